//! Interaction policy engine.
//!
//! Pure decision functions. Nothing here touches storage; services load the
//! facts a rule needs and hand them in, so every read and write path runs the
//! same rules.

pub mod actor;
pub mod conversation;
pub mod permission;
pub mod quota;
pub mod reveal;
pub mod visibility;

pub use actor::Actor;
pub use conversation::{ConversationState, Opening, Side, Transition, TransitionOutcome};
pub use permission::{Action, PermissionGate, Relationship, Target, VideoDraft};
pub use quota::QuotaDecision;
pub use reveal::{FullProfile, PartyView, RedactedProfile};
pub use visibility::{check_video_visibility, resolve_visibility_classes};
