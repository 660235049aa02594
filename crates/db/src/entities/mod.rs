//! Database entities.

#![allow(missing_docs)]

pub mod blocking;
pub mod comment;
pub mod conversation;
pub mod express_interest;
pub mod following;
pub mod investor_profile;
pub mod investor_verification;
pub mod message;
pub mod message_limit;
pub mod notification;
pub mod profile_reveal;
pub mod subscription;
pub mod user;
pub mod user_profile;
pub mod video;
pub mod video_like;

pub use blocking::Entity as Blocking;
pub use comment::Entity as Comment;
pub use conversation::Entity as Conversation;
pub use express_interest::Entity as ExpressInterest;
pub use following::Entity as Following;
pub use investor_profile::Entity as InvestorProfile;
pub use investor_verification::Entity as InvestorVerification;
pub use message::Entity as Message;
pub use message_limit::Entity as MessageLimit;
pub use notification::Entity as Notification;
pub use profile_reveal::Entity as ProfileReveal;
pub use subscription::Entity as Subscription;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
pub use video::Entity as Video;
pub use video_like::Entity as VideoLike;
