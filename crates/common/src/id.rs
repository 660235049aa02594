//! ID generation utilities.

use chrono::{DateTime, Utc};
use ulid::Ulid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable by creation time, so ID order
    /// matches insertion order across milliseconds.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a ULID whose time component is `at`.
    ///
    /// Used when the record's timestamp comes from an injected clock.
    #[must_use]
    pub fn generate_at(&self, at: DateTime<Utc>) -> String {
        Ulid::from_datetime(at.into()).to_string().to_lowercase()
    }
}
