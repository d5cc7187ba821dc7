//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};

/// Entity with a stable identity and audit timestamps.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// When the entity was first persisted.
    fn created_at(&self) -> DateTime<Utc>;

    /// When the entity last changed. Never earlier than `created_at`.
    fn updated_at(&self) -> DateTime<Utc>;
}
