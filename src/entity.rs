//! The contract [`crate::crud::CrudHandler`] requires of any entity type.

use chrono::{DateTime, Utc};

/// Any entity managed by the CRUD handler exposes a mutable integer `id` and
/// two UTC timestamps. `id == 0` denotes "unassigned"; the store assigns a
/// positive id on insert. Timestamps are maintained by the persistence
/// layer, not by the handler.
pub trait Entity {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    fn set_created_at(&mut self, at: DateTime<Utc>);
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}
