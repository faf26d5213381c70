//! Persistence abstraction the [`crate::crud::CrudHandler`] and
//! [`crate::health::HealthHandler`] are generic over.
//!
//! Implementations must be `Send + Sync` to work with the consumer's
//! concurrent delivery handling. No backend is implemented by this crate
//! beyond the in-memory reference store in [`memory`] — a real deployment
//! plugs in its own SQL/KV-backed `Store` (persistence implementation
//! details are a Non-goal of this crate).

pub mod memory;

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::AppError;

/// A lightweight connectivity probe, used by [`crate::health::HealthHandler`].
///
/// `Ok(true)` — reachable. `Ok(false)` — cleanly "cannot connect" (reported
/// as `Degraded`). `Err` — thrown failure (reported as `Unhealthy`).
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> Result<bool, AppError>;
}

/// Set-of-entity operations keyed by integer id.
///
/// Reads (`find_by_id`, `enumerate`) must be non-tracking / snapshot-
/// consistent — no implicit write-back. Writes (`add`, `update`, `remove`)
/// must be durable once `save` (called internally by the mutating methods,
/// or explicitly by a caller batching several changes) returns.
#[async_trait]
pub trait Store<E>: Probe
where
    E: Entity + Send + Sync,
{
    /// Inserts `entity`, assigning it a fresh positive id, and persists it.
    /// Returns the stored entity (with its assigned id and timestamps).
    async fn add(&self, entity: E) -> Result<E, AppError>;

    /// Read-only lookup by id. `Ok(None)` when absent — callers decide
    /// whether that is a `NotFound`.
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError>;

    /// Enumerates the entire set. Read-only.
    async fn enumerate(&self) -> Result<Vec<E>, AppError>;

    /// Marks `entity` as modified and persists it. The entity's `id` selects
    /// which row is updated.
    async fn update(&self, entity: E) -> Result<(), AppError>;

    /// Removes the entity with `id`. Callers are expected to have already
    /// confirmed existence (load-then-remove) so `NotFound` surfaces before
    /// any mutation — see [`crate::crud::CrudHandler`]'s `DELETE` action.
    async fn remove(&self, id: i64) -> Result<(), AppError>;

    /// Flushes any buffered writes. The in-memory store makes this a no-op
    /// since every mutation above is already durable when it returns.
    async fn save(&self) -> Result<(), AppError>;
}
