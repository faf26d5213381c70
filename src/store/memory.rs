//! An in-memory [`Store`] implementation, for tests and as a starting point
//! for a real backend. Not durable across process restarts — this crate
//! does not implement persistence (Non-goal).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::entity::Entity;
use crate::error::AppError;

use super::{Probe, Store};

/// Thread-safe in-memory set of entities keyed by id.
pub struct MemoryStore<E> {
    rows: RwLock<HashMap<i64, E>>,
    next_id: AtomicI64,
}

impl<E> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seeds the store with an existing entity, honoring its id and
    /// advancing the id counter past it. Useful for tests that need a
    /// known starting `last-id`.
    pub async fn seed(&self, entity: E)
    where
        E: Entity,
    {
        let id = entity.id();
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        self.rows.write().await.insert(id, entity);
    }
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Send + Sync> Probe for MemoryStore<E> {
    async fn probe(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

#[async_trait]
impl<E> Store<E> for MemoryStore<E>
where
    E: Entity + Clone + Send + Sync,
{
    async fn add(&self, mut entity: E) -> Result<E, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        entity.set_id(id);
        entity.set_created_at(now);
        entity.set_updated_at(now);
        self.rows.write().await.insert(id, entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn enumerate(&self) -> Result<Vec<E>, AppError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn update(&self, mut entity: E) -> Result<(), AppError> {
        let id = entity.id();
        let mut rows = self.rows.write().await;
        let existing = rows
            .get(&id)
            .ok_or_else(|| AppError::not_found("NOT_FOUND", "Cannot find ressource"))?;
        if let Some(created) = existing.created_at() {
            entity.set_created_at(created);
        }
        entity.set_updated_at(Utc::now());
        rows.insert(id, entity);
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), AppError> {
        let mut rows = self.rows.write().await;
        if rows.remove(&id).is_none() {
            return Err(AppError::not_found("NOT_FOUND", "Cannot find ressource"));
        }
        Ok(())
    }

    async fn save(&self) -> Result<(), AppError> {
        Ok(())
    }
}
