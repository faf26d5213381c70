//! Generic Create/Get/List/Update/Delete handler bound to a `(store, entity
//! type, resource name)` triple.
//!
//! Grounded on `context-harness`'s pattern of concrete `Tool` implementations
//! that delegate to a shared context (`SearchTool`/`GetTool` in
//! `src/traits.rs`), generalized here into one handler parameterized over the
//! entity type instead of one hand-written struct per operation.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entity::Entity;
use crate::envelope::{BusMessage, MessageType};
use crate::error::AppError;
use crate::handler::BusHandler;
use crate::params::Params;
use crate::store::Store;

/// Binds a [`Store`] to a resource name, exposing it as a [`BusHandler`] of
/// type `Data` implementing Create/Get/List/Update/Delete.
pub struct CrudHandler<S, E> {
    store: S,
    resource: String,
    _entity: PhantomData<E>,
}

impl<S, E> CrudHandler<S, E> {
    pub fn new(store: S, resource: impl Into<String>) -> Self {
        Self {
            store,
            resource: resource.into(),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<S, E> BusHandler for CrudHandler<S, E>
where
    S: Store<E>,
    E: Entity + Serialize + DeserializeOwned + Send + Sync,
{
    fn service_type(&self) -> MessageType {
        MessageType::Data
    }

    fn resource(&self) -> &str {
        &self.resource
    }

    async fn handle(&self, msg: &BusMessage) -> Result<String, AppError> {
        let params = Params::new(msg);
        match msg.action_upper().as_str() {
            "CREATE" => {
                let entity: E = params.to_object()?;
                let stored = self.store.add(entity).await?;
                self.store.save().await?;
                Ok(stored.id().to_string())
            }
            "GET" => {
                let id = params.require_id()?;
                let entity = self
                    .store
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("NOT_FOUND", "Cannot find ressource"))?;
                to_json(&entity)
            }
            "LIST" => {
                let entities = self.store.enumerate().await?;
                to_json(&entities)
            }
            "UPDATE" => {
                // `id` is informational only — only the decoded body is
                // persisted.
                let _id = params.require_id()?;
                let entity: E = params.to_object()?;
                self.store.update(entity).await?;
                self.store.save().await?;
                Ok("true".to_string())
            }
            "DELETE" => {
                let id = params.require_id()?;
                // Load-then-remove so NotFound surfaces before any mutation.
                self.store
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("NOT_FOUND", "Cannot find ressource"))?;
                self.store.remove(id).await?;
                self.store.save().await?;
                Ok("true".to_string())
            }
            other => Err(AppError::internal(
                "ACTION_NOT_IMPLEMENTED",
                format!("unrecognized action '{other}'"),
            )),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(AppError::from_unhandled)
}
