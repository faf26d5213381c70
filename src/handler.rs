//! The trait every routable service implements, and the registry
//! ([`crate::router::BusRouter`]) that dispatches to it.
//!
//! Grounded on `context-harness`'s `Tool` trait (`src/traits.rs`): an async
//! trait object held behind `Box<dyn _>`, found by a key rather than
//! resolved through inheritance.

use async_trait::async_trait;

use crate::envelope::{BusMessage, MessageType};
use crate::error::AppError;

/// A handler addressed by `(type, resource)`. `action` is not interpreted by
/// the router — `handle` receives the whole message and dispatches on
/// `action` itself.
#[async_trait]
pub trait BusHandler: Send + Sync {
    /// The service type this handler answers for.
    fn service_type(&self) -> MessageType;

    /// The resource name this handler answers for (e.g. `"Users"`). Matched
    /// case-insensitively by the router.
    fn resource(&self) -> &str;

    /// Handles `msg` and returns the raw JSON string result, or a typed
    /// [`AppError`] to be converted into an error envelope at the consumer
    /// boundary.
    async fn handle(&self, msg: &BusMessage) -> Result<String, AppError>;
}
