//! Matches an incoming message to exactly one registered handler.
//!
//! Generalizes `context-harness`'s `ToolRegistry`/`ConnectorRegistry`
//! (`src/traits.rs`, `Vec<Box<dyn Trait>>` + linear `find()`) to two-key
//! `(type, resource)` matching, with construction-time uniqueness validation
//! instead of leaving duplicate registration to be discovered at dispatch
//! time.

use thiserror::Error;

use crate::envelope::BusMessage;
use crate::error::AppError;
use crate::handler::BusHandler;

/// Construction-time misconfiguration: two handlers registered for the same
/// `(type, resource)` pair.
#[derive(Debug, Error)]
#[error("duplicate handler registered for ({0:?}, {1})")]
pub struct RouterBuildError(pub crate::envelope::MessageType, pub String);

/// A read-only, once-built table of [`BusHandler`]s.
pub struct BusRouter {
    handlers: Vec<Box<dyn BusHandler>>,
}

impl BusRouter {
    /// Builds a router from a finite set of handlers, failing fast if two
    /// handlers claim the same `(type, resource)` pair.
    pub fn new(handlers: Vec<Box<dyn BusHandler>>) -> Result<Self, RouterBuildError> {
        for (i, a) in handlers.iter().enumerate() {
            for b in handlers.iter().skip(i + 1) {
                if a.service_type() == b.service_type()
                    && a.resource().eq_ignore_ascii_case(b.resource())
                {
                    return Err(RouterBuildError(a.service_type(), a.resource().to_string()));
                }
            }
        }
        Ok(Self { handlers })
    }

    /// Selects the unique handler matching `msg`'s `(type, resource)` and
    /// forwards `msg` unchanged to it, returning the handler's raw JSON
    /// string result verbatim. `NotFound{SERVICE_NOT_FOUND}` when no handler
    /// matches.
    pub async fn route(&self, msg: &BusMessage) -> Result<String, AppError> {
        let handler = self
            .handlers
            .iter()
            .find(|h| {
                h.service_type() == msg.message_type && h.resource().eq_ignore_ascii_case(&msg.resource)
            })
            .ok_or_else(|| {
                AppError::not_found(
                    "SERVICE_NOT_FOUND",
                    format!(
                        "no handler registered for ({:?}, {})",
                        msg.message_type, msg.resource
                    ),
                )
            })?;

        handler.handle(msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageType;
    use async_trait::async_trait;

    struct EchoHandler {
        service_type: MessageType,
        resource: &'static str,
    }

    #[async_trait]
    impl BusHandler for EchoHandler {
        fn service_type(&self) -> MessageType {
            self.service_type
        }
        fn resource(&self) -> &str {
            self.resource
        }
        async fn handle(&self, msg: &BusMessage) -> Result<String, AppError> {
            Ok(format!("handled:{}", msg.action))
        }
    }

    fn msg(message_type: MessageType, resource: &str, action: &str) -> BusMessage {
        BusMessage {
            message_type,
            resource: resource.to_string(),
            action: action.to_string(),
            id: None,
            data: None,
        }
    }

    #[tokio::test]
    async fn routes_to_the_matching_handler() {
        let router = BusRouter::new(vec![Box::new(EchoHandler {
            service_type: MessageType::Data,
            resource: "Users",
        })])
        .unwrap();

        let result = router
            .route(&msg(MessageType::Data, "users", "LIST"))
            .await
            .unwrap();
        assert_eq!(result, "handled:LIST");
    }

    #[tokio::test]
    async fn unknown_resource_is_service_not_found() {
        let router = BusRouter::new(vec![Box::new(EchoHandler {
            service_type: MessageType::Data,
            resource: "Users",
        })])
        .unwrap();

        let err = router
            .route(&msg(MessageType::Data, "Ghost", "LIST"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "SERVICE_NOT_FOUND");
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn same_resource_different_type_does_not_match() {
        let router = BusRouter::new(vec![Box::new(EchoHandler {
            service_type: MessageType::Infra,
            resource: "Health",
        })])
        .unwrap();

        let err = router
            .route(&msg(MessageType::Data, "Health", "CHECK"))
            .await
            .unwrap_err();
        assert_eq!(err.code, "SERVICE_NOT_FOUND");
    }

    #[test]
    fn construction_rejects_duplicate_registration() {
        let result = BusRouter::new(vec![
            Box::new(EchoHandler {
                service_type: MessageType::Data,
                resource: "Users",
            }),
            Box::new(EchoHandler {
                service_type: MessageType::Data,
                resource: "users",
            }),
        ]);
        assert!(result.is_err());
    }
}
