//! Connectivity probe handler, type `INFRA`, resource `"Health"`.
//!
//! Modeled after `context-harness`'s `GET /health` endpoint
//! (`src/server.rs::handle_health`) and `sources.rs`'s connector status
//! listing, generalized from "always returns ok" to a three-way
//! {Healthy, Degraded, Unhealthy} snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::envelope::{BusMessage, MessageType};
use crate::error::AppError;
use crate::handler::BusHandler;
use crate::store::Probe;

/// One of {Healthy, Degraded, Unhealthy}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// The result of a `CHECK` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<HealthStatus>,
}

/// `BusHandler` of type `INFRA`, resource `"Health"`, single action `CHECK`.
/// Never propagates errors to the caller — a probe failure becomes an
/// `Unhealthy` snapshot, not an `AppError`.
pub struct HealthHandler<P> {
    probe: P,
}

impl<P: Probe> HealthHandler<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    async fn check(&self) -> HealthSnapshot {
        match self.probe.probe().await {
            Ok(true) => HealthSnapshot {
                status: HealthStatus::Healthy,
                db: Some(HealthStatus::Healthy),
            },
            Ok(false) => HealthSnapshot {
                status: HealthStatus::Healthy,
                db: Some(HealthStatus::Degraded),
            },
            Err(err) => {
                tracing::warn!(code = %err.code, "health probe failed");
                HealthSnapshot {
                    status: HealthStatus::Unhealthy,
                    db: Some(HealthStatus::Unhealthy),
                }
            }
        }
    }
}

#[async_trait]
impl<P: Probe> BusHandler for HealthHandler<P> {
    fn service_type(&self) -> MessageType {
        MessageType::Infra
    }

    fn resource(&self) -> &str {
        "Health"
    }

    async fn handle(&self, msg: &BusMessage) -> Result<String, AppError> {
        match msg.action_upper().as_str() {
            "CHECK" => {
                let snapshot = self.check().await;
                serde_json::to_string(&snapshot).map_err(AppError::from_unhandled)
            }
            other => Err(AppError::internal(
                "ACTION_NOT_IMPLEMENTED",
                format!("unrecognized action '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Result<bool, &'static str>);

    #[async_trait]
    impl Probe for FixedProbe {
        async fn probe(&self) -> Result<bool, AppError> {
            self.0
                .map_err(|m| AppError::internal("PROBE_FAILED", m))
        }
    }

    fn check_msg() -> BusMessage {
        BusMessage {
            message_type: MessageType::Infra,
            resource: "Health".into(),
            action: "CHECK".into(),
            id: None,
            data: None,
        }
    }

    #[tokio::test]
    async fn healthy_probe_reports_healthy() {
        let h = HealthHandler::new(FixedProbe(Ok(true)));
        let result = h.handle(&check_msg()).await.unwrap();
        let snapshot: HealthSnapshot = serde_json::from_str(&result).unwrap();
        assert_eq!(snapshot.status, HealthStatus::Healthy);
        assert_eq!(snapshot.db, Some(HealthStatus::Healthy));
    }

    #[tokio::test]
    async fn clean_cannot_connect_reports_degraded() {
        let h = HealthHandler::new(FixedProbe(Ok(false)));
        let result = h.handle(&check_msg()).await.unwrap();
        let snapshot: HealthSnapshot = serde_json::from_str(&result).unwrap();
        assert_eq!(snapshot.status, HealthStatus::Healthy);
        assert_eq!(snapshot.db, Some(HealthStatus::Degraded));
    }

    #[tokio::test]
    async fn thrown_failure_reports_unhealthy_and_never_errors() {
        let h = HealthHandler::new(FixedProbe(Err("connection refused")));
        let result = h.handle(&check_msg()).await.unwrap();
        let snapshot: HealthSnapshot = serde_json::from_str(&result).unwrap();
        assert_eq!(snapshot.status, HealthStatus::Unhealthy);
        assert_eq!(snapshot.db, Some(HealthStatus::Unhealthy));
    }

    #[tokio::test]
    async fn unknown_action_is_action_not_implemented() {
        let h = HealthHandler::new(FixedProbe(Ok(true)));
        let mut msg = check_msg();
        msg.action = "FROBNICATE".into();
        let err = h.handle(&msg).await.unwrap_err();
        assert_eq!(err.code, "ACTION_NOT_IMPLEMENTED");
    }
}
