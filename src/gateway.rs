//! The user-visible error shape a process host hands back to its own
//! callers (HTTP clients, CLI users, whatever sits in front of a gateway
//! built on [`crate::producer::Producer`]).
//!
//! This is deliberately outside the wire protocol: [`envelope::RpcError`]
//! is what travels over the broker, `ErrorEnvelope` is what a host might
//! choose to render at its own edge. Not wired into [`crate::consumer`] or
//! [`crate::producer`] — a process host constructs one from the
//! [`crate::error::AppError`] it gets back from a `Producer::call`.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// An error shape suitable for serializing straight back to an external
/// caller, analogous to `context-harness`'s `ErrorResponse` in `src/server.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(rename = "traceId", skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ErrorEnvelope {
    /// Builds an `ErrorEnvelope` from an [`AppError`], tagging it with the
    /// current `tracing` span's id as `traceId` when one is active.
    /// `exception` is populated only outside production (see
    /// [`is_production`]) — it is a debugging aid, not something to leak to
    /// an external caller in a deployed environment.
    pub fn from_app_error(err: &AppError) -> Self {
        Self {
            message: err.message.clone(),
            exception: if is_production() {
                None
            } else {
                Some(err.code.clone())
            },
            trace_id: current_trace_id(),
        }
    }
}

/// Whether this process considers itself production, per the `APP_ENV`
/// environment variable. Unset or any value other than `"production"` is
/// treated as non-production.
fn is_production() -> bool {
    std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

fn current_trace_id() -> Option<String> {
    let id = tracing::Span::current().id()?;
    Some(format!("{:x}", id.into_u64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn carries_message_and_code() {
        let err = AppError::not_found("NOT_FOUND", "Cannot find ressource");
        let envelope = ErrorEnvelope::from_app_error(&err);
        assert_eq!(envelope.message, "Cannot find ressource");
        assert_eq!(envelope.exception.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn trace_id_is_absent_outside_a_span() {
        let err = AppError::internal("INTERNAL_ERROR", "boom");
        let envelope = ErrorEnvelope::from_app_error(&err);
        assert!(envelope.trace_id.is_none());
    }

    #[test]
    fn exception_is_omitted_in_production() {
        // Mutates process env; no other test in this crate reads or writes
        // `APP_ENV`.
        std::env::set_var("APP_ENV", "production");
        let err = AppError::not_found("NOT_FOUND", "Cannot find ressource");
        let envelope = ErrorEnvelope::from_app_error(&err);
        std::env::remove_var("APP_ENV");
        assert!(envelope.exception.is_none());
    }
}
