//! Closed error taxonomy shared by every handler and by the producer/consumer
//! boundary.
//!
//! Handler code must never let storage or transport errors cross the bus
//! boundary directly — everything is translated into an [`AppError`] first.
//! [`AppError::into_rpc_error`] is the single point where that happens on the
//! consumer side; the producer does the mirror-image reconstruction in
//! [`crate::producer`].

use crate::envelope::RpcError;

/// The closed set of error kinds, each with a stable HTTP-style status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RequestTimeout,
    TooManyRequests,
    InternalServerError,
    GatewayTimeout,
    /// The remote peer answered with `ok:false`; carries its `code`/`details`.
    Rpc,
}

impl ErrorKind {
    /// The HTTP-style status code for this kind.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::RequestTimeout => 408,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::GatewayTimeout => 504,
            ErrorKind::Rpc => 500,
        }
    }
}

/// An in-process failure, constructed at the point of failure and carried
/// across layers until the consumer boundary converts it into an
/// [`RpcEnvelope`](crate::envelope::RpcEnvelope).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    pub kind: ErrorKind,
    /// Short machine token, e.g. `"NOT_FOUND"`.
    pub code: String,
    pub message: String,
    /// Present only for [`ErrorKind::Rpc`] — the remote peer's technical detail.
    pub details: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, code, message)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, code, message)
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    pub fn request_timeout(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestTimeout, code, message)
    }

    pub fn too_many_requests(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, code, message)
    }

    pub fn gateway_timeout(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GatewayTimeout, code, message)
    }

    /// Reconstructs a remote failure reported by a peer's `RpcEnvelope`.
    pub fn from_remote(error: RpcError) -> Self {
        Self {
            kind: ErrorKind::Rpc,
            code: error.code,
            message: error.message,
            details: error.details,
        }
    }

    /// The single translation point from an in-process failure to the wire
    /// error shape. Used by the consumer when a handler returns `Err`.
    pub fn into_rpc_error(self) -> RpcError {
        RpcError {
            code: self.code,
            message: self.message,
            details: self.details,
        }
    }

    /// Any failure not already typed surfaces as `InternalServerError`.
    /// Used to wrap storage/codec errors the handler code must not leak raw.
    pub fn from_unhandled(err: impl std::fmt::Display) -> Self {
        Self::internal("INTERNAL_ERROR", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ErrorKind::BadRequest.status(), 400);
        assert_eq!(ErrorKind::Unauthorized.status(), 401);
        assert_eq!(ErrorKind::Forbidden.status(), 403);
        assert_eq!(ErrorKind::NotFound.status(), 404);
        assert_eq!(ErrorKind::RequestTimeout.status(), 408);
        assert_eq!(ErrorKind::TooManyRequests.status(), 429);
        assert_eq!(ErrorKind::InternalServerError.status(), 500);
        assert_eq!(ErrorKind::GatewayTimeout.status(), 504);
        assert_eq!(ErrorKind::Rpc.status(), 500);
    }

    #[test]
    fn into_rpc_error_drops_kind_keeps_fields() {
        let err = AppError::not_found("NOT_FOUND", "Cannot find ressource").with_details("row 42");
        let rpc = err.into_rpc_error();
        assert_eq!(rpc.code, "NOT_FOUND");
        assert_eq!(rpc.message, "Cannot find ressource");
        assert_eq!(rpc.details.as_deref(), Some("row 42"));
    }

    #[test]
    fn from_remote_round_trips_as_rpc_kind() {
        let remote = RpcError {
            code: "TIMEOUT".into(),
            message: "deadline exceeded".into(),
            details: None,
        };
        let err = AppError::from_remote(remote);
        assert_eq!(err.kind, ErrorKind::Rpc);
        assert_eq!(err.status(), 500);
    }
}
