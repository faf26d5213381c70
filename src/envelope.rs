//! Wire types: the request envelope ([`BusMessage`]) and the reply envelope
//! ([`RpcEnvelope`]/[`RpcError`]).
//!
//! Everything here is JSON over UTF-8, lowerCamelCase keys, absent optional
//! fields omitted — matching the JSON codec conventions the rest of the
//! retrieval pack uses for its own wire types (e.g. `context-harness`'s
//! `server.rs` response structs).

use serde::{Deserialize, Serialize};

/// Coarse handler category a [`BusMessage`] is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    /// Persisted entities, served by a [`crate::crud::CrudHandler`].
    Data,
    /// Business logic handlers.
    App,
    /// Operational handlers, e.g. [`crate::health::HealthHandler`].
    Infra,
}

/// The on-wire request envelope. A handler is addressed uniquely by
/// `(type, resource)`; `action` selects the operation within that handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub resource: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl BusMessage {
    /// `action`, compared case-insensitively by convention — this crate's
    /// canonical form is uppercase.
    pub fn action_upper(&self) -> String {
        self.action.to_uppercase()
    }
}

/// The on-wire reply envelope. Exactly one of `data`/`error` is meaningful,
/// selected by `ok`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEnvelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl<T> RpcEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: RpcError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

/// A remote failure as reported over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcError {
    /// Short machine token, e.g. `"NOT_FOUND"`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_lower_camel_case_and_skips_absent_fields() {
        let msg = BusMessage {
            message_type: MessageType::Data,
            resource: "Users".into(),
            action: "GET".into(),
            id: Some(42),
            data: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "DATA");
        assert_eq!(json["resource"], "Users");
        assert_eq!(json["action"], "GET");
        assert_eq!(json["id"], 42);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn success_envelope_omits_error_key() {
        let env = RpcEnvelope::success("8".to_string());
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"], "8");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_envelope_omits_data_key() {
        let env: RpcEnvelope<String> = RpcEnvelope::failure(RpcError {
            code: "NOT_FOUND".into(),
            message: "Cannot find ressource".into(),
            details: None,
        });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn request_roundtrips_through_json() {
        let raw = r#"{"type":"INFRA","resource":"Health","action":"CHECK"}"#;
        let msg: BusMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.message_type, MessageType::Infra);
        assert_eq!(msg.resource, "Health");
        assert!(msg.id.is_none());
        assert!(msg.data.is_none());
    }
}
