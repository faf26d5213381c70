//! Strict decoding of a [`BusMessage`]'s opaque `data`/`id` fields into typed
//! values.
//!
//! Generalizes the ad hoc `if req.field.is_empty() { return
//! Err(bad_request(...)) }` checks `context-harness`'s `server.rs` handlers
//! write per-handler into one reusable parser bound to a single
//! `BusMessage`.

use serde::de::DeserializeOwned;

use crate::envelope::BusMessage;
use crate::error::AppError;

/// Borrowing view over a [`BusMessage`]'s parameters.
pub struct Params<'a> {
    msg: &'a BusMessage,
}

impl<'a> Params<'a> {
    pub fn new(msg: &'a BusMessage) -> Self {
        Self { msg }
    }

    /// The message's `id`, required. `ID_MANDATORY` if absent.
    pub fn require_id(&self) -> Result<i64, AppError> {
        self.msg
            .id
            .ok_or_else(|| AppError::bad_request("ID_MANDATORY", "id is required"))
    }

    /// The message's `data`, required non-empty. `DATA_MANDATORY` if absent
    /// or empty.
    pub fn require_data(&self) -> Result<&str, AppError> {
        match self.msg.data.as_deref() {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(AppError::bad_request(
                "DATA_MANDATORY",
                "data is required",
            )),
        }
    }

    /// Parses `id` as an `i32`. `PARSE_ERROR` if missing or out of the `i32`
    /// range.
    pub fn to_short(&self) -> Result<i32, AppError> {
        let id = self.require_id()?;
        i32::try_from(id)
            .map_err(|_| AppError::bad_request("PARSE_ERROR", format!("'{id}' is out of range")))
    }

    /// Parses `id` as an `i64`.
    pub fn to_long(&self) -> Result<i64, AppError> {
        self.require_id()
    }

    /// Parses `id` as an `i32` range-checked value, returned widened to
    /// `i64`. `PARSE_ERROR` if missing or out of the `i32` range — `ToInt`'s
    /// target width is 32-bit, distinct from `ToLong`'s 64-bit one.
    pub fn to_int(&self) -> Result<i64, AppError> {
        self.to_short().map(i64::from)
    }

    /// Parses an arbitrary base-10 string into an `i64` — used when a typed
    /// field nested inside a decoded JSON body needs the same strict
    /// canonical-integer contract `id` gets for free from JSON numbers.
    pub fn parse_int_str(raw: &str) -> Result<i64, AppError> {
        parse_canonical_int(raw)
    }

    /// Decodes `data` as JSON into `T`. `DATA_INVALID` on decode failure or
    /// when the decoded value is JSON `null`.
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let raw = self.require_data()?;
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::bad_request("DATA_INVALID", e.to_string()))?;
        if value.is_null() {
            return Err(AppError::bad_request("DATA_INVALID", "data is null"));
        }
        serde_json::from_value(value)
            .map_err(|e| AppError::bad_request("DATA_INVALID", e.to_string()))
    }

    /// As [`to_object`](Self::to_object), but a JSON `null` (or absent
    /// `data`) resolves to `None` instead of failing.
    pub fn to_nullable_object<T: DeserializeOwned>(&self) -> Result<Option<T>, AppError> {
        let raw = match self.msg.data.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(None),
        };
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::bad_request("DATA_INVALID", e.to_string()))?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AppError::bad_request("DATA_INVALID", e.to_string()))
    }

    /// Decodes `data` as a JSON array into `Vec<T>`. `DATA_INVALID` on decode
    /// failure, absent/null data, or (if `require_non_empty`) an empty
    /// sequence.
    pub fn to_list_object<T: DeserializeOwned>(
        &self,
        require_non_empty: bool,
    ) -> Result<Vec<T>, AppError> {
        let list: Vec<T> = self.to_object()?;
        if require_non_empty && list.is_empty() {
            return Err(AppError::bad_request("DATA_INVALID", "data must not be empty"));
        }
        Ok(list)
    }
}

/// A canonical base-10 integer: no leading `+`, no leading zeros other than
/// `"0"` itself, optional leading `-`.
fn parse_canonical_int(raw: &str) -> Result<i64, AppError> {
    let is_canonical = {
        let body = raw.strip_prefix('-').unwrap_or(raw);
        !body.is_empty()
            && body.chars().all(|c| c.is_ascii_digit())
            && (body == "0" || !body.starts_with('0'))
    };
    if !is_canonical {
        return Err(AppError::bad_request(
            "PARSE_ERROR",
            format!("'{raw}' is not a canonical base-10 integer"),
        ));
    }
    raw.parse::<i64>()
        .map_err(|_| AppError::bad_request("PARSE_ERROR", format!("'{raw}' is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageType;
    use serde::Deserialize;

    fn msg(id: Option<i64>, data: Option<&str>) -> BusMessage {
        BusMessage {
            message_type: MessageType::Data,
            resource: "Users".into(),
            action: "GET".into(),
            id,
            data: data.map(str::to_string),
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
    }

    #[test]
    fn require_id_missing_is_id_mandatory() {
        let m = msg(None, None);
        let err = Params::new(&m).require_id().unwrap_err();
        assert_eq!(err.code, "ID_MANDATORY");
    }

    #[test]
    fn require_data_empty_is_data_mandatory() {
        let m = msg(None, Some(""));
        let err = Params::new(&m).require_data().unwrap_err();
        assert_eq!(err.code, "DATA_MANDATORY");
    }

    #[test]
    fn to_object_decodes_valid_json() {
        let m = msg(None, Some(r#"{"name":"Ada"}"#));
        let user: User = Params::new(&m).to_object().unwrap();
        assert_eq!(user, User { name: "Ada".into() });
    }

    #[test]
    fn to_object_rejects_null() {
        let m = msg(None, Some("null"));
        let err = Params::new(&m).to_object::<User>().unwrap_err();
        assert_eq!(err.code, "DATA_INVALID");
    }

    #[test]
    fn to_nullable_object_accepts_null() {
        let m = msg(None, Some("null"));
        let result: Option<User> = Params::new(&m).to_nullable_object().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn to_nullable_object_absent_data_is_none() {
        let m = msg(None, None);
        let result: Option<User> = Params::new(&m).to_nullable_object().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn to_list_object_requires_non_empty_when_asked() {
        let m = msg(None, Some("[]"));
        let err = Params::new(&m)
            .to_list_object::<User>(true)
            .unwrap_err();
        assert_eq!(err.code, "DATA_INVALID");
    }

    #[test]
    fn to_list_object_allows_empty_by_default() {
        let m = msg(None, Some("[]"));
        let list = Params::new(&m).to_list_object::<User>(false).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn to_int_rejects_a_value_outside_i32_range() {
        let m = msg(Some(3_000_000_000), None);
        let err = Params::new(&m).to_int().unwrap_err();
        assert_eq!(err.code, "PARSE_ERROR");
    }

    #[test]
    fn to_long_accepts_a_value_outside_i32_range() {
        let m = msg(Some(3_000_000_000), None);
        assert_eq!(Params::new(&m).to_long().unwrap(), 3_000_000_000);
    }

    #[test]
    fn parse_canonical_int_rejects_leading_zero_and_plus() {
        assert!(parse_canonical_int("007").is_err());
        assert!(parse_canonical_int("+3").is_err());
        assert!(parse_canonical_int("abc").is_err());
        assert_eq!(parse_canonical_int("-5").unwrap(), -5);
        assert_eq!(parse_canonical_int("0").unwrap(), 0);
        assert_eq!(parse_canonical_int("42").unwrap(), 42);
    }
}
