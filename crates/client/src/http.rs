//! Response helpers shared by every endpoint.
//!
//! Status mapping lives here so endpoint code only builds requests and names
//! the payload type.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, GENERIC_FAILURE};

/// Parse a body leniently: malformed or empty JSON becomes `{}`.
pub(crate) fn lenient_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// The single user-facing message carried by an error body.
///
/// Order: `detail`, `non_field_errors`, the first field error, a bare string
/// body, then [`GENERIC_FAILURE`].
pub(crate) fn error_message(body: &Value) -> String {
    if let Value::String(s) = body {
        if !s.trim().is_empty() {
            return s.trim().to_string();
        }
    }

    let Some(obj) = body.as_object() else {
        return GENERIC_FAILURE.to_string();
    };

    if let Some(msg) = obj.get("detail").and_then(first_text) {
        return msg;
    }
    if let Some(msg) = obj.get("non_field_errors").and_then(first_text) {
        return msg;
    }
    obj.iter()
        .find_map(|(field, value)| first_text(value).map(|msg| format!("{field}: {msg}")))
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

/// Map a non-2xx status plus its body to an [`ApiError`].
pub(crate) fn status_error(status: u16, body: &str) -> ApiError {
    let parsed = lenient_json(body);
    match status {
        401 => ApiError::Unauthenticated,
        403 if is_csrf_failure(&parsed) => ApiError::Csrf(error_message(&parsed)),
        _ => ApiError::Request {
            status,
            message: error_message(&parsed),
        },
    }
}

fn is_csrf_failure(body: &Value) -> bool {
    body.get("detail")
        .and_then(Value::as_str)
        .is_some_and(|d| d.to_ascii_lowercase().contains("csrf"))
}

/// Decode a 2xx body into `T`, treating a malformed body as `{}`.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_value(lenient_json(body)).map_err(|e| ApiError::Parse(e.to_string()))
}
