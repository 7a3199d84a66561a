use thiserror::Error;

/// Shown when a failed response carries no usable message.
pub const GENERIC_FAILURE: &str = "An error occurred. Please try again.";

/// Errors returned by collaborator calls.
///
/// Every variant is recoverable at the call site; [`ApiError::user_message`]
/// is the one string a form or action shows inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, ...
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx response. `message` comes from the body's `detail` field, or
    /// the first field error, or [`GENERIC_FAILURE`].
    #[error("request failed ({status}): {message}")]
    Request { status: u16, message: String },

    /// A 2xx response whose body does not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The CSRF token could not be obtained or was rejected.
    #[error("csrf token unavailable: {0}")]
    Csrf(String),

    /// 401: the cookie session is missing or expired.
    #[error("not authenticated")]
    Unauthenticated,

    /// The client could not be built (bad base URL, TLS backend, ...).
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Timeout(_) => "The server took too long to respond. Please try again.".to_string(),
            ApiError::Request { message, .. } => message.clone(),
            ApiError::Parse(_) => GENERIC_FAILURE.to_string(),
            ApiError::Csrf(_) => "Your security token expired. Please retry.".to_string(),
            ApiError::Unauthenticated => "Your session has expired. Please log in again.".to_string(),
            ApiError::Config(reason) => format!("Client misconfigured: {reason}"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            ApiError::Unauthenticated => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout_secs)
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
