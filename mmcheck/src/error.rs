//! Error types for the probe library.
//!
//! Two layers, mirroring how the remote service reports problems:
//! [`ApiError`] for failures the service declares itself through its
//! `base_resp` envelope, and [`Error`] for everything else that can go
//! wrong around a request (transport, JSON, I/O, payload decoding).

use serde_json::Value;
use std::fmt;

/// Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for probe operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Failure declared by the MiniMax API in its response envelope.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio payload could not be decoded.
    #[error("audio decode error: {0}")]
    Audio(String),

    /// Missing or invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create an audio decode error with a message.
    #[must_use]
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the remote service reported the failure itself, as
    /// opposed to a transport-level or local error.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        matches!(self, Self::Api(_))
    }
}

/// An error explicitly communicated by the remote service.
///
/// MiniMax reports failures inside a `base_resp` object carrying a
/// numeric `status_code` (0 means success) and a human-readable
/// `status_msg`, usually alongside an HTTP 200. Non-2xx responses are
/// folded into the same shape with the HTTP status as the code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ApiError {
    /// Status code from the provider, or the HTTP status when the
    /// request failed before producing an envelope.
    pub status_code: Option<i64>,
    /// Human-readable status message.
    pub status_msg: String,
}

impl ApiError {
    /// Create an error with a provider status code.
    #[must_use]
    pub fn new(status_code: i64, status_msg: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            status_msg: status_msg.into(),
        }
    }

    /// Create an error with a message only.
    #[must_use]
    pub fn message(status_msg: impl Into<String>) -> Self {
        Self {
            status_code: None,
            status_msg: status_msg.into(),
        }
    }

    /// Create an error from a non-2xx HTTP response.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let msg = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {body}")
        };
        Self {
            status_code: Some(i64::from(status)),
            status_msg: msg,
        }
    }

    /// Read the `base_resp` envelope of a response, if it declares a
    /// failure. A missing envelope or a zero status code yields `None`.
    #[must_use]
    pub fn from_envelope(json: &Value) -> Option<Self> {
        let base = json.get("base_resp")?;
        let code = base.get("status_code").and_then(Value::as_i64)?;
        if code == 0 {
            return None;
        }
        let msg = base
            .get("status_msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        Some(Self::new(code, msg))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_msg)?;
        if let Some(code) = self.status_code {
            write!(f, " (status {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_with_code() {
        let err = ApiError::new(1004, "invalid api key");
        assert_eq!(err.to_string(), "invalid api key (status 1004)");
    }

    #[test]
    fn display_without_code() {
        let err = ApiError::message("unknown error");
        assert_eq!(err.to_string(), "unknown error");
    }

    #[test]
    fn http_status_includes_body() {
        let err = ApiError::http_status(401, "unauthorized");
        assert_eq!(err.status_code, Some(401));
        assert!(err.status_msg.contains("HTTP 401"));
        assert!(err.status_msg.contains("unauthorized"));
    }

    #[test]
    fn http_status_empty_body() {
        let err = ApiError::http_status(500, "");
        assert_eq!(err.status_msg, "HTTP 500");
    }

    #[test]
    fn envelope_with_failure() {
        let json = json!({
            "base_resp": { "status_code": 1004, "status_msg": "invalid api key" }
        });
        let err = ApiError::from_envelope(&json).unwrap();
        assert_eq!(err.status_code, Some(1004));
        assert_eq!(err.status_msg, "invalid api key");
    }

    #[test]
    fn envelope_success_is_none() {
        let json = json!({
            "base_resp": { "status_code": 0, "status_msg": "success" }
        });
        assert!(ApiError::from_envelope(&json).is_none());
    }

    #[test]
    fn envelope_absent_is_none() {
        assert!(ApiError::from_envelope(&json!({ "choices": [] })).is_none());
    }

    #[test]
    fn envelope_missing_msg_falls_back() {
        let json = json!({ "base_resp": { "status_code": 2 } });
        let err = ApiError::from_envelope(&json).unwrap();
        assert_eq!(err.status_msg, "unknown error");
    }

    #[test]
    fn is_declared_only_for_api_errors() {
        let declared: Error = ApiError::message("nope").into();
        assert!(declared.is_declared());

        let local = Error::audio("bad hex");
        assert!(!local.is_declared());
    }

    #[test]
    fn from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
