//! Error types for futon
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every error propagates to the caller unmodified: futon performs no
//! implicit retries or fallbacks. Retry/backoff policy belongs to the
//! transport or the application, never to this library.

use serde_json::Value;
use std::io;
use thiserror::Error;

/// Result type alias for futon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for view queries and pagination
#[derive(Debug, Error)]
pub enum Error {
    /// Required query field missing at render time (caller bug, never retried)
    #[error("query configuration error: {0}")]
    Configuration(String),

    /// A result row carried an `error` field
    ///
    /// The key identifies the offending row. Rows whose error is
    /// `"not_found"` can be suppressed via the query's ignore flag.
    #[error("view row error '{message}' for key {key}")]
    Row {
        /// Key of the offending row
        key: Value,
        /// Error text reported by the server
        message: String,
    },

    /// Unexpected HTTP status from the server
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Malformed response payload or transport-level failure
    #[error("document access error: {0}")]
    DocumentAccess(String),

    /// Malformed key JSON or corrupt pagination token
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// An accessor was called in a state where its value does not exist
    /// (e.g. `next_link()` on a page without a next page)
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// I/O error while reading the response body
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display_configuration() {
        let err = Error::Configuration("view name not set".to_string());
        let msg = err.to_string();
        assert!(msg.contains("configuration error"));
        assert!(msg.contains("view name not set"));
    }

    #[test]
    fn test_error_display_row() {
        let err = Error::Row {
            key: json!(["dept", 3]),
            message: "not_found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("not_found"));
        assert!(msg.contains("[\"dept\",3]"));
    }

    #[test]
    fn test_error_display_status() {
        let err = Error::Status {
            status: 404,
            body: "{\"error\":\"not_found\"}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("not_found"));
    }

    #[test]
    fn test_error_display_invalid_format() {
        let err = Error::InvalidFormat("token is not base64".to_string());
        assert!(err.to_string().contains("token is not base64"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "body truncated");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(7)
        }
        assert_eq!(returns_result().unwrap(), 7);
    }
}
