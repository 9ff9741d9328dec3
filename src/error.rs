//! Request error module
//!
//! Every failure while reading or interpreting a `/light-control` body lands
//! in [`RequestError`]. The variants only differ in the message they carry:
//! each one is answered with the same 400 response.

use thiserror::Error;

/// A malformed or unprocessable request body
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Missing Content-Length header")]
    MissingContentLength,

    #[error("Invalid Content-Length value: '{0}'")]
    InvalidContentLength(String),

    #[error("Request body too large: {size} bytes (max: {max})")]
    BodyTooLarge { size: u64, max: u64 },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Request body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_not_empty() {
        let errors = [
            RequestError::MissingContentLength,
            RequestError::InvalidContentLength("abc".to_string()),
            RequestError::BodyTooLarge { size: 10, max: 5 },
            RequestError::NotAnObject("array"),
            RequestError::InvalidTimestamp(f64::INFINITY),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_json_error_keeps_decoder_message() {
        let json_err = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let expected = json_err.to_string();
        let err = RequestError::from(json_err);
        assert_eq!(err.to_string(), expected);
    }
}
