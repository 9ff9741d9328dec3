//! Controller event model
//!
//! A [`ControllerEvent`] lives for exactly one request: it is parsed from the
//! POST body, reported, and dropped once the response is written.

use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RequestError;

/// Placeholder used for an absent `controller_id` or `action`
pub const UNKNOWN: &str = "unknown";

/// One controller input report
///
/// `controller_id` and `action` are echoed as given, whatever their JSON
/// type: gamepad clients send numeric ids, other tools send strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: Option<f64>,
    pub controller_id: Option<Value>,
    pub action: Option<Value>,
}

impl ControllerEvent {
    /// Parse a raw request body.
    ///
    /// The body must be UTF-8 JSON holding an object; keys other than
    /// `timestamp`, `controller_id` and `action` are ignored.
    pub fn from_body(body: &[u8]) -> Result<Self, RequestError> {
        let text = std::str::from_utf8(body)?;
        match serde_json::from_str::<Value>(text)? {
            object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
            other => Err(RequestError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn action(&self) -> String {
        display_field(self.action.as_ref())
    }

    pub fn controller_label(&self) -> String {
        display_field(self.controller_id.as_ref())
    }

    /// Convert the epoch-millisecond timestamp to local time.
    ///
    /// A missing timestamp means the epoch itself. Values chrono cannot
    /// represent are rejected.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn local_time(&self) -> Result<DateTime<Local>, RequestError> {
        let millis = self.timestamp.unwrap_or(0.0);
        let micros = (millis * 1000.0).round();
        if !micros.is_finite() || micros < i64::MIN as f64 || micros > i64::MAX as f64 {
            return Err(RequestError::InvalidTimestamp(millis));
        }

        DateTime::<Utc>::from_timestamp_micros(micros as i64)
            .map(|utc| utc.with_timezone(&Local))
            .ok_or(RequestError::InvalidTimestamp(millis))
    }

    /// Message echoed back to the client on success
    pub fn ack_message(&self) -> String {
        format!("Received {} command", self.action())
    }
}

/// Strings without quotes, anything else as compact JSON
fn display_field(value: Option<&Value>) -> String {
    match value {
        None => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
