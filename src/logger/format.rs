//! Access log lines
//!
//! Formats:
//! - `common`: `client - - [time] "request line" status bytes`
//! - `combined`: `common` followed by `"user agent" seconds`
//! - `json`: the entry serialized as one JSON object
//!
//! Any other name is treated as `combined`.

use chrono::{DateTime, Local};
use hyper::header::USER_AGENT;
use hyper::Request;
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;

/// What the access log records about one exchange
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub client: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub received: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Without the leading `?`
    pub query: Option<String>,
    /// `1.0`, `1.1`, `2`
    pub version: String,
    pub user_agent: Option<String>,
    pub status: u16,
    pub body_bytes: usize,
    pub elapsed_us: u64,
}

impl AccessLogEntry {
    /// Capture the request side, stamped with the current local time
    pub fn start<B>(req: &Request<B>, peer_addr: SocketAddr) -> Self {
        Self {
            client: peer_addr.ip().to_string(),
            received: Local::now(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            version: format!("{:?}", req.version())
                .trim_start_matches("HTTP/")
                .to_string(),
            user_agent: req
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            status: 0,
            body_bytes: 0,
            elapsed_us: 0,
        }
    }

    /// Fill in the response side
    pub fn complete(&mut self, status: u16, body_bytes: usize, elapsed: Duration) {
        self.status = status;
        self.body_bytes = body_bytes;
        self.elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    pub fn format(&self, format: &str) -> String {
        match format {
            "common" => self.common_line(),
            "json" => self.json_line(),
            _ => self.combined_line(),
        }
    }

    fn common_line(&self) -> String {
        let query = self
            .query
            .as_deref()
            .map_or_else(String::new, |q| format!("?{q}"));
        format!(
            "{} - - [{}] \"{} {}{query} HTTP/{}\" {} {}",
            self.client,
            self.received.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.version,
            self.status,
            self.body_bytes,
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn combined_line(&self) -> String {
        let seconds = self.elapsed_us as f64 / 1_000_000.0;
        format!(
            "{} \"{}\" {seconds:.3}",
            self.common_line(),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error":"{e}"}}"#))
    }
}

fn serialize_rfc3339<S>(time: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&time.to_rfc3339())
}
