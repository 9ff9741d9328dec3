//! Logger module
//!
//! Console output of the server:
//! - startup banner and shutdown notice
//! - one block per received controller event
//! - request errors, connection errors and warnings
//! - optional access log (off by default)

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::event::ControllerEvent;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info log
fn write_info(message: &str) {
    if let Some(w) = writer::get() {
        w.write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if let Some(w) = writer::get() {
        w.write_error(message);
    } else {
        eprintln!("{message}");
    }
}

/// Startup banner, one entry per console line
pub fn format_banner(config: &Config) -> Vec<String> {
    let mut lines = vec![
        "Light Show Test Server".to_string(),
        "======================".to_string(),
        format!("Listening on port {}", config.server.port),
        format!("Endpoint: {}", config.endpoint_url()),
    ];
    if let Some(workers) = config.server.workers {
        lines.push(format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.log_file {
        lines.push(format!("Event log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        lines.push(format!("Error log: {path}"));
    }
    lines.push(String::new());
    lines.push("Press Ctrl+C to stop the server".to_string());
    lines.push(String::new());
    lines.push("Waiting for controller inputs...".to_string());
    lines
}

pub fn log_server_start(config: &Config) {
    write_info(&format_banner(config).join("\n"));
}

pub fn log_shutdown() {
    write_info("\n\nShutting down server...");
}

/// `HH:MM:SS.mmm` in local time
pub fn format_clock(time: &DateTime<Local>) -> String {
    time.format("%H:%M:%S%.3f").to_string()
}

/// Console block for one accepted event
pub fn format_controller_event(event: &ControllerEvent, received_at: &DateTime<Local>) -> String {
    format!(
        "\n[{}] Controller Input Received:\n  Controller ID: {}\n  Action: {}",
        format_clock(received_at),
        event.controller_label(),
        event.action(),
    )
}

pub fn log_controller_event(event: &ControllerEvent, received_at: &DateTime<Local>) {
    write_info(&format_controller_event(event, received_at));
}

pub fn format_request_error(err: &impl std::fmt::Display) -> String {
    format!("Error processing request: {err}")
}

pub fn log_request_error(err: &impl std::fmt::Display) {
    write_error(&format_request_error(err));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use chrono::TimeZone;

    #[test]
    fn test_format_clock() {
        let time = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(format_clock(&time), "07:05:03.042");
    }

    #[test]
    fn test_format_controller_event() {
        let event = ControllerEvent::from_body(br#"{"controller_id":"ctrl-1","action":"flash_red"}"#)
            .unwrap();
        let time = Local.with_ymd_and_hms(2024, 3, 9, 23, 59, 1).unwrap();
        let block = format_controller_event(&event, &time);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "[23:59:01.000] Controller Input Received:",
                "  Controller ID: ctrl-1",
                "  Action: flash_red",
            ]
        );
    }

    #[test]
    fn test_format_banner() {
        let mut config = Config::defaults().unwrap();
        config.server.port = 9000;
        assert_eq!(
            format_banner(&config),
            vec![
                "Light Show Test Server",
                "======================",
                "Listening on port 9000",
                "Endpoint: http://localhost:9000/light-control",
                "",
                "Press Ctrl+C to stop the server",
                "",
                "Waiting for controller inputs...",
            ]
        );
    }

    #[test]
    fn test_format_banner_optional_lines() {
        let mut config = Config::defaults().unwrap();
        config.server.workers = Some(4);
        config.logging.log_file = Some("logs/events.log".to_string());
        let lines = format_banner(&config);
        assert_eq!(lines[4], "Worker threads: 4");
        assert_eq!(lines[5], "Event log: logs/events.log");
        assert_eq!(lines.last().unwrap(), "Waiting for controller inputs...");
    }

    #[test]
    fn test_format_request_error() {
        assert_eq!(
            format_request_error(&RequestError::MissingContentLength),
            "Error processing request: Missing Content-Length header"
        );
        let err = ControllerEvent::from_body(b"[1]").unwrap_err();
        assert_eq!(
            format_request_error(&err),
            "Error processing request: Expected a JSON object, got array"
        );
    }

    #[test]
    fn test_format_controller_event_defaults() {
        let event = ControllerEvent::default();
        let time = event.local_time().unwrap();
        let block = format_controller_event(&event, &time);
        assert!(block.contains("  Controller ID: unknown"));
        assert!(block.contains("  Action: unknown"));
    }
}
