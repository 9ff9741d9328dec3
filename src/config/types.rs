// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Per-request access log lines (off unless enabled)
    pub access_log: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
    /// Info/event log file path (stdout if not set)
    #[serde(default)]
    pub log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds an idle keep-alive connection stays open (0 disables keep-alive)
    pub keep_alive_timeout: u64,
    /// Seconds a new connection may take to send its first request
    pub read_timeout: u64,
    /// Together with `read_timeout`, bounds the time spent on one request
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Path accepting controller events
    pub endpoint_path: String,
    pub max_body_size: u64,
}

/// Values given on the command line, applied above every other source
#[derive(Debug, Default, Clone)]
pub struct StartupOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}
