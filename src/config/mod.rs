// Configuration module entry point
// Layers defaults, an optional config file, LIGHTSHOW_* environment variables
// and command-line overrides

mod state;
mod types;

use config::builder::{ConfigBuilder, DefaultState};
use config::ConfigError;
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StartupOverrides};

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "lightshow.toml";

impl Config {
    /// Load configuration from the given file (optional) plus environment,
    /// with command-line overrides taking precedence over both
    pub fn load_from(config_path: &str, overrides: &StartupOverrides) -> Result<Self, ConfigError> {
        let settings = Self::builder_with_defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("LIGHTSHOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .build()?;

        settings.try_deserialize().map(Self::normalized)
    }

    /// Built-in defaults only, no file or environment
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder_with_defaults()?
            .build()?
            .try_deserialize()
            .map(Self::normalized)
    }

    /// Request paths always start with `/`, so the endpoint must too
    fn normalized(mut self) -> Self {
        if !self.http.endpoint_path.starts_with('/') {
            self.http.endpoint_path.insert(0, '/');
        }
        self
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)? // 0 disables keep-alive
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.endpoint_path", "/light-control")?
            .set_default("http.max_body_size", 1_048_576) // 1MB
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// URL clients should post events to
    pub fn endpoint_url(&self) -> String {
        format!("http://localhost:{}{}", self.server.port, self.http.endpoint_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.workers, None);
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.logging.log_file, None);
        assert_eq!(cfg.performance.max_connections, None);
        assert_eq!(cfg.http.endpoint_path, "/light-control");
        assert_eq!(cfg.endpoint_url(), "http://localhost:8080/light-control");
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_missing_file_and_overrides() {
        let overrides = StartupOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(9090),
        };
        let cfg = Config::load_from("does-not-exist/lightshow.toml", &overrides).unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.endpoint_url(), "http://localhost:9090/light-control");
    }

    #[test]
    fn test_file_values_and_override_precedence() {
        let path = std::env::temp_dir().join(format!("lightshow-test-{}.toml", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "[server]\nport = 7000\nworkers = 2\n").unwrap();
            writeln!(file, "[logging]\naccess_log = true\naccess_log_format = \"json\"").unwrap();
        }

        let path_str = path.to_str().unwrap();
        let cfg = Config::load_from(path_str, &StartupOverrides::default()).unwrap();
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.server.workers, Some(2));
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "json");
        // untouched sections keep their defaults
        assert_eq!(cfg.performance.read_timeout, 30);

        let overrides = StartupOverrides {
            host: None,
            port: Some(7001),
        };
        let cfg = Config::load_from(path_str, &overrides).unwrap();
        assert_eq!(cfg.server.port, 7001);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_endpoint_path_gets_leading_slash() {
        let path = std::env::temp_dir().join(format!("lightshow-path-{}.toml", std::process::id()));
        std::fs::write(&path, "[http]\nendpoint_path = \"events\"\n").unwrap();

        let cfg = Config::load_from(path.to_str().unwrap(), &StartupOverrides::default()).unwrap();
        assert_eq!(cfg.http.endpoint_path, "/events");
        assert_eq!(cfg.endpoint_url(), "http://localhost:8080/events");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_host() {
        let mut cfg = Config::defaults().unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
