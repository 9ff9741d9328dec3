//! Command-line startup parameters

use clap::Parser;

use crate::config::{StartupOverrides, DEFAULT_CONFIG_PATH};

/// Echo server for controller light-show events
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Port to listen on (default 8080)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface to bind (default 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Configuration file; missing files are ignored
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

impl Cli {
    pub fn overrides(&self) -> StartupOverrides {
        StartupOverrides {
            host: self.host.clone(),
            port: self.port,
        }
    }
}
