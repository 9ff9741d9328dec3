// Application state module
// Configuration and collaborators shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::sink::EventSink;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Side effect for accepted events; `None` means report only
    pub sink: Option<Arc<dyn EventSink>>,
}

impl AppState {
    pub const fn new(config: Config) -> Self {
        Self { config, sink: None }
    }

    pub fn with_sink(config: Config, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            sink: Some(sink),
        }
    }
}
