//! Client configuration.

use std::{path::PathBuf, time::Duration};

use crate::transport::{MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL, ReconnectPolicy};

/// Chat server base URL, fixed at build time through `HIROBA_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = match option_env!("HIROBA_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:8080",
};

/// Number of transcript lines shown at once
pub const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Where the session entry is kept across restarts; in memory if `None`
    pub session_file: Option<PathBuf>,
    pub viewport_height: usize,
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_file: None,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_reconnect(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.reconnect = ReconnectPolicy {
            max_attempts,
            interval,
        };
        self
    }
}
