//! Construction-time options for a `Tracker`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between refresh passes, in seconds
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

#[derive(Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Phone number or email used to log in
    pub identifier: String,
    pub secret: String,
    /// Whether `Tracker::start` launches the background refresh loop
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_auto_refresh() -> bool {
    true
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

impl TrackerConfig {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            auto_refresh: true,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }

    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    /// Zero is bumped to one second so the loop never spins.
    pub fn with_refresh_interval_secs(mut self, secs: u64) -> Self {
        self.refresh_interval_secs = secs.max(1);
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

// Keeps the secret out of logs
impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .field("auto_refresh", &self.auto_refresh)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish()
    }
}
