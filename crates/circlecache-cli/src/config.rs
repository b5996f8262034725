//! Driver configuration management.
//!
//! Remembers the last login identifier and login preferences between runs.
//! Stored at `~/.config/circlecache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use circlecache_core::auth::DEFAULT_COUNTRY_CODE;
use circlecache_core::LoginKind;

/// Application name used for the config directory path
pub const APP_NAME: &str = "circlecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_identifier: Option<String>,
    #[serde(default)]
    pub email_login: bool,
    pub country_code: Option<String>,
    pub refresh_interval_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Record the login used on this run so later runs repeat it
    pub fn remember(&mut self, identifier: &str, email_login: bool, interval_secs: Option<u64>) {
        self.last_identifier = Some(identifier.to_string());
        self.email_login = email_login;
        if interval_secs.is_some() {
            self.refresh_interval_secs = interval_secs;
        }
    }

    /// Login kind, with `force_email` overriding the stored preference
    pub fn login_kind(&self, force_email: bool) -> LoginKind {
        if force_email || self.email_login {
            LoginKind::Email
        } else {
            LoginKind::Phone {
                country_code: self
                    .country_code
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string()),
            }
        }
    }
}
