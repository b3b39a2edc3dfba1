use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::calculations::business_days::DEFAULT_MAX_SCAN_DAYS;

pub const CONFIG_PATH_ENV: &str = "DEADLINE_TOOL_CONFIG";
pub const HTTP_ADDR_ENV: &str = "DEADLINE_TOOL_HTTP_ADDR";
pub const MAX_SCAN_DAYS_ENV: &str = "DEADLINE_TOOL_MAX_SCAN_DAYS";
pub const REMINDER_OFFSETS_ENV: &str = "DEADLINE_TOOL_REMINDER_OFFSETS";

const MIN_SCAN_DAYS: u32 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    /// Calendar days before the due date, used when a deadline names no offsets of its own.
    pub default_reminders: Vec<i64>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            default_reminders: vec![10, 3, 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocketConfig {
    pub notifications: NotificationSettings,
    pub max_scan_days: u32,
    pub http_addr: String,
}

impl Default for DocketConfig {
    fn default() -> Self {
        Self {
            notifications: NotificationSettings::default(),
            max_scan_days: DEFAULT_MAX_SCAN_DAYS,
            http_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl DocketConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: DocketConfig = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `DEADLINE_TOOL_CONFIG` when set, then applies the individual
    /// `DEADLINE_TOOL_*` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(HTTP_ADDR_ENV) {
            self.http_addr = addr;
        }
        if let Some(raw) = lookup(MAX_SCAN_DAYS_ENV) {
            self.max_scan_days = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{MAX_SCAN_DAYS_ENV} must be an integer (got '{raw}')"
                ))
            })?;
        }
        if let Some(raw) = lookup(REMINDER_OFFSETS_ENV) {
            self.notifications.default_reminders = parse_offsets(&raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_scan_days < MIN_SCAN_DAYS {
            return Err(ConfigError::Invalid(format!(
                "max_scan_days must be at least {MIN_SCAN_DAYS} (got {})",
                self.max_scan_days
            )));
        }
        if let Some(negative) = self
            .notifications
            .default_reminders
            .iter()
            .find(|offset| **offset < 0)
        {
            return Err(ConfigError::Invalid(format!(
                "default reminder offsets must be non-negative (got {negative})"
            )));
        }
        Ok(())
    }

    pub fn http_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse().map_err(|_| {
            ConfigError::Invalid(format!("http_addr '{}' is not a socket address", self.http_addr))
        })
    }
}

fn parse_offsets(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                ConfigError::Invalid(format!("reminder offset '{part}' is not an integer"))
            })
        })
        .collect()
}
