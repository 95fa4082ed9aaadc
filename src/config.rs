//! User configuration stored in ~/.registro/config.json.
//!
//! Every key is optional; a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::categories::loader::load_custom_categories;
use crate::categories::CategoryRegistry;
use crate::clock::SystemClock;
use crate::error::RegistroError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Days shown in the activity trend chart.
    #[serde(default = "default_trend_days")]
    pub trend_days: i64,
    /// Recent activities listed on the dashboard.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    /// Categories listed before the rest are collapsed into an overflow count.
    #[serde(default = "default_category_limit")]
    pub category_limit: usize,
    /// IANA zone that decides which calendar day "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// User-edited category list; the embedded defaults are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories_path: Option<PathBuf>,
}

/// Longest trend chart the dashboard draws.
pub const MAX_TREND_DAYS: i64 = 366;

fn default_trend_days() -> i64 {
    7
}

fn default_recent_limit() -> usize {
    5
}

fn default_category_limit() -> usize {
    6
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trend_days: default_trend_days(),
            recent_limit: default_recent_limit(),
            category_limit: default_category_limit(),
            timezone: default_timezone(),
            categories_path: None,
        }
    }
}

impl Config {
    pub fn tz(&self) -> Result<Tz, RegistroError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            RegistroError::ConfigurationError(format!("invalid timezone '{}': {}", self.timezone, e))
        })
    }

    pub fn clock(&self) -> Result<SystemClock, RegistroError> {
        Ok(SystemClock::new(self.tz()?))
    }

    /// Categories from `categories_path`, or the embedded defaults.
    pub fn category_registry(&self) -> Result<CategoryRegistry, RegistroError> {
        match &self.categories_path {
            Some(path) => Ok(CategoryRegistry::new(load_custom_categories(path)?)),
            None => CategoryRegistry::with_defaults(),
        }
    }

    fn validate(&self) -> Result<(), RegistroError> {
        if !(1..=MAX_TREND_DAYS).contains(&self.trend_days) {
            return Err(RegistroError::ConfigurationError(format!(
                "trendDays must be between 1 and {}, got {}",
                MAX_TREND_DAYS, self.trend_days
            )));
        }
        self.tz()?;
        Ok(())
    }
}

/// Get the canonical config file path (~/.registro/config.json)
pub fn config_path() -> Result<PathBuf, RegistroError> {
    let home = dirs::home_dir().ok_or_else(|| {
        RegistroError::ConfigurationError("Could not find home directory".to_string())
    })?;
    Ok(home.join(".registro").join("config.json"))
}

/// Load and validate a config file.
pub fn load_config_from(path: &Path) -> Result<Config, RegistroError> {
    if !path.exists() {
        return Err(RegistroError::ConfigNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)
        .map_err(|e| RegistroError::parse(path.display().to_string(), e))?;
    config.validate()?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load ~/.registro/config.json, falling back to defaults when it does not
/// exist. A file that exists but is broken is an error.
pub fn load_config() -> Result<Config, RegistroError> {
    let path = config_path()?;
    match load_config_from(&path) {
        Err(RegistroError::ConfigNotFound(_)) => {
            log::info!("No config at {}; using defaults", path.display());
            Ok(Config::default())
        }
        other => other,
    }
}
