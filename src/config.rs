use crate::assignment::AssignmentPolicy;
use crate::calendar::ExamCalendarConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "https://mucollegdb.pockethost.io";
/// Large enough for every course to come back in one page.
pub const DEFAULT_PAGE_SIZE: u32 = 1080;
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
/// Longest exam window, in days, accepted from configuration or API requests.
pub const MAX_WINDOW_DAYS: i64 = 3660;

pub const ENV_BACKEND_URL: &str = "TIMETABLE_BACKEND_URL";
pub const ENV_BACKEND_TOKEN: &str = "TIMETABLE_BACKEND_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Static bearer token. No `Authorization` header is sent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Request timeout; the transport default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_window_days() -> i64 {
    DEFAULT_WINDOW_DAYS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL without a trailing slash.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub calendar: ExamCalendarConfig,
    #[serde(default)]
    pub policy: AssignmentPolicy,
    /// Length of the window offered before the user picks dates.
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,
    /// Send the exam window to the backend on every `generate`.
    #[serde(default)]
    pub persist_exam_window: bool,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            calendar: ExamCalendarConfig::default(),
            policy: AssignmentPolicy::default(),
            default_window_days: DEFAULT_WINDOW_DAYS,
            persist_exam_window: false,
        }
    }
}

impl TimetableConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: TimetableConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the optional file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `TIMETABLE_BACKEND_URL` and `TIMETABLE_BACKEND_TOKEN` looked up through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(token) = lookup(ENV_BACKEND_TOKEN) {
            let token = token.trim().to_string();
            self.backend.token = if token.is_empty() { None } else { Some(token) };
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.base_url must not be empty".into()));
        }
        if self.backend.page_size == 0 {
            return Err(ConfigError::Invalid("backend.page_size must be positive".into()));
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.default_window_days) {
            return Err(ConfigError::Invalid(format!(
                "default_window_days must be between 0 and {MAX_WINDOW_DAYS} (got {})",
                self.default_window_days
            )));
        }
        crate::calendar::ExamCalendar::from_config(&self.calendar)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }
}
