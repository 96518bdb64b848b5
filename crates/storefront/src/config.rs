//! Run configuration.
//!
//! Layered as defaults, then an optional YAML file, then environment
//! overrides. The CLI applies its flags on top of the result.

use crate::driver::DriverConfig;
use crate::logging::LogLevel;
use crate::result::{StoreError, StoreResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// The public demo storefront
pub const DEFAULT_STORE_URL: &str = "https://automation-interview.vercel.app/";

/// Environment variable overriding [`StoreConfig::base_url`]
pub const ENV_STORE_URL: &str = "STOREFRONT_URL";
/// Environment variable overriding [`StoreConfig::log_level`]
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable overriding [`DriverConfig::chromium_path`]
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";
/// Environment variable that, when truthy, shows the browser window
pub const ENV_HEADED: &str = "STOREFRONT_HEADED";

/// Everything a scenario run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Page opened by `open`
    pub base_url: String,
    /// Auto-wait for elements and settle waits after clicks
    pub wait: WaitOptions,
    /// Minimum log level
    pub log_level: LogLevel,
    /// Browser launch settings
    pub driver: DriverConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORE_URL.to_string(),
            wait: WaitOptions::default(),
            log_level: LogLevel::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storefront URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the wait budget
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Shorthand for the wait timeout only
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.wait = self.wait.with_timeout(ms);
        self
    }

    /// Set the log level
    #[must_use]
    pub const fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the driver settings
    #[must_use]
    pub fn with_driver(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }

    /// Parse YAML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Yaml` on malformed input.
    pub fn from_yaml_str(yaml: &str) -> StoreResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Yaml` if it does not parse.
    pub fn from_yaml_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize as YAML
    ///
    /// # Errors
    ///
    /// Returns `Yaml` if serialization fails.
    pub fn to_yaml(&self) -> StoreResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable holds an unusable value.
    pub fn apply_env(self) -> StoreResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable holds an unusable value.
    pub fn apply_env_from<F>(mut self, lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = level.parse()?;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH).filter(|v| !v.trim().is_empty()) {
            self.driver.chromium_path = Some(path);
        }
        if let Some(headed) = lookup(ENV_HEADED) {
            self.driver.headless = !parse_flag(ENV_HEADED, &headed)?;
        }
        Ok(self)
    }

    /// Defaults, then `path` if given, then the environment, without
    /// validation. Callers layering more overrides validate afterwards.
    ///
    /// # Errors
    ///
    /// Propagates file, YAML and environment errors.
    pub fn layered(path: Option<&Path>) -> StoreResult<Self> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    /// [`layered`](Self::layered), then [`validated`](Self::validated)
    ///
    /// # Errors
    ///
    /// Propagates file, YAML and environment errors, and rejects unusable values.
    pub fn load(path: Option<&Path>) -> StoreResult<Self> {
        Self::layered(path)?.validated()
    }

    /// Reject values no run could use
    ///
    /// # Errors
    ///
    /// Returns `Config` for an empty URL or zero timeout.
    pub fn validated(self) -> StoreResult<Self> {
        if self.base_url.trim().is_empty() {
            return Err(StoreError::Config {
                message: "base_url must not be empty".to_string(),
            });
        }
        if self.wait.timeout_ms == 0 {
            return Err(StoreError::Config {
                message: "wait.timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(self)
    }
}

fn parse_flag(name: &str, value: &str) -> StoreResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(StoreError::Config {
            message: format!("{name}: expected a boolean, got {other:?}"),
        }),
    }
}
