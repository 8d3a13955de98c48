//! Suite configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub const API_URL_ENV: &str = "SERVEREST_API_URL";
pub const FRONT_URL_ENV: &str = "SERVEREST_FRONT_URL";

/// Suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base URL of the REST API
    pub api_url: String,

    /// Base URL of the login UI
    pub front_url: String,

    /// Browser viewport
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Timeout for a single browser command (ms)
    pub command_timeout_ms: u64,

    /// Timeout for a page navigation (ms)
    pub page_load_timeout_ms: u64,

    /// Timeout for a single HTTP request (ms)
    pub request_timeout_ms: u64,

    /// Capture a screenshot when a browser script fails
    pub screenshot_on_failure: bool,

    /// Path to the `users.json` fixture
    pub fixture_path: PathBuf,

    /// Directory for results and screenshots
    pub output_dir: PathBuf,
}

/// Values passed explicitly on the command line; `None` keeps the config value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub front_url: Option<String>,
    pub fixture_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            api_url: "https://serverest.dev".to_string(),
            front_url: "https://front.serverest.dev".to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            command_timeout_ms: 30_000,
            page_load_timeout_ms: 60_000,
            request_timeout_ms: 30_000,
            screenshot_on_failure: true,
            fixture_path: PathBuf::from("fixtures/users.json"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl SuiteConfig {
    /// Parse a config from TOML; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading suite config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Apply `SERVEREST_API_URL` / `SERVEREST_FRONT_URL` from the process env
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = lookup(FRONT_URL_ENV).filter(|v| !v.is_empty()) {
            self.front_url = url;
        }
        self
    }

    /// Apply the flags that were actually passed, then re-validate
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Result<Self> {
        if let Some(url) = overrides.api_url {
            self.api_url = url;
        }
        if let Some(url) = overrides.front_url {
            self.front_url = url;
        }
        if let Some(path) = overrides.fixture_path {
            self.fixture_path = path;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, url) in [("api_url", &self.api_url), ("front_url", &self.front_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be an http(s) URL, got '{}'",
                    key, url
                )));
            }
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::InvalidConfig("viewport must be non-empty".to_string()));
        }
        Ok(())
    }
}
