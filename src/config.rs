//! User configuration
//!
//! Read once at startup from `<config dir>/sfg-studio/config.json`. Every
//! field is optional; environment variables override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::solver::{DEFAULT_TIMEOUT_SECS, DEFAULT_URL};

/// Environment variable overriding the solver base URL
pub const ENV_SOLVER_URL: &str = "SFG_SOLVER_URL";

/// Environment variable overriding the request timeout in seconds
pub const ENV_REQUEST_TIMEOUT: &str = "SFG_REQUEST_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the analysis service
    pub solver_url: String,
    pub request_timeout_secs: u64,
    /// Draw the dotted background grid
    pub canvas_grid: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            solver_url: DEFAULT_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            canvas_grid: true,
        }
    }
}

impl AppConfig {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sfg-studio").join("config.json"))
    }

    /// Reads a config file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Applies overrides from any variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SOLVER_URL).filter(|u| !u.trim().is_empty()) {
            self.solver_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!("Ignoring {}={:?}", ENV_REQUEST_TIMEOUT, raw),
            }
        }
    }

    /// File at the default path, then environment overrides.
    /// A broken file is reported and replaced by defaults.
    pub fn load() -> Self {
        let mut config = match Self::default_path() {
            Some(path) => Self::from_file(&path).unwrap_or_else(|e| {
                warn!("{:#}, using default configuration", e);
                Self::default()
            }),
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        info!("Solver at {}", config.solver_url);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sfg-studio-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_file("partial.json", r#"{ "solver_url": "http://solver:8080" }"#);
        let config = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.solver_url, "http://solver:8080");
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.canvas_grid);
    }

    #[test]
    fn test_missing_file_is_default_and_broken_file_errors() {
        let missing = std::env::temp_dir().join("sfg-studio-does-not-exist.json");
        assert_eq!(AppConfig::from_file(&missing).unwrap(), AppConfig::default());

        let path = temp_file("broken.json", "{ not json");
        assert!(AppConfig::from_file(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> =
            [(ENV_SOLVER_URL, " http://10.0.0.2:5000 "), (ENV_REQUEST_TIMEOUT, "0")]
                .into_iter()
                .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.solver_url, "http://10.0.0.2:5000");
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
