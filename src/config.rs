//! Advisory service configuration
//!
//! Credential, endpoint, and default model for the remote advisory API.
//! Values come from the process environment first, falling back to an
//! optional TOML file under the home directory. Credential validity is
//! checked when the client is built, not here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default chat-completions endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for advisory completions.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdvisorySettings {
    /// API credential; expected to start with "sk-".
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

impl AdvisorySettings {
    /// Load settings from the config file (if present), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path)?,
            _ => AdvisorySettings::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Read and parse a specific config file. No environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).context("Failed to read advisory config file")?;
        toml::from_str(&contents).context("Failed to parse advisory config file")
    }

    /// Build settings from the environment alone.
    pub fn from_env() -> Self {
        let mut settings = AdvisorySettings::default();
        settings.apply_env();
        settings
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("AQUAMON_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = std::env::var("AQUAMON_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("AQUAMON_MODEL") {
            self.model = Some(model);
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".aquamon").join("config.toml"))
    }

    /// Endpoint base URL, falling back to the default.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Default model tag, falling back to the crate default.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AdvisorySettings::default();
        assert_eq!(settings.base_url(), DEFAULT_BASE_URL);
        assert_eq!(settings.model(), DEFAULT_MODEL);
        assert!(settings.api_key.is_empty());
    }

    #[test]
    fn test_explicit_values_win_over_defaults() {
        let settings = AdvisorySettings {
            api_key: "sk-test".to_string(),
            base_url: Some("http://localhost:8080/v1".to_string()),
            model: Some("gpt-4o".to_string()),
        };
        assert_eq!(settings.base_url(), "http://localhost:8080/v1");
        assert_eq!(settings.model(), "gpt-4o");
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = AdvisorySettings {
            api_key: "sk-test".to_string(),
            base_url: None,
            model: Some("gpt-4o".to_string()),
        };
        let toml_string = toml::to_string(&settings).unwrap();
        let parsed: AdvisorySettings = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.api_key, "sk-test");
        assert_eq!(parsed.model(), "gpt-4o");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: AdvisorySettings = toml::from_str("api_key = \"sk-abc\"").unwrap();
        assert_eq!(parsed.api_key, "sk-abc");
        assert_eq!(parsed.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"sk-file\"\nmodel = \"gpt-4o\"\n").unwrap();

        let settings = AdvisorySettings::load_from(&path).unwrap();
        assert_eq!(settings.api_key, "sk-file");
        assert_eq!(settings.model(), "gpt-4o");
    }

    #[test]
    fn test_load_from_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [not toml").unwrap();

        assert!(AdvisorySettings::load_from(&path).is_err());
    }
}
