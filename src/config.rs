use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;
use crate::data::source::RemoteSource;

/// Environment variable that overrides `anthropic.api_key`.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Anthropic Messages API settings shared by the column advisor and the narrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// Token budget for the column classification probe
    pub classify_max_tokens: u32,
    /// Token budget for the two-language narrative
    pub narrative_max_tokens: u32,
    pub classify_timeout_secs: u64,
    pub narrate_timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-3-5-sonnet-20240620".to_string(),
            classify_max_tokens: 150,
            narrative_max_tokens: 8192,
            classify_timeout_secs: 8,
            narrate_timeout_secs: 180,
        }
    }
}

impl AnthropicConfig {
    /// The key, if set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn narrate_timeout(&self) -> Duration {
        Duration::from_secs(self.narrate_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 15 }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Main configuration for tide-tales
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Place the narrative is written for
    pub location: String,
    pub anthropic: AnthropicConfig,
    pub loader: LoadOptions,
    pub fetch: FetchConfig,
    /// Remote datasets offered in the sidebar
    pub sources: Vec<RemoteSource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: "Bhubaneswar, India".to_string(),
            anthropic: AnthropicConfig::default(),
            loader: LoadOptions::default(),
            fetch: FetchConfig::default(),
            sources: vec![RemoteSource {
                name: "NASA GISTEMP global means".to_string(),
                url: "https://data.giss.nasa.gov/gistemp/tabledata_v4/GLB.Ts+dSST.csv".to_string(),
            }],
        }
    }
}

impl AppConfig {
    /// Load config from the default location (~/.tide-tales/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // Return default config if file doesn't exist
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config file path (~/.tide-tales/config.toml)
    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        Ok(PathBuf::from(home).join(".tide-tales").join("config.toml"))
    }

    /// A non-blank key from the environment wins over the file.
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.anthropic.api_key = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.loader.missing_tokens[0], "***");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "location = \"Lisbon, Portugal\"\n\n[anthropic]\nclassify_timeout_secs = 3\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.location, "Lisbon, Portugal");
        assert_eq!(config.anthropic.classify_timeout(), Duration::from_secs(3));
        assert_eq!(config.anthropic.model, AnthropicConfig::default().model);
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn env_key_overrides_and_blank_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(Some("   ".into()));
        assert_eq!(config.anthropic.credential(), None);
        config.apply_env(Some("sk-test".into()));
        assert_eq!(config.anthropic.credential(), Some("sk-test"));
    }
}
