use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::extractors::StrategyKind;

/// Browser identity sent with upstream requests. The watch page and the
/// timed-text endpoint answer bare clients with consent pages or empty bodies.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream caption acquisition settings
    pub youtube: YoutubeConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Language code preferred when choosing among caption tracks
    pub preferred_language: String,

    /// Key for the official captions API. Never written to logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Strategies tried in order until one yields captions
    pub strategies: Vec<StrategyKind>,

    /// Upper bound for each individual network call
    pub request_timeout_secs: u64,

    /// User-Agent header sent upstream
    pub user_agent: String,

    /// Accept-Language header sent upstream
    pub accept_language: String,

    /// Endpoints, overridable for mirrors and testing
    pub endpoints: EndpointConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub watch_url: String,
    pub timedtext_url: String,
    pub captions_api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            preferred_language: "ko".to_string(),
            api_key: None,
            strategies: StrategyKind::default_order(),
            request_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            watch_url: "https://www.youtube.com/watch".to_string(),
            timedtext_url: "https://www.youtube.com/api/timedtext".to_string(),
            captions_api_url: "https://www.googleapis.com/youtube/v3/captions".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl YoutubeConfig {
    /// Per-call network timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from an explicit path, the working directory, or
    /// the user config directory. Falls back to defaults when none exists.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location and return that path
    pub async fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("ytjamak.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("ytjamak").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let yt = &self.youtube;

        if yt.preferred_language.trim().is_empty() {
            anyhow::bail!("youtube.preferred_language must not be empty");
        }

        if yt.request_timeout_secs == 0 {
            anyhow::bail!("youtube.request_timeout_secs must be greater than zero");
        }

        if yt.strategies.is_empty() {
            anyhow::bail!("youtube.strategies must list at least one strategy");
        }

        for (name, value) in [
            ("watch_url", &yt.endpoints.watch_url),
            ("timedtext_url", &yt.endpoints.timedtext_url),
            ("captions_api_url", &yt.endpoints.captions_api_url),
        ] {
            Url::parse(value)
                .with_context(|| format!("youtube.endpoints.{} is not a valid URL", name))?;
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Preferred Language: {}", self.youtube.preferred_language);
        println!(
            "  Strategies: {}",
            self.youtube
                .strategies
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        println!(
            "  API Key: {}",
            if self.youtube.api_key.is_some() { "configured" } else { "not set" }
        );
        println!("  Request Timeout: {}s", self.youtube.request_timeout_secs);
        println!("  Server: {}", self.bind_address());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.youtube.preferred_language, "ko");
        assert_eq!(config.youtube.strategies, StrategyKind::default_order());
        assert_eq!(config.youtube.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.youtube.preferred_language = "en".to_string();
        config.youtube.strategies = vec![StrategyKind::Timedtext];
        config.server.port = 8080;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.youtube.preferred_language, "en");
        assert_eq!(loaded.youtube.strategies, vec![StrategyKind::Timedtext]);
        assert_eq!(loaded.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_api_key_is_not_serialized_when_absent() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(!yaml.contains("api_key"));
    }

    #[test]
    fn test_validate_rejects_empty_strategy_list() {
        let mut config = Config::default();
        config.youtube.strategies.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.youtube.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.youtube.endpoints.timedtext_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "youtube:\n  preferred_language: en\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.youtube.preferred_language, "en");
        assert_eq!(config.youtube.strategies, StrategyKind::default_order());
        assert_eq!(config.youtube.request_timeout_secs, 10);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_from_rejects_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(&path, "youtube: 42\nserver:\n  port: not-a-port\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
