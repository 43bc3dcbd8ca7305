use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shaker_core::constants::DEFAULT_SERVER_URL;
use shaker_core::CoreConfig;

const CONFIG_DIR_NAME: &str = "agent-shaker";
const CONFIG_FILE_NAME: &str = "cli.json";

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Server root or API base, e.g. `http://localhost:8080`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Delay before the push channel reconnects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,

    /// Pretty-print JSON output (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// `<config_dir>/agent-shaker/cli.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Explicit path must exist; the default location is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Builds the core config. `url_override` is the `--url` flag, already
    /// merged with `AGENT_SHAKER_URL` by clap, and wins over the file.
    pub fn core_config(&self, url_override: Option<&str>) -> CoreConfig {
        let url = url_override
            .filter(|u| !u.trim().is_empty())
            .or(self.server_url.as_deref())
            .unwrap_or(DEFAULT_SERVER_URL);

        let config = CoreConfig::new(url);
        match self.reconnect_delay_ms {
            Some(ms) => config.with_reconnect_delay(Duration::from_millis(ms)),
            None => config,
        }
    }

    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_full() {
        let json = r#"{"serverUrl": "https://shaker.example.com/api", "reconnectDelayMs": 500, "pretty": false}"#;
        let config: CliConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.server_url.as_deref(), Some("https://shaker.example.com/api"));
        assert!(!config.pretty());

        let core = config.core_config(None);
        assert_eq!(core.api_base_url(), "https://shaker.example.com/api");
        assert_eq!(core.reconnect_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_config_minimal() {
        let config: CliConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert!(config.pretty());
        assert_eq!(config.core_config(None).server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_flag_wins_over_file() {
        let config = CliConfig {
            server_url: Some("http://file-host:9000".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.core_config(Some("http://flag-host:7000")).server_url,
            "http://flag-host:7000"
        );
        assert_eq!(config.core_config(Some("  ")).server_url, "http://file-host:9000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.json");
        std::fs::write(&path, r#"{"serverUrl": "http://127.0.0.1:3000"}"#).unwrap();

        let config = CliConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.server_url.as_deref(), Some("http://127.0.0.1:3000"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load_or_default(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = CliConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
