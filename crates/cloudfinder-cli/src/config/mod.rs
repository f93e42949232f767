//! Configuration management.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cloudfinder::FetchConfig;

use crate::output::OutputFormat;

/// Data directory used when neither the flag nor the config sets one.
pub const DEFAULT_DATA_DIR: &str = "data";

/// CLI configuration. Every field is optional; flags take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the compiled blobs.
    pub data_dir: Option<PathBuf>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Log filter, e.g. `info` or `cloudfinder_sources=debug`.
    pub log_level: Option<String>,

    /// Per-request timeout for feed downloads.
    pub timeout_secs: Option<u64>,

    /// User-Agent sent with feed requests.
    pub user_agent: Option<String>,

    /// Location of the prefix-to-ASN table.
    pub asn_table_url: Option<String>,
}

impl Config {
    /// Get the default config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("tech", "escape", "cloudfinder")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Set a value from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = Some(PathBuf::from(value)),
            "output_format" | "output" => self.output_format = Some(value.parse()?),
            "log_level" => self.log_level = Some(value.to_string()),
            "timeout_secs" | "timeout" => {
                self.timeout_secs = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid timeout: {value}"))?,
                );
            }
            "user_agent" => self.user_agent = Some(value.to_string()),
            "asn_table_url" => self.asn_table_url = Some(value.to_string()),
            _ => anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 data_dir       - Directory holding ipv4.bin, ipv6.bin and hash.txt\n  \
                 output_format  - Default output format (pretty/json/raw)\n  \
                 log_level      - Log filter (error/warn/info/debug/trace)\n  \
                 timeout_secs   - Feed request timeout in seconds\n  \
                 user_agent     - User-Agent for feed requests\n  \
                 asn_table_url  - Prefix-to-ASN table location",
                key
            ),
        }
        Ok(())
    }

    /// Data directory, falling back to `./data`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Fetch settings with configured overrides applied.
    pub fn fetch_config(&self) -> FetchConfig {
        let mut fetch = FetchConfig::default();
        if let Some(secs) = self.timeout_secs {
            fetch.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = &self.user_agent {
            fetch.user_agent.clone_from(agent);
        }
        if let Some(url) = &self.asn_table_url {
            fetch.asn_table_url.clone_from(url);
        }
        fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.data_dir(), PathBuf::from("data"));
    }

    #[test]
    fn test_set_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("data_dir", "/var/lib/cloudfinder").unwrap();
        config.set("output", "json").unwrap();
        config.set("timeout_secs", "10").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.output_format, Some(OutputFormat::Json));
        assert_eq!(loaded.fetch_config().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("api_key", "x").is_err());
        assert!(config.set("timeout_secs", "soon").is_err());
        assert!(config.set("output_format", "yaml").is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_fetch_overrides() {
        let config = Config {
            user_agent: Some("probe/1.0".into()),
            asn_table_url: Some("http://localhost/table.txt".into()),
            ..Config::default()
        };
        let fetch = config.fetch_config();
        assert_eq!(fetch.user_agent, "probe/1.0");
        assert_eq!(fetch.asn_table_url, "http://localhost/table.txt");
        assert_eq!(fetch.timeout, Duration::from_secs(45));
    }
}
