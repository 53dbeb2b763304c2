use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub backup: bool,
    pub backup_suffix: String,
    pub ignore_patterns: Vec<String>,
    pub retry: RetryConfig,
    pub ready: ReadyConfig,
    pub converter: ConverterConfig,
    pub strip: StripConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadyConfig {
    /// Number of readiness checks, one per poll interval.
    pub timeout_secs: u32,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Office engine executable. Legacy conversion is disabled when unset.
    pub program: Option<String>,
    /// Arguments placed before `--convert-to <ext> --outdir <dir> <file>`.
    pub args: Vec<String>,
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StripConfig {
    pub require_content_types: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            poll_interval_ms: 1000,
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: vec!["--headless".to_string(), "--norestore".to_string()],
            settle_ms: 1000,
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            require_content_types: true,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl ReadyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AppConfig {
    pub fn backup_suffix(&self) -> &str {
        if self.backup_suffix.is_empty() {
            ".bak"
        } else {
            &self.backup_suffix
        }
    }
}

/// Defaults, then `Config.toml` (if present), then `CLEANMETA__*` env vars.
pub fn load_configuration() -> Result<AppConfig, Error> {
    load_configuration_from("Config")
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(
            Environment::with_prefix("CLEANMETA")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_baseline_behavior() {
        let config = AppConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay(), Duration::from_secs(1));
        assert_eq!(config.ready.timeout_secs, 15);
        assert_eq!(config.ready.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.backup_suffix(), ".bak");
        assert!(config.strip.require_content_types);
        assert!(config.converter.program.is_none());
        assert!(!config.log.enabled);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("cleanmeta.toml");
        fs::write(
            &file,
            "backup = true\n[retry]\nmax_attempts = 5\n[converter]\nprogram = \"soffice\"\n",
        )
        .unwrap();

        let name = file.with_extension("");
        let config = load_configuration_from(name.to_str().unwrap()).unwrap();
        assert!(config.backup);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.converter.program.as_deref(), Some("soffice"));
        assert_eq!(config.converter.settle_ms, 1000);
        assert_eq!(config.ready.timeout_secs, 15);
    }
}
