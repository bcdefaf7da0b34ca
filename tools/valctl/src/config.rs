//! valctl configuration
//!
//! Read from an optional config file (yaml/toml/json) or, without one, from
//! built-in defaults. `VAL_` environment variables override either source
//! (`VAL_CONFIRMATION_TIMEOUT_MS=800`, `VAL_LOG__LEVEL=debug`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use common::{LogConfig, LogFormat, ENV_PREFIX};
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Logging section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LogSettings {
    /// `--verbose` raises the console level to debug
    pub fn to_log_config(&self, verbose: bool, ansi: bool) -> LogConfig {
        LogConfig {
            level: if verbose {
                "debug".to_string()
            } else {
                self.level.clone()
            },
            format: self.format,
            ansi,
            file: self.file.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValConfig {
    /// Budget for each confirmed write batch
    pub confirmation_timeout_ms: u64,
    pub log: LogSettings,
    /// Vehicle profile the simulated bus is built from
    pub profile: PathBuf,
    /// Empty grants every permission
    pub granted_permissions: Vec<String>,
}

impl Default for ValConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_ms: 5000,
            log: LogSettings::default(),
            profile: PathBuf::from("profiles/cabin.yaml"),
            granted_permissions: Vec::new(),
        }
    }
}

impl ValConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(path) => common::load_config_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Figment::from(Serialized::defaults(Self::default()))
                .merge(Env::prefixed(ENV_PREFIX).split("__"))
                .extract()
                .context("Failed to apply environment overrides")?,
        };
        config.validate()?;
        debug!(?config, "Loaded valctl config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.confirmation_timeout_ms == 0 {
            bail!("confirmation_timeout_ms must be greater than zero");
        }
        if self.granted_permissions.iter().any(|p| p.trim().is_empty()) {
            bail!("granted_permissions contains an empty entry");
        }
        Ok(())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        let config = ValConfig::load(None).unwrap();
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(5));
        assert_eq!(config.log.level, "warn");
        assert!(config.granted_permissions.is_empty());
    }

    #[test]
    #[serial]
    fn test_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "valctl.yaml",
            "confirmation_timeout_ms: 750\nlog:\n  level: info\n  format: json\nprofile: /tmp/suv.yaml\n",
        );

        let config = ValConfig::load(Some(&path)).unwrap();
        assert_eq!(config.confirmation_timeout_ms, 750);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.file, None);
        assert_eq!(config.profile, PathBuf::from("/tmp/suv.yaml"));
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        std::env::set_var("VAL_CONFIRMATION_TIMEOUT_MS", "300");
        std::env::set_var("VAL_LOG__LEVEL", "trace");
        let config = ValConfig::load(None);
        std::env::remove_var("VAL_CONFIRMATION_TIMEOUT_MS");
        std::env::remove_var("VAL_LOG__LEVEL");

        let config = config.unwrap();
        assert_eq!(config.confirmation_timeout_ms, 300);
        assert_eq!(config.log.level, "trace");
    }

    #[test]
    #[serial]
    fn test_zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "valctl.json", r#"{"confirmation_timeout_ms": 0}"#);
        assert!(ValConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_verbose_raises_level() {
        let settings = LogSettings::default();
        assert_eq!(settings.to_log_config(true, false).level, "debug");
        assert_eq!(settings.to_log_config(false, false).level, "warn");
    }
}
