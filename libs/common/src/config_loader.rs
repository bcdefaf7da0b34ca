//! Configuration loading helper functions
//! Provides utilities for loading configuration with fallback logic

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Prefix for environment overrides (`VAL_LOG__LEVEL=debug` sets `log.level`)
pub const ENV_PREFIX: &str = "VAL_";

/// Load configuration from a specific file, merged with `VAL_` environment overrides
///
/// The provider is chosen by extension: `.yaml`/`.yml`, `.toml` or `.json`.
/// Nested keys are addressed with a double underscore.
pub fn load_config_from_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    file_figment(path.as_ref())?
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration from file: {}", e)))
}

/// Load a data file (no environment overrides)
pub fn load_config_file_only<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    file_figment(path.as_ref())?
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load {}: {}", path.as_ref().display(), e)))
}

fn file_figment(path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    match extension {
        "toml" => Ok(Figment::new().merge(Toml::file(path))),
        "yaml" | "yml" => Ok(Figment::new().merge(Yaml::file(path))),
        "json" => Ok(Figment::new().merge(Json::file(path))),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

/// Get configuration value with priority: explicit value > ENV > Default
///
/// # Arguments
/// * `value` - Value given explicitly (command line or config file)
/// * `env_var` - Environment variable name to check
/// * `default` - Default value to use as fallback
pub fn get_config_value<T>(value: Option<T>, env_var: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    // Priority 1: explicit value
    if let Some(val) = value {
        info!("Using {} from arguments", env_var);
        return val;
    }

    // Priority 2: Environment variable
    if let Ok(env_str) = std::env::var(env_var) {
        match env_str.parse::<T>() {
            Ok(val) => {
                info!("Using {} from environment: {}", env_var, env_str);
                return val;
            },
            Err(e) => {
                warn!("Failed to parse {} from environment: {}", env_var, e);
            },
        }
    }

    // Priority 3: Default value
    info!("Using default value for {}", env_var);
    default
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::io::Write;
    use tracing_test::traced_test;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        nested: Nested,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Nested {
        #[serde(default)]
        timeout_ms: u64,
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write_file(&dir, "a.yaml", "name: cabin\nnested:\n  timeout_ms: 250\n");
        let json = write_file(&dir, "b.json", r#"{"name": "cabin"}"#);

        let from_yaml: Sample = load_config_from_file(&yaml).unwrap();
        assert_eq!(from_yaml.name, "cabin");
        assert_eq!(from_yaml.nested.timeout_ms, 250);

        let from_json: Sample = load_config_from_file(&json).unwrap();
        assert_eq!(from_json.nested, Nested::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_nested_key() {
        let dir = tempfile::tempdir().unwrap();
        let toml = write_file(&dir, "c.toml", "name = \"cabin\"\n[nested]\ntimeout_ms = 10\n");

        std::env::set_var("VAL_NESTED__TIMEOUT_MS", "900");
        let loaded: Result<Sample> = load_config_from_file(&toml);
        std::env::remove_var("VAL_NESTED__TIMEOUT_MS");

        assert_eq!(loaded.unwrap().nested.timeout_ms, 900);
    }

    #[test]
    fn test_rejects_unknown_extension_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_file(&dir, "d.ini", "name=cabin");
        assert!(matches!(
            load_config_from_file::<Sample, _>(&ini),
            Err(Error::UnsupportedFormat(ext)) if ext == "ini"
        ));
        assert!(matches!(
            load_config_from_file::<Sample, _>(dir.path().join("missing.yaml")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            load_config_from_file::<Sample, _>(dir.path().join("noext")),
            Err(Error::UnsupportedFormat(_))
        ));

        let broken = write_file(&dir, "e.yaml", "name: [unclosed\n");
        assert!(matches!(
            load_config_from_file::<Sample, _>(&broken),
            Err(Error::Config(_))
        ));
    }

    #[test]
    #[serial]
    #[traced_test]
    fn test_get_config_value_priority() {
        std::env::set_var("VAL_TEST_TIMEOUT_MS", "1500");
        assert_eq!(get_config_value(Some(10u64), "VAL_TEST_TIMEOUT_MS", 5000), 10);
        assert_eq!(get_config_value(None, "VAL_TEST_TIMEOUT_MS", 5000u64), 1500);
        assert!(logs_contain("Using VAL_TEST_TIMEOUT_MS from environment: 1500"));

        std::env::set_var("VAL_TEST_TIMEOUT_MS", "soon");
        assert_eq!(get_config_value(None, "VAL_TEST_TIMEOUT_MS", 5000u64), 5000);

        std::env::remove_var("VAL_TEST_TIMEOUT_MS");
        assert_eq!(get_config_value(None, "VAL_TEST_TIMEOUT_MS", 5000u64), 5000);
    }
}
