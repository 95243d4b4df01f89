//! Configuration management for the `tripcrew` command.
//!
//! Settings are resolved once at startup from:
//! 1. Default values
//! 2. Config file (`~/.tripcrew/config.toml`)
//! 3. Environment variables

mod schema;

pub use schema::{AppConfig, IssueLevel};

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use tripcrew::ConfigError;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tripcrew")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a specific path.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or a parse error if it
/// is not a valid configuration.
pub async fn load_config_from(path: &Path) -> ConfigResult<AppConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Parse a TOML configuration document.
///
/// # Errors
///
/// Returns [`ConfigError::TomlParse`] for malformed documents and unknown keys.
pub fn parse_config(content: &str) -> ConfigResult<AppConfig> {
    toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))
}

/// Save configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Returns an I/O or serialization error.
pub async fn save_config_to(config: &AppConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::TomlSerialize(e.to_string()))?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Write a default configuration to `path`.
///
/// Returns `false` without touching the file when it exists and `force` is
/// not set.
///
/// # Errors
///
/// Returns an I/O or serialization error.
pub async fn init_config(path: &Path, force: bool) -> ConfigResult<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    save_config_to(&AppConfig::default(), path).await?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tripcrew-cli-{}-{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_default_paths() {
        let cfg_dir = default_config_dir();
        assert!(cfg_dir.ends_with(".tripcrew"));
        assert!(config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_parse_error_is_a_config_error() {
        let err = parse_config("[llm\nprovider =").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let config = load_config_from(&scratch("missing")).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_init_respects_force() {
        let path = scratch("init");
        let _ = tokio::fs::remove_file(&path).await;

        assert!(init_config(&path, false).await.unwrap());
        let mut config = load_config_from(&path).await.unwrap();
        config.trip.origin = "Oslo".to_owned();
        save_config_to(&config, &path).await.unwrap();

        assert!(!init_config(&path, false).await.unwrap());
        assert_eq!(load_config_from(&path).await.unwrap().trip.origin, "Oslo");

        assert!(init_config(&path, true).await.unwrap());
        assert!(load_config_from(&path).await.unwrap().trip.origin.is_empty());

        if let Some(dir) = path.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}
