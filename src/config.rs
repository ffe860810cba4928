//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$DOCMAIL_CONFIG` (environment variable)
//! 2. `~/.config/docmail/config.toml` (Linux/macOS)
//!    `%APPDATA%\docmail\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::{AttachmentBase, ConvertOptions, IndexBase};
use crate::error::{ConvertError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Conversion defaults.
    pub conversion: ConversionConfig,
    /// Shorthand folder path settings.
    pub folders: FoldersConfig,
    /// Mail host settings.
    pub host: HostConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Conversion defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Display the message after conversion.
    pub display: bool,
    /// Save the message to drafts after conversion.
    pub save: bool,
    /// Base for relative attachment paths: "document" or "working-dir".
    pub attachment_base: AttachmentBase,
    /// Warn about header keys outside the supported property list.
    pub warn_unknown: bool,
}

/// Shorthand folder path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldersConfig {
    /// Base of the leading folder index: 0 or 1.
    pub index_base: IndexBase,
}

/// Mail host settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Reject property names the mail item does not expose.
    pub strict: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            display: false,
            save: false,
            attachment_base: AttachmentBase::Document,
            warn_unknown: true,
        }
    }
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            index_base: IndexBase::One,
        }
    }
}

impl Config {
    /// Conversion options seeded from this configuration.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            index_base: self.folders.index_base,
            attachment_base: self.conversion.attachment_base,
            warn_unknown: self.conversion.warn_unknown,
            display: self.conversion.display,
            save: self.conversion.save,
            save_as: None,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found. A file that
/// exists but cannot be read or parsed is an error.
pub fn load_config() -> Result<Config> {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Load configuration from an explicit file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    let config = toml::from_str::<Config>(&contents).map_err(|e| {
        ConvertError::InvalidConfig(format!("{}: {e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("DOCMAIL_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("docmail").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docmail")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("docmail.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.folders.index_base, IndexBase::One);
        assert_eq!(cfg.conversion.attachment_base, AttachmentBase::Document);
        assert!(cfg.conversion.warn_unknown);
        assert!(!cfg.host.strict);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(parsed.folders.index_base, cfg.folders.index_base);
        assert_eq!(
            parsed.conversion.attachment_base,
            cfg.conversion.attachment_base
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[folders]
index_base = 0

[conversion]
attachment_base = "working-dir"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.folders.index_base, IndexBase::Zero);
        assert_eq!(cfg.conversion.attachment_base, AttachmentBase::WorkingDir);
        // Other fields use defaults
        assert!(!cfg.conversion.display);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_invalid_index_base_rejected() {
        let result = toml::from_str::<Config>("[folders]\nindex_base = 2\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[host]\nstrict = true\n").unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert!(cfg.host.strict);
        assert_eq!(cfg.folders.index_base, IndexBase::One);
    }

    #[test]
    fn test_load_config_reports_bad_index_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[folders]\nindex_base = 2\n").unwrap();
        match load_config_from(&path) {
            Err(ConvertError::InvalidConfig(msg)) => assert!(msg.contains("config.toml")),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_options_from_config() {
        let mut cfg = Config::default();
        cfg.conversion.display = true;
        cfg.folders.index_base = IndexBase::Zero;
        let options = cfg.convert_options();
        assert!(options.display);
        assert_eq!(options.index_base, IndexBase::Zero);
        assert!(options.save_as.is_none());
    }
}
