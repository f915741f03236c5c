//! Satellite manager configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::manager::{ManagerConfig, Platform};
use crate::window::Size;

const LOCAL_CONFIG: &str = ".satellite-manager.yml";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Coordinator tuning
    pub manager: ManagerConfig,

    /// Environment the main window runs in
    pub platform: Platform,

    /// Screen bounds satellites are clamped to
    pub screen: Size,

    /// Size requested when a scenario step names none
    #[serde(rename = "default-size")]
    pub default_size: Size,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            manager: ManagerConfig::default(),
            platform: Platform::default(),
            screen: Size::new(1920, 1080),
            default_size: Size::new(800, 600),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .satellite-manager.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/satellite-manager/satellite-manager.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Any failure reads as "not configured"; the full load reports it later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(LOCAL_CONFIG))
                .chain(Self::user_config_path())
                .collect(),
        };

        candidates
            .iter()
            .find(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("satellite-manager").join("satellite-manager.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Render the effective configuration
    pub fn to_yaml(&self) -> Result<String> {
        debug!("Config::to_yaml: called");
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::BrowserEngine;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.screen, Size::new(1920, 1080));
        assert_eq!(config.default_size, Size::new(800, 600));
        assert_eq!(config.platform, Platform::default());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

manager:
  channel-buffer: 32
  open-timeout-secs: 10

platform:
  kind: browser
  engine: chromium

screen:
  width: 1280
  height: 720
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.manager.channel_buffer, 32);
        assert_eq!(config.manager.open_timeout_secs, Some(10));
        assert_eq!(
            config.platform,
            Platform::Browser {
                engine: BrowserEngine::Chromium
            }
        );
        assert_eq!(config.screen, Size::new(1280, 720));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
platform:
  kind: native-shell
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.platform, Platform::NativeShell);
        assert_eq!(config.manager.channel_buffer, 256);
        assert_eq!(config.manager.event_bus_capacity, 1024);
        assert_eq!(config.default_size, Size::new(800, 600));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log-level: warn\nscreen:\n  width: 640\n  height: 480").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.screen, Size::new(640, 480));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/satellite-manager.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_yaml_output_reloads() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        let reloaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reloaded, config);
    }
}
