//! Layered configuration: defaults, then an optional TOML file, then
//! `LOSTPAGE_*` environment variables.
//!
//! ```toml
//! [phases]
//! corruption_ms = 3500
//!
//! [display]
//! reduced_motion = false
//! frame_interval_ms = 16
//! cursor_blink_ms = 530
//! glitch_interval_ms = 90
//!
//! [debugger]
//! state_file = "/home/me/.local/share/lostpage/storage.json"
//!
//! [logging]
//! filter = "lostpage=debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase::{CORRUPTION_PHASE_MS, PhaseDurations};
use crate::schedule::BOOT_PHASE_MS;
use crate::store::FileFlagStore;

const ENV_PREFIX: &str = "LOSTPAGE";

/// Errors that can occur during configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadError(String),

    #[error("Configuration file not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub phases: PhasesConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub debugger: DebuggerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasesConfig {
    /// Length of the corruption phase. The boot phase is derived from the
    /// message schedule and is not configurable.
    #[serde(default = "default_corruption_ms")]
    pub corruption_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Jump straight to the aftermath screen.
    #[serde(default)]
    pub reduced_motion: bool,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    #[serde(default = "default_cursor_blink_ms")]
    pub cursor_blink_ms: u64,

    #[serde(default = "default_glitch_interval_ms")]
    pub glitch_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebuggerConfig {
    /// Where the enabled flag is persisted. Defaults to the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_corruption_ms() -> u64 {
    CORRUPTION_PHASE_MS
}
fn default_frame_interval_ms() -> u64 {
    16
}
fn default_cursor_blink_ms() -> u64 {
    530
}
fn default_glitch_interval_ms() -> u64 {
    90
}
fn default_log_filter() -> String {
    "lostpage=info".to_string()
}

impl Default for PhasesConfig {
    fn default() -> Self {
        Self {
            corruption_ms: default_corruption_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            frame_interval_ms: default_frame_interval_ms(),
            cursor_blink_ms: default_cursor_blink_ms(),
            glitch_interval_ms: default_glitch_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("display.frame_interval_ms", self.display.frame_interval_ms),
            ("display.cursor_blink_ms", self.display.cursor_blink_ms),
            ("display.glitch_interval_ms", self.display.glitch_interval_ms),
            ("phases.corruption_ms", self.phases.corruption_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn phase_durations(&self) -> PhaseDurations {
        PhaseDurations {
            boot: Duration::from_millis(BOOT_PHASE_MS),
            corruption: Duration::from_millis(self.phases.corruption_ms),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.display.frame_interval_ms)
    }

    pub fn cursor_blink_interval(&self) -> Duration {
        Duration::from_millis(self.display.cursor_blink_ms)
    }

    pub fn glitch_interval(&self) -> Duration {
        Duration::from_millis(self.display.glitch_interval_ms)
    }

    /// Resolved path of the persisted debugger flag.
    pub fn state_file(&self) -> crate::Result<PathBuf> {
        match &self.debugger.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(FileFlagStore::default_path()?),
        }
    }

    /// Resolved log directory, falling back to the data directory.
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.logging.directory.clone().or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_dir)
                .map(|dir| dir.join("lostpage").join("log"))
        })
    }
}

/// Configuration loader with layered merging support
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration with layered merging:
    /// 1. Defaults
    /// 2. Config file if provided
    /// 3. Environment variables, e.g. `LOSTPAGE_DISPLAY__REDUCED_MOTION=true`
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let defaults_json = serde_json::to_string(&AppConfig::default())?;
        let mut builder = Config::builder().add_source(File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            tracing::info!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// `$XDG_CONFIG_HOME/lostpage/config.toml` if it exists.
    pub fn find_config_file() -> Option<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("lostpage").join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Load configuration from the default location
    pub fn load_default() -> Result<AppConfig, ConfigError> {
        match Self::find_config_file() {
            Some(path) => ConfigLoader::new().with_file(path).load(),
            None => ConfigLoader::new().load(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn defaults_match_phase_constants() {
        let config = ConfigLoader::new()
            .with_env_prefix("LOSTPAGE_TEST_DEFAULTS")
            .load()
            .expect("defaults load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.phase_durations(), PhaseDurations::default());
        assert_eq!(config.frame_interval(), Duration::from_millis(16));
        assert_eq!(config.cursor_blink_interval(), Duration::from_millis(530));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_config(
            &dir,
            r#"
[phases]
corruption_ms = 1200

[display]
reduced_motion = true
"#,
        );
        let config = ConfigLoader::new()
            .with_env_prefix("LOSTPAGE_TEST_FILE")
            .with_file(&path)
            .load()
            .expect("load");
        assert!(config.display.reduced_motion);
        assert_eq!(config.phases.corruption_ms, 1_200);
        assert_eq!(config.display.glitch_interval_ms, 90);
        assert_eq!(
            config.phase_durations().corruption,
            Duration::from_millis(1_200)
        );
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_config(&dir, "[display]\ncursor_blink_ms = 400\n");
        unsafe {
            std::env::set_var("LOSTPAGE_TEST_ENV_DISPLAY__CURSOR_BLINK_MS", "250");
        }
        let config = ConfigLoader::new()
            .with_env_prefix("LOSTPAGE_TEST_ENV")
            .with_file(&path)
            .load()
            .expect("load");
        unsafe {
            std::env::remove_var("LOSTPAGE_TEST_ENV_DISPLAY__CURSOR_BLINK_MS");
        }
        assert_eq!(config.display.cursor_blink_ms, 250);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = ConfigLoader::new()
            .with_file(dir.path().join("absent.toml"))
            .load()
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_config(&dir, "[display]\nframe_interval_ms = 0\n");
        let err = ConfigLoader::new()
            .with_env_prefix("LOSTPAGE_TEST_ZERO")
            .with_file(&path)
            .load()
            .expect_err("zero interval");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value: display.frame_interval_ms must be greater than zero"
        );

        let mut config = AppConfig::default();
        config.phases.corruption_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_state_file_wins() {
        let mut config = AppConfig::default();
        config.debugger.state_file = Some(PathBuf::from("/tmp/lostpage.json"));
        assert_eq!(
            config.state_file().expect("path"),
            PathBuf::from("/tmp/lostpage.json")
        );
    }

    #[test]
    fn defaults_serialize_to_toml() {
        let rendered = toml::to_string(&AppConfig::default()).expect("toml");
        assert!(rendered.contains("cursor_blink_ms = 530"));
        assert!(!rendered.contains("state_file"));
    }
}
