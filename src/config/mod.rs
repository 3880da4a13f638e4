//! Configuration module for the camera director
//!
//! Settings are grouped by the part of the pipeline they tune:
//! - `recording`: where sessions go and how often ticks are sampled
//! - `playback`: random-cut behaviour
//! - `prediction`: statistics window, confidence gate and model library
//!
//! The configuration is stored as TOML. Missing keys fall back to defaults,
//! so a partial file is valid.
//!
//! # App Data Location
//!
//! Recordings default to the platform data directory under `APP_ID`:
//! - **Linux**: `~/.local/share/dev.camdirector/recordings/`
//! - **macOS**: `~/Library/Application Support/dev.camdirector/recordings/`
//! - **Windows**: `%APPDATA%\dev.camdirector\recordings\`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DirectorError, Result};
use crate::prediction::{ModelKind, DEFAULT_FORECAST_THRESHOLD};
use crate::session::format::{DEFAULT_DELIMITER, DEFAULT_EXTENSION};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.camdirector";

/// Config filename inside the app data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default history window for running statistics
pub const DEFAULT_HISTORY_WINDOW: usize = 100;

/// Timestamp format used to name new recordings
pub const SESSION_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

fn default_output_dir() -> PathBuf {
    app_data_dir()
        .map(|p| p.join("recordings"))
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

// ==================== Sections ====================

/// Where and how sessions are recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory new recordings are written to
    pub output_dir: PathBuf,
    /// Session file extension, without the dot
    pub extension: String,
    /// Record delimiter character
    pub delimiter: char,
    /// Seconds between samples
    pub tick_interval_secs: f32,
    /// Seconds before the first sample or the first playback tick
    pub initial_delay_secs: f32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            extension: DEFAULT_EXTENSION.to_string(),
            delimiter: DEFAULT_DELIMITER,
            tick_interval_secs: 1.0,
            initial_delay_secs: 10.0,
        }
    }
}

impl RecordingConfig {
    pub fn tick_interval(&self) -> Duration {
        seconds(self.tick_interval_secs).unwrap_or_default()
    }

    pub fn initial_delay(&self) -> Duration {
        seconds(self.initial_delay_secs).unwrap_or_default()
    }

    /// Path for a new recording named after the current local time
    pub fn new_session_path(&self) -> PathBuf {
        let name = chrono::Local::now().format(SESSION_NAME_FORMAT).to_string();
        self.session_path(&name)
    }

    /// Path for a named session inside the output directory
    pub fn session_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{name}.{}", self.extension))
    }
}

/// Non-negative seconds as a duration, `None` when NaN, negative or too large
fn seconds(secs: f32) -> Option<Duration> {
    Duration::try_from_secs_f32(secs).ok()
}

/// Random-cut playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Fewest ticks between random cuts
    pub random_min_ticks: u32,
    /// Upper bound (exclusive) on ticks between random cuts
    pub random_max_ticks: u32,
    /// Seed for random cuts; `None` seeds from entropy
    pub random_seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            random_min_ticks: 50,
            random_max_ticks: 400,
            random_seed: Some(1),
        }
    }
}

/// Prediction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Rows in the sliding statistics window
    pub history_window: usize,
    /// Confidence a prediction must exceed to switch cameras
    pub forecast_threshold: f64,
    /// Root of the model library
    pub models_dir: PathBuf,
    /// Model loaded at startup
    pub model: ModelKind,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            forecast_threshold: DEFAULT_FORECAST_THRESHOLD,
            models_dir: PathBuf::from("models"),
            model: ModelKind::default(),
        }
    }
}

// ==================== Director Config ====================

/// Complete director configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub recording: RecordingConfig,
    pub playback: PlaybackConfig,
    pub prediction: PredictionConfig,
}

impl DirectorConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DirectorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| {
            DirectorError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults if missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Using default configuration: {}", e);
            Self::default()
        })
    }

    /// Save as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| DirectorError::Serialization(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let r = &self.recording;
        if r.tick_interval_secs <= 0.0 || seconds(r.tick_interval_secs).is_none() {
            return Err(DirectorError::Config(format!(
                "tick_interval_secs must be a positive duration, got {}",
                r.tick_interval_secs
            )));
        }
        if seconds(r.initial_delay_secs).is_none() {
            return Err(DirectorError::Config(format!(
                "initial_delay_secs must be a non-negative duration, got {}",
                r.initial_delay_secs
            )));
        }
        let p = &self.playback;
        if p.random_min_ticks >= p.random_max_ticks {
            return Err(DirectorError::Config(format!(
                "random cut range {}..{} is empty",
                p.random_min_ticks, p.random_max_ticks
            )));
        }
        let m = &self.prediction;
        if m.history_window < 2 {
            return Err(DirectorError::Config(
                "history_window must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&m.forecast_threshold) {
            return Err(DirectorError::Config(
                "forecast_threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
