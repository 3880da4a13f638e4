//! # camdirector: automated camera direction for recorded scenes
//!
//! Records multi-camera, multi-avatar scenes to session files and plays them
//! back, either following human-authored camera labels or letting a trained
//! classifier cut between cameras as the session unfolds.
//!
//! ## Architecture
//!
//! - **Scene**: the [`scene::SceneAdapter`] trait is the only way the core
//!   touches the live scene; [`scene::HeadlessScene`] is an in-memory one
//! - **Session**: the session file format, the recorder and the
//!   [`session::SessionDirector`] state machine that owns every session
//! - **Analysis**: streaming mean/variance and the classifier feature row
//! - **Prediction**: the classifier interface, confidence gate and
//!   Rhai-scripted models
//!
//! ## Configuration
//!
//! Settings are stored as TOML; recordings default to the platform data
//! directory under `dev.camdirector`:
//!
//! - **Linux**: `~/.local/share/dev.camdirector/`
//! - **macOS**: `~/Library/Application Support/dev.camdirector/`
//! - **Windows**: `%APPDATA%\dev.camdirector\`
//!
//! ## Example
//!
//! ```ignore
//! use camdirector::{DirectorConfig, HeadlessScene, SessionDirector};
//!
//! let config = DirectorConfig::load_or_default("config.toml");
//! let model = config.prediction.model;
//! let mut director = SessionDirector::new(HeadlessScene::new(), config);
//! director.change_model(model)?;
//!
//! director.start_predict(Path::new("recordings/2024-05-01_14-30.json"))?;
//! while !director.state().is_inactive() {
//!     director.tick()?;
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod prediction;
pub mod scene;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::DirectorConfig;
pub use error::{DirectorError, Result};
pub use prediction::{CameraPredictor, Classifier, ModelKind};
pub use scene::{HeadlessScene, SceneAdapter};
pub use session::{DirectorEvent, DirectorState, SessionDirector};
pub use types::{STransform, SVector};
