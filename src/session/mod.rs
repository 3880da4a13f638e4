//! Session recording and playback module
//!
//! A session is a header followed by one record per tick, captured from a
//! live scene at a fixed interval and played back later to author camera
//! labels, replay recorded cuts, or let a classifier pick the camera.
//!
//! # Features
//!
//! - Record scene snapshots to a delimited session file
//! - Replay sessions, optionally following a recorded label stream
//! - Author per-tick camera labels during playback
//! - Predict camera cuts from running feature statistics
//! - Random cuts as a baseline
//! - Pause, resume and seek backward within a session

pub mod director;
pub mod format;
pub mod recorder;
pub mod ticker;
pub mod types;

pub use director::{DirectorEvent, SessionDirector};
pub use format::{SessionFile, SessionWriter};
pub use recorder::SessionRecorder;
pub use ticker::Ticker;
pub use types::{DirectorState, EnvironmentData, LabelList, StateData};
