//! Analysis module for online feature extraction
//!
//! This module provides the statistics used by camera prediction:
//! - Streaming mean/variance, cumulative and sliding-window
//! - Feature schema and per-tick observation rows
//! - Time since the last camera change

pub mod features;
pub mod stats;

pub use features::{CameraDuration, FeatureSchema, FeatureTracker};
pub use stats::RunningStats;
