//! Per-tick feature extraction for camera prediction
//!
//! An observation is one row of values in [`FeatureSchema`] order: the
//! on-air camera label, then for every avatar its voice volume followed by
//! the eight transform components of head, left hand, right hand and root.
//!
//! The classifier consumes a single row per tick with a fixed column order
//! (see [`FeatureTracker::feature_row`]). Models are trained against that
//! layout, so it must not change.

use std::collections::HashMap;

use super::stats::RunningStats;
use crate::session::types::StateData;
use crate::types::TRANSFORM_COMPONENTS;

/// Name of the camera label feature
pub const CAMERA_FEATURE: &str = "camera";

/// Reported mean before any observation
pub const MEAN_SENTINEL: f64 = -1.0;

/// Reported variance before two observations
pub const VARIANCE_SENTINEL: f64 = 0.0;

/// Ordered feature names for a session with a given avatar count
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
    num_avatars: usize,
}

impl FeatureSchema {
    pub fn new(num_avatars: usize) -> Self {
        let mut names = vec![CAMERA_FEATURE.to_string()];
        for a in 0..num_avatars {
            names.push(format!("avatar{a}.voiceVolume"));
            for part in ["head", "leftHand", "rightHand", "root"] {
                for component in TRANSFORM_COMPONENTS {
                    names.push(format!("avatar{a}.{part}{component}"));
                }
            }
        }
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self {
            names,
            index,
            num_avatars,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn num_avatars(&self) -> usize {
        self.num_avatars
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Build the observation row for one tick
    ///
    /// # Panics
    ///
    /// Panics if the tick has fewer avatars than the schema.
    pub fn observe(&self, camera: i32, state: &StateData) -> Vec<f64> {
        let avatars = state.avatars();
        assert!(
            avatars.len() >= self.num_avatars,
            "tick has {} avatars, schema expects {}",
            avatars.len(),
            self.num_avatars
        );

        let mut row = Vec::with_capacity(self.len());
        row.push(camera as f64);
        for avatar in &avatars[..self.num_avatars] {
            row.push(avatar.voice_volume as f64);
            for (_, transform) in avatar.tracked_parts() {
                row.extend(transform.components().iter().map(|&c| c as f64));
            }
        }
        debug_assert_eq!(row.len(), self.len());
        row
    }

    /// Column names of the classifier input row
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec![
            "timeSinceStart".to_string(),
            "camera.prevDuration".to_string(),
            "camera.var".to_string(),
        ];
        columns.extend((0..self.num_avatars).map(|a| format!("avatar{a}.voiceVolume.current")));
        for name in self.names.iter().skip(1) {
            columns.push(format!("{name}.mean"));
            columns.push(format!("{name}.var"));
        }
        columns
    }
}

/// Time since the on-air camera last changed
#[derive(Debug, Clone, Default)]
pub struct CameraDuration {
    start: f32,
    last_label: Option<i32>,
}

impl CameraDuration {
    /// Start timing from `time` with no label history
    pub fn begin(&mut self, time: f32) {
        self.start = time;
        self.last_label = None;
    }

    /// Record the label that was on air at `time`; returns true on a change
    pub fn observe(&mut self, label: i32, time: f32) -> bool {
        let changed = self.last_label.is_some_and(|last| last != label);
        if changed {
            self.start = time;
        }
        self.last_label = Some(label);
        changed
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn elapsed_at(&self, now: f32) -> f32 {
        now - self.start
    }
}

/// Feature state for one prediction session
#[derive(Debug, Clone)]
pub struct FeatureTracker {
    schema: FeatureSchema,
    stats: RunningStats,
    session_start: f32,
    duration: CameraDuration,
}

impl FeatureTracker {
    pub fn new(num_avatars: usize, window: usize) -> Self {
        let schema = FeatureSchema::new(num_avatars);
        let stats = RunningStats::windowed(schema.len(), window);
        Self {
            schema,
            stats,
            session_start: 0.0,
            duration: CameraDuration::default(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Start a session at its first tick
    pub fn begin(&mut self, first: &StateData) {
        self.stats.reset();
        self.session_start = first.time_elapsed;
        self.duration.begin(first.time_elapsed);
    }

    /// Restart the camera duration clock at `state`, forgetting the last label
    pub fn start_duration(&mut self, state: &StateData) {
        self.duration.begin(state.time_elapsed);
    }

    /// Fold in a completed tick together with the camera that was on air for it
    pub fn observe(&mut self, camera: i32, state: &StateData) {
        let row = self.schema.observe(camera, state);
        self.stats.push(row);
        if self.duration.observe(camera, state.time_elapsed) {
            tracing::trace!(
                "Camera changed to {} at {:.3}s",
                camera,
                state.time_elapsed
            );
        }
    }

    /// Running mean of a named feature, or the sentinel before any data
    ///
    /// # Panics
    ///
    /// Panics if `name` is not in the schema.
    pub fn mean(&self, name: &str) -> f64 {
        let i = self.require(name);
        self.stats.mean(i).unwrap_or(MEAN_SENTINEL)
    }

    /// Running variance of a named feature, or the sentinel before two rows
    ///
    /// # Panics
    ///
    /// Panics if `name` is not in the schema.
    pub fn variance(&self, name: &str) -> f64 {
        let i = self.require(name);
        self.stats.variance(i).unwrap_or(VARIANCE_SENTINEL)
    }

    fn require(&self, name: &str) -> usize {
        self.schema
            .index_of(name)
            .unwrap_or_else(|| panic!("unknown feature {name:?}"))
    }

    /// Seconds the current camera has been on air, as of `current`
    pub fn prev_duration(&self, current: &StateData) -> f32 {
        self.duration.elapsed_at(current.time_elapsed)
    }

    /// Assemble the classifier input row for the tick being displayed
    ///
    /// Columns: time since session start, camera duration, camera label
    /// variance, each avatar's current voice volume, then mean and variance
    /// of every non-camera feature in schema order.
    pub fn feature_row(&self, current: &StateData) -> Vec<f64> {
        let mut row = Vec::with_capacity(3 + self.schema.num_avatars() + 2 * self.schema.len());
        row.push((current.time_elapsed - self.session_start) as f64);
        row.push(self.prev_duration(current) as f64);
        row.push(self.variance(CAMERA_FEATURE));
        row.extend(
            current
                .avatars()
                .iter()
                .take(self.schema.num_avatars())
                .map(|a| a.voice_volume as f64),
        );
        for i in 1..self.schema.len() {
            row.push(self.stats.mean(i).unwrap_or(MEAN_SENTINEL));
            row.push(self.stats.variance(i).unwrap_or(VARIANCE_SENTINEL));
        }
        row
    }
}
