//! Session director: recording and playback state machine
//!
//! [`SessionDirector`] is the single owner of everything a session touches:
//! the open session file, the label array under construction, the feature
//! statistics, the replay proxies in the scene and the tick schedule. Only
//! one session can be active at a time; every start operation is guarded on
//! the director being [`DirectorState::Inactive`].
//!
//! ```text
//!            start_*                    pause
//! Inactive ──────────▶ Replay/... ◀──────────▶ PausedReplay/...
//!    ▲                    │         resume             │
//!    └──── stop / end ────┴────────────────────────────┘
//! ```
//!
//! Ticks are applied one at a time through [`SessionDirector::tick`], either
//! directly or from [`SessionDirector::poll`] when the schedule is due.
//! `data_index` is the 1-based index of the next tick to display; once it
//! passes the last tick the next firing ends the session.
//!
//! State changes, applied ticks, camera cuts and label writes are published
//! to every receiver handed out by [`SessionDirector::subscribe`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::format::{label_path_for, LabelWriter, SessionFile};
use super::recorder::SessionRecorder;
use super::ticker::Ticker;
use super::types::{DirectorState, LabelList, StateData, UNSET_LABEL};
use crate::analysis::FeatureTracker;
use crate::config::DirectorConfig;
use crate::error::{DirectorError, Result};
use crate::prediction::{CameraPredictor, ModelKind};
use crate::scene::SceneAdapter;

/// Notifications published by the director
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorEvent {
    StateChanged {
        from: DirectorState,
        to: DirectorState,
    },
    /// Tick `index` (1-based) of `total` was applied to the scene
    TickApplied { index: usize, total: usize },
    CameraSwitched { camera: usize },
    LabelsWritten {
        path: PathBuf,
        labelled: usize,
        total: usize,
    },
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Drive the replay proxies to a recorded tick
fn apply_state<S: SceneAdapter>(scene: &mut S, state: &StateData) {
    for (i, camera) in state.cameras().iter().enumerate() {
        scene.apply_camera_state(i, &camera.transform, camera.fov);
    }
    for (i, avatar) in state.avatars().iter().enumerate() {
        scene.apply_avatar_state(i, avatar);
    }
}

pub struct SessionDirector<S: SceneAdapter> {
    scene: S,
    config: DirectorConfig,
    predictor: Option<CameraPredictor>,
    state: DirectorState,
    ticker: Ticker,

    recorder: Option<SessionRecorder>,
    session: Option<SessionFile>,
    data_index: usize,

    label_writer: Option<LabelWriter>,
    labels: LabelList,

    features: Option<FeatureTracker>,
    prev_label: i32,

    rng: StdRng,
    random_countdown: u32,

    subscribers: Vec<Sender<DirectorEvent>>,
}

impl<S: SceneAdapter> std::fmt::Debug for SessionDirector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDirector")
            .field("state", &self.state)
            .field("data_index", &self.data_index)
            .field("predictor", &self.predictor)
            .finish_non_exhaustive()
    }
}

impl<S: SceneAdapter> SessionDirector<S> {
    /// Create an idle director around a scene. No classifier is loaded.
    pub fn new(scene: S, config: DirectorConfig) -> Self {
        let rng = seeded_rng(config.playback.random_seed);
        Self {
            scene,
            config,
            predictor: None,
            state: DirectorState::Inactive,
            ticker: Ticker::new(),
            recorder: None,
            session: None,
            data_index: 1,
            label_writer: None,
            labels: LabelList::default(),
            features: None,
            prev_label: UNSET_LABEL,
            rng,
            random_countdown: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn with_predictor(mut self, predictor: CameraPredictor) -> Self {
        self.predictor = Some(predictor);
        self
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> DirectorState {
        self.state
    }

    /// 1-based index of the next tick to display
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    /// Ticks in the loaded session, 0 when none is loaded
    pub fn tick_count(&self) -> usize {
        self.session.as_ref().map_or(0, SessionFile::tick_count)
    }

    pub fn session(&self) -> Option<&SessionFile> {
        self.session.as_ref()
    }

    pub fn recorder(&self) -> Option<&SessionRecorder> {
        self.recorder.as_ref()
    }

    /// Labels authored so far in the current label-writing session
    pub fn labels(&self) -> &LabelList {
        &self.labels
    }

    pub fn features(&self) -> Option<&FeatureTracker> {
        self.features.as_ref()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn predictor(&self) -> Option<&CameraPredictor> {
        self.predictor.as_ref()
    }

    /// When the schedule next fires, if a session is running
    pub fn next_due(&self) -> Option<Instant> {
        self.ticker.next_due()
    }

    /// Receive every event published from now on
    pub fn subscribe(&mut self) -> Receiver<DirectorEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: DirectorEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn set_state(&mut self, to: DirectorState) {
        let from = self.state;
        if from != to {
            self.state = to;
            tracing::debug!("Director state: {} -> {}", from, to);
            self.emit(DirectorEvent::StateChanged { from, to });
        }
    }

    // ==================== Model ====================

    pub fn set_predictor(&mut self, predictor: CameraPredictor) {
        self.predictor = Some(predictor);
    }

    /// Load the library model of `kind`, unless it is already loaded
    ///
    /// Returns whether a new model was loaded. On failure the previous model
    /// stays in place.
    pub fn change_model(&mut self, kind: ModelKind) -> Result<bool> {
        if self.predictor.as_ref().and_then(CameraPredictor::kind) == Some(kind) {
            return Ok(false);
        }
        let prediction = &self.config.prediction;
        let predictor = CameraPredictor::from_library(
            &prediction.models_dir,
            kind,
            prediction.history_window,
            prediction.forecast_threshold,
        )?;
        self.predictor = Some(predictor);
        self.config.prediction.model = kind;
        Ok(true)
    }

    // ==================== Starting ====================

    /// Record the scene to a new timestamped file in the output directory
    pub fn start_record(&mut self) -> Result<bool> {
        let path = self.config.recording.new_session_path();
        self.start_record_to(path)
    }

    /// Record the scene to `path`
    pub fn start_record_to(&mut self, path: impl Into<PathBuf>) -> Result<bool> {
        if !self.state.is_inactive() {
            tracing::warn!("Ignoring record request while {}", self.state);
            return Ok(false);
        }
        self.config.validate()?;
        let recording = &self.config.recording;
        let recorder = SessionRecorder::start(
            &self.scene,
            path,
            recording.delimiter,
            recording.tick_interval_secs,
        )?;
        self.recorder = Some(recorder);
        self.ticker.start(
            Instant::now(),
            recording.tick_interval(),
            recording.initial_delay(),
        );
        self.set_state(DirectorState::Record);
        Ok(true)
    }

    /// Play a session back, following its labels when `path` is a label file
    pub fn start_replay(&mut self, path: &Path) -> Result<bool> {
        let Some(file) = self.open_for(path, DirectorState::Replay)? else {
            return Ok(false);
        };
        if let Some(labels) = file.labels() {
            tracing::info!("Following {} recorded labels", labels.len());
        }
        self.begin_playback(file, DirectorState::Replay);
        Ok(true)
    }

    /// Play a session back while capturing the live camera as labels
    ///
    /// The label file is created next to the data file and written at stop.
    pub fn start_write_label(&mut self, path: &Path) -> Result<bool> {
        let Some(file) = self.open_for(path, DirectorState::WriteLabel)? else {
            return Ok(false);
        };
        let label_path = label_path_for(file.data_path());
        let writer = LabelWriter::create(&label_path)?;
        tracing::info!("Writing labels to {:?}", label_path);
        self.labels = LabelList::unset(file.tick_count());
        self.label_writer = Some(writer);
        self.begin_playback(file, DirectorState::WriteLabel);
        Ok(true)
    }

    /// Play a session back with the classifier choosing the camera
    pub fn start_predict(&mut self, path: &Path) -> Result<bool> {
        if !self.state.is_inactive() {
            tracing::warn!("Ignoring predict request while {}", self.state);
            return Ok(false);
        }
        if self.predictor.is_none() {
            return Err(DirectorError::Classifier(
                "no classifier loaded for prediction".to_string(),
            ));
        }
        let Some(file) = self.open_for(path, DirectorState::Predict)? else {
            return Ok(false);
        };
        self.features = Some(FeatureTracker::new(
            file.header().num_avatars,
            self.config.prediction.history_window,
        ));
        self.prev_label = UNSET_LABEL;
        self.begin_playback(file, DirectorState::Predict);
        Ok(true)
    }

    /// Play a session back with random camera cuts
    pub fn start_random(&mut self, path: &Path) -> Result<bool> {
        let Some(file) = self.open_for(path, DirectorState::Random)? else {
            return Ok(false);
        };
        self.rng = seeded_rng(self.config.playback.random_seed);
        self.random_countdown = 0;
        self.begin_playback(file, DirectorState::Random);
        Ok(true)
    }

    /// Guard on Inactive, check the config, then open the session file
    fn open_for(&self, path: &Path, mode: DirectorState) -> Result<Option<SessionFile>> {
        if !self.state.is_inactive() {
            tracing::warn!("Ignoring {} request while {}", mode, self.state);
            return Ok(None);
        }
        self.config.validate()?;
        let file = SessionFile::open(path, self.config.recording.delimiter)?;
        Ok(Some(file))
    }

    fn begin_playback(&mut self, file: SessionFile, mode: DirectorState) {
        let header = *file.header();
        self.scene
            .spawn_replay_proxies(header.num_cameras, header.num_avatars);
        tracing::info!(
            "{} {:?}: {} ticks, {} cameras, {} avatars",
            mode,
            file.data_path(),
            file.tick_count(),
            header.num_cameras,
            header.num_avatars
        );
        self.session = Some(file);
        self.data_index = 1;
        self.ticker.start(
            Instant::now(),
            header.interval(),
            self.config.recording.initial_delay(),
        );
        self.set_state(mode);
    }

    // ==================== Stopping and pausing ====================

    /// Tear the session down and return to Inactive
    ///
    /// Always completes. Pending labels are written before files are closed;
    /// the first I/O error met on the way is returned.
    pub fn stop(&mut self) -> Result<()> {
        let mut result = Ok(());

        self.data_index = 1;
        self.scene.despawn_replay_proxies();
        self.session = None;
        self.random_countdown = 0;

        if let Some(mut writer) = self.label_writer.take() {
            let labels = std::mem::take(&mut self.labels);
            match writer.finish(&labels) {
                Ok(()) => {
                    tracing::info!(
                        "Wrote {}/{} labels to {:?}",
                        labels.labelled(),
                        labels.len(),
                        writer.path()
                    );
                    self.emit(DirectorEvent::LabelsWritten {
                        path: writer.path().to_path_buf(),
                        labelled: labels.labelled(),
                        total: labels.len(),
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to write labels to {:?}: {}", writer.path(), e);
                    result = Err(e);
                }
            }
        }
        self.labels = LabelList::default();

        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.stop() {
                tracing::error!("Failed to close recording {:?}: {}", recorder.path(), e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        self.features = None;
        self.prev_label = UNSET_LABEL;
        self.ticker.cancel();
        self.set_state(DirectorState::Inactive);
        result
    }

    /// Pause an active playback. Returns false if nothing is playing.
    pub fn pause(&mut self) -> bool {
        let Some(paused) = self.state.paused() else {
            return false;
        };
        self.ticker.cancel();
        self.set_state(paused);
        true
    }

    /// Resume a paused playback immediately. Returns false if not paused.
    pub fn resume(&mut self) -> bool {
        let Some(resumed) = self.state.resumed() else {
            return false;
        };
        self.ticker
            .start(Instant::now(), self.ticker.interval(), Duration::ZERO);
        self.set_state(resumed);
        true
    }

    /// Resume if paused, otherwise pause
    pub fn toggle_pause(&mut self) -> bool {
        if self.state.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    // ==================== Seeking ====================

    /// Jump back to tick `index` and display it
    ///
    /// Only earlier ticks can be revisited: `index` must be positive, below
    /// the current index and within the session. Anything else is ignored.
    pub fn set_data_index(&mut self, index: usize) -> Result<bool> {
        let Some(total) = self.session.as_ref().map(SessionFile::tick_count) else {
            return Ok(false);
        };
        if index == 0 || index >= self.data_index || index > total {
            tracing::debug!(
                "Ignoring seek to {} (current {}, {} ticks)",
                index,
                self.data_index,
                total
            );
            return Ok(false);
        }
        self.data_index = index;
        let result = self.load(index).map(|_| self.advance(index));
        self.finish_tick(result)?;
        Ok(true)
    }

    /// Slider drag: pause a replay or label session and seek
    pub fn scrub_to(&mut self, index: usize) -> Result<bool> {
        let scrubbable = matches!(
            self.state,
            DirectorState::Replay
                | DirectorState::WriteLabel
                | DirectorState::PausedReplay
                | DirectorState::PausedWriteLabel
        );
        if !scrubbable {
            return Ok(false);
        }
        self.pause();
        self.set_data_index(index)
    }

    // ==================== Ticking ====================

    /// Run one tick if the schedule is due. Returns whether a tick ran.
    pub fn poll(&mut self, now: Instant) -> Result<bool> {
        if !self.ticker.poll(now) {
            return Ok(false);
        }
        self.tick()?;
        Ok(true)
    }

    /// Advance the active session by one tick
    ///
    /// A tick that cannot be decoded ends the session before the error is
    /// returned. Does nothing while inactive or paused.
    pub fn tick(&mut self) -> Result<()> {
        match self.state {
            DirectorState::Record => {
                let result = match self.recorder.as_mut() {
                    Some(recorder) => recorder.sample(&self.scene),
                    None => Ok(()),
                };
                self.finish_tick(result)
            }
            DirectorState::Replay
            | DirectorState::WriteLabel
            | DirectorState::Predict
            | DirectorState::Random => {
                if self.data_index > self.tick_count() {
                    tracing::info!("Reached end of session after {} ticks", self.tick_count());
                    return self.stop();
                }
                let index = self.data_index;
                let result = match self.state {
                    DirectorState::Replay => self.replay_tick(index),
                    DirectorState::WriteLabel => self.write_label_tick(index),
                    DirectorState::Predict => self.predict_tick(index),
                    _ => self.random_tick(index),
                };
                self.finish_tick(result)
            }
            _ => Ok(()),
        }
    }

    /// Tear down on a failed tick and pass the error on
    fn finish_tick(&mut self, result: Result<()>) -> Result<()> {
        if let Err(e) = result {
            tracing::error!("Ending session at tick {}: {}", self.data_index, e);
            if let Err(stop_err) = self.stop() {
                tracing::warn!("Teardown after failed tick also failed: {}", stop_err);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Decode tick `index` and apply it to the scene
    fn load(&mut self, index: usize) -> Result<StateData> {
        let state = match self.session.as_ref() {
            Some(file) => file.tick(index)?,
            None => {
                return Err(DirectorError::Inconsistent {
                    index,
                    message: "no session loaded".to_string(),
                })
            }
        };
        apply_state(&mut self.scene, &state);
        Ok(state)
    }

    /// Move past tick `index` once its mode logic has run
    fn advance(&mut self, index: usize) {
        self.data_index = index + 1;
        let total = self.tick_count();
        self.emit(DirectorEvent::TickApplied { index, total });
    }

    fn cut_to(&mut self, camera: usize) {
        if self.scene.current_camera() == camera {
            return;
        }
        if self.scene.switch_camera(camera) {
            tracing::debug!("Cut to camera {} at tick {}", camera, self.data_index);
            self.emit(DirectorEvent::CameraSwitched { camera });
        } else {
            tracing::warn!(
                "Camera {} does not exist ({} replay cameras)",
                camera,
                self.scene.replay_camera_count()
            );
        }
    }

    fn replay_tick(&mut self, index: usize) -> Result<()> {
        self.load(index)?;
        let label = self.session.as_ref().and_then(|file| file.label(index));
        if let Some(camera) = label.and_then(|l| usize::try_from(l).ok()) {
            self.cut_to(camera);
        }
        self.advance(index);
        Ok(())
    }

    fn write_label_tick(&mut self, index: usize) -> Result<()> {
        let camera = self.scene.current_camera() as i32;
        if let Some(slot) = self.labels.list.get_mut(index - 1) {
            *slot = camera;
        }
        self.load(index)?;
        self.advance(index);
        Ok(())
    }

    /// Observe the previous tick, predict, then cut
    ///
    /// The statistics lag one tick behind the display. Tick 1 only marks the
    /// session start. Tick 2 starts the camera duration clock and predicts on
    /// empty statistics. From tick 3 on, tick `index - 1` is folded in
    /// together with the camera that was on air at its end.
    fn predict_tick(&mut self, index: usize) -> Result<()> {
        let current = self.load(index)?;

        if index == 1 {
            if let Some(features) = self.features.as_mut() {
                features.begin(&current);
            }
        } else {
            let previous = match self.session.as_ref() {
                _ if index == 2 => None,
                Some(file) => Some(file.tick(index - 1)?),
                None => return Ok(()),
            };
            let (Some(features), Some(predictor)) =
                (self.features.as_mut(), self.predictor.as_ref())
            else {
                return Err(DirectorError::Classifier(
                    "prediction session without classifier".to_string(),
                ));
            };
            match previous {
                Some(previous) => features.observe(self.prev_label, &previous),
                None => features.start_duration(&current),
            }
            let row = features.feature_row(&current);
            let predicted = predictor.predict(row)?;
            if let Ok(camera) = usize::try_from(predicted) {
                self.cut_to(camera);
            }
        }

        self.advance(index);
        self.prev_label = self.scene.current_camera() as i32;
        Ok(())
    }

    fn random_tick(&mut self, index: usize) -> Result<()> {
        self.load(index)?;
        if self.random_countdown == 0 {
            self.cut_to_random();
            let playback = &self.config.playback;
            self.random_countdown = self
                .rng
                .random_range(playback.random_min_ticks..playback.random_max_ticks);
            tracing::debug!("Next random cut in {} ticks", self.random_countdown);
        } else {
            self.random_countdown -= 1;
        }
        self.advance(index);
        Ok(())
    }

    /// Cut to a uniformly chosen camera other than the current one
    fn cut_to_random(&mut self) {
        let count = self.scene.replay_camera_count();
        if count < 2 {
            return;
        }
        let current = self.scene.current_camera();
        let mut camera = self.rng.random_range(0..count - 1);
        if camera >= current {
            camera += 1;
        }
        self.cut_to(camera);
    }
}
