//! Session data types
//!
//! Field names follow the on-disk JSON layout of existing recordings
//! (`invokeInterval`, `cameraData.cameras`, `headTransform`, ...), so files
//! written by earlier capture tools replay unchanged.

use serde::{Deserialize, Serialize};

use crate::types::STransform;

/// Camera label value meaning "no camera chosen"
pub const UNSET_LABEL: i32 = -1;

/// State of the director state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirectorState {
    /// No active session
    #[default]
    Inactive,
    /// Sampling the live scene into a session file
    Record,
    /// Plain playback, optionally following a loaded label stream
    Replay,
    /// Playback while capturing the live camera choice as labels
    WriteLabel,
    /// Playback with classifier-driven camera selection
    Predict,
    /// Playback with random camera cuts
    Random,
    PausedReplay,
    PausedWriteLabel,
    PausedPredict,
    PausedRandom,
}

impl DirectorState {
    /// Check if a playback mode is actively ticking
    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            DirectorState::Replay
                | DirectorState::WriteLabel
                | DirectorState::Predict
                | DirectorState::Random
        )
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        self.resumed().is_some()
    }

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        matches!(self, DirectorState::Record)
    }

    /// Check if idle
    pub fn is_inactive(&self) -> bool {
        matches!(self, DirectorState::Inactive)
    }

    /// Paused variant of an active playback mode
    pub fn paused(&self) -> Option<DirectorState> {
        match self {
            DirectorState::Replay => Some(DirectorState::PausedReplay),
            DirectorState::WriteLabel => Some(DirectorState::PausedWriteLabel),
            DirectorState::Predict => Some(DirectorState::PausedPredict),
            DirectorState::Random => Some(DirectorState::PausedRandom),
            _ => None,
        }
    }

    /// Active variant of a paused playback mode
    pub fn resumed(&self) -> Option<DirectorState> {
        match self {
            DirectorState::PausedReplay => Some(DirectorState::Replay),
            DirectorState::PausedWriteLabel => Some(DirectorState::WriteLabel),
            DirectorState::PausedPredict => Some(DirectorState::Predict),
            DirectorState::PausedRandom => Some(DirectorState::Random),
            _ => None,
        }
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            DirectorState::Inactive => "Inactive",
            DirectorState::Record => "Record",
            DirectorState::Replay => "Replay",
            DirectorState::WriteLabel => "Write Label",
            DirectorState::Predict => "Predict",
            DirectorState::Random => "Random",
            DirectorState::PausedReplay => "Paused Replay",
            DirectorState::PausedWriteLabel => "Paused Write Label",
            DirectorState::PausedPredict => "Paused Predict",
            DirectorState::PausedRandom => "Paused Random",
        }
    }
}

impl std::fmt::Display for DirectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Session header, written once at the start of a session file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    /// Seconds between ticks
    pub invoke_interval: f32,
    pub num_cameras: usize,
    pub num_avatars: usize,
}

impl EnvironmentData {
    pub fn new(invoke_interval: f32, num_cameras: usize, num_avatars: usize) -> Self {
        Self {
            invoke_interval,
            num_cameras,
            num_avatars,
        }
    }

    /// Tick interval as a duration, if it is positive and representable
    pub fn checked_interval(&self) -> Option<std::time::Duration> {
        if self.invoke_interval > 0.0 {
            std::time::Duration::try_from_secs_f32(self.invoke_interval).ok()
        } else {
            None
        }
    }

    /// Tick interval as a duration, zero when unusable
    pub fn interval(&self) -> std::time::Duration {
        self.checked_interval().unwrap_or_default()
    }
}

/// Per-camera state for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraData {
    pub name: String,
    pub transform: STransform,
    pub fov: f32,
    /// Distance to each avatar's head, indexed by avatar
    pub distance_to: Vec<f32>,
    /// Whether the line from camera to avatar is blocked, indexed by avatar
    pub head_obstructed: Vec<bool>,
    /// Angle between camera forward and each avatar's head, in degrees
    pub angle_to: Vec<f32>,
}

/// Per-avatar state for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarData {
    pub head_transform: STransform,
    pub root_transform: STransform,
    pub left_hand_transform: STransform,
    pub right_hand_transform: STransform,
    pub pose_type: i32,
    pub voice_volume: f32,
}

impl AvatarData {
    /// Tracked body parts and their transforms, in feature order
    pub fn tracked_parts(&self) -> [(&'static str, &STransform); 4] {
        [
            ("head", &self.head_transform),
            ("leftHand", &self.left_hand_transform),
            ("rightHand", &self.right_hand_transform),
            ("root", &self.root_transform),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraDataList {
    pub cameras: Vec<CameraData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AvatarDataList {
    pub avatars: Vec<AvatarData>,
}

/// One tick's snapshot of every camera and avatar
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateData {
    /// Scene time in seconds, monotonic within a session
    pub time_elapsed: f32,
    pub camera_data: CameraDataList,
    pub avatar_data: AvatarDataList,
}

impl StateData {
    pub fn new(time_elapsed: f32, cameras: Vec<CameraData>, avatars: Vec<AvatarData>) -> Self {
        Self {
            time_elapsed,
            camera_data: CameraDataList { cameras },
            avatar_data: AvatarDataList { avatars },
        }
    }

    pub fn cameras(&self) -> &[CameraData] {
        &self.camera_data.cameras
    }

    pub fn avatars(&self) -> &[AvatarData] {
        &self.avatar_data.avatars
    }

    /// Check the entity counts against the session header
    pub fn matches(&self, env: &EnvironmentData) -> std::result::Result<(), String> {
        if self.cameras().len() != env.num_cameras {
            return Err(format!(
                "expected {} cameras, found {}",
                env.num_cameras,
                self.cameras().len()
            ));
        }
        if self.avatars().len() != env.num_avatars {
            return Err(format!(
                "expected {} avatars, found {}",
                env.num_avatars,
                self.avatars().len()
            ));
        }
        Ok(())
    }
}

/// Per-tick camera labels, as stored in a label file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelList {
    pub list: Vec<i32>,
}

impl LabelList {
    /// A label list with every tick unset
    pub fn unset(ticks: usize) -> Self {
        Self {
            list: vec![UNSET_LABEL; ticks],
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Number of ticks that carry a camera label
    pub fn labelled(&self) -> usize {
        self.list.iter().filter(|&&l| l != UNSET_LABEL).count()
    }
}
