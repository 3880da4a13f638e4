//! Test data builders for creating session files

use std::path::{Path, PathBuf};

use camdirector::session::types::{AvatarData, CameraData, EnvironmentData, StateData};
use camdirector::session::SessionWriter;
use camdirector::STransform;
use glam::Vec3;

/// Builder for a single tick record
pub struct StateBuilder {
    time: f32,
    cameras: usize,
    avatars: Vec<AvatarData>,
}

impl StateBuilder {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            cameras: 0,
            avatars: Vec::new(),
        }
    }

    pub fn cameras(mut self, count: usize) -> Self {
        self.cameras = count;
        self
    }

    /// Add an avatar standing at `x` with the given voice volume
    pub fn avatar(mut self, x: f32, voice: f32) -> Self {
        let root = Vec3::new(x, 0.0, 0.0);
        self.avatars.push(AvatarData {
            head_transform: STransform::from_position(root + Vec3::Y * 1.6),
            root_transform: STransform::from_position(root),
            left_hand_transform: STransform::from_position(root + Vec3::new(-0.3, 1.0, 0.0)),
            right_hand_transform: STransform::from_position(root + Vec3::new(0.3, 1.0, 0.0)),
            pose_type: 0,
            voice_volume: voice,
        });
        self
    }

    pub fn build(self) -> StateData {
        let n = self.avatars.len();
        let cameras = (0..self.cameras)
            .map(|i| CameraData {
                name: format!("Camera{i}"),
                transform: STransform::from_position(Vec3::new(i as f32, 2.0, -5.0)),
                fov: 60.0,
                distance_to: vec![5.0; n],
                head_obstructed: vec![false; n],
                angle_to: vec![10.0; n],
            })
            .collect();
        StateData::new(self.time, cameras, self.avatars)
    }
}

/// Builder for a whole session file
pub struct SessionBuilder {
    interval: f32,
    cameras: usize,
    avatars: usize,
    ticks: Vec<StateData>,
}

impl SessionBuilder {
    pub fn new(cameras: usize, avatars: usize) -> Self {
        Self {
            interval: 1.0,
            cameras,
            avatars,
            ticks: Vec::new(),
        }
    }

    pub fn interval(mut self, interval: f32) -> Self {
        self.interval = interval;
        self
    }

    /// Append ticks at the given times, with voices alternating by tick
    pub fn ticks_at(mut self, times: &[f32]) -> Self {
        for (i, &t) in times.iter().enumerate() {
            let mut state = StateBuilder::new(t).cameras(self.cameras);
            for a in 0..self.avatars {
                let voice = if (i + a) % 2 == 0 { 0.8 } else { 0.1 };
                state = state.avatar(a as f32 * 2.0 - 1.0, voice);
            }
            self.ticks.push(state.build());
        }
        self
    }

    pub fn header(&self) -> EnvironmentData {
        EnvironmentData::new(self.interval, self.cameras, self.avatars)
    }

    pub fn states(&self) -> &[StateData] {
        &self.ticks
    }

    /// Write the session to `dir/name` and return its path
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut writer = SessionWriter::create(&path, '|').unwrap();
        writer.write_header(&self.header()).unwrap();
        for state in &self.ticks {
            writer.append_tick(state).unwrap();
        }
        writer.close().unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builder() {
        let state = StateBuilder::new(2.0).cameras(3).avatar(0.0, 0.5).build();
        assert_eq!(state.time_elapsed, 2.0);
        assert_eq!(state.cameras().len(), 3);
        assert_eq!(state.cameras()[0].distance_to.len(), 1);
        assert_eq!(state.avatars()[0].voice_volume, 0.5);
    }
}
