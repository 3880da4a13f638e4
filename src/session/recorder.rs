//! Session recorder for capturing live scenes
//!
//! The recorder enumerates the scene's cameras and avatars once when it
//! starts, writes the session header, and then appends one tick record per
//! [`SessionRecorder::sample`]. Scheduling is left to the owner.

use std::path::{Path, PathBuf};

use super::format::SessionWriter;
use super::types::{AvatarData, CameraData, EnvironmentData, StateData};
use crate::error::Result;
use crate::scene::SceneAdapter;

/// Session recorder writing a scene to a session file
#[derive(Debug)]
pub struct SessionRecorder {
    writer: SessionWriter,
    environment: EnvironmentData,
}

impl SessionRecorder {
    /// Open `path` and write the header for the scene as it is now
    pub fn start<S: SceneAdapter + ?Sized>(
        scene: &S,
        path: impl Into<PathBuf>,
        delimiter: char,
        interval_secs: f32,
    ) -> Result<Self> {
        let environment = EnvironmentData::new(
            interval_secs,
            scene.cameras().len(),
            scene.avatars().len(),
        );
        let mut writer = SessionWriter::create(path, delimiter)?;
        writer.write_header(&environment)?;
        tracing::info!(
            "Recording {} cameras and {} avatars to {:?}",
            environment.num_cameras,
            environment.num_avatars,
            writer.path()
        );
        Ok(Self {
            writer,
            environment,
        })
    }

    pub fn environment(&self) -> &EnvironmentData {
        &self.environment
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn is_recording(&self) -> bool {
        self.writer.is_open()
    }

    pub fn ticks_recorded(&self) -> usize {
        self.writer.ticks_written()
    }

    /// Capture the scene into one tick record and append it
    pub fn sample<S: SceneAdapter + ?Sized>(&mut self, scene: &S) -> Result<()> {
        let state = capture(scene, &self.environment);
        self.writer.append_tick(&state)
    }

    /// Close the session file. Idempotent.
    pub fn stop(&mut self) -> Result<()> {
        if self.writer.is_open() {
            tracing::info!(
                "Stopped recording {:?} after {} ticks",
                self.writer.path(),
                self.writer.ticks_written()
            );
        }
        self.writer.close()
    }
}

/// Build a tick record for the entities enumerated in `env`
///
/// Each camera carries, per avatar, the distance and view angle to the
/// avatar's head and whether the line to the avatar's root is obstructed.
pub fn capture<S: SceneAdapter + ?Sized>(scene: &S, env: &EnvironmentData) -> StateData {
    let avatars: Vec<AvatarData> = scene.avatars().into_iter().take(env.num_avatars).collect();

    let cameras = scene
        .cameras()
        .into_iter()
        .take(env.num_cameras)
        .map(|camera| {
            let origin = camera.transform.position();
            let mut data = CameraData {
                name: camera.name,
                transform: camera.transform,
                fov: camera.fov,
                distance_to: Vec::with_capacity(avatars.len()),
                head_obstructed: Vec::with_capacity(avatars.len()),
                angle_to: Vec::with_capacity(avatars.len()),
            };
            for avatar in &avatars {
                let sight = camera.transform.sight_to(avatar.head_transform.position());
                data.distance_to.push(sight.distance);
                data.angle_to.push(sight.angle_degrees);
                data.head_obstructed.push(
                    scene.line_of_sight_blocked(origin, avatar.root_transform.position()),
                );
            }
            data
        })
        .collect();

    StateData::new(scene.time_seconds(), cameras, avatars)
}
