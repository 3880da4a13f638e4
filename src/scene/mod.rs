//! Scene adapter interface
//!
//! The recorder and the replay engine never touch engine objects directly.
//! Everything they need from the live scene (enumerating cameras and
//! avatars, driving replay proxies, switching the on-air camera and line of
//! sight queries) goes through [`SceneAdapter`], which the owning
//! application passes in explicitly.
//!
//! [`HeadlessScene`] is an in-memory implementation used by the command
//! line tool and the tests.

pub mod headless;

pub use headless::{HeadlessScene, Occluder};

use glam::Vec3;

use crate::session::types::AvatarData;
use crate::types::STransform;

/// A live camera as seen at sampling time
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSnapshot {
    pub name: String,
    pub transform: STransform,
    pub fov: f32,
}

/// Access to the scene the director records from and replays into
pub trait SceneAdapter {
    /// Scene clock in seconds, monotonic
    fn time_seconds(&self) -> f32;

    /// Enumerate the cameras that should be recorded
    fn cameras(&self) -> Vec<CameraSnapshot>;

    /// Enumerate the avatars that should be recorded
    fn avatars(&self) -> Vec<AvatarData>;

    /// Whether scene geometry blocks the segment `from -> to`
    fn line_of_sight_blocked(&self, from: Vec3, to: Vec3) -> bool;

    /// Create replay-only camera and avatar proxies; resets the on-air camera to 0
    fn spawn_replay_proxies(&mut self, num_cameras: usize, num_avatars: usize);

    /// Destroy every replay-only proxy. Safe to call when none exist.
    fn despawn_replay_proxies(&mut self);

    /// Number of replay camera proxies currently alive
    fn replay_camera_count(&self) -> usize;

    /// Drive replay camera `index` to a recorded transform and field of view
    fn apply_camera_state(&mut self, index: usize, transform: &STransform, fov: f32);

    /// Drive replay avatar `index` to a recorded pose
    fn apply_avatar_state(&mut self, index: usize, avatar: &AvatarData);

    /// Index of the on-air camera
    fn current_camera(&self) -> usize;

    /// Put replay camera `index` on air. Returns false if no such camera.
    fn switch_camera(&mut self, index: usize) -> bool;
}
