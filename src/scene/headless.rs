//! In-memory scene without a renderer
//!
//! Holds live cameras and avatars, spherical occluders for line of sight
//! tests, and the replay proxies the director drives during playback.

use std::time::Instant;

use glam::{Quat, Vec3};

use super::{CameraSnapshot, SceneAdapter};
use crate::session::types::AvatarData;
use crate::types::STransform;

/// Spherical obstacle used for line of sight queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    pub center: Vec3,
    pub radius: f32,
}

impl Occluder {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether the segment `from -> to` passes through this sphere
    pub fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let segment = to - from;
        let len_sq = segment.length_squared();
        let t = if len_sq > 0.0 {
            ((self.center - from).dot(segment) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = from + segment * t;
        closest.distance_squared(self.center) <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, Copy)]
enum SceneClock {
    Wall(Instant),
    Manual(f32),
}

/// A replay camera proxy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReplayCamera {
    pub transform: STransform,
    pub fov: f32,
}

#[derive(Debug, Clone)]
pub struct HeadlessScene {
    clock: SceneClock,
    cameras: Vec<CameraSnapshot>,
    avatars: Vec<AvatarData>,
    occluders: Vec<Occluder>,
    replay_cameras: Vec<ReplayCamera>,
    replay_avatars: Vec<AvatarData>,
    current_camera: usize,
    cuts: Vec<usize>,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessScene {
    /// Empty scene with a manual clock starting at zero
    pub fn new() -> Self {
        Self {
            clock: SceneClock::Manual(0.0),
            cameras: Vec::new(),
            avatars: Vec::new(),
            occluders: Vec::new(),
            replay_cameras: Vec::new(),
            replay_avatars: Vec::new(),
            current_camera: 0,
            cuts: Vec::new(),
        }
    }

    /// Use wall-clock time since this call as the scene clock
    pub fn with_wall_clock(mut self) -> Self {
        self.clock = SceneClock::Wall(Instant::now());
        self
    }

    /// Two avatars facing each other, watched by three cameras, with a pillar
    /// between the side camera and the second avatar
    pub fn demo() -> Self {
        let mut scene = Self::new();
        let look = |from: Vec3, to: Vec3| {
            STransform::new(from, Quat::from_rotation_arc(Vec3::Z, (to - from).normalize()))
        };
        let centre = Vec3::new(0.0, 1.6, 0.0);
        for (name, position) in [
            ("Wide", Vec3::new(0.0, 2.5, -6.0)),
            ("OverShoulderA", Vec3::new(-1.5, 1.8, -2.5)),
            ("OverShoulderB", Vec3::new(1.5, 1.8, 2.5)),
        ] {
            scene.add_camera(name, look(position, centre), 60.0);
        }
        scene.add_avatar(Vec3::new(-1.0, 0.0, 0.0));
        scene.add_avatar(Vec3::new(1.0, 0.0, 0.0));
        scene.add_occluder(Occluder::new(Vec3::new(1.25, 1.0, 1.25), 0.3));
        scene
    }

    pub fn add_camera(&mut self, name: impl Into<String>, transform: STransform, fov: f32) {
        self.cameras.push(CameraSnapshot {
            name: name.into(),
            transform,
            fov,
        });
    }

    /// Add an avatar standing at `root`, head 1.6 above it
    pub fn add_avatar(&mut self, root: Vec3) {
        let head = root + Vec3::new(0.0, 1.6, 0.0);
        self.avatars.push(AvatarData {
            head_transform: STransform::from_position(head),
            root_transform: STransform::from_position(root),
            left_hand_transform: STransform::from_position(root + Vec3::new(-0.3, 1.0, 0.1)),
            right_hand_transform: STransform::from_position(root + Vec3::new(0.3, 1.0, 0.1)),
            pose_type: 0,
            voice_volume: 0.0,
        });
    }

    pub fn add_occluder(&mut self, occluder: Occluder) {
        self.occluders.push(occluder);
    }

    pub fn avatar_mut(&mut self, index: usize) -> Option<&mut AvatarData> {
        self.avatars.get_mut(index)
    }

    pub fn camera_mut(&mut self, index: usize) -> Option<&mut CameraSnapshot> {
        self.cameras.get_mut(index)
    }

    /// Move the demo avatars and their voices as a function of scene time
    pub fn animate(&mut self) {
        let t = self.time_seconds();
        for (i, avatar) in self.avatars.iter_mut().enumerate() {
            let phase = t * 0.5 + i as f32 * std::f32::consts::PI;
            let root = avatar.root_transform.position();
            avatar.head_transform = STransform::new(
                root + Vec3::new(0.0, 1.6 + 0.05 * phase.sin(), 0.0),
                Quat::from_rotation_y(0.3 * phase.sin()),
            );
            avatar.right_hand_transform =
                STransform::from_position(root + Vec3::new(0.3, 1.0 + 0.2 * phase.cos(), 0.1));
            avatar.voice_volume = phase.sin().max(0.0);
        }
    }

    /// Advance a manual clock. Ignored when running on the wall clock.
    pub fn advance(&mut self, seconds: f32) {
        if let SceneClock::Manual(t) = &mut self.clock {
            *t += seconds;
        }
    }

    pub fn replay_cameras(&self) -> &[ReplayCamera] {
        &self.replay_cameras
    }

    pub fn replay_avatars(&self) -> &[AvatarData] {
        &self.replay_avatars
    }

    /// Every successful camera switch, in order
    pub fn cuts(&self) -> &[usize] {
        &self.cuts
    }
}

impl SceneAdapter for HeadlessScene {
    fn time_seconds(&self) -> f32 {
        match self.clock {
            SceneClock::Wall(start) => start.elapsed().as_secs_f32(),
            SceneClock::Manual(t) => t,
        }
    }

    fn cameras(&self) -> Vec<CameraSnapshot> {
        self.cameras.clone()
    }

    fn avatars(&self) -> Vec<AvatarData> {
        self.avatars.clone()
    }

    fn line_of_sight_blocked(&self, from: Vec3, to: Vec3) -> bool {
        self.occluders.iter().any(|o| o.blocks(from, to))
    }

    fn spawn_replay_proxies(&mut self, num_cameras: usize, num_avatars: usize) {
        self.replay_cameras = vec![ReplayCamera::default(); num_cameras];
        self.replay_avatars = vec![AvatarData::default(); num_avatars];
        self.current_camera = 0;
        self.cuts.clear();
    }

    fn despawn_replay_proxies(&mut self) {
        self.replay_cameras.clear();
        self.replay_avatars.clear();
    }

    fn replay_camera_count(&self) -> usize {
        self.replay_cameras.len()
    }

    fn apply_camera_state(&mut self, index: usize, transform: &STransform, fov: f32) {
        if let Some(camera) = self.replay_cameras.get_mut(index) {
            camera.transform = *transform;
            camera.fov = fov;
        }
    }

    fn apply_avatar_state(&mut self, index: usize, avatar: &AvatarData) {
        if let Some(proxy) = self.replay_avatars.get_mut(index) {
            *proxy = *avatar;
        }
    }

    fn current_camera(&self) -> usize {
        self.current_camera
    }

    fn switch_camera(&mut self, index: usize) -> bool {
        if index >= self.replay_cameras.len() {
            return false;
        }
        self.current_camera = index;
        self.cuts.push(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occluder_blocks_segment() {
        let pillar = Occluder::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        assert!(pillar.blocks(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)));
        assert!(!pillar.blocks(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0)));
        assert!(!pillar.blocks(Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 10.0)));
    }

    #[test]
    fn test_manual_clock() {
        let mut scene = HeadlessScene::new();
        assert_eq!(scene.time_seconds(), 0.0);
        scene.advance(0.5);
        scene.advance(0.25);
        assert_eq!(scene.time_seconds(), 0.75);
    }

    #[test]
    fn test_replay_proxies() {
        let mut scene = HeadlessScene::demo();
        assert_eq!(scene.cameras().len(), 3);
        assert_eq!(scene.avatars().len(), 2);

        assert!(!scene.switch_camera(0));
        scene.spawn_replay_proxies(3, 2);
        assert_eq!(scene.replay_camera_count(), 3);
        assert!(scene.switch_camera(2));
        assert!(!scene.switch_camera(3));
        assert_eq!(scene.current_camera(), 2);
        assert_eq!(scene.cuts(), &[2]);

        let avatar = AvatarData {
            voice_volume: 0.7,
            ..Default::default()
        };
        scene.apply_avatar_state(1, &avatar);
        assert_eq!(scene.replay_avatars()[1].voice_volume, 0.7);

        scene.spawn_replay_proxies(3, 2);
        assert_eq!(scene.current_camera(), 0);

        scene.despawn_replay_proxies();
        scene.despawn_replay_proxies();
        assert_eq!(scene.replay_camera_count(), 0);
        assert!(scene.replay_avatars().is_empty());
    }

    #[test]
    fn test_demo_occlusion() {
        let scene = HeadlessScene::demo();
        let cameras = scene.cameras();
        let avatars = scene.avatars();
        let blocked = scene.line_of_sight_blocked(
            cameras[2].transform.position(),
            avatars[1].root_transform.position(),
        );
        let clear = scene.line_of_sight_blocked(
            cameras[0].transform.position(),
            avatars[0].root_transform.position(),
        );
        assert!(blocked);
        assert!(!clear);
    }
}
