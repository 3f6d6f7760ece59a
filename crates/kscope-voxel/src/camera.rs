// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera math and controls.
//!
//! The pose is position plus yaw/pitch; orientation is rebuilt from the two
//! angles whenever it is needed, so repeated input never accumulates
//! quaternion drift.

use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4Swizzles};

use crate::hover::Ray;

/// Translation per W/A/S/D press.
pub const PAN_STEP: f32 = 1.0;
/// Z translation per O/P press.
pub const ZOOM_STEP: f32 = 2.0;
/// Radians per arrow-key press.
pub const ROTATE_STEP: f32 = 0.05;
/// Z translation per wheel unit.
pub const WHEEL_SCALE: f32 = 0.1;
/// Wheel zoom lower bound on Z.
pub const MIN_WHEEL_Z: f32 = 20.0;
/// Wheel zoom upper bound on Z.
pub const MAX_WHEEL_Z: f32 = 200.0;
/// Radians per pixel of drag.
pub const DRAG_SENSITIVITY: f32 = 0.005;
/// Pitch limit in either direction.
pub const MAX_PITCH: f32 = FRAC_PI_2;
/// Offset from a focus target to the camera.
pub const FOCUS_OFFSET: Vec3 = Vec3::new(0.0, 20.0, 100.0);

const NEAR: f32 = 0.1;
const FAR: f32 = 5000.0;

/// Position and angles; the full camera state apart from projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// World-space position.
    pub position: Vec3,
    /// Rotation about +Y (radians).
    pub yaw: f32,
    /// Rotation about the local X axis (radians), within `±MAX_PITCH`.
    pub pitch: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 100.0),
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl CameraPose {
    /// Orientation derived from yaw then pitch.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// `(forward, right, up)` unit vectors.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let q = self.orientation();
        (q * -Vec3::Z, q * Vec3::X, q * Vec3::Y)
    }

    /// Pose at `position` looking toward `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let f = (target - position).normalize_or_zero();
        if f == Vec3::ZERO {
            return Self {
                position,
                yaw: 0.0,
                pitch: 0.0,
            };
        }
        Self {
            position,
            yaw: (-f.x).atan2(-f.z),
            pitch: f.y.clamp(-1.0, 1.0).asin(),
        }
    }
}

/// Physical keys the camera reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKey {
    /// Pan +Y.
    W,
    /// Pan -Y.
    S,
    /// Pan -X.
    A,
    /// Pan +X.
    D,
    /// Move toward the scene (-Z).
    O,
    /// Move away from the scene (+Z).
    P,
    /// Pitch -0.05 rad.
    ArrowUp,
    /// Pitch +0.05 rad.
    ArrowDown,
    /// Yaw -0.05 rad.
    ArrowLeft,
    /// Yaw +0.05 rad.
    ArrowRight,
}

/// One camera input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraInput {
    /// Key press.
    Key(CameraKey),
    /// Pointer pressed at a screen position (pixels).
    DragStart(Vec2),
    /// Pointer moved while pressed.
    DragMove(Vec2),
    /// Pointer released.
    DragEnd,
    /// Wheel scrolled; positive moves away.
    Wheel(f32),
}

/// Keyboard/mouse camera with focus and reset.
#[derive(Debug, Clone)]
pub struct CameraController {
    pose: CameraPose,
    home: CameraPose,
    fov_y: f32,
    drag_from: Option<Vec2>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraPose::default())
    }
}

impl CameraController {
    /// Mount the camera at `home`; [`CameraController::reset_view`] returns here.
    pub fn new(home: CameraPose) -> Self {
        Self {
            pose: home,
            home,
            fov_y: 45f32.to_radians(),
            drag_from: None,
        }
    }

    /// Current pose.
    pub const fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Pose restored by reset.
    pub const fn home(&self) -> CameraPose {
        self.home
    }

    /// Replace the current pose (e.g. from saved prefs) without touching home.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = CameraPose {
            pitch: pose.pitch.clamp(-MAX_PITCH, MAX_PITCH),
            ..pose
        };
    }

    /// Vertical field of view in radians.
    pub const fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// True while a drag is in progress.
    pub const fn dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Apply one key press.
    pub fn key(&mut self, key: CameraKey) {
        let p = &mut self.pose;
        match key {
            CameraKey::W => p.position.y += PAN_STEP,
            CameraKey::S => p.position.y -= PAN_STEP,
            CameraKey::A => p.position.x -= PAN_STEP,
            CameraKey::D => p.position.x += PAN_STEP,
            CameraKey::O => p.position.z -= ZOOM_STEP,
            CameraKey::P => p.position.z += ZOOM_STEP,
            CameraKey::ArrowUp => p.pitch = (p.pitch - ROTATE_STEP).max(-MAX_PITCH),
            CameraKey::ArrowDown => p.pitch = (p.pitch + ROTATE_STEP).min(MAX_PITCH),
            CameraKey::ArrowLeft => p.yaw -= ROTATE_STEP,
            CameraKey::ArrowRight => p.yaw += ROTATE_STEP,
        }
    }

    /// Wheel zoom; clamps Z to `[MIN_WHEEL_Z, MAX_WHEEL_Z]`.
    pub fn wheel(&mut self, delta_y: f32) {
        self.pose.position.z =
            (self.pose.position.z + delta_y * WHEEL_SCALE).clamp(MIN_WHEEL_Z, MAX_WHEEL_Z);
    }

    /// Rotate by a pixel delta.
    pub fn rotate_by_drag(&mut self, delta: Vec2) {
        self.pose.yaw -= delta.x * DRAG_SENSITIVITY;
        self.pose.pitch =
            (self.pose.pitch - delta.y * DRAG_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Dispatch an input event. Returns `true` when the pose changed.
    pub fn handle(&mut self, input: CameraInput) -> bool {
        let before = self.pose;
        match input {
            CameraInput::Key(k) => self.key(k),
            CameraInput::Wheel(dy) => self.wheel(dy),
            CameraInput::DragStart(at) => self.drag_from = Some(at),
            CameraInput::DragMove(at) => {
                if let Some(from) = self.drag_from {
                    self.rotate_by_drag(at - from);
                    self.drag_from = Some(at);
                }
            }
            CameraInput::DragEnd => self.drag_from = None,
        }
        self.pose != before
    }

    /// Move to `target + FOCUS_OFFSET` and aim at `target`.
    pub fn focus_on(&mut self, target: Vec3) {
        self.drag_from = None;
        self.pose = CameraPose::looking_at(target + FOCUS_OFFSET, target);
    }

    /// Restore the mount-time pose.
    pub fn reset_view(&mut self) {
        self.drag_from = None;
        self.pose = self.home;
    }

    /// Combined projection and view matrix.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let (f, _, u) = self.pose.basis();
        let view = Mat4::look_to_rh(self.pose.position, f, u);
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(0.1), NEAR, FAR);
        proj * view
    }

    /// World ray through a point in normalized device coordinates.
    pub fn pick_ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        let (f, r, u) = self.pose.basis();
        let t = (self.fov_y * 0.5).tan();
        Ray::new(
            self.pose.position,
            f + r * (ndc.x * t * aspect) + u * (ndc.y * t),
        )
    }

    /// Project a world point to NDC; `None` when it is behind the camera.
    pub fn project(&self, world: Vec3, aspect: f32) -> Option<Vec2> {
        let clip = self.view_proj(aspect) * world.extend(1.0);
        (clip.w > NEAR).then(|| clip.xy() / clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_looks_down_negative_z() {
        let cam = CameraController::default();
        let (f, r, u) = cam.pose().basis();
        assert_relative_eq!(f.z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(r.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(u.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(cam.fov_y().to_degrees(), 45.0, epsilon = 1e-4);
    }

    #[test]
    fn keys_pan_and_zoom() {
        let mut cam = CameraController::default();
        for k in [CameraKey::W, CameraKey::W, CameraKey::A, CameraKey::O] {
            cam.key(k);
        }
        assert_eq!(cam.pose().position, Vec3::new(-1.0, 2.0, 98.0));
        cam.key(CameraKey::D);
        cam.key(CameraKey::S);
        cam.key(CameraKey::P);
        assert_eq!(cam.pose().position, Vec3::new(0.0, 1.0, 100.0));
    }

    #[test]
    fn pitch_clamps_at_quarter_turn() {
        let mut cam = CameraController::default();
        for _ in 0..100 {
            cam.key(CameraKey::ArrowDown);
        }
        assert_relative_eq!(cam.pose().pitch, MAX_PITCH);
        for _ in 0..200 {
            cam.key(CameraKey::ArrowUp);
        }
        assert_relative_eq!(cam.pose().pitch, -MAX_PITCH);
    }

    #[test]
    fn yaw_is_unbounded() {
        let mut cam = CameraController::default();
        for _ in 0..10 {
            cam.key(CameraKey::ArrowRight);
        }
        assert_relative_eq!(cam.pose().yaw, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn wheel_clamps_z() {
        let mut cam = CameraController::default();
        cam.wheel(10_000.0);
        assert_relative_eq!(cam.pose().position.z, MAX_WHEEL_Z);
        cam.wheel(-10_000.0);
        assert_relative_eq!(cam.pose().position.z, MIN_WHEEL_Z);
        cam.wheel(50.0);
        assert_relative_eq!(cam.pose().position.z, 25.0);
    }

    #[test]
    fn drag_rotates_only_while_pressed() {
        let mut cam = CameraController::default();
        assert!(!cam.handle(CameraInput::DragMove(Vec2::new(50.0, 0.0))));
        assert!(!cam.handle(CameraInput::DragStart(Vec2::ZERO)));
        assert!(cam.handle(CameraInput::DragMove(Vec2::new(100.0, 0.0))));
        assert_relative_eq!(cam.pose().yaw, -0.5, epsilon = 1e-6);
        cam.handle(CameraInput::DragEnd);
        assert!(!cam.handle(CameraInput::DragMove(Vec2::new(200.0, 0.0))));
    }

    #[test]
    fn focus_aims_at_target() {
        let mut cam = CameraController::default();
        cam.key(CameraKey::ArrowLeft);
        let target = Vec3::new(50.0, 0.0, 0.0);
        cam.focus_on(target);
        let pose = cam.pose();
        assert_eq!(pose.position, Vec3::new(50.0, 20.0, 100.0));
        let (f, _, _) = pose.basis();
        let want = (target - pose.position).normalize();
        assert_relative_eq!(f.x, want.x, epsilon = 1e-5);
        assert_relative_eq!(f.y, want.y, epsilon = 1e-5);
        assert_relative_eq!(f.z, want.z, epsilon = 1e-5);
    }

    #[test]
    fn reset_restores_mount_pose() {
        let home = CameraPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..CameraPose::default()
        };
        let mut cam = CameraController::new(home);
        cam.key(CameraKey::W);
        cam.key(CameraKey::ArrowRight);
        cam.reset_view();
        assert_eq!(cam.pose(), home);
    }

    #[test]
    fn center_ray_matches_forward_and_projects_back() {
        let cam = CameraController::default();
        let ray = cam.pick_ray(Vec2::ZERO, 1.5);
        assert_relative_eq!(ray.dir.z, -1.0, epsilon = 1e-6);
        let ndc = cam.project(Vec3::ZERO, 1.5).unwrap();
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(cam.project(Vec3::new(0.0, 0.0, 200.0), 1.5).is_none());
    }
}
