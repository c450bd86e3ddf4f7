use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Distance between camera and target point for a fresh or reset camera.
pub const STANDARD_ZOOM: f32 = 5.0;

const MAX_VERTICAL_ANGLE: f32 = 90.0;

/// Orbit camera parameterised by a target point, a zoom distance and two
/// orbit angles in degrees.
///
/// Position and view matrix are derived state: every mutator recomputes
/// them before returning, so the accessors always agree with the orbit
/// parameters.
///
/// Positioning: `Ry(horizontal) * Rx(vertical) * T(target) * T(0, 0, zoom)`
/// applied to the origin. The target therefore lives in the un-rotated
/// orbit frame and the camera always looks at `Ry * Rx * target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    target: Vec3,
    zoom: f32,
    horizontal: f32,
    vertical: f32,
    position: Vec3,
    pitch: f32,
    yaw: f32,
    roll: f32,
    view: Mat4,
    initial: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    position: Vec3,
    pitch: f32,
    yaw: f32,
    roll: f32,
}

/// Plain snapshot of a camera, for logs and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f32,
    pub horizontal_angle: f32,
    pub vertical_angle: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Camera {
    /// Place a camera at `position` with the given orientation in degrees.
    /// Pitch is clamped to the vertical orbit range.
    pub fn new(position: Vec3, pitch: f32, yaw: f32, roll: f32) -> Self {
        let initial = Pose {
            position,
            pitch: pitch.clamp(-MAX_VERTICAL_ANGLE, MAX_VERTICAL_ANGLE),
            yaw,
            roll,
        };
        let mut camera = Self {
            target: Vec3::ZERO,
            zoom: STANDARD_ZOOM,
            horizontal: 0.0,
            vertical: 0.0,
            position,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            view: Mat4::IDENTITY,
            initial,
        };
        camera.apply_pose(initial);
        tracing::debug!(?position, pitch, yaw, roll, "camera created");
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Point the camera is looking at, in world space.
    pub fn look_at_point(&self) -> Vec3 {
        self.orbit_rotation().transform_point3(self.target)
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom
    }

    pub fn horizontal_angle(&self) -> f32 {
        self.horizontal
    }

    pub fn vertical_angle(&self) -> f32 {
        self.vertical
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            target: self.target,
            zoom: self.zoom,
            horizontal_angle: self.horizontal,
            vertical_angle: self.vertical,
            pitch: self.pitch,
            yaw: self.yaw,
            roll: self.roll,
        }
    }

    pub fn orbit_horizontal(&mut self, degrees: f32) {
        self.horizontal += degrees;
        self.reposition();
    }

    pub fn orbit_vertical(&mut self, degrees: f32) {
        self.vertical = (self.vertical + degrees).clamp(-MAX_VERTICAL_ANGLE, MAX_VERTICAL_ANGLE);
        self.reposition();
    }

    /// Change the orbit distance. Never goes below zero.
    pub fn zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).max(0.0);
        self.reposition();
    }

    /// Move the target (and with it the camera) along the camera's own
    /// right, up and forward axes.
    pub fn pan_relative(&mut self, dx: f32, dy: f32, dz: f32) {
        let right = self.view.row(0).truncate().normalize_or_zero();
        let up = self.view.row(1).truncate().normalize_or_zero();
        let forward = -self.view.row(2).truncate().normalize_or_zero();
        let world = right * dx + up * dy + forward * dz;
        // target lives in the un-rotated orbit frame
        self.target += self.orbit_rotation().inverse().transform_vector3(world);
        self.reposition();
    }

    /// Restore the construction-time position and orientation and rebuild
    /// the target from it.
    pub fn reset(&mut self) {
        self.apply_pose(self.initial);
    }

    fn apply_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.pitch = pose.pitch;
        self.yaw = pose.yaw;
        self.roll = pose.roll;
        self.horizontal = -pose.yaw;
        self.vertical = -pose.pitch;
        self.zoom = STANDARD_ZOOM;
        self.target = self
            .orbit_rotation()
            .inverse()
            .transform_point3(pose.position)
            - Vec3::new(0.0, 0.0, self.zoom);
        self.update_view();
    }

    fn orbit_rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.horizontal.to_radians())
            * Mat4::from_rotation_x(self.vertical.to_radians())
    }

    fn reposition(&mut self) {
        let positioning = self.orbit_rotation()
            * Mat4::from_translation(self.target)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, self.zoom));
        self.position = positioning.transform_point3(Vec3::ZERO);
        self.yaw = -self.horizontal;
        self.pitch = -self.vertical;
        self.update_view();
    }

    fn update_view(&mut self) {
        self.view = Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
            * Mat4::from_rotation_z(self.roll.to_radians())
            * Mat4::from_translation(-self.position);
    }
}

/// Fixed set of cameras with one active at a time. Never empty.
#[derive(Debug, Clone)]
pub struct CameraRegistry {
    cameras: Vec<Camera>,
    active: usize,
}

impl CameraRegistry {
    pub fn new(first: Camera) -> Self {
        Self {
            cameras: vec![first],
            active: 0,
        }
    }

    /// Register another camera and return its slot.
    pub fn add(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    /// Always at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Camera {
        &self.cameras[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Camera {
        &mut self.cameras[self.active]
    }

    pub fn get(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    /// Activate `index` if it exists.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.cameras.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Cycle forward, wrapping around.
    pub fn next(&mut self) -> &Camera {
        self.active = (self.active + 1) % self.cameras.len();
        self.active()
    }

    /// Cycle backward, wrapping around.
    pub fn previous(&mut self) -> &Camera {
        self.active = (self.active + self.cameras.len() - 1) % self.cameras.len();
        self.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    fn assert_consistent(cam: &Camera) {
        let expected = (cam.orbit_rotation()
            * Mat4::from_translation(cam.target())
            * Mat4::from_translation(Vec3::new(0.0, 0.0, cam.zoom_level())))
        .transform_point3(Vec3::ZERO);
        assert!(
            approx(cam.position(), expected),
            "{:?} vs {:?}",
            cam.position(),
            expected
        );
        let eye = cam.view_matrix().inverse().transform_point3(Vec3::ZERO);
        assert!(approx(eye, cam.position()));
    }

    #[test]
    fn orbit_horizontal_90_swaps_axes() {
        let mut cam = Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0);
        assert!(approx(cam.target(), Vec3::new(0.0, 5.0, 0.0)));
        cam.orbit_horizontal(90.0);
        assert!(approx(cam.position(), Vec3::new(5.0, 5.0, 0.0)), "{:?}", cam.position());
        assert_eq!(cam.yaw(), -90.0);
    }

    #[test]
    fn construction_is_consistent() {
        let cam = Camera::new(Vec3::new(3.0, 4.0, 12.0), 20.0, 35.0, 0.0);
        assert_consistent(&cam);
        assert_eq!(cam.horizontal_angle(), -35.0);
        assert_eq!(cam.vertical_angle(), -20.0);
    }

    #[test]
    fn camera_looks_at_target() {
        let mut cam = Camera::new(Vec3::new(1.0, 2.0, 9.0), 15.0, -40.0, 0.0);
        cam.orbit_horizontal(33.0);
        cam.orbit_vertical(-12.0);
        let in_view = cam.view_matrix().transform_point3(cam.look_at_point());
        assert!(approx(in_view, Vec3::new(0.0, 0.0, -cam.zoom_level())), "{in_view:?}");
    }

    #[test]
    fn orbit_round_trip() {
        let mut cam = Camera::new(Vec3::new(2.0, 3.0, 10.0), 10.0, 20.0, 0.0);
        let before = cam.position();
        let angle = cam.horizontal_angle();
        cam.orbit_horizontal(47.5);
        cam.orbit_horizontal(-47.5);
        assert!((cam.horizontal_angle() - angle).abs() < EPS);
        assert!(approx(cam.position(), before));
    }

    #[test]
    fn vertical_angle_and_zoom_stay_in_range() {
        let mut cam = Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0);
        let steps = [37.0, 80.0, -300.0, 45.0, 200.0, -15.0, 91.0];
        for (i, d) in steps.iter().enumerate() {
            cam.orbit_vertical(*d);
            cam.orbit_horizontal(*d * 0.5);
            cam.zoom(if i % 2 == 0 { -4.0 } else { 1.5 });
            assert!((-90.0..=90.0).contains(&cam.vertical_angle()));
            assert!(cam.zoom_level() >= 0.0);
            assert_consistent(&cam);
        }
    }

    #[test]
    fn construction_clamps_pitch() {
        let cam = Camera::new(Vec3::new(0.0, 5.0, 5.0), 120.0, 0.0, 0.0);
        assert_eq!(cam.pitch(), 90.0);
        assert_eq!(cam.vertical_angle(), -90.0);
    }

    #[test]
    fn zero_zoom_puts_camera_on_target() {
        let mut cam = Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0);
        cam.zoom(-100.0);
        assert_eq!(cam.zoom_level(), 0.0);
        assert!(approx(cam.position(), cam.look_at_point()));
    }

    #[test]
    fn reset_restores_exact_pose() {
        let mut cam = Camera::new(Vec3::new(1.5, 2.5, 7.25), 12.0, -33.0, 4.0);
        let original = (cam.position(), cam.pitch(), cam.yaw(), cam.roll());
        let view = cam.view_matrix();
        cam.orbit_horizontal(70.0);
        cam.orbit_vertical(-25.0);
        cam.zoom(3.0);
        cam.pan_relative(1.0, -2.0, 0.5);
        cam.reset();
        assert_eq!((cam.position(), cam.pitch(), cam.yaw(), cam.roll()), original);
        assert_eq!(cam.view_matrix(), view);
        assert_eq!(cam.zoom_level(), STANDARD_ZOOM);
    }

    #[test]
    fn pan_moves_along_camera_axes() {
        let mut cam = Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0);
        cam.orbit_horizontal(90.0);
        let right = cam.view_matrix().row(0).truncate();
        let before = cam.position();
        cam.pan_relative(2.0, 0.0, 0.0);
        assert!(approx(cam.position() - before, right * 2.0));

        let forward = -cam.view_matrix().row(2).truncate();
        let before = cam.position();
        cam.pan_relative(0.0, 0.0, 1.0);
        assert!(approx(cam.position() - before, forward));
        assert_consistent(&cam);
    }

    #[test]
    fn pan_up_uses_up_axis() {
        let mut cam = Camera::new(Vec3::new(0.0, 5.0, 5.0), 30.0, 0.0, 0.0);
        let up = cam.view_matrix().row(1).truncate();
        let before = cam.position();
        cam.pan_relative(0.0, 1.0, 0.0);
        assert!(approx(cam.position() - before, up));
    }

    #[test]
    fn registry_cycles_both_ways() {
        let mut reg = CameraRegistry::new(Camera::new(Vec3::ZERO, 0.0, 0.0, 0.0));
        reg.add(Camera::new(Vec3::X, 0.0, 0.0, 0.0));
        reg.add(Camera::new(Vec3::Y, 0.0, 0.0, 0.0));
        assert_eq!(reg.len(), 3);
        reg.next();
        assert_eq!(reg.active_index(), 1);
        reg.previous();
        reg.previous();
        assert_eq!(reg.active_index(), 2);
        reg.next();
        assert_eq!(reg.active_index(), 0);
        assert!(!reg.set_active(3));
        assert!(reg.set_active(2));
        assert_eq!(reg.active().position(), Vec3::Y);
    }

    #[test]
    fn single_camera_registry_cycles_to_itself() {
        let mut reg = CameraRegistry::new(Camera::new(Vec3::Z, 0.0, 0.0, 0.0));
        assert_eq!(reg.len(), 1);
        reg.next();
        reg.previous();
        assert_eq!(reg.active_index(), 0);
        assert!(approx(reg.active().position(), Vec3::Z));
    }
}
