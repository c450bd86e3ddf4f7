use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Action;

/// Camera step per key press, in world units.
pub const PAN_STEP: f32 = 0.1;
/// Orbit step per key press, in degrees.
pub const ORBIT_STEP: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.5;

/// Keys the controls react to, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    R,
    F1,
    F2,
    F3,
    F4,
    F5,
    /// Text input, for the single-character bindings.
    Char(char),
}

/// How movement keys drive the camera. Everything else is shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    /// Arrows and WASD orbit around the target; W/S zoom.
    #[default]
    Orbit,
    /// Arrows and WASD slide the camera along its own axes.
    Pan,
}

impl ControlScheme {
    pub fn map_key(self, key: Key) -> Action {
        if let Some(action) = self.movement(key) {
            return action;
        }
        match key {
            Key::R => Action::ResetCamera,
            Key::F1 | Key::Char('p') => Action::PreviousCamera,
            Key::F2 | Key::Char('n') => Action::NextCamera,
            Key::F3 => Action::ToggleWireframe,
            Key::F4 => Action::ToggleFlatShading,
            Key::F5 => Action::ToggleCulling,
            Key::Char(c @ '1'..='9') => Action::ToggleLight(c as usize - '1' as usize),
            _ => Action::Noop,
        }
    }

    /// Scroll maps to zoom in both schemes; positive scroll moves closer.
    pub fn map_scroll(self, lines: f32) -> Action {
        if lines == 0.0 || !lines.is_finite() {
            return Action::Noop;
        }
        Action::Zoom(-lines * ZOOM_STEP)
    }

    fn movement(self, key: Key) -> Option<Action> {
        let action = match (self, key) {
            (ControlScheme::Orbit, Key::Left | Key::A) => Action::OrbitHorizontal(-ORBIT_STEP),
            (ControlScheme::Orbit, Key::Right | Key::D) => Action::OrbitHorizontal(ORBIT_STEP),
            (ControlScheme::Orbit, Key::Up) => Action::OrbitVertical(ORBIT_STEP),
            (ControlScheme::Orbit, Key::Down) => Action::OrbitVertical(-ORBIT_STEP),
            (ControlScheme::Orbit, Key::W) => Action::Zoom(-ZOOM_STEP),
            (ControlScheme::Orbit, Key::S) => Action::Zoom(ZOOM_STEP),
            (ControlScheme::Pan, Key::Left | Key::A) => Action::Pan(Vec3::new(-PAN_STEP, 0.0, 0.0)),
            (ControlScheme::Pan, Key::Right | Key::D) => Action::Pan(Vec3::new(PAN_STEP, 0.0, 0.0)),
            (ControlScheme::Pan, Key::Up) => Action::Pan(Vec3::new(0.0, PAN_STEP, 0.0)),
            (ControlScheme::Pan, Key::Down) => Action::Pan(Vec3::new(0.0, -PAN_STEP, 0.0)),
            (ControlScheme::Pan, Key::W) => Action::Pan(Vec3::new(0.0, 0.0, PAN_STEP)),
            (ControlScheme::Pan, Key::S) => Action::Pan(Vec3::new(0.0, 0.0, -PAN_STEP)),
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes_share_non_movement_keys() {
        for scheme in [ControlScheme::Orbit, ControlScheme::Pan] {
            assert_eq!(scheme.map_key(Key::F1), Action::PreviousCamera);
            assert_eq!(scheme.map_key(Key::Char('n')), Action::NextCamera);
            assert_eq!(scheme.map_key(Key::F3), Action::ToggleWireframe);
            assert_eq!(scheme.map_key(Key::F4), Action::ToggleFlatShading);
            assert_eq!(scheme.map_key(Key::F5), Action::ToggleCulling);
            assert_eq!(scheme.map_key(Key::R), Action::ResetCamera);
            assert_eq!(scheme.map_key(Key::Char('2')), Action::ToggleLight(1));
            assert_eq!(scheme.map_key(Key::Char('x')), Action::Noop);
        }
    }

    #[test]
    fn movement_differs_by_scheme() {
        assert_eq!(
            ControlScheme::Orbit.map_key(Key::A),
            Action::OrbitHorizontal(-ORBIT_STEP)
        );
        assert_eq!(
            ControlScheme::Pan.map_key(Key::A),
            Action::Pan(Vec3::new(-PAN_STEP, 0.0, 0.0))
        );
        assert_eq!(ControlScheme::Orbit.map_key(Key::W), Action::Zoom(-ZOOM_STEP));
    }

    #[test]
    fn scroll_zooms() {
        assert_eq!(ControlScheme::Pan.map_scroll(2.0), Action::Zoom(-1.0));
        assert_eq!(ControlScheme::Orbit.map_scroll(0.0), Action::Noop);
    }
}
