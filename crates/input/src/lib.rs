//! Input layer: raw keys, scroll and clicks mapped to [`Action`]s through a
//! [`ControlScheme`], and actions applied to the scene and render toggles.
//!
//! # Invariants
//! - One camera type for every scheme; schemes differ only in their
//!   mapping tables.
//! - Applying an action never touches the batch buffers; picks are handed
//!   back to the caller to resolve against the last rendered frame.

pub mod action;
mod scheme;

pub use action::Action;
pub use scheme::{ControlScheme, Key, ORBIT_STEP, PAN_STEP, ZOOM_STEP};

use pickview_render::RenderToggles;
use pickview_scene::Scene;

/// What the caller still has to do after an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// Read the pick target at this window pixel.
    Pick { x: u32, y: u32 },
    Ignored,
}

/// Apply `action` to the scene camera, lights and render toggles.
pub fn apply(action: Action, scene: &mut Scene, toggles: &mut RenderToggles) -> Dispatch {
    match action {
        Action::OrbitHorizontal(d) => scene.update_camera(|c| c.orbit_horizontal(d)),
        Action::OrbitVertical(d) => scene.update_camera(|c| c.orbit_vertical(d)),
        Action::Zoom(d) => scene.update_camera(|c| c.zoom(d)),
        Action::Pan(d) => scene.update_camera(|c| c.pan_relative(d.x, d.y, d.z)),
        Action::ResetCamera => scene.update_camera(|c| c.reset()),
        Action::NextCamera => scene.next_camera(),
        Action::PreviousCamera => scene.previous_camera(),
        Action::ToggleWireframe => {
            let on = toggles.toggle_wireframe();
            tracing::info!(on, "wireframe");
        }
        Action::ToggleFlatShading => {
            let mode = toggles.toggle_shading();
            tracing::info!(?mode, "shading");
        }
        Action::ToggleCulling => {
            let on = toggles.toggle_culling();
            tracing::info!(on, "back-face culling");
        }
        Action::ToggleLight(index) => {
            if index >= scene.lights().len() {
                return Dispatch::Ignored;
            }
            let changed = scene.toggle_light(index);
            tracing::info!(index, changed, "light toggle");
        }
        Action::Pick { x, y } => return Dispatch::Pick { x, y },
        Action::Noop => return Dispatch::Ignored,
    }
    if action.is_camera() {
        tracing::trace!(position = ?scene.camera().position(), "camera moved");
    }
    Dispatch::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pickview_assets::HeadlessLoader;
    use pickview_render::ShadingMode;
    use pickview_scene::demo::{CAMERA_LIGHT, SUN_LIGHT, build_demo_scene};

    fn demo() -> Scene {
        build_demo_scene(&mut HeadlessLoader::new()).unwrap()
    }

    #[test]
    fn orbit_keys_move_camera_and_attached_light() {
        let mut scene = demo();
        let mut toggles = RenderToggles::default();
        let before = scene.camera().position();
        let action = ControlScheme::Orbit.map_key(Key::Right);
        assert_eq!(apply(action, &mut scene, &mut toggles), Dispatch::Handled);
        let after = scene.camera().position();
        assert!(before.distance(after) > 1e-4);
        assert!(scene.lights()[CAMERA_LIGHT].position.distance(after) < 1e-4);

        apply(Action::ResetCamera, &mut scene, &mut toggles);
        assert!(scene.camera().position().distance(before) < 1e-4);
    }

    #[test]
    fn toggles_flip() {
        let mut scene = demo();
        let mut toggles = RenderToggles::default();
        apply(Action::ToggleWireframe, &mut scene, &mut toggles);
        apply(Action::ToggleFlatShading, &mut scene, &mut toggles);
        apply(Action::ToggleCulling, &mut scene, &mut toggles);
        assert!(toggles.wireframe());
        assert_eq!(toggles.shading(), ShadingMode::Flat);
        assert!(!toggles.culling());
    }

    #[test]
    fn light_toggles_respect_lock() {
        let mut scene = demo();
        let mut toggles = RenderToggles::default();
        apply(Action::ToggleLight(CAMERA_LIGHT), &mut scene, &mut toggles);
        assert_eq!(scene.lights()[CAMERA_LIGHT].effective_color(), Vec3::ZERO);
        apply(Action::ToggleLight(SUN_LIGHT), &mut scene, &mut toggles);
        assert_ne!(scene.lights()[SUN_LIGHT].effective_color(), Vec3::ZERO);
        assert_eq!(
            apply(Action::ToggleLight(99), &mut scene, &mut toggles),
            Dispatch::Ignored
        );
    }

    #[test]
    fn camera_cycling() {
        let mut scene = demo();
        let mut toggles = RenderToggles::default();
        let first = scene.cameras().active_index();
        apply(Action::NextCamera, &mut scene, &mut toggles);
        assert_ne!(scene.cameras().active_index(), first);
        apply(Action::PreviousCamera, &mut scene, &mut toggles);
        assert_eq!(scene.cameras().active_index(), first);
    }

    #[test]
    fn picks_are_handed_back() {
        let mut scene = demo();
        let mut toggles = RenderToggles::default();
        assert_eq!(
            apply(Action::pick_at(12.5, 40.0), &mut scene, &mut toggles),
            Dispatch::Pick { x: 12, y: 40 }
        );
        assert_eq!(apply(Action::Noop, &mut scene, &mut toggles), Dispatch::Ignored);
    }
}
