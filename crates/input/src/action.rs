use glam::Vec3;

/// A high-level action produced from raw input.
///
/// The scene and the render toggles consume actions, never raw input
/// events, so every control scheme drives the same camera and renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Orbit around the target by degrees.
    OrbitHorizontal(f32),
    OrbitVertical(f32),
    /// Change the orbit distance.
    Zoom(f32),
    /// Move along the camera's right, up and forward axes.
    Pan(Vec3),
    ResetCamera,
    NextCamera,
    PreviousCamera,
    ToggleWireframe,
    ToggleFlatShading,
    ToggleCulling,
    /// Toggle the scene light at this index.
    ToggleLight(usize),
    /// Pick whatever was drawn at this window pixel (top-left origin).
    Pick { x: u32, y: u32 },
    Noop,
}

impl Action {
    /// Pick action for a cursor position; negative coordinates clamp to 0.
    pub fn pick_at(x: f64, y: f64) -> Self {
        let clamp = |v: f64| if v.is_finite() && v > 0.0 { v.floor() as u32 } else { 0 };
        Action::Pick {
            x: clamp(x),
            y: clamp(y),
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(
            self,
            Action::OrbitHorizontal(_)
                | Action::OrbitVertical(_)
                | Action::Zoom(_)
                | Action::Pan(_)
                | Action::ResetCamera
                | Action::NextCamera
                | Action::PreviousCamera
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_at_floors_and_clamps() {
        assert_eq!(Action::pick_at(10.7, 3.2), Action::Pick { x: 10, y: 3 });
        assert_eq!(Action::pick_at(-4.0, f64::NAN), Action::Pick { x: 0, y: 0 });
    }

    #[test]
    fn camera_actions() {
        assert!(Action::Zoom(1.0).is_camera());
        assert!(Action::NextCamera.is_camera());
        assert!(!Action::ToggleWireframe.is_camera());
        assert!(!Action::Pick { x: 0, y: 0 }.is_camera());
    }
}
