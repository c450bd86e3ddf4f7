use glam::Mat4;
use pickview_common::Viewport;

use crate::config::ProjectionConfig;

/// Perspective projection rebuilt whenever the viewport changes.
///
/// Uses a right-handed perspective with a `[0, 1]` depth range, which is
/// what wgpu clip space expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    viewport: Viewport,
    matrix: Mat4,
}

impl Projection {
    pub fn new(config: &ProjectionConfig, viewport: Viewport) -> Self {
        let mut projection = Self {
            fov_degrees: config.fov_degrees,
            near: config.near_plane,
            far: config.far_plane,
            viewport,
            matrix: Mat4::IDENTITY,
        };
        projection.rebuild();
        projection
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.matrix = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.viewport.aspect(),
            self.near,
            self.far,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    fn projection(width: u32, height: u32) -> Projection {
        Projection::new(&ProjectionConfig::default(), Viewport::new(width, height))
    }

    #[test]
    fn near_and_far_map_to_depth_range() {
        let p = projection(700, 700);
        let near = p.matrix() * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = p.matrix() * Vec4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn vertical_fov_is_70_degrees() {
        let p = projection(700, 700);
        let edge = Vec3::new(0.0, 35f32.to_radians().tan(), -1.0);
        let clip = p.matrix() * edge.extend(1.0);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut p = projection(700, 700);
        let square = p.matrix();
        p.resize(Viewport::new(1400, 700));
        assert_ne!(p.matrix(), square);
        assert_eq!(p.matrix().x_axis.x * 2.0, square.x_axis.x);
        assert_eq!(p.viewport().width, 1400);
    }
}
