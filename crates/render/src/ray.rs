//! Geometric picking: unproject a window point into a world-space ray and
//! test it against bounding spheres.
//!
//! This path is approximate and independent of the pick buffer; the GPU
//! pick result wins whenever both are available.

use glam::{Mat4, Vec2, Vec3, Vec4};
use pickview_common::Viewport;
use pickview_scene::Camera;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Converts window coordinates (origin top-left, y down) into world rays.
#[derive(Debug, Clone, Copy)]
pub struct RayCaster {
    inverse_projection: Mat4,
    viewport: Viewport,
}

impl RayCaster {
    pub fn new(projection: Mat4, viewport: Viewport) -> Self {
        Self {
            inverse_projection: projection.inverse(),
            viewport,
        }
    }

    /// World-space direction through window point `point`.
    pub fn cast_ray(&self, view: Mat4, point: Vec2) -> Vec3 {
        let ndc = self.normalized_device_coords(point);
        let clip = Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
        let eye = self.inverse_projection * clip;
        let eye = Vec4::new(eye.x, eye.y, -1.0, 0.0);
        let world = view.inverse() * eye;
        world.truncate().normalize_or_zero()
    }

    /// Ray from the camera through window point `point`.
    pub fn ray_from(&self, camera: &Camera, point: Vec2) -> Ray {
        Ray {
            origin: camera.position(),
            direction: self.cast_ray(camera.view_matrix(), point),
        }
    }

    fn normalized_device_coords(&self, point: Vec2) -> Vec2 {
        let w = self.viewport.width.max(1) as f32;
        let h = self.viewport.height.max(1) as f32;
        Vec2::new(2.0 * point.x / w - 1.0, 1.0 - 2.0 * point.y / h)
    }
}

/// Distance along `ray` to the nearest non-negative hit on the sphere, if
/// any. A ray starting inside the sphere hits its far side.
pub fn sphere_intersection(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - ray.origin;
    let projection = to_center.dot(ray.direction);
    let distance_sq = to_center.length_squared() - projection * projection;
    let radius_sq = radius * radius;
    if distance_sq > radius_sq {
        return None;
    }
    let inner = (radius_sq - distance_sq).sqrt();
    let near = projection - inner;
    let far = projection + inner;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

pub fn intersects_sphere(ray: &Ray, center: Vec3, radius: f32) -> bool {
    sphere_intersection(ray, center, radius).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Projection, config::ProjectionConfig};

    fn caster() -> RayCaster {
        let viewport = Viewport::new(700, 700);
        let projection = Projection::new(&ProjectionConfig::default(), viewport);
        RayCaster::new(projection.matrix(), viewport)
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn centre_ray_points_forward() {
        let camera = Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0);
        let dir = caster().cast_ray(camera.view_matrix(), Vec2::new(350.0, 350.0));
        assert!(approx(dir, Vec3::new(0.0, 0.0, -1.0)), "{dir:?}");
    }

    #[test]
    fn top_of_window_points_up() {
        let camera = Camera::new(Vec3::ZERO, 0.0, 0.0, 0.0);
        let dir = caster().cast_ray(camera.view_matrix(), Vec2::new(350.0, 0.0));
        assert!(dir.y > 0.0);
        // half the vertical fov above the axis
        let angle = dir.y.atan2(-dir.z).to_degrees();
        assert!((angle - 35.0).abs() < 1e-3, "{angle}");
    }

    #[test]
    fn ray_follows_camera_orientation() {
        let mut camera = Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0);
        camera.orbit_horizontal(90.0);
        let ray = caster().ray_from(&camera, Vec2::new(350.0, 350.0));
        assert!(approx(ray.origin, Vec3::new(5.0, 5.0, 0.0)));
        assert!(approx(ray.direction, Vec3::new(-1.0, 0.0, 0.0)), "{:?}", ray.direction);
    }

    #[test]
    fn sphere_hit_returns_nearest_root() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        let t = sphere_intersection(&ray, Vec3::new(0.0, 0.0, -10.0), 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
        assert!(approx(ray.at(t), Vec3::new(0.0, 0.0, -8.0)));
        assert!(intersects_sphere(&ray, Vec3::new(0.0, 1.9, -10.0), 2.0));
    }

    #[test]
    fn sphere_miss_and_behind() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        assert!(!intersects_sphere(&ray, Vec3::new(0.0, 3.0, -10.0), 2.0));
        assert!(!intersects_sphere(&ray, Vec3::new(0.0, 0.0, 10.0), 2.0));
    }

    #[test]
    fn origin_inside_sphere_hits_far_side() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::X,
        };
        let t = sphere_intersection(&ray, Vec3::ZERO, 3.0).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
    }
}
