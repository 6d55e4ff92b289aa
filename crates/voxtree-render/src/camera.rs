//! Pinhole camera generating per-pixel rays in voxel space.

use glam::Vec3;
use voxtree_trace::Ray;

/// Pinhole camera; `eye` and `look_at` are voxel-space coordinates and may
/// sit outside the volume (the traversal clips against it).
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    eye: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    half_width: f32,
    half_height: f32,
}

impl Camera {
    /// `fov_y` is the vertical field of view in degrees; `aspect` is
    /// width / height of the render target.
    pub fn new(eye: Vec3, look_at: Vec3, fov_y: f32, aspect: f32) -> Camera {
        let forward = (look_at - eye).normalize();
        // World up, unless the camera looks straight along it.
        let up_hint = if forward.y.abs() > 0.999 { Vec3::X } else { Vec3::Y };
        let right = forward.cross(up_hint).normalize();
        let up = right.cross(forward);
        let half_height = (fov_y.to_radians() * 0.5).tan();
        Camera {
            eye,
            right,
            up,
            forward,
            half_width: half_height * aspect,
            half_height,
        }
    }

    /// Ray through the center of pixel `(px, py)` on a `width x height`
    /// target, mapped into the traversal's cube frame.
    #[inline]
    pub fn pixel_ray(&self, px: u32, py: u32, width: u32, height: u32) -> Ray {
        let sx = ((px as f32 + 0.5) / width as f32) * 2.0 - 1.0;
        let sy = 1.0 - ((py as f32 + 0.5) / height as f32) * 2.0;
        let dir = self.forward + self.right * (sx * self.half_width) + self.up * (sy * self.half_height);
        Ray::from_voxel(self.eye, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::Camera;
    use glam::Vec3;
    use voxtree_core::DIM;

    #[test]
    fn center_pixel_looks_forward() {
        let eye = Vec3::new(0.0, 0.0, -100.0);
        let target = Vec3::new(0.0, 0.0, 100.0);
        let camera = Camera::new(eye, target, 60.0, 1.0);

        // Odd-sized target so a pixel center sits on the axis.
        let ray = camera.pixel_ray(50, 50, 101, 101);
        let dir = ray.dir.normalize();
        assert!((dir - Vec3::Z).length() < 1e-3, "dir {dir}");
    }

    #[test]
    fn rays_start_at_the_mapped_eye() {
        let eye = Vec3::new(2048.0, 2048.0, -512.0);
        let camera = Camera::new(eye, Vec3::new(2048.0, 2048.0, 0.0), 45.0, 2.0);
        let ray = camera.pixel_ray(0, 0, 64, 32);
        let expected = Vec3::ONE + eye / DIM as f32;
        assert!((ray.origin - expected).length() < 1e-6);
    }

    #[test]
    fn vertical_view_does_not_degenerate() {
        let camera = Camera::new(Vec3::new(0.0, 500.0, 0.0), Vec3::ZERO, 60.0, 1.0);
        let ray = camera.pixel_ray(3, 7, 16, 16);
        assert!(ray.dir.length() > 0.0);
        assert!(ray.dir.is_finite());
    }
}
