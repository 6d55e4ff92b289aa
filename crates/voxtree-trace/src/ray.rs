//! Rays in the traversal's cube coordinate frame.

use glam::Vec3;
use voxtree_core::DIM;

/// A ray in cube space: the tree occupies `[1, 2)^3`, with voxel `v` mapped
/// to `1 + v / DIM` per axis. The leading mantissa bit of that range is what
/// lets the traversal halve cells with a single bit mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// A ray already expressed in cube coordinates.
    #[inline]
    pub const fn new(origin: Vec3, dir: Vec3) -> Ray {
        Ray { origin, dir }
    }

    /// Map a voxel-space ray into cube space.
    ///
    /// The map is affine on origin and direction alike, so the ray parameter
    /// — and with it [`Hit::time`](crate::Hit::time) — stays in the caller's
    /// units.
    #[inline]
    pub fn from_voxel(origin: Vec3, dir: Vec3) -> Ray {
        Ray {
            origin: Vec3::ONE + origin / DIM as f32,
            dir: dir / DIM as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Ray;
    use glam::Vec3;

    #[test]
    fn voxel_map_is_affine() {
        let ray = Ray::from_voxel(Vec3::new(0.0, 2048.0, 4096.0), Vec3::new(4096.0, 0.0, 0.0));
        assert_eq!(ray.origin, Vec3::new(1.0, 1.5, 2.0));
        assert_eq!(ray.dir, Vec3::new(1.0, 0.0, 0.0));
    }
}
