//! Stack-based first-hit traversal in a sign-mirrored frame.
//!
//! The cube lives in `[1, 2)^3`, so every coordinate has the same exponent
//! and the octree structure maps directly onto mantissa bits: a single
//! `dim_bit` mask toggles a cell corner between the lower and upper half of
//! the current cell, and halving the cell is one shift of that mask.
//!
//! Before traversal the ray is reflected about the cube center on every axis
//! where its direction is positive, recorded in `inv_signs`. With all
//! components negative, a cell is always exited through one of its three
//! *lower* faces and entered from the upper ones, which collapses the
//! traversal to three states:
//!
//! - **push** — the selected child is occupied: descend into it, picking the
//!   sub-cell the ray occupies at the current parameter.
//! - **step** — the selected child is empty: cross its tightest lower face
//!   into the neighbouring sibling.
//! - **pop** — the crossing leaves the parent cell: back up one level and
//!   step from there.
//!
//! Levels `1..BASE_DEPTH` have no stored nodes; they are implicitly dense
//! and always descended, with the running Morton prefix addressing the base
//! grid once the traversal reaches it.

use voxtree_core::{VoxelTree, BASE_DEPTH, DEPTH};

use crate::hit::{Hit, HitDirection};
use crate::ray::Ray;

/// Mantissa bit worth half the root cell: toggling it moves a cube
/// coordinate by 0.5.
const TOP_DIM_BIT: u32 = 1 << 22;

/// Exponent plus top mantissa bit of `[1, 2)` floats; `bits & HALF_MASK`
/// snaps a cube coordinate to 1.0 or 1.5.
const HALF_MASK: u32 = 0x3FC0_0000;

/// Largest `f32` below 2.0.
const ALMOST_TWO: f32 = f32::from_bits(0x3FFF_FFFF);

/// Mirrored direction components above `-MIN_DIR` (zeros and subnormals) are
/// flushed down to it. Their plane times then stay finite and huge: octant
/// selection follows the origin's position and the axis never wins the
/// exit-face minimum.
const MIN_DIR: f32 = 1e-30;

/// Trace `ray` through the tree, returning the first non-empty leaf.
///
/// Pure read; any number of traces may run concurrently over a tree that is
/// not being mutated.
pub fn trace(tree: &VoxelTree, ray: &Ray) -> Hit {
    let mut o = ray.origin.to_array();
    let mut d = ray.dir.to_array();

    // Reflect positive-direction axes about the cube center (1.5) so that
    // every component runs negative; child octants un-mirror via inv_signs.
    let mut inv_signs: u32 = 0;
    for k in 0..3 {
        if d[k] > 0.0 {
            o[k] = 3.0 - o[k];
            d[k] = -d[k];
            inv_signs |= 1 << k;
        }
        if d[k] > -MIN_DIR {
            d[k] = -MIN_DIR;
        }
    }

    // t(p) = p * coef + bias per axis, for any axis-aligned plane p.
    let mut coef = [0.0f32; 3];
    let mut bias = [0.0f32; 3];
    for k in 0..3 {
        coef[k] = 1.0 / d[k];
        bias[k] = -(o[k] * coef[k]);
    }

    // Clip against the cube slabs. Mirrored rays enter through the upper
    // (p = 2) planes and leave through the lower (p = 1) ones.
    let mut t_min = 0.0f32;
    let mut min_t_axis: u32 = 0; // stays 0 until some plane is crossed
    let mut t_exit = f32::INFINITY;
    for k in 0..3 {
        let entry = 2.0f32.mul_add(coef[k], bias[k]);
        let exit = coef[k] + bias[k];
        if entry > t_min {
            t_min = entry;
            min_t_axis = 1 << k;
        }
        if exit < t_exit {
            t_exit = exit;
        }
    }
    if t_min >= t_exit {
        return Hit::MISS;
    }

    // `pos` is the lower corner of the candidate child cell selected by
    // `idx`, kept as raw f32 bits. Seed both from the clipped entry point.
    let mut pos = [0u32; 3];
    let mut idx: u32 = 0;
    for k in 0..3 {
        let entry_point = t_min.mul_add(d[k], o[k]).clamp(1.0, ALMOST_TWO);
        pos[k] = entry_point.to_bits() & HALF_MASK;
        if pos[k] == 1.5f32.to_bits() {
            idx |= 1 << k;
        }
    }

    let mut dim_bit = TOP_DIM_BIT;
    let mut parents = [0u32; (DEPTH - 1) as usize];
    let mut sp = 0usize;
    let mut node: u32 = 0;
    let mut level: u32 = 1;
    let mut prefix: u64 = 0;

    // Push state: descend while the selected child is occupied.
    loop {
        let octant = ((idx ^ inv_signs) & 7) as usize;
        let child = if level < BASE_DEPTH {
            // Implicitly dense above the base grid: nothing to test.
            1
        } else if level == BASE_DEPTH {
            tree.root((prefix << 3) | octant as u64)
        } else {
            tree.node(node).children[octant]
        };

        if child != 0 {
            if level == DEPTH {
                return Hit {
                    direction: hit_face(min_t_axis, inv_signs, &d),
                    voxel: child,
                    time: t_min,
                };
            }
            parents[sp] = node;
            sp += 1;
            if level < BASE_DEPTH {
                prefix = (prefix << 3) | octant as u64;
            }
            node = child;
            level += 1;
            dim_bit >>= 1;

            // Select the sub-cell occupied at t_min: an axis whose mid-plane
            // crossing still lies ahead starts in the upper half.
            idx = 0;
            for k in 0..3 {
                let mid = f32::from_bits(pos[k] | dim_bit);
                if mid.mul_add(coef[k], bias[k]) >= t_min {
                    idx |= 1 << k;
                    pos[k] |= dim_bit;
                }
            }
            continue;
        }

        // Step state: cross into the neighbouring sibling, or pop when the
        // crossing would leave the parent.
        loop {
            let tx = f32::from_bits(pos[0]).mul_add(coef[0], bias[0]);
            let ty = f32::from_bits(pos[1]).mul_add(coef[1], bias[1]);
            let tz = f32::from_bits(pos[2]).mul_add(coef[2], bias[2]);
            if tx <= ty && tx <= tz {
                min_t_axis = 1;
                t_min = tx;
            } else if ty < tx && ty <= tz {
                min_t_axis = 2;
                t_min = ty;
            } else {
                min_t_axis = 4;
                t_min = tz;
            }

            if idx & min_t_axis != 0 {
                // Still inside the parent: move to the lower sibling.
                pos[min_t_axis.trailing_zeros() as usize] &= !dim_bit;
                idx ^= min_t_axis;
                break;
            }

            // Pop state: restore the parent cell and step again from there.
            if level <= BASE_DEPTH {
                prefix >>= 3;
            }
            level -= 1;
            if level == 0 {
                return Hit::MISS;
            }
            sp -= 1;
            node = parents[sp];
            for p in &mut pos {
                *p &= !dim_bit;
            }
            dim_bit <<= 1;
            idx = 0;
            for k in 0..3 {
                if pos[k] & dim_bit != 0 {
                    idx |= 1 << k;
                }
            }
        }
    }
}

/// Entry face of the hit voxel, un-mirrored into the caller's frame.
///
/// `min_t_axis == 0` means no plane was crossed before the hit — the origin
/// sits inside the hit voxel — so the dominant direction axis stands in.
fn hit_face(min_t_axis: u32, inv_signs: u32, d: &[f32; 3]) -> HitDirection {
    let axis_bit = if min_t_axis != 0 {
        min_t_axis
    } else {
        // All components are negative; the most negative dominates.
        let mut dominant = 0;
        for k in 1..3 {
            if d[k] < d[dominant] {
                dominant = k;
            }
        }
        1 << dominant
    };
    HitDirection::from_axis(axis_bit, inv_signs & axis_bit != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_tree_misses_everywhere() {
        let tree = VoxelTree::new();
        let rays = [
            Ray::from_voxel(Vec3::new(0.5, 0.5, -1.0), Vec3::new(0.0, 0.0, 1.0)),
            Ray::from_voxel(Vec3::new(-10.0, 2048.0, 2048.0), Vec3::new(1.0, 0.0, 0.0)),
            Ray::from_voxel(Vec3::new(2048.0, 2048.0, 2048.0), Vec3::new(0.3, -0.8, 0.5)),
        ];
        for ray in &rays {
            assert_eq!(trace(&tree, ray), Hit::MISS);
        }
    }

    #[test]
    fn ray_missing_the_cube_exits() {
        let tree = VoxelTree::new();
        // Parallel to the cube, off to the side.
        let ray = Ray::from_voxel(Vec3::new(-10.0, 8000.0, 0.5), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(trace(&tree, &ray), Hit::MISS);
        // Pointing away from the cube.
        let ray = Ray::from_voxel(Vec3::new(-10.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(trace(&tree, &ray), Hit::MISS);
    }

    #[test]
    fn single_voxel_from_negative_x() {
        let mut tree = VoxelTree::new();
        tree.set(0, 0, 0, 0x1234_5678).unwrap();
        let ray = Ray::from_voxel(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let hit = trace(&tree, &ray);
        assert_eq!(hit.direction, HitDirection::NegX);
        assert_eq!(hit.voxel, 0x1234_5678);
        assert!((hit.time - 1.0).abs() < 1e-3, "time {}", hit.time);
    }

    #[test]
    fn boundary_voxel_from_outside() {
        // Flush against the upper cube face: the clip seeds the entry face.
        let mut tree = VoxelTree::new();
        tree.set(4095, 0, 0, 3).unwrap();
        let ray = Ray::from_voxel(Vec3::new(4099.5, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        let hit = trace(&tree, &ray);
        assert_eq!(hit.direction, HitDirection::PosX);
        assert_eq!(hit.voxel, 3);
        assert!((hit.time - 3.5).abs() < 1e-3, "time {}", hit.time);
    }

    #[test]
    fn origin_inside_the_cube() {
        let mut tree = VoxelTree::new();
        tree.set(32, 10, 10, 5).unwrap();
        let ray = Ray::from_voxel(Vec3::new(10.0, 10.5, 10.5), Vec3::new(1.0, 0.0, 0.0));
        let hit = trace(&tree, &ray);
        assert_eq!(hit.direction, HitDirection::NegX);
        assert_eq!(hit.voxel, 5);
        assert!((hit.time - 22.0).abs() < 1e-3, "time {}", hit.time);
    }
}
