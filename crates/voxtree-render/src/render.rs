//! Row-partitioned parallel rendering over an immutable tree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::info;
use voxtree_core::VoxelTree;
use voxtree_trace::{trace, Hit, HitDirection};

use crate::camera::Camera;
use crate::framebuffer::Framebuffer;

/// Color for rays that leave the tree without hitting anything.
const SKY: [u8; 3] = [24, 30, 44];

/// Renders a tree through a camera into a [`Framebuffer`].
///
/// Traversal is a pure read, so worker threads share the tree without any
/// synchronization and write disjoint row bands of the target.
pub struct Renderer {
    width: u32,
    height: u32,
    threads: usize,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Renderer {
        Renderer {
            width,
            height,
            threads: 1,
        }
    }

    /// Use up to `threads` workers (at least one).
    pub fn with_threads(mut self, threads: usize) -> Renderer {
        self.threads = threads.max(1);
        self
    }

    /// Render a frame.
    pub fn render(&self, tree: &VoxelTree, camera: &Camera) -> Framebuffer {
        let started = Instant::now();
        let mut frame = Framebuffer::new(self.width, self.height);
        let (width, height) = (self.width, self.height);

        let hit_count = if self.threads == 1 {
            // Single-thread fast path — no scope overhead.
            let hits = AtomicU64::new(0);
            render_band(tree, camera, 0, frame.data_mut(), width, height, &hits);
            hits.into_inner()
        } else {
            let rows_per_band = height.div_ceil(self.threads as u32).max(1);
            let band_bytes = (rows_per_band * width * 3) as usize;
            let bands: Vec<&mut [u8]> = frame.data_mut().chunks_mut(band_bytes).collect();
            let counters: Vec<AtomicU64> = bands.iter().map(|_| AtomicU64::new(0)).collect();

            std::thread::scope(|scope| {
                for (band_index, band) in bands.into_iter().enumerate() {
                    let counter = &counters[band_index];
                    let first_row = band_index as u32 * rows_per_band;
                    scope.spawn(move || {
                        render_band(tree, camera, first_row, band, width, height, counter);
                    });
                }
            });
            // scope joined every worker here

            counters.iter().map(|c| c.load(Ordering::Relaxed)).sum()
        };

        info!(
            width,
            height,
            threads = self.threads,
            hits = hit_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frame rendered"
        );
        frame
    }
}

/// Fill one horizontal band, `band` being its slice of the pixel buffer.
fn render_band(
    tree: &VoxelTree,
    camera: &Camera,
    first_row: u32,
    band: &mut [u8],
    width: u32,
    height: u32,
    hit_count: &AtomicU64,
) {
    let rows = band.len() / (width as usize * 3);
    let mut hits = 0u64;
    for row in 0..rows as u32 {
        for px in 0..width {
            let ray = camera.pixel_ray(px, first_row + row, width, height);
            let hit = trace(tree, &ray);
            if hit.is_hit() {
                hits += 1;
            }
            let index = ((row * width + px) * 3) as usize;
            band[index..index + 3].copy_from_slice(&shade(&hit));
        }
    }
    hit_count.fetch_add(hits, Ordering::Relaxed);
}

/// Face-keyed brightness over the payload's `0xRRGGBB` color.
fn shade(hit: &Hit) -> [u8; 3] {
    if !hit.is_hit() {
        return SKY;
    }
    let brightness = match hit.direction {
        HitDirection::PosY => 1.0,
        HitDirection::NegY => 0.45,
        HitDirection::PosX | HitDirection::NegX => 0.8,
        HitDirection::PosZ | HitDirection::NegZ => 0.62,
        HitDirection::Exit => 0.0,
    };
    let r = ((hit.voxel >> 16) & 0xFF) as f32 * brightness;
    let g = ((hit.voxel >> 8) & 0xFF) as f32 * brightness;
    let b = (hit.voxel & 0xFF) as f32 * brightness;
    [r as u8, g as u8, b as u8]
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// A wall of voxels facing the camera.
    fn wall_tree() -> VoxelTree {
        let mut tree = VoxelTree::new();
        for x in 28..36 {
            for y in 28..36 {
                tree.set(x, y, 40, 0x00C0_80FF).unwrap();
            }
        }
        tree
    }

    fn wall_camera() -> Camera {
        Camera::new(Vec3::new(31.5, 31.5, -20.0), Vec3::new(31.5, 31.5, 40.0), 40.0, 1.0)
    }

    #[test]
    fn wall_fills_center_pixels() {
        let tree = wall_tree();
        let frame = Renderer::new(33, 33).render(&tree, &wall_camera());
        let center = frame.get(16, 16);
        assert_ne!(center, SKY, "center pixel should be lit by the wall");
    }

    #[test]
    fn empty_tree_renders_sky_only() {
        let tree = VoxelTree::new();
        let frame = Renderer::new(16, 16).render(&tree, &wall_camera());
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(frame.get(x, y), SKY);
            }
        }
    }

    #[test]
    fn thread_count_does_not_change_the_image() {
        let tree = wall_tree();
        let camera = wall_camera();
        let single = Renderer::new(48, 36).render(&tree, &camera);
        let multi = Renderer::new(48, 36).with_threads(4).render(&tree, &camera);
        assert_eq!(single.data(), multi.data());
    }

    #[test]
    fn shade_keys_off_the_face() {
        let hit = |direction| Hit { direction, voxel: 0x00FF_FFFF, time: 1.0 };
        let top = shade(&hit(HitDirection::PosY));
        let bottom = shade(&hit(HitDirection::NegY));
        assert!(top[0] > bottom[0]);
        assert_eq!(shade(&Hit::MISS), SKY);
    }
}
