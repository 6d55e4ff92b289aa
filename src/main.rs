use std::path::Path;

use anyhow::Result;
use glam::Vec3;
use tracing::info;
use voxtree_core::{TreeError, VoxelTree};
use voxtree_render::{Camera, Renderer};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut tree = VoxelTree::new();
    build_scene(&mut tree)?;
    let stats = tree.stats();
    info!(
        live = stats.fillcnt,
        refs = stats.nodecnt,
        max_refcount = stats.max_refcnt,
        "scene built"
    );

    let camera = Camera::new(
        Vec3::new(-60.0, 150.0, -110.0),
        Vec3::new(96.0, 60.0, 96.0),
        55.0,
        640.0 / 480.0,
    );
    let threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let frame = Renderer::new(640, 480).with_threads(threads).render(&tree, &camera);

    let output = Path::new("voxtree.png");
    frame.save_png(output)?;
    info!(path = %output.display(), "frame written");
    Ok(())
}

/// A solid sphere hovering over a checkered slab.
fn build_scene(tree: &mut VoxelTree) -> Result<(), TreeError> {
    const SLAB: u16 = 2;
    const LIGHT: u32 = 0x00C8_C8C8;
    const DARK: u32 = 0x0038_3838;
    const SPHERE: u32 = 0x00D4_683A;

    for x in 16..176u16 {
        for z in 16..176u16 {
            let checker = ((x / 8) + (z / 8)) % 2 == 0;
            let color = if checker { LIGHT } else { DARK };
            for y in 16..16 + SLAB {
                tree.set(x, y, z, color)?;
            }
        }
    }

    let center = (96i32, 70i32, 96i32);
    let radius = 34i32;
    for x in center.0 - radius..=center.0 + radius {
        for y in center.1 - radius..=center.1 + radius {
            for z in center.2 - radius..=center.2 + radius {
                let (dx, dy, dz) = (x - center.0, y - center.1, z - center.2);
                if dx * dx + dy * dy + dz * dz <= radius * radius {
                    tree.set(x as u16, y as u16, z as u16, SPHERE)?;
                }
            }
        }
    }
    Ok(())
}
