//! Core spatial types: Morton keys, the hash-consed node store, and the voxel tree.

mod base;
mod error;
pub mod morton;
mod node;
mod table;
mod tree;

pub use base::BaseGrid;
pub use error::{TreeError, ValidateError};
pub use node::{Handle, Node};
pub use table::{NodeTable, LOG2_TABLE_CAPACITY, TABLE_CAPACITY};
pub use tree::{TreeStats, VoxelTree};

/// Octree depth: the volume spans `[0, 2^DEPTH)` voxels per axis.
pub const DEPTH: u32 = 12;

/// Voxels per axis.
pub const DIM: u32 = 1 << DEPTH;

/// Levels resolved by the dense base grid instead of the hash table.
pub const BASE_DEPTH: u32 = 5;

/// Base-grid cells per axis.
pub const BASE_DIM: u32 = 1 << BASE_DEPTH;

/// Octree levels stored as interned nodes below the base grid.
pub const HASHED_DEPTH: u32 = DEPTH - BASE_DEPTH;

// ── Compile-time range checks on the geometry constants ─────────────────────
const _: () = {
    assert!(BASE_DEPTH >= 4);
    assert!(BASE_DEPTH < DEPTH);
    assert!(DIM <= 1 << 16);
};
