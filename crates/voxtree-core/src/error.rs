//! Error types for tree mutation and invariant validation.

use thiserror::Error;

/// Errors surfaced by voxel mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node table reached its occupancy ceiling mid-edit.
    ///
    /// Fatal to the tree: the interrupted edit leaves the store inconsistent,
    /// so the caller must `clear` it or rebuild with a larger table.
    #[error("node table full: {used} of {capacity} slots in use")]
    TableFull {
        /// Slots occupied (live or tombstoned) when the intern was refused.
        used: u32,
        /// Total slot count.
        capacity: usize,
    },
    /// Coordinates outside the voxel volume.
    #[error("voxel ({x}, {y}, {z}) outside the {dim}^3 volume")]
    OutOfBounds {
        x: u16,
        y: u16,
        z: u16,
        /// Voxels per axis.
        dim: u32,
    },
}

/// Structural violations reported by [`VoxelTree::validate`](crate::VoxelTree::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// Two live slots hold equal nodes; the store must be a set.
    #[error("slots {first} and {second} hold identical nodes")]
    DuplicateNode { first: usize, second: usize },
    /// A live slot holds the all-zero node, which must collapse to handle 0.
    #[error("slot {slot} holds the all-zero node")]
    ZeroNode { slot: usize },
    /// A stored refcount disagrees with the number of actual referents.
    #[error("slot {slot} has refcount {stored}, expected {expected}")]
    RefcountMismatch {
        slot: usize,
        stored: u32,
        expected: u32,
    },
    /// A live slot is not referenced by any base-grid entry or live node.
    #[error("live slot {slot} is unreachable from the base grid")]
    UnreachableNode { slot: usize },
    /// A reachable handle points at a slot that is not live.
    #[error("handle {handle} references slot {slot}, which is not live")]
    DanglingHandle { handle: u32, slot: usize },
    /// A live slot cannot be found by probing from its own hash.
    #[error("slot {slot} cannot be reached by probing from its hash")]
    BrokenProbe { slot: usize },
}
