//! Open-addressed, fixed-capacity interning store for octree nodes.
//!
//! Content-addressed and reference-counted: equal nodes share a single slot.
//! Each slot carries a one-byte tag with three states — `0` means the slot
//! has never been occupied since the last clear, `0xFF` marks a tombstone
//! that still blocks probing, and anything else is a remnant of the node's
//! hash that filters out almost all false record comparisons.
//!
//! The table never grows: handles are slot indices, so reallocation would
//! invalidate every outstanding reference. Callers that outgrow it rebuild
//! with a larger `LOG2_TABLE_CAPACITY`.

use tracing::warn;

use crate::error::TreeError;
use crate::node::{Handle, Node};

/// log2 of the slot count.
pub const LOG2_TABLE_CAPACITY: u32 = 19;

/// Total slot count. Fixed at construction.
pub const TABLE_CAPACITY: usize = 1 << LOG2_TABLE_CAPACITY;

const TAG_EMPTY: u8 = 0;
const TAG_TOMBSTONE: u8 = 0xFF;

/// Probe sequences start on a 16-slot boundary so a group shares cache lines.
const INDEX_MASK: usize = (TABLE_CAPACITY - 1) & !0xF;

/// Occupancy ceiling: 15/16 of capacity. Beyond this the linear probe
/// degrades superlinearly, so interning refuses instead.
const MAX_USED: u32 = (TABLE_CAPACITY - TABLE_CAPACITY / 16) as u32;

/// Tag byte kept per slot, remapped away from the two reserved values.
#[inline]
const fn cache_byte(hash: u32) -> u8 {
    match (hash >> LOG2_TABLE_CAPACITY) as u8 {
        0 => 1,
        0xFF => 0x7F,
        byte => byte,
    }
}

/// Fixed-capacity hash set of [`Node`]s with per-slot refcounts.
pub struct NodeTable {
    tags: Box<[u8]>,
    refcounts: Box<[u32]>,
    nodes: Box<[Node]>,
    /// Slots holding a live node.
    live: u32,
    /// Slots that are not `EMPTY` (live + tombstones). Monotonic until
    /// `clear`: a release leaves a tombstone, never a fresh empty slot.
    used: u32,
    /// Outstanding references across all live slots.
    refs: u32,
    /// High-water refcount seen on any single slot.
    max_refcount: u32,
}

impl NodeTable {
    /// Allocate an empty table. Roughly 19 MiB at the default capacity.
    pub fn new() -> NodeTable {
        NodeTable {
            tags: vec![TAG_EMPTY; TABLE_CAPACITY].into_boxed_slice(),
            refcounts: vec![0; TABLE_CAPACITY].into_boxed_slice(),
            nodes: vec![Node::EMPTY; TABLE_CAPACITY].into_boxed_slice(),
            live: 0,
            used: 0,
            refs: 0,
            max_refcount: 0,
        }
    }

    /// Intern `node`, returning its handle.
    ///
    /// An existing equal node gains a reference; otherwise the node is stored
    /// with refcount 1, reusing the first tombstone on its probe path if one
    /// exists. Fails with [`TreeError::TableFull`] once the occupancy ceiling
    /// would be crossed.
    pub fn intern(&mut self, node: &Node) -> Result<Handle, TreeError> {
        debug_assert!(!node.is_empty(), "the all-zero node is handle 0");

        let hash = node.content_hash();
        let cache = cache_byte(hash);
        let mut index = hash as usize & INDEX_MASK;
        let mut first_grave = None;

        loop {
            match self.tags[index] {
                TAG_EMPTY => break,
                TAG_TOMBSTONE => {
                    if first_grave.is_none() {
                        first_grave = Some(index);
                    }
                }
                tag => {
                    if tag == cache && self.nodes[index] == *node {
                        let refcount = self.refcounts[index] + 1;
                        self.refcounts[index] = refcount;
                        self.refs += 1;
                        if refcount > self.max_refcount {
                            self.max_refcount = refcount;
                        }
                        return Ok(index as Handle + 1);
                    }
                }
            }
            index = (index + 1) & (TABLE_CAPACITY - 1);
        }

        let slot = match first_grave {
            Some(grave) => grave,
            None => {
                if self.used >= MAX_USED {
                    warn!(used = self.used, capacity = TABLE_CAPACITY, "node table full");
                    return Err(TreeError::TableFull {
                        used: self.used,
                        capacity: TABLE_CAPACITY,
                    });
                }
                self.used += 1;
                index
            }
        };

        self.tags[slot] = cache;
        self.nodes[slot] = *node;
        self.refcounts[slot] = 1;
        self.live += 1;
        self.refs += 1;
        if self.max_refcount == 0 {
            self.max_refcount = 1;
        }
        Ok(slot as Handle + 1)
    }

    /// Drop one reference on `handle`; the slot becomes a tombstone at zero.
    ///
    /// The record bytes are left in place — `set` reads back a node it has
    /// just released while rebuilding an edit path.
    pub fn release(&mut self, handle: Handle) {
        debug_assert_ne!(handle, 0);
        let slot = (handle - 1) as usize;
        debug_assert!(self.refcounts[slot] > 0);

        self.refcounts[slot] -= 1;
        self.refs -= 1;
        if self.refcounts[slot] == 0 {
            self.tags[slot] = TAG_TOMBSTONE;
            self.live -= 1;
        }
    }

    /// The record stored at `handle`'s slot.
    ///
    /// Valid for any slot that has held a node since the last clear,
    /// including one just released.
    #[inline]
    pub fn node(&self, handle: Handle) -> &Node {
        &self.nodes[(handle - 1) as usize]
    }

    /// Reset every slot to never-occupied. Storage is retained.
    pub fn clear(&mut self) {
        self.tags.fill(TAG_EMPTY);
        self.live = 0;
        self.used = 0;
        self.refs = 0;
        self.max_refcount = 0;
    }

    /// Slots currently holding a live node.
    #[inline]
    pub fn live(&self) -> u32 {
        self.live
    }

    /// Outstanding references across all live slots.
    #[inline]
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// High-water refcount observed on a single slot.
    #[inline]
    pub fn max_refcount(&self) -> u32 {
        self.max_refcount
    }

    // ── Introspection for the tree validator ────────────────────────────────

    pub(crate) fn is_live(&self, slot: usize) -> bool {
        self.tags[slot] != TAG_EMPTY && self.tags[slot] != TAG_TOMBSTONE
    }

    pub(crate) fn refcount(&self, slot: usize) -> u32 {
        self.refcounts[slot]
    }

    pub(crate) fn node_at(&self, slot: usize) -> &Node {
        &self.nodes[slot]
    }

    /// Whether `slot` is reachable by probing from its own hash without
    /// crossing a never-occupied slot.
    pub(crate) fn probe_reaches(&self, slot: usize) -> bool {
        let mut index = self.nodes[slot].content_hash() as usize & INDEX_MASK;
        for _ in 0..TABLE_CAPACITY {
            if index == slot {
                return true;
            }
            if self.tags[index] == TAG_EMPTY {
                return false;
            }
            index = (index + 1) & (TABLE_CAPACITY - 1);
        }
        false
    }
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTable")
            .field("capacity", &TABLE_CAPACITY)
            .field("live", &self.live)
            .field("used", &self.used)
            .field("refs", &self.refs)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
