//! Octree node records and the content hash used to intern them.

/// Index of a node record in the table, 1-based so that `0` can mean
/// "empty subtree". Slot index = handle − 1.
pub type Handle = u32;

const FNV_SEED: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// An interior octree node: eight child handles indexed by the 3-bit octant.
///
/// At the lowest hashed level the eight slots hold leaf payloads instead of
/// handles; the representations coincide, with `0` meaning empty either way.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(align(32))]
pub struct Node {
    pub children: [Handle; 8],
}

impl Node {
    /// The all-zero node. Never stored in the table; its handle is `0`.
    pub const EMPTY: Node = Node { children: [0; 8] };

    /// Node with a single occupied child slot.
    #[inline]
    pub const fn with_child(octant: usize, child: Handle) -> Node {
        let mut children = [0; 8];
        children[octant] = child;
        Node { children }
    }

    /// `true` if every child slot is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        let mut i = 0;
        while i < 8 {
            if self.children[i] != 0 {
                return false;
            }
            i += 1;
        }
        true
    }

    /// FNV-1a over the 32 little-endian child bytes.
    ///
    /// Probe order in the table derives from this value, so it must stay
    /// bit-identical across builds and platforms.
    pub const fn content_hash(&self) -> u32 {
        let mut hash = FNV_SEED;
        let mut i = 0;
        while i < 8 {
            let bytes = self.children[i].to_le_bytes();
            let mut j = 0;
            while j < 4 {
                hash = (hash ^ bytes[j] as u32).wrapping_mul(FNV_PRIME);
                j += 1;
            }
            i += 1;
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::Node;

    #[test]
    fn record_is_32_bytes_aligned() {
        assert_eq!(std::mem::size_of::<Node>(), 32);
        assert_eq!(std::mem::align_of::<Node>(), 32);
    }

    #[test]
    fn emptiness() {
        assert!(Node::EMPTY.is_empty());
        assert!(!Node::with_child(3, 1).is_empty());
        assert!(!Node::with_child(7, 0xFFFF_FFFF).is_empty());
    }

    #[test]
    fn with_child_places_one_slot() {
        let node = Node::with_child(5, 42);
        for (octant, &child) in node.children.iter().enumerate() {
            assert_eq!(child, if octant == 5 { 42 } else { 0 });
        }
    }

    #[test]
    fn hash_reference_vectors() {
        // Pinned FNV-1a values; a change here changes every probe sequence.
        assert_eq!(Node::EMPTY.content_hash(), 0x0B2A_E445);
        assert_eq!(Node::with_child(0, 1).content_hash(), 0xC6AE_CFC4);
        assert_eq!(Node::with_child(7, 1).content_hash(), 0xBAFE_A534);
        let counting = Node { children: [1, 2, 3, 4, 5, 6, 7, 8] };
        assert_eq!(counting.content_hash(), 0x9A4D_CA4D);
        let saturated = Node { children: [0x1234_5678; 8] };
        assert_eq!(saturated.content_hash(), 0xFF6A_47C5);
    }

    #[test]
    fn hash_depends_on_child_position() {
        assert_ne!(
            Node::with_child(0, 1).content_hash(),
            Node::with_child(1, 1).content_hash()
        );
    }

    #[test]
    fn equality_is_over_all_children() {
        let a = Node { children: [1, 2, 3, 4, 5, 6, 7, 8] };
        let mut b = a;
        assert_eq!(a, b);
        b.children[7] = 9;
        assert_ne!(a, b);
    }
}
