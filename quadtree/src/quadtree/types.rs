use crate::error::{QuadtreeError, QuadtreeResult};
use common::shapes::BBox;
use smallvec::SmallVec;

pub type EntityId = u32;

pub(crate) const ROOT: u32 = 0;
pub(crate) const BLOCK_LEN: u32 = 4;

/// One slot of the node pool.
///
/// A slot is either a live node (leaf or branch) or a member of a free block.
/// Free slots only carry the free-list link; every other field is reset when
/// the block is handed out again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuadNode {
    Leaf { parent: u32, total_entity: u32 },
    /// Children live at `first_child .. first_child + 4`, quadrant `i` at
    /// `first_child + i`.
    Branch { parent: u32, first_child: u32 },
    Free { next_free: Option<u32> },
}

impl QuadNode {
    #[inline(always)]
    pub(crate) fn new_leaf(parent: u32) -> Self {
        QuadNode::Leaf {
            parent,
            total_entity: 0,
        }
    }

    #[inline(always)]
    pub fn first_child(&self) -> Option<u32> {
        match *self {
            QuadNode::Branch { first_child, .. } => Some(first_child),
            _ => None,
        }
    }

    /// Base index of the next free block, for slots on the free list.
    #[inline(always)]
    pub fn next_free(&self) -> Option<u32> {
        match *self {
            QuadNode::Free { next_free } => next_free,
            _ => None,
        }
    }

    /// The root is its own parent.
    #[inline(always)]
    pub fn parent_index(&self) -> Option<u32> {
        match *self {
            QuadNode::Leaf { parent, .. } | QuadNode::Branch { parent, .. } => Some(parent),
            QuadNode::Free { .. } => None,
        }
    }

    /// Entity count of a leaf. Branches report `None`.
    #[inline(always)]
    pub fn total_entity(&self) -> Option<u32> {
        match *self {
            QuadNode::Leaf { total_entity, .. } => Some(total_entity),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn in_use(&self) -> bool {
        !matches!(self, QuadNode::Free { .. })
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        matches!(self, QuadNode::Leaf { .. })
    }

    #[inline(always)]
    pub fn is_branch(&self) -> bool {
        matches!(self, QuadNode::Branch { .. })
    }

    #[inline(always)]
    pub(crate) fn is_empty_leaf(&self) -> bool {
        matches!(
            self,
            QuadNode::Leaf {
                total_entity: 0,
                ..
            }
        )
    }
}

/// A node together with the region it owns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeRegion {
    pub index: u32,
    pub node: QuadNode,
    pub region: BBox,
    /// Root is depth 1.
    pub depth: u32,
}

/// Starting point for leaf enumeration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LeafQuery {
    /// Every leaf under this node.
    Node(u32),
    /// Every leaf touching this box.
    Region(BBox),
}

impl From<BBox> for LeafQuery {
    fn from(bbox: BBox) -> Self {
        LeafQuery::Region(bbox)
    }
}

impl From<u32> for LeafQuery {
    fn from(index: u32) -> Self {
        LeafQuery::Node(index)
    }
}

pub(crate) type NodeStack = SmallVec<[(u32, BBox, u32); 64]>;

#[inline(always)]
pub(crate) fn validate_bbox(bbox: BBox) -> QuadtreeResult<()> {
    if !bbox.is_well_formed() {
        return Err(QuadtreeError::InvalidBBox { bbox });
    }
    Ok(())
}
