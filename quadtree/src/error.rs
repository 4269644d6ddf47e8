use common::shapes::BBox;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadtreeError {
    #[error("quadtree size must be finite and positive (width: {width}, height: {height})")]
    InvalidTreeSize { width: f32, height: f32 },

    #[error("{field} must be at least 1")]
    InvalidConfig { field: &'static str },

    #[error("bounding box must be finite with non-negative width/height ({bbox:?})")]
    InvalidBBox { bbox: BBox },

    #[error("bounding box {bbox:?} is not within quadtree bounds {bounds:?}")]
    OutOfBounds { bbox: BBox, bounds: BBox },

    #[error("node index {index} is out of range (pool holds {len} nodes)")]
    NodeOutOfRange { index: u32, len: usize },

    #[error("node {index} is on the free list")]
    NodeNotInUse { index: u32 },

    #[error("node {index} is already a branch")]
    NotALeaf { index: u32 },

    #[error("index {index} is child {quadrant} of its block, blocks are freed by their first child")]
    MisalignedBlock { index: u32, quadrant: u32 },

    #[error("block {index} is not the child block of any live branch")]
    NotAChildBlock { index: u32 },

    #[error("block {index} still holds entities or grandchildren")]
    BlockNotEmpty { index: u32 },

    #[error("entity {id} is already in the quadtree")]
    DuplicateEntity { id: u32 },

    #[error("entity {id} is not in the quadtree")]
    EntityNotFound { id: u32 },

    #[error("node pool is corrupt: {reason}")]
    CorruptPool { reason: String },
}

impl QuadtreeError {
    /// Caller supplied something the tree cannot accept.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            QuadtreeError::InvalidTreeSize { .. }
                | QuadtreeError::InvalidConfig { .. }
                | QuadtreeError::InvalidBBox { .. }
                | QuadtreeError::NodeOutOfRange { .. }
                | QuadtreeError::NodeNotInUse { .. }
                | QuadtreeError::NotALeaf { .. }
                | QuadtreeError::MisalignedBlock { .. }
                | QuadtreeError::NotAChildBlock { .. }
                | QuadtreeError::BlockNotEmpty { .. }
                | QuadtreeError::DuplicateEntity { .. }
        )
    }

    /// The requested region or entity does not exist in the tree.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QuadtreeError::OutOfBounds { .. } | QuadtreeError::EntityNotFound { .. }
        )
    }
}

pub type QuadtreeResult<T> = Result<T, QuadtreeError>;
