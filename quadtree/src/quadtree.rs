//! Region quadtree stored in a flat node pool.
//!
//! Nodes never own each other. The tree is a `NodePool` of `QuadNode` slots
//! linked by index, a side table of entity ids per leaf, and a map from entity
//! id to its bounding box. Node regions are never stored: they are derived
//! from the tree box while walking down, or reconstructed from the parent
//! chain by `region_of`.

mod config;
mod insert;
mod maintenance;
mod pool;
mod query;
mod tree;
mod types;

pub use config::Config;
pub use pool::NodePool;
pub use types::{EntityId, LeafQuery, NodeRegion, QuadNode};

use common::shapes::BBox;
use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{QuadtreeError, QuadtreeResult};
use types::{validate_bbox, NodeStack, BLOCK_LEN, ROOT};

pub struct QuadTree {
    bbox: BBox,
    config: Config,
    pool: NodePool,
    /// Entity ids per pool slot. Only leaves hold any.
    leaf_entities: Vec<SmallVec<[EntityId; 4]>>,
    entities: FxHashMap<EntityId, BBox>,
    next_id: EntityId,
}
