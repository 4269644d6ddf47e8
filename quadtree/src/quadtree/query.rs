use super::*;
use fxhash::FxHashSet;

impl QuadTree {
    /// Region owned by the node at `index`, rebuilt from its parent chain.
    pub fn region_of(&self, index: u32) -> QuadtreeResult<BBox> {
        Ok(self.node_region(index)?.region)
    }

    pub(crate) fn node_region(&self, index: u32) -> QuadtreeResult<NodeRegion> {
        let node = self.pool.live(index)?;

        // Quadrant choices, collected node-to-root and applied root-to-node.
        let mut quadrants: SmallVec<[u32; 32]> = SmallVec::new();
        let mut current = index;
        let mut current_node = node;
        while current != ROOT {
            if quadrants.len() > self.pool.len() {
                return Err(QuadtreeError::CorruptPool {
                    reason: format!("parent chain of node {} never reaches the root", index),
                });
            }
            let parent = current_node
                .parent_index()
                .ok_or(QuadtreeError::NodeNotInUse { index: current })?;
            let parent_node = self.pool.live(parent)?;
            let quadrant = match parent_node.first_child() {
                Some(first_child) if current >= first_child && current - first_child < BLOCK_LEN => {
                    current - first_child
                }
                _ => {
                    return Err(QuadtreeError::CorruptPool {
                        reason: format!("node {} is not a child of its parent {}", current, parent),
                    })
                }
            };
            quadrants.push(quadrant);
            current = parent;
            current_node = parent_node;
        }

        let mut region = self.bbox;
        for &quadrant in quadrants.iter().rev() {
            region = region.split()[quadrant as usize];
        }
        Ok(NodeRegion {
            index,
            node,
            region,
            depth: quadrants.len() as u32 + 1,
        })
    }

    /// Smallest node whose region fully contains `query`.
    ///
    /// Every node visited on the way down is a candidate, branches included.
    /// Ties on area go to the node visited first.
    pub fn find_containing_node(&self, query: BBox) -> QuadtreeResult<NodeRegion> {
        self.ensure_in_bounds(query)?;

        let mut best: Option<NodeRegion> = None;
        let mut stack = NodeStack::new();
        stack.push((ROOT, self.bbox, 1));
        while let Some((index, region, depth)) = stack.pop() {
            let node = self.pool.node(index);
            if !node.in_use() {
                continue;
            }
            if best.map_or(true, |best| region.area() < best.region.area()) {
                best = Some(NodeRegion {
                    index,
                    node,
                    region,
                    depth,
                });
            }
            let Some(first_child) = node.first_child() else {
                continue;
            };
            for (i, quadrant) in region.split().iter().enumerate() {
                if quadrant.overlaps(&query) && quadrant.contains(&query) {
                    stack.push((first_child + i as u32, *quadrant, depth + 1));
                }
            }
        }

        best.ok_or(QuadtreeError::OutOfBounds {
            bbox: query,
            bounds: self.bbox,
        })
    }

    /// Leaf frontier under a node, or under the node containing a box.
    ///
    /// The walk starts at the node itself for `LeafQuery::Node`, or at
    /// `find_containing_node(bbox)` for `LeafQuery::Region`, and returns every
    /// leaf below it. Use `collisions` to filter by box.
    pub fn leaves_overlapping<Q: Into<LeafQuery>>(&self, query: Q) -> QuadtreeResult<Vec<NodeRegion>> {
        let start = match query.into() {
            LeafQuery::Node(index) => self.node_region(index)?,
            LeafQuery::Region(bbox) => self.find_containing_node(bbox)?,
        };
        Ok(self.collect_leaves(start, start.region))
    }

    /// Every leaf in the tree whose region overlaps `bbox`, walking from the
    /// root. These are exactly the leaves an entity with this box lives in.
    pub(crate) fn overlapping_leaves(&self, bbox: BBox) -> Vec<NodeRegion> {
        if !self.bbox.overlaps(&bbox) {
            return Vec::new();
        }
        let root = NodeRegion {
            index: ROOT,
            node: self.pool.node(ROOT),
            region: self.bbox,
            depth: 1,
        };
        self.collect_leaves(root, bbox)
    }

    fn collect_leaves(&self, start: NodeRegion, working: BBox) -> Vec<NodeRegion> {
        let mut leaves = Vec::new();
        let mut stack = NodeStack::new();
        stack.push((start.index, start.region, start.depth));
        while let Some((index, region, depth)) = stack.pop() {
            let node = self.pool.node(index);
            match node {
                QuadNode::Leaf { .. } => leaves.push(NodeRegion {
                    index,
                    node,
                    region,
                    depth,
                }),
                QuadNode::Branch { first_child, .. } => {
                    for (i, quadrant) in region.split().iter().enumerate() {
                        if quadrant.overlaps(&working) {
                            stack.push((first_child + i as u32, *quadrant, depth + 1));
                        }
                    }
                }
                QuadNode::Free { .. } => {}
            }
        }
        leaves
    }

    /// Ids of entities whose boxes overlap `bbox`, each reported once.
    pub fn collisions(&self, bbox: BBox, collisions: &mut Vec<EntityId>) -> QuadtreeResult<()> {
        validate_bbox(bbox)?;
        let mut seen = FxHashSet::default();
        for leaf in self.overlapping_leaves(bbox) {
            for &id in &self.leaf_entities[leaf.index as usize] {
                if !seen.insert(id) {
                    continue;
                }
                let hit = self
                    .entities
                    .get(&id)
                    .map_or(false, |entity_bbox| entity_bbox.overlaps(&bbox));
                if hit {
                    collisions.push(id);
                }
            }
        }
        Ok(())
    }

    /// Regions of every live node, root first.
    pub fn all_node_bounding_boxes(&self, bounding_boxes: &mut Vec<BBox>) {
        let mut stack = NodeStack::new();
        stack.push((ROOT, self.bbox, 1));
        while let Some((index, region, depth)) = stack.pop() {
            bounding_boxes.push(region);
            if let Some(first_child) = self.pool.node(index).first_child() {
                for (i, quadrant) in region.split().iter().enumerate().rev() {
                    stack.push((first_child + i as u32, *quadrant, depth + 1));
                }
            }
        }
    }
}
