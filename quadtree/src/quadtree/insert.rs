use super::*;
use tracing::trace;

impl QuadTree {
    /// Stores `id` in every leaf its box overlaps, splitting full leaves on
    /// the way down.
    ///
    /// An entity straddling a quadrant boundary is referenced from each leaf
    /// it touches; branches never hold entities. Leaves at `max_depth` accept
    /// entities past `node_capacity`.
    pub fn insert(&mut self, id: EntityId, bbox: BBox) -> QuadtreeResult<()> {
        self.ensure_in_bounds(bbox)?;
        if self.entities.contains_key(&id) {
            return Err(QuadtreeError::DuplicateEntity { id });
        }
        self.entities.insert(id, bbox);
        if let Err(err) = self.place(id, bbox) {
            self.entities.remove(&id);
            self.scrub_entity(id);
            return Err(err);
        }
        trace!(id, ?bbox, "inserted entity");
        Ok(())
    }

    /// Inserts under the next unused sequential id and returns it.
    pub fn insert_auto(&mut self, bbox: BBox) -> QuadtreeResult<EntityId> {
        if !self.config.auto_id {
            return Err(QuadtreeError::InvalidConfig { field: "auto_id" });
        }
        let mut id = self.next_id;
        while self.entities.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.insert(id, bbox)?;
        self.next_id = id.wrapping_add(1);
        Ok(id)
    }

    /// Removes `id` from every leaf holding it and returns its box.
    ///
    /// Emptied leaves stay in place until `compact` runs.
    pub fn remove(&mut self, id: EntityId) -> QuadtreeResult<BBox> {
        let bbox = self
            .entities
            .remove(&id)
            .ok_or(QuadtreeError::EntityNotFound { id })?;
        for leaf in self.overlapping_leaves(bbox) {
            let ids = &mut self.leaf_entities[leaf.index as usize];
            if let Some(position) = ids.iter().position(|&stored| stored == id) {
                ids.swap_remove(position);
                let count = ids.len() as u32;
                self.pool.set_total_entity(leaf.index, count);
            }
        }
        trace!(id, "removed entity");
        Ok(bbox)
    }

    /// Moves `id` to a new box. On error the tree is left untouched.
    pub fn relocate(&mut self, id: EntityId, bbox: BBox) -> QuadtreeResult<()> {
        self.ensure_in_bounds(bbox)?;
        if !self.entities.contains_key(&id) {
            return Err(QuadtreeError::EntityNotFound { id });
        }
        self.remove(id)?;
        self.insert(id, bbox)
    }

    fn place(&mut self, id: EntityId, bbox: BBox) -> QuadtreeResult<()> {
        let capacity = self.config.node_capacity as u32;
        let max_depth = self.config.max_depth as u32;

        let mut stack = NodeStack::new();
        stack.push((ROOT, self.bbox, 1));
        while let Some((index, region, depth)) = stack.pop() {
            match self.pool.node(index) {
                QuadNode::Branch { first_child, .. } => {
                    for (i, quadrant) in region.split().iter().enumerate() {
                        if quadrant.overlaps(&bbox) {
                            stack.push((first_child + i as u32, *quadrant, depth + 1));
                        }
                    }
                }
                QuadNode::Leaf { total_entity, .. } => {
                    if total_entity < capacity {
                        self.push_entity(index, id);
                    } else if depth >= max_depth {
                        trace!(id, index, total_entity, "leaf at max depth over capacity");
                        self.push_entity(index, id);
                    } else {
                        self.split_leaf(index, region)?;
                        stack.push((index, region, depth));
                    }
                }
                QuadNode::Free { .. } => {
                    return Err(QuadtreeError::CorruptPool {
                        reason: format!("free slot {} is reachable from the root", index),
                    })
                }
            }
        }
        Ok(())
    }

    /// Splits a full leaf and hands its entities to every child they overlap.
    fn split_leaf(&mut self, index: u32, region: BBox) -> QuadtreeResult<()> {
        let first_child = self.pool.allocate_branch(index)?;
        self.sync_leaf_storage();

        let residents = std::mem::take(&mut self.leaf_entities[index as usize]);
        let quadrants = region.split();
        for id in residents {
            let Some(bbox) = self.entities.get(&id).copied() else {
                continue;
            };
            for (i, quadrant) in quadrants.iter().enumerate() {
                if quadrant.overlaps(&bbox) {
                    self.push_entity(first_child + i as u32, id);
                }
            }
        }
        Ok(())
    }

    /// Drops every leaf reference to `id` left behind by an aborted placement.
    fn scrub_entity(&mut self, id: EntityId) {
        for (index, ids) in self.leaf_entities.iter_mut().enumerate() {
            if let Some(position) = ids.iter().position(|&stored| stored == id) {
                ids.swap_remove(position);
                self.pool.set_total_entity(index as u32, ids.len() as u32);
            }
        }
    }

    fn push_entity(&mut self, index: u32, id: EntityId) {
        let ids = &mut self.leaf_entities[index as usize];
        ids.push(id);
        let count = ids.len() as u32;
        self.pool.set_total_entity(index, count);
    }
}
