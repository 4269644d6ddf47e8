use super::*;

impl QuadTree {
    /// Tree covering `(0, 0)` to `size`.
    pub fn new(size: (f32, f32), max_depth: usize, node_capacity: usize) -> QuadtreeResult<Self> {
        Self::new_with_config(
            size,
            Config {
                max_depth,
                node_capacity,
                ..Config::default()
            },
        )
    }

    pub fn new_with_config(size: (f32, f32), config: Config) -> QuadtreeResult<Self> {
        let (width, height) = size;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(QuadtreeError::InvalidTreeSize { width, height });
        }
        config.validate()?;
        let pool = NodePool::with_capacity(config.pool_size.saturating_add(1));
        let mut leaf_entities = Vec::with_capacity(pool.len());
        leaf_entities.resize_with(pool.len(), SmallVec::new);
        Ok(Self {
            bbox: BBox::from_size(width, height),
            config,
            pool,
            leaf_entities,
            entities: FxHashMap::default(),
            next_id: 0,
        })
    }

    /// Builds a tree and inserts every entity in order.
    pub fn from_entities<I>(size: (f32, f32), config: Config, entities: I) -> QuadtreeResult<Self>
    where
        I: IntoIterator<Item = (EntityId, BBox)>,
    {
        let mut tree = Self::new_with_config(size, config)?;
        for (id, bbox) in entities {
            tree.insert(id, bbox)?;
        }
        Ok(tree)
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Pool slots ever allocated, free ones included.
    pub fn node_count(&self) -> usize {
        self.pool.len()
    }

    pub fn nodes_in_use(&self) -> usize {
        self.pool.nodes_in_use()
    }

    /// Number of distinct entities stored.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn root(&self) -> QuadNode {
        self.pool.node(ROOT)
    }

    pub fn node(&self, index: u32) -> Option<QuadNode> {
        self.pool.get(index).copied()
    }

    pub fn entity_bbox(&self, id: EntityId) -> Option<BBox> {
        self.entities.get(&id).copied()
    }

    /// Ids stored in a live leaf. `None` for branches and free slots.
    pub fn leaf_entities(&self, index: u32) -> Option<&[EntityId]> {
        match self.pool.get(index) {
            Some(node) if node.is_leaf() => Some(self.leaf_entities[index as usize].as_slice()),
            _ => None,
        }
    }

    /// Number of levels below and including the root.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: SmallVec<[(u32, usize); 64]> = SmallVec::new();
        stack.push((ROOT, 1));
        while let Some((index, depth)) = stack.pop() {
            height = height.max(depth);
            if let Some(first_child) = self.pool.node(index).first_child() {
                for i in 0..BLOCK_LEN {
                    stack.push((first_child + i, depth + 1));
                }
            }
        }
        height
    }

    /// Checks the pool invariants and that every entity is referenced by
    /// exactly the leaves its box overlaps.
    pub fn validate(&self) -> QuadtreeResult<()> {
        self.pool.validate()?;
        let corrupt = |reason: String| Err(QuadtreeError::CorruptPool { reason });

        if self.leaf_entities.len() < self.pool.len() {
            return corrupt("leaf storage is shorter than the node pool".into());
        }
        let mut stored = 0usize;
        for (index, node) in self.pool.nodes().iter().enumerate() {
            let ids = &self.leaf_entities[index];
            match node.total_entity() {
                Some(total) if total as usize == ids.len() => stored += ids.len(),
                None if ids.is_empty() => {}
                _ => {
                    return corrupt(format!(
                        "node {} count does not match its {} stored ids",
                        index,
                        ids.len()
                    ))
                }
            }
        }

        let mut expected = 0usize;
        for (&id, &bbox) in &self.entities {
            for leaf in self.overlapping_leaves(bbox) {
                if !self.leaf_entities[leaf.index as usize].contains(&id) {
                    return corrupt(format!("entity {} is missing from leaf {}", id, leaf.index));
                }
                expected += 1;
            }
        }
        if expected != stored {
            return corrupt(format!(
                "leaves hold {} entity references, expected {}",
                stored, expected
            ));
        }
        Ok(())
    }

    pub(crate) fn ensure_in_bounds(&self, bbox: BBox) -> QuadtreeResult<()> {
        validate_bbox(bbox)?;
        if !self.bbox.contains(&bbox) {
            return Err(QuadtreeError::OutOfBounds {
                bbox,
                bounds: self.bbox,
            });
        }
        Ok(())
    }

    pub(crate) fn sync_leaf_storage(&mut self) {
        if self.leaf_entities.len() < self.pool.len() {
            self.leaf_entities.resize_with(self.pool.len(), SmallVec::new);
        }
    }
}
