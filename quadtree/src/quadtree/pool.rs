use super::types::{QuadNode, BLOCK_LEN, ROOT};
use crate::error::{QuadtreeError, QuadtreeResult};
use tracing::debug;

/// Flat storage for every quadtree node.
///
/// Slot 0 is the root. Children are always handed out in blocks of four
/// contiguous slots, so every block base sits at `1 + 4k`. Freed blocks are
/// threaded into a LIFO free list through their first slot and are reused
/// before the pool grows again.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePool {
    nodes: Vec<QuadNode>,
    free_head: Option<u32>,
    in_use: usize,
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

impl NodePool {
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(QuadNode::new_leaf(ROOT));
        Self {
            nodes,
            free_head: None,
            in_use: 1,
        }
    }

    /// Slots ever allocated, free ones included.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Pairs with `len`. Never true, the root slot always exists.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    pub fn nodes_in_use(&self) -> usize {
        self.in_use
    }

    #[inline(always)]
    pub fn free_head(&self) -> Option<u32> {
        self.free_head
    }

    #[inline(always)]
    pub fn get(&self, index: u32) -> Option<&QuadNode> {
        self.nodes.get(index as usize)
    }

    pub fn nodes(&self) -> &[QuadNode] {
        &self.nodes
    }

    #[inline(always)]
    pub(crate) fn node(&self, index: u32) -> QuadNode {
        self.nodes[index as usize]
    }

    /// Looks up a slot that must be a live node.
    pub(crate) fn live(&self, index: u32) -> QuadtreeResult<QuadNode> {
        let node = *self
            .nodes
            .get(index as usize)
            .ok_or(QuadtreeError::NodeOutOfRange {
                index,
                len: self.nodes.len(),
            })?;
        if !node.in_use() {
            return Err(QuadtreeError::NodeNotInUse { index });
        }
        Ok(node)
    }

    pub(crate) fn set_total_entity(&mut self, index: u32, count: u32) {
        if let QuadNode::Leaf { total_entity, .. } = &mut self.nodes[index as usize] {
            *total_entity = count;
        }
    }

    /// Turns the leaf at `node_index` into a branch and returns the base
    /// index of its four fresh, empty children.
    pub fn allocate_branch(&mut self, node_index: u32) -> QuadtreeResult<u32> {
        let parent = match self.live(node_index)? {
            QuadNode::Leaf { parent, .. } => parent,
            _ => return Err(QuadtreeError::NotALeaf { index: node_index }),
        };

        let first_child = match self.free_head {
            Some(base) => {
                let next_free = self.free_block_link(base)?;
                for i in 0..BLOCK_LEN {
                    self.nodes[(base + i) as usize] = QuadNode::new_leaf(node_index);
                }
                self.free_head = next_free;
                debug!(node_index, base, "reused free node block");
                base
            }
            None => {
                let base = self.nodes.len() as u32;
                self.nodes
                    .extend(std::iter::repeat(QuadNode::new_leaf(node_index)).take(BLOCK_LEN as usize));
                debug!(node_index, base, pool_len = self.nodes.len(), "grew node pool");
                base
            }
        };

        self.nodes[node_index as usize] = QuadNode::Branch {
            parent,
            first_child,
        };
        self.in_use += BLOCK_LEN as usize;
        Ok(first_child)
    }

    /// Returns the block starting at `first_child_index` to the free list.
    /// The owning branch becomes an empty leaf.
    ///
    /// All four children must be empty leaves.
    pub fn free_block(&mut self, first_child_index: u32) -> QuadtreeResult<()> {
        let index = first_child_index;
        if index == ROOT {
            return Err(QuadtreeError::NotAChildBlock { index });
        }
        let quadrant = (index - 1) % BLOCK_LEN;
        if quadrant != 0 {
            return Err(QuadtreeError::MisalignedBlock { index, quadrant });
        }
        let last = index as usize + (BLOCK_LEN - 1) as usize;
        if last >= self.nodes.len() {
            return Err(QuadtreeError::NodeOutOfRange {
                index: last as u32,
                len: self.nodes.len(),
            });
        }

        let parent_index = self
            .live(index)?
            .parent_index()
            .ok_or(QuadtreeError::NodeNotInUse { index })?;
        let grandparent = match self.nodes.get(parent_index as usize) {
            Some(&QuadNode::Branch {
                parent,
                first_child,
            }) if first_child == index => parent,
            _ => return Err(QuadtreeError::NotAChildBlock { index }),
        };
        let all_empty = (0..BLOCK_LEN).all(|i| self.nodes[(index + i) as usize].is_empty_leaf());
        if !all_empty {
            return Err(QuadtreeError::BlockNotEmpty { index });
        }

        for i in 0..BLOCK_LEN {
            self.nodes[(index + i) as usize] = QuadNode::Free {
                next_free: self.free_head,
            };
        }
        self.free_head = Some(index);
        self.nodes[parent_index as usize] = QuadNode::new_leaf(grandparent);
        self.in_use -= BLOCK_LEN as usize;
        debug!(parent_index, base = index, "freed node block");
        Ok(())
    }

    fn free_block_link(&self, base: u32) -> QuadtreeResult<Option<u32>> {
        match self.nodes.get(base as usize) {
            Some(QuadNode::Free { next_free }) if base != ROOT && (base - 1) % BLOCK_LEN == 0 => {
                Ok(*next_free)
            }
            _ => Err(QuadtreeError::CorruptPool {
                reason: format!("free list head {} is not a free block", base),
            }),
        }
    }

    /// Checks every structural invariant of the pool.
    pub fn validate(&self) -> QuadtreeResult<()> {
        let corrupt = |reason: String| Err(QuadtreeError::CorruptPool { reason });
        let len = self.nodes.len();

        match self.nodes.first() {
            Some(QuadNode::Leaf { parent, .. }) | Some(QuadNode::Branch { parent, .. })
                if *parent == ROOT => {}
            _ => return corrupt("root slot is not a live node owned by itself".into()),
        }

        let mut reachable = vec![false; len];
        let mut branches = 0usize;
        let mut stack = vec![ROOT];
        reachable[ROOT as usize] = true;
        while let Some(index) = stack.pop() {
            let first_child = match self.nodes[index as usize] {
                QuadNode::Branch { first_child, .. } => first_child,
                _ => continue,
            };
            branches += 1;
            if first_child == ROOT || (first_child - 1) % BLOCK_LEN != 0 {
                return corrupt(format!("branch {} has misaligned children at {}", index, first_child));
            }
            if first_child as usize + (BLOCK_LEN - 1) as usize >= len {
                return corrupt(format!("branch {} has children past the pool end", index));
            }
            for i in 0..BLOCK_LEN {
                let child = first_child + i;
                if reachable[child as usize] {
                    return corrupt(format!("node {} is reachable twice", child));
                }
                match self.nodes[child as usize].parent_index() {
                    Some(parent) if parent == index => {}
                    _ => {
                        return corrupt(format!(
                            "child {} of branch {} is free or points elsewhere",
                            child, index
                        ))
                    }
                }
                reachable[child as usize] = true;
                stack.push(child);
            }
        }

        if self.in_use != 1 + BLOCK_LEN as usize * branches {
            return corrupt(format!(
                "{} nodes marked in use but {} branches are reachable",
                self.in_use, branches
            ));
        }

        let mut free_slots = 0usize;
        let mut cursor = self.free_head;
        while let Some(base) = cursor {
            if base == ROOT
                || (base - 1) % BLOCK_LEN != 0
                || base as usize + (BLOCK_LEN - 1) as usize >= len
            {
                return corrupt(format!("free block {} is misaligned or out of range", base));
            }
            if free_slots >= len {
                return corrupt("free list contains a cycle".into());
            }
            for i in 0..BLOCK_LEN {
                if self.nodes[(base + i) as usize].in_use() {
                    return corrupt(format!("slot {} is on the free list but in use", base + i));
                }
            }
            free_slots += BLOCK_LEN as usize;
            cursor = self.nodes[base as usize].next_free();
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.in_use() != reachable[index] {
                return corrupt(format!("slot {} is in use but unreachable, or the reverse", index));
            }
        }
        if free_slots + self.in_use != len {
            return corrupt(format!(
                "{} free slots and {} live nodes do not add up to {} slots",
                free_slots, self.in_use, len
            ));
        }
        Ok(())
    }
}
