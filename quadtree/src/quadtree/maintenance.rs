use super::*;
use tracing::debug;

impl QuadTree {
    /// Collapses every branch whose four children are empty leaves, bottom
    /// up, so a collapse can cascade to the root in a single pass. Returns the
    /// number of blocks returned to the free list.
    pub fn compact(&mut self) -> QuadtreeResult<usize> {
        // Child blocks in pre-order. Walking it backwards visits every block
        // after all blocks beneath it.
        let mut blocks: Vec<u32> = Vec::new();
        let mut stack: SmallVec<[u32; 64]> = SmallVec::new();
        stack.push(ROOT);
        while let Some(index) = stack.pop() {
            if let Some(first_child) = self.pool.node(index).first_child() {
                blocks.push(first_child);
                for i in 0..BLOCK_LEN {
                    stack.push(first_child + i);
                }
            }
        }

        let mut freed = 0;
        for &first_child in blocks.iter().rev() {
            let collapsible =
                (0..BLOCK_LEN).all(|i| self.pool.node(first_child + i).is_empty_leaf());
            if collapsible {
                self.pool.free_block(first_child)?;
                freed += 1;
            }
        }

        if freed > 0 {
            debug!(
                freed,
                nodes_in_use = self.pool.nodes_in_use(),
                "compacted quadtree"
            );
        }
        Ok(freed)
    }
}
