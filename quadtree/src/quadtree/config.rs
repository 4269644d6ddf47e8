use crate::error::{QuadtreeError, QuadtreeResult};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Node slots reserved up front.
    pub pool_size: usize,
    /// Entities a leaf holds before it splits.
    pub node_capacity: usize,
    /// Depth cap, counting the root as depth 1. Leaves at this depth never
    /// split and accept entities past `node_capacity`.
    pub max_depth: usize,
    /// Hand out sequential ids through `insert_auto`.
    pub auto_id: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pool_size: 4000,
            node_capacity: 8,
            max_depth: 12,
            auto_id: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> QuadtreeResult<()> {
        if self.node_capacity == 0 {
            return Err(QuadtreeError::InvalidConfig {
                field: "node_capacity",
            });
        }
        if self.max_depth == 0 {
            return Err(QuadtreeError::InvalidConfig { field: "max_depth" });
        }
        Ok(())
    }
}
