#![forbid(unsafe_code)]

use alm_core::{NodeId, NodeType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddNodeRequest {
    pub parent: Option<NodeId>,
    pub node_type: NodeType,
    pub name: String,
    /// Empty means no description row is written.
    pub description: String,
}

/// Fields left as `None` keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateNodeRequest {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    /// `Some(false)` soft-deletes the node and its subtree.
    pub active: Option<bool>,
}

impl UpdateNodeRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.active.is_none()
    }
}
