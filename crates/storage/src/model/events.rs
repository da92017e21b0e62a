#![forbid(unsafe_code)]

use alm_core::{NodeId, RevisionId};

/// Change notifications delivered to [`super::DataModel::subscribe`] callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelEvent {
    /// The whole tree was replaced. `None` when the store has no revisions yet.
    Reset { revision: Option<RevisionId> },
    NodeAdded {
        id: NodeId,
        parent: Option<NodeId>,
        revision: RevisionId,
    },
    NodeUpdated { id: NodeId, revision: RevisionId },
    /// Soft delete; the node's descendants left the tree with it.
    NodeRemoved { id: NodeId, revision: RevisionId },
}

impl ModelEvent {
    pub fn revision(&self) -> Option<RevisionId> {
        match self {
            Self::Reset { revision } => *revision,
            Self::NodeAdded { revision, .. }
            | Self::NodeUpdated { revision, .. }
            | Self::NodeRemoved { revision, .. } => Some(*revision),
        }
    }
}

pub(crate) type Observer = Box<dyn FnMut(&ModelEvent)>;
