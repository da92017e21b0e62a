#![forbid(unsafe_code)]

use crate::store::{NodeAttributesRecord, RelationalStore, StoreError};
use alm_core::{NodeId, RevisionId};

/// Returns the attribute snapshot of `node` with the largest revision not newer than `revision`.
///
/// `NotFound` means the node did not exist yet at `revision`. The snapshot's `active` flag is
/// left for the caller to interpret.
pub fn resolve_attributes<S>(
    store: &S,
    node: NodeId,
    revision: RevisionId,
) -> Result<NodeAttributesRecord, StoreError>
where
    S: RelationalStore + ?Sized,
{
    let id = store
        .select_latest_attributes_id(node, revision)?
        .ok_or(StoreError::NotFound("node attributes"))?;
    let attributes = store.select_attributes(id)?.ok_or_else(|| {
        StoreError::structural(format!("attributes row {id} vanished while resolving node {node}"))
    })?;

    if attributes.node != node {
        return Err(StoreError::structural(format!(
            "attributes row {id} belongs to node {}, not {node}",
            attributes.node
        )));
    }
    if attributes.revision > revision {
        return Err(StoreError::structural(format!(
            "attributes row {id} is from revision {}, after {revision}",
            attributes.revision
        )));
    }
    Ok(attributes)
}
