#![forbid(unsafe_code)]

//! Rebuilds the in-memory [`Tree`] as of a revision.
//!
//! Loads are atomic: a fresh tree is built and handed out only when every node resolved cleanly.
//! The first structural or conversion error discards everything built so far.

use crate::resolver::resolve_attributes;
use crate::store::{NodeAttributesRecord, NodeRecord, RelationalStore, StoreError, TextTable};
use alm_core::{Item, ItemAttributes, NodeId, RevisionId, Tree};
use tracing::{debug, instrument};

/// Outcome of loading one node and its descendants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loaded {
    Item(NodeId),
    /// Inactive at the target revision, or created after it. The whole subtree was left out.
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    UnderParent,
    TopLevel,
}

/// Loads every live root and its live descendants as of `revision`.
#[instrument(level = "debug", skip(store))]
pub fn load_tree<S>(store: &S, revision: RevisionId) -> Result<Tree, StoreError>
where
    S: RelationalStore + ?Sized,
{
    let mut tree = Tree::new();
    for record in store.select_nodes_by_parent(None)? {
        if let Some(parent) = record.parent {
            return Err(StoreError::structural(format!(
                "root query returned node {} with parent {parent}",
                record.id
            )));
        }
        load_subtree(store, &record, revision, &mut tree)?;
    }
    debug!(items = tree.len(), "tree loaded");
    Ok(tree)
}

/// Loads `record` under its parent in `tree`, then recurses into its children.
///
/// The parent must already be in `tree` unless `record` is a root.
pub fn load_subtree<S>(
    store: &S,
    record: &NodeRecord,
    revision: RevisionId,
    tree: &mut Tree,
) -> Result<Loaded, StoreError>
where
    S: RelationalStore + ?Sized,
{
    load_item(store, record, revision, tree, Placement::UnderParent)
}

/// Loads the subtree rooted at `id` as its own tree.
///
/// The top item keeps its real parent id even though that parent is not part of the result.
/// An inactive node yields an empty tree.
pub fn load_node<S>(store: &S, id: NodeId, revision: RevisionId) -> Result<Tree, StoreError>
where
    S: RelationalStore + ?Sized,
{
    let record = store.select_node(id)?.ok_or(StoreError::NotFound("node"))?;
    let mut tree = Tree::new();
    load_item(store, &record, revision, &mut tree, Placement::TopLevel)?;
    Ok(tree)
}

fn load_item<S>(
    store: &S,
    record: &NodeRecord,
    revision: RevisionId,
    tree: &mut Tree,
    placement: Placement,
) -> Result<Loaded, StoreError>
where
    S: RelationalStore + ?Sized,
{
    let attributes = match resolve_attributes(store, record.id, revision) {
        Ok(attributes) => attributes,
        Err(StoreError::NotFound(_)) => {
            if store
                .select_latest_attributes_id(record.id, RevisionId::new(i64::MAX))?
                .is_some()
            {
                return Ok(Loaded::Skipped);
            }
            return Err(StoreError::structural(format!(
                "node {} has no attributes at all",
                record.id
            )));
        }
        Err(err) => return Err(err),
    };
    if !attributes.active {
        return Ok(Loaded::Skipped);
    }

    let item = materialize(store, record, &attributes)?;
    match placement {
        Placement::UnderParent => tree.insert(item)?,
        Placement::TopLevel => tree.insert_root(item)?,
    }

    for child in store.select_nodes_by_parent(Some(record.id))? {
        if child.parent != Some(record.id) {
            return Err(StoreError::structural(format!(
                "node {} listed under {} but its parent is {:?}",
                child.id, record.id, child.parent
            )));
        }
        load_item(store, &child, revision, tree, Placement::UnderParent)?;
    }
    Ok(Loaded::Item(record.id))
}

/// Builds the in-memory item for a node from its resolved snapshot.
fn materialize<S>(
    store: &S,
    record: &NodeRecord,
    attributes: &NodeAttributesRecord,
) -> Result<Item, StoreError>
where
    S: RelationalStore + ?Sized,
{
    let name = store
        .select_text(TextTable::NodeName, attributes.name)?
        .ok_or_else(|| {
            StoreError::structural(format!(
                "name text {} of node {} is missing",
                attributes.name, record.id
            ))
        })?;
    Ok(Item::new(
        record.id,
        record.parent,
        record.node_type,
        item_attributes(attributes, name),
    ))
}

fn item_attributes(attributes: &NodeAttributesRecord, name: String) -> ItemAttributes {
    ItemAttributes {
        revision: attributes.revision,
        name,
        description: attributes.description,
        references: attributes.references,
        attachments: attributes.attachments,
        comments: attributes.comments,
    }
}
