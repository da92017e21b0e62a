#![forbid(unsafe_code)]

//! In-memory projection of the node hierarchy at one revision.
//!
//! Items live in an arena keyed by their store id. A parent owns its children through the
//! arena: removing an item removes its whole subtree, and `parent` is an id lookup, never a
//! pointer.

use crate::ids::{ListId, NodeId, RevisionId, TextId};
use crate::kinds::NodeType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mutable facts of an item as of the attribute snapshot it was built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemAttributes {
    pub revision: RevisionId,
    pub name: String,
    pub description: Option<TextId>,
    pub references: Option<ListId>,
    pub attachments: Option<ListId>,
    pub comments: Option<ListId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    id: NodeId,
    parent: Option<NodeId>,
    node_type: NodeType,
    attributes: ItemAttributes,
    children: Vec<NodeId>,
}

impl Item {
    pub fn new(
        id: NodeId,
        parent: Option<NodeId>,
        node_type: NodeType,
        attributes: ItemAttributes,
    ) -> Self {
        Self {
            id,
            parent,
            node_type,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn attributes(&self) -> &ItemAttributes {
        &self.attributes
    }

    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    pub fn revision(&self) -> RevisionId {
        self.attributes.revision
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    DuplicateId(NodeId),
    UnknownParent { id: NodeId, parent: NodeId },
    UnknownItem(NodeId),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "node {id} appears twice in the tree"),
            Self::UnknownParent { id, parent } => {
                write!(f, "node {id} refers to parent {parent} which is not in the tree")
            }
            Self::UnknownItem(id) => write!(f, "node {id} is not in the tree"),
        }
    }
}

impl std::error::Error for TreeError {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    items: BTreeMap<NodeId, Item>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn root_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.roots.iter().filter_map(|id| self.items.get(id))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Item> + '_ {
        self.items
            .get(&id)
            .map(|item| item.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.items.get(child))
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&Item> {
        self.items
            .get(&id)
            .and_then(|item| item.parent)
            .and_then(|parent| self.items.get(&parent))
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.keys().copied()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    /// Attaches `item` under its parent, or as a root when it has none.
    pub fn insert(&mut self, item: Item) -> Result<(), TreeError> {
        let id = item.id;
        if self.items.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        match item.parent {
            Some(parent) => {
                let Some(parent_item) = self.items.get_mut(&parent) else {
                    return Err(TreeError::UnknownParent { id, parent });
                };
                parent_item.children.push(id);
            }
            None => self.roots.push(id),
        }
        self.items.insert(id, Item {
            children: Vec::new(),
            ..item
        });
        Ok(())
    }

    /// Adds `item` as a top-level entry even if its parent lies outside this tree.
    ///
    /// Used for subtree projections, where the topmost item keeps its real parent id.
    pub fn insert_root(&mut self, item: Item) -> Result<(), TreeError> {
        let id = item.id;
        if self.items.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        self.roots.push(id);
        self.items.insert(id, Item {
            children: Vec::new(),
            ..item
        });
        Ok(())
    }

    pub fn set_attributes(
        &mut self,
        id: NodeId,
        attributes: ItemAttributes,
    ) -> Result<(), TreeError> {
        let item = self.items.get_mut(&id).ok_or(TreeError::UnknownItem(id))?;
        item.attributes = attributes;
        Ok(())
    }

    /// Removes `id` and all of its descendants. Returns the removed ids in pre-order.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let item = self.items.get(&id).ok_or(TreeError::UnknownItem(id))?;
        let parent = item.parent;

        let removed = self.preorder_from(id);
        for removed_id in &removed {
            self.items.remove(removed_id);
        }

        match parent.and_then(|parent| self.items.get_mut(&parent)) {
            Some(parent_item) => parent_item.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        Ok(removed)
    }

    /// Depth-first walk of the whole tree as `(depth, item)` pairs, roots at depth 0.
    pub fn walk(&self) -> Vec<(usize, &Item)> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut stack: Vec<(usize, NodeId)> =
            self.roots.iter().rev().map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(item) = self.items.get(&id) else {
                continue;
            };
            out.push((depth, item));
            stack.extend(item.children.iter().rev().map(|child| (depth + 1, *child)));
        }
        out
    }

    fn preorder_from(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(item) = self.items.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(item.children.iter().rev().copied());
        }
        out
    }
}
