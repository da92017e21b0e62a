#![forbid(unsafe_code)]

//! Reference, comment and attachment lists hanging off a node's attribute snapshot.
//!
//! Lists are append-only: every change writes a complete new list and a new snapshot pointing
//! at it.

use super::DataModel;
use crate::store::{AttachmentRecord, CommentRecord, RelationalStore, StoreError};
use alm_core::{AttachmentId, CommentId, NodeId, RevisionId};

impl<S: RelationalStore> DataModel<S> {
    /// Replaces the node's references. An empty slice clears them.
    ///
    /// Returns `false`, without stamping a revision, when the list is unchanged.
    pub fn set_references(&mut self, id: NodeId, nodes: &[NodeId]) -> Result<bool, StoreError> {
        self.acting_user_id()?;
        self.loaded_item(id)?;
        if let Some(missing) = nodes.iter().find(|node| !self.tree.contains(**node)) {
            return Err(StoreError::validation(format!(
                "referenced node {missing} is not in the loaded tree"
            )));
        }
        if self.references(id)? == nodes {
            return Ok(false);
        }

        self.rewrite_attributes(id, |store, next| {
            next.references = if nodes.is_empty() {
                None
            } else {
                Some(store.insert_reference_list(nodes)?)
            };
            Ok(())
        })?;
        Ok(true)
    }

    /// Appends a comment to the node's comment list.
    pub fn add_comment(
        &mut self,
        id: NodeId,
        text: &str,
    ) -> Result<(RevisionId, CommentId), StoreError> {
        self.acting_user_id()?;
        if text.trim().is_empty() {
            return Err(StoreError::validation("comment must not be empty"));
        }

        self.rewrite_attributes(id, |store, next| {
            let mut comments: Vec<CommentId> = match next.comments {
                Some(list) => store
                    .select_comment_list(list)?
                    .into_iter()
                    .map(|comment| comment.id)
                    .collect(),
                None => Vec::new(),
            };
            let comment = store.insert_comment(text)?;
            comments.push(comment);
            next.comments = Some(store.insert_comment_list(&comments)?);
            Ok(comment)
        })
    }

    /// Appends a file to the node's attachment list.
    pub fn add_attachment(
        &mut self,
        id: NodeId,
        file_name: &str,
        data: &[u8],
    ) -> Result<(RevisionId, AttachmentId), StoreError> {
        self.acting_user_id()?;
        if file_name.trim().is_empty() {
            return Err(StoreError::validation("file name must not be empty"));
        }

        self.rewrite_attributes(id, |store, next| {
            let mut attachments: Vec<AttachmentId> = match next.attachments {
                Some(list) => store
                    .select_attachment_list(list)?
                    .into_iter()
                    .map(|attachment| attachment.id)
                    .collect(),
                None => Vec::new(),
            };
            let attachment = store.insert_attachment(file_name.trim(), data)?;
            attachments.push(attachment);
            next.attachments = Some(store.insert_attachment_list(&attachments)?);
            Ok(attachment)
        })
    }

    pub fn references(&self, id: NodeId) -> Result<Vec<NodeId>, StoreError> {
        match self.loaded_item(id)?.attributes().references {
            Some(list) => self.store.select_reference_list(list),
            None => Ok(Vec::new()),
        }
    }

    pub fn comments(&self, id: NodeId) -> Result<Vec<CommentRecord>, StoreError> {
        match self.loaded_item(id)?.attributes().comments {
            Some(list) => self.store.select_comment_list(list),
            None => Ok(Vec::new()),
        }
    }

    pub fn attachments(&self, id: NodeId) -> Result<Vec<AttachmentRecord>, StoreError> {
        match self.loaded_item(id)?.attributes().attachments {
            Some(list) => self.store.select_attachment_list(list),
            None => Ok(Vec::new()),
        }
    }
}
