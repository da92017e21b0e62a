#![forbid(unsafe_code)]

use super::error::StoreError;
use super::records::{
    AttachmentRecord, CommentRecord, NewNodeAttributes, NewUser, NodeAttributesRecord, NodeRecord,
    RevisionRecord, TextTable, UserRecord,
};
use alm_core::{
    AttachmentId, AttributesId, CommentId, ListId, NodeId, NodeType, RevisionId, TextId, UserId,
};

/// CRUD and query primitives the ledger, resolver, loader and data model are written against.
///
/// Implementations are single-connection and synchronous. Reads issued inside an open
/// transaction must observe that transaction's own writes.
pub trait RelationalStore {
    fn is_open(&self) -> bool;
    fn close(&mut self);

    fn begin_transaction(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;

    fn insert_node(
        &mut self,
        parent: Option<NodeId>,
        node_type: NodeType,
    ) -> Result<NodeId, StoreError>;
    fn select_node(&self, id: NodeId) -> Result<Option<NodeRecord>, StoreError>;
    /// `None` selects the roots. Rows come back in ascending id order.
    fn select_nodes_by_parent(&self, parent: Option<NodeId>)
    -> Result<Vec<NodeRecord>, StoreError>;

    fn insert_text(&mut self, table: TextTable, value: &str) -> Result<TextId, StoreError>;
    fn select_text(&self, table: TextTable, id: TextId) -> Result<Option<String>, StoreError>;

    fn insert_node_attributes(
        &mut self,
        attributes: &NewNodeAttributes,
    ) -> Result<AttributesId, StoreError>;
    /// Id of the row with the largest revision not newer than `max_revision`.
    fn select_latest_attributes_id(
        &self,
        node: NodeId,
        max_revision: RevisionId,
    ) -> Result<Option<AttributesId>, StoreError>;
    fn select_attributes(&self, id: AttributesId)
    -> Result<Option<NodeAttributesRecord>, StoreError>;

    fn select_max_revision_id(&self) -> Result<Option<RevisionId>, StoreError>;
    fn insert_revision(&mut self, revision: &RevisionRecord) -> Result<(), StoreError>;
    fn select_revision(&self, id: RevisionId) -> Result<Option<RevisionRecord>, StoreError>;

    fn insert_user(&mut self, user: &NewUser) -> Result<UserId, StoreError>;
    fn select_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;
    fn select_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, StoreError>;

    fn insert_reference_list(&mut self, nodes: &[NodeId]) -> Result<ListId, StoreError>;
    fn select_reference_list(&self, list: ListId) -> Result<Vec<NodeId>, StoreError>;

    fn insert_comment(&mut self, text: &str) -> Result<CommentId, StoreError>;
    fn insert_comment_list(&mut self, comments: &[CommentId]) -> Result<ListId, StoreError>;
    fn select_comment_list(&self, list: ListId) -> Result<Vec<CommentRecord>, StoreError>;

    fn insert_attachment(
        &mut self,
        file_name: &str,
        data: &[u8],
    ) -> Result<AttachmentId, StoreError>;
    fn insert_attachment_list(
        &mut self,
        attachments: &[AttachmentId],
    ) -> Result<ListId, StoreError>;
    fn select_attachment_list(&self, list: ListId)
    -> Result<Vec<AttachmentRecord>, StoreError>;
}
