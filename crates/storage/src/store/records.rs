#![forbid(unsafe_code)]

//! Plain rows of the persisted tables.

use super::convert::{
    integer_to_boolean, integer_to_node_type, integer_to_user_type, text_to_timestamp,
};
use super::error::StoreError;
use super::field::Field;
use alm_core::{
    AttachmentId, AttributesId, CommentId, ListId, NodeId, NodeType, RevisionId, TextId, UserId,
    UserType,
};
use rusqlite::Row;
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub node_type: NodeType,
}

impl NodeRecord {
    /// Expects `Id, Parent, Type`.
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: NodeId::new(row.get::<_, Field<i64>>(0)?.require("Node.Id")?),
            parent: row.get::<_, Field<i64>>(1)?.map(NodeId::new).into_option(),
            node_type: integer_to_node_type("Node.Type", row.get(2)?)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionRecord {
    pub id: RevisionId,
    pub timestamp: OffsetDateTime,
    pub user: UserId,
}

impl RevisionRecord {
    /// Expects `Id, Timestamp, User`.
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: RevisionId::new(row.get::<_, Field<i64>>(0)?.require("Revision.Id")?),
            timestamp: text_to_timestamp("Revision.Timestamp", row.get(1)?)?,
            user: UserId::new(row.get::<_, Field<i64>>(2)?.require("Revision.User")?),
        })
    }
}

/// The two append-only text tables referenced from `NodeAttributes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextTable {
    NodeName,
    NodeDescription,
}

impl TextTable {
    pub fn table_name(self) -> &'static str {
        match self {
            TextTable::NodeName => "NodeName",
            TextTable::NodeDescription => "NodeDescription",
        }
    }
}

/// A node's mutable facts as of one revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeAttributesRecord {
    pub id: AttributesId,
    pub node: NodeId,
    pub revision: RevisionId,
    pub name: TextId,
    pub description: Option<TextId>,
    pub references: Option<ListId>,
    pub attachments: Option<ListId>,
    pub comments: Option<ListId>,
    pub active: bool,
}

impl NodeAttributesRecord {
    /// Expects `Id, Node, Revision, Name, Description, References, Attachments, Comments, Active`.
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: AttributesId::new(row.get::<_, Field<i64>>(0)?.require("NodeAttributes.Id")?),
            node: NodeId::new(row.get::<_, Field<i64>>(1)?.require("NodeAttributes.Node")?),
            revision: RevisionId::new(
                row.get::<_, Field<i64>>(2)?
                    .require("NodeAttributes.Revision")?,
            ),
            name: TextId::new(row.get::<_, Field<i64>>(3)?.require("NodeAttributes.Name")?),
            description: row.get::<_, Field<i64>>(4)?.map(TextId::new).into_option(),
            references: row.get::<_, Field<i64>>(5)?.map(ListId::new).into_option(),
            attachments: row.get::<_, Field<i64>>(6)?.map(ListId::new).into_option(),
            comments: row.get::<_, Field<i64>>(7)?.map(ListId::new).into_option(),
            active: integer_to_boolean("NodeAttributes.Active", row.get(8)?)?,
        })
    }

    /// Copies every ref forward into a snapshot for `revision`.
    pub fn carry_forward(&self, revision: RevisionId) -> NewNodeAttributes {
        NewNodeAttributes {
            node: self.node,
            revision,
            name: self.name,
            description: self.description,
            references: self.references,
            attachments: self.attachments,
            comments: self.comments,
            active: self.active,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNodeAttributes {
    pub node: NodeId,
    pub revision: RevisionId,
    pub name: TextId,
    pub description: Option<TextId>,
    pub references: Option<ListId>,
    pub attachments: Option<ListId>,
    pub comments: Option<ListId>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub user_type: UserType,
    pub full_name: String,
    pub username: String,
    /// `salt$digest`, both hex.
    pub password: String,
}

impl UserRecord {
    /// Expects `Id, Type, FullName, Username, Password`.
    pub(crate) fn from_row(row: &Row<'_>) -> Result<Self, StoreError> {
        Ok(Self {
            id: UserId::new(row.get::<_, Field<i64>>(0)?.require("User.Id")?),
            user_type: integer_to_user_type("User.Type", row.get(1)?)?,
            full_name: row.get::<_, Field<String>>(2)?.require("User.FullName")?,
            username: row.get::<_, Field<String>>(3)?.require("User.Username")?,
            password: row.get::<_, Field<String>>(4)?.require("User.Password")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub user_type: UserType,
    pub full_name: String,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: CommentId,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub id: AttachmentId,
    pub file_name: String,
    pub data: Vec<u8>,
}
