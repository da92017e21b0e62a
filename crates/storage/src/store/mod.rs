#![forbid(unsafe_code)]

mod convert;
mod error;
mod field;
mod records;
mod relational;
mod schema;
mod users;

pub use error::StoreError;
pub use field::Field;
pub use records::*;
pub use relational::RelationalStore;
pub use users::{hash_password, verify_password};

pub(crate) use convert::now_utc;

use crate::config::StoreConfig;
use alm_core::{
    AttachmentId, AttributesId, CommentId, ListId, NodeId, NodeType, RevisionId, TextId, UserId,
};
use convert::{boolean_to_integer, timestamp_to_text};
use rusqlite::{Connection, OptionalExtension, params};
use schema::Preflight;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The embedded, file-backed relational store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
    storage_dir: PathBuf,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Opens the database in `storage_dir`, creating and initializing it when the file is empty.
    ///
    /// A non-empty file that is not ours (or fails its integrity check) is rejected with
    /// [`StoreError::SchemaMismatch`]; it is never rewritten.
    pub fn open(storage_dir: impl AsRef<Path>, config: &StoreConfig) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(&config.database_file);
        let conn = Connection::open(&db_path)?;
        schema::apply_runtime_config(&conn, config)?;

        match schema::preflight_gate(&conn)? {
            Preflight::Fresh => {
                info!(path = %db_path.display(), "creating database");
                schema::install_schema(&conn, config)?;
                schema::validate(&conn)?;
            }
            Preflight::Existing => {
                debug!(path = %db_path.display(), "opened database");
            }
        }

        Ok(Self {
            conn: Some(conn),
            storage_dir,
            db_path,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Re-runs the integrity, application id, schema version and table checks.
    pub fn validate(&self) -> Result<(), StoreError> {
        schema::validate(self.conn()?)
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::NotConnected)
    }

    fn insert_list(&self, list_table: &str) -> Result<ListId, StoreError> {
        let conn = self.conn()?;
        conn.execute(&format!("INSERT INTO {list_table} DEFAULT VALUES"), [])?;
        Ok(ListId::new(conn.last_insert_rowid()))
    }
}

impl RelationalStore for SqliteStore {
    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, err)) = conn.close() {
                tracing::warn!(error = %err, "closing database failed");
            }
        }
    }

    fn begin_transaction(&mut self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            return Err(StoreError::transaction(
                "begin",
                "a transaction is already open",
            ));
        }
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|err| StoreError::transaction("begin", err))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        if conn.is_autocommit() {
            return Err(StoreError::transaction("commit", "no open transaction"));
        }
        conn.execute_batch("COMMIT")
            .map_err(|err| StoreError::transaction("commit", err))
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK")
            .map_err(|err| StoreError::transaction("rollback", err))
    }

    fn insert_node(
        &mut self,
        parent: Option<NodeId>,
        node_type: NodeType,
    ) -> Result<NodeId, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO Node(Parent, Type) VALUES (?1, ?2)",
            params![Field::from(parent.map(NodeId::get)), node_type.code()],
        )?;
        Ok(NodeId::new(conn.last_insert_rowid()))
    }

    fn select_node(&self, id: NodeId) -> Result<Option<NodeRecord>, StoreError> {
        let mut stmt = self
            .conn()?
            .prepare_cached("SELECT Id, Parent, Type FROM Node WHERE Id = ?1")?;
        let mut rows = stmt.query(params![id.get()])?;
        match rows.next()? {
            Some(row) => Ok(Some(NodeRecord::from_row(row)?)),
            None => Ok(None),
        }
    }

    fn select_nodes_by_parent(
        &self,
        parent: Option<NodeId>,
    ) -> Result<Vec<NodeRecord>, StoreError> {
        let mut stmt = self
            .conn()?
            .prepare_cached("SELECT Id, Parent, Type FROM Node WHERE Parent IS ?1 ORDER BY Id ASC")?;
        let mut rows = stmt.query(params![Field::from(parent.map(NodeId::get))])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(NodeRecord::from_row(row)?);
        }
        Ok(out)
    }

    fn insert_text(&mut self, table: TextTable, value: &str) -> Result<TextId, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO {}(Text) VALUES (?1)", table.table_name()),
            params![value],
        )?;
        Ok(TextId::new(conn.last_insert_rowid()))
    }

    fn select_text(&self, table: TextTable, id: TextId) -> Result<Option<String>, StoreError> {
        let text = self
            .conn()?
            .query_row(
                &format!("SELECT Text FROM {} WHERE Id = ?1", table.table_name()),
                params![id.get()],
                |row| row.get::<_, Field<String>>(0),
            )
            .optional()?;
        match text {
            Some(field) => Ok(Some(field.require("Text")?)),
            None => Ok(None),
        }
    }

    fn insert_node_attributes(
        &mut self,
        attributes: &NewNodeAttributes,
    ) -> Result<AttributesId, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO NodeAttributes(Node, Revision, Name, Description, "References", Attachments, Comments, Active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                attributes.node.get(),
                attributes.revision.get(),
                attributes.name.get(),
                Field::from(attributes.description.map(TextId::get)),
                Field::from(attributes.references.map(ListId::get)),
                Field::from(attributes.attachments.map(ListId::get)),
                Field::from(attributes.comments.map(ListId::get)),
                boolean_to_integer(attributes.active),
            ],
        )?;
        Ok(AttributesId::new(conn.last_insert_rowid()))
    }

    fn select_latest_attributes_id(
        &self,
        node: NodeId,
        max_revision: RevisionId,
    ) -> Result<Option<AttributesId>, StoreError> {
        let id = self
            .conn()?
            .query_row(
                r#"
                SELECT Id FROM NodeAttributes
                WHERE Node = ?1 AND Revision <= ?2
                ORDER BY Revision DESC
                LIMIT 1
                "#,
                params![node.get(), max_revision.get()],
                |row| row.get::<_, Field<i64>>(0),
            )
            .optional()?;
        match id {
            Some(field) => Ok(Some(AttributesId::new(field.require("NodeAttributes.Id")?))),
            None => Ok(None),
        }
    }

    fn select_attributes(
        &self,
        id: AttributesId,
    ) -> Result<Option<NodeAttributesRecord>, StoreError> {
        let mut stmt = self.conn()?.prepare_cached(
            r#"
            SELECT Id, Node, Revision, Name, Description, "References", Attachments, Comments, Active
            FROM NodeAttributes
            WHERE Id = ?1
            "#,
        )?;
        let mut rows = stmt.query(params![id.get()])?;
        match rows.next()? {
            Some(row) => Ok(Some(NodeAttributesRecord::from_row(row)?)),
            None => Ok(None),
        }
    }

    fn select_max_revision_id(&self) -> Result<Option<RevisionId>, StoreError> {
        let max = self
            .conn()?
            .query_row("SELECT MAX(Id) FROM Revision", [], |row| {
                row.get::<_, Field<i64>>(0)
            })?;
        Ok(max.map(RevisionId::new).into_option())
    }

    fn insert_revision(&mut self, revision: &RevisionRecord) -> Result<(), StoreError> {
        let timestamp = timestamp_to_text(revision.timestamp)?;
        self.conn()?.execute(
            "INSERT INTO Revision(Id, Timestamp, User) VALUES (?1, ?2, ?3)",
            params![revision.id.get(), timestamp, revision.user.get()],
        )?;
        Ok(())
    }

    fn select_revision(&self, id: RevisionId) -> Result<Option<RevisionRecord>, StoreError> {
        let mut stmt = self
            .conn()?
            .prepare_cached("SELECT Id, Timestamp, User FROM Revision WHERE Id = ?1")?;
        let mut rows = stmt.query(params![id.get()])?;
        match rows.next()? {
            Some(row) => Ok(Some(RevisionRecord::from_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<UserId, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO User(Type, FullName, Username, Password) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.user_type.code(),
                user.full_name,
                user.username,
                user.password_hash
            ],
        )?;
        Ok(UserId::new(conn.last_insert_rowid()))
    }

    fn select_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let mut stmt = self.conn()?.prepare_cached(
            "SELECT Id, Type, FullName, Username, Password FROM User WHERE Id = ?1",
        )?;
        let mut rows = stmt.query(params![id.get()])?;
        match rows.next()? {
            Some(row) => Ok(Some(UserRecord::from_row(row)?)),
            None => Ok(None),
        }
    }

    fn select_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let mut stmt = self.conn()?.prepare_cached(
            "SELECT Id, Type, FullName, Username, Password FROM User WHERE Username = ?1",
        )?;
        let mut rows = stmt.query(params![username])?;
        match rows.next()? {
            Some(row) => Ok(Some(UserRecord::from_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_reference_list(&mut self, nodes: &[NodeId]) -> Result<ListId, StoreError> {
        let list = self.insert_list("NodeReferenceList")?;
        let mut stmt = self
            .conn()?
            .prepare_cached("INSERT INTO NodeReferenceItem(List, Node) VALUES (?1, ?2)")?;
        for node in nodes {
            stmt.execute(params![list.get(), node.get()])?;
        }
        Ok(list)
    }

    fn select_reference_list(&self, list: ListId) -> Result<Vec<NodeId>, StoreError> {
        let mut stmt = self.conn()?.prepare_cached(
            "SELECT Node FROM NodeReferenceItem WHERE List = ?1 ORDER BY Id ASC",
        )?;
        let mut rows = stmt.query(params![list.get()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let node = row.get::<_, Field<i64>>(0)?.require("NodeReferenceItem.Node")?;
            out.push(NodeId::new(node));
        }
        Ok(out)
    }

    fn insert_comment(&mut self, text: &str) -> Result<CommentId, StoreError> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO NodeComment(Text) VALUES (?1)", params![text])?;
        Ok(CommentId::new(conn.last_insert_rowid()))
    }

    fn insert_comment_list(&mut self, comments: &[CommentId]) -> Result<ListId, StoreError> {
        let list = self.insert_list("NodeCommentList")?;
        let mut stmt = self
            .conn()?
            .prepare_cached("INSERT INTO NodeCommentItem(List, Comment) VALUES (?1, ?2)")?;
        for comment in comments {
            stmt.execute(params![list.get(), comment.get()])?;
        }
        Ok(list)
    }

    fn select_comment_list(&self, list: ListId) -> Result<Vec<CommentRecord>, StoreError> {
        let mut stmt = self.conn()?.prepare_cached(
            r#"
            SELECT c.Id, c.Text
            FROM NodeCommentItem i
            JOIN NodeComment c ON c.Id = i.Comment
            WHERE i.List = ?1
            ORDER BY i.Id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![list.get()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(CommentRecord {
                id: CommentId::new(row.get::<_, Field<i64>>(0)?.require("NodeComment.Id")?),
                text: row.get::<_, Field<String>>(1)?.require("NodeComment.Text")?,
            });
        }
        Ok(out)
    }

    fn insert_attachment(
        &mut self,
        file_name: &str,
        data: &[u8],
    ) -> Result<AttachmentId, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO NodeAttachment(FileName, FileData) VALUES (?1, ?2)",
            params![file_name, data],
        )?;
        Ok(AttachmentId::new(conn.last_insert_rowid()))
    }

    fn insert_attachment_list(
        &mut self,
        attachments: &[AttachmentId],
    ) -> Result<ListId, StoreError> {
        let list = self.insert_list("NodeAttachmentList")?;
        let mut stmt = self.conn()?.prepare_cached(
            "INSERT INTO NodeAttachmentItem(List, Attachment) VALUES (?1, ?2)",
        )?;
        for attachment in attachments {
            stmt.execute(params![list.get(), attachment.get()])?;
        }
        Ok(list)
    }

    fn select_attachment_list(&self, list: ListId) -> Result<Vec<AttachmentRecord>, StoreError> {
        let mut stmt = self.conn()?.prepare_cached(
            r#"
            SELECT a.Id, a.FileName, a.FileData
            FROM NodeAttachmentItem i
            JOIN NodeAttachment a ON a.Id = i.Attachment
            WHERE i.List = ?1
            ORDER BY i.Id ASC
            "#,
        )?;
        let mut rows = stmt.query(params![list.get()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(AttachmentRecord {
                id: AttachmentId::new(
                    row.get::<_, Field<i64>>(0)?.require("NodeAttachment.Id")?,
                ),
                file_name: row
                    .get::<_, Field<String>>(1)?
                    .require("NodeAttachment.FileName")?,
                data: row
                    .get::<_, Field<Vec<u8>>>(2)?
                    .require("NodeAttachment.FileData")?,
            });
        }
        Ok(out)
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        self.close();
    }
}
