#![allow(dead_code)]

use alm_core::{
    AttachmentId, AttributesId, CommentId, ListId, NodeId, NodeType, RevisionId, TextId, UserId,
};
use alm_storage::{
    AttachmentRecord, CommentRecord, DataModel, NewNodeAttributes, NewUser, NodeAttributesRecord,
    NodeRecord, RelationalStore, RevisionRecord, SqliteStore, StoreConfig, StoreError, TextTable,
    UserRecord,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("alm_storage_")
        .tempdir()
        .expect("create temp dir")
}

pub fn db_path(dir: &Path) -> PathBuf {
    dir.join(StoreConfig::default().database_file)
}

pub fn open_store(dir: &Path) -> SqliteStore {
    SqliteStore::open(dir, &StoreConfig::default()).expect("open store")
}

/// Opened, logged in as the default admin and loaded at the latest revision.
pub fn open_model(dir: &Path) -> DataModel {
    let mut model = DataModel::open(dir, &StoreConfig::default()).expect("open model");
    model.login("admin", "admin").expect("admin login");
    model.load(None).expect("initial load");
    model
}

pub fn admin_id(store: &impl RelationalStore) -> UserId {
    store
        .select_user_by_username("admin")
        .expect("select admin")
        .expect("admin exists")
        .id
}

/// Faults a [`FaultyStore`] injects on top of the store it wraps.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    pub fail_attributes_insert: bool,
    /// Rewrites the parent of `(child, parent)` in parent queries.
    pub reparent: Option<(NodeId, NodeId)>,
    /// Returns this node twice from parent queries.
    pub duplicate: Option<NodeId>,
}

pub struct FaultyStore<S = SqliteStore> {
    pub inner: S,
    pub faults: Faults,
}

impl<S: RelationalStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Faults::default(),
        }
    }
}

fn injected() -> StoreError {
    StoreError::Io(std::io::Error::other("injected fault"))
}

impl<S: RelationalStore> RelationalStore for FaultyStore<S> {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn close(&mut self) {
        self.inner.close()
    }

    fn begin_transaction(&mut self) -> Result<(), StoreError> {
        self.inner.begin_transaction()
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.inner.rollback()
    }

    fn insert_node(
        &mut self,
        parent: Option<NodeId>,
        node_type: NodeType,
    ) -> Result<NodeId, StoreError> {
        self.inner.insert_node(parent, node_type)
    }

    fn select_node(&self, id: NodeId) -> Result<Option<NodeRecord>, StoreError> {
        self.inner.select_node(id)
    }

    fn select_nodes_by_parent(
        &self,
        parent: Option<NodeId>,
    ) -> Result<Vec<NodeRecord>, StoreError> {
        let mut rows = self.inner.select_nodes_by_parent(parent)?;
        if let Some((child, fake_parent)) = self.faults.reparent {
            for row in rows.iter_mut().filter(|row| row.id == child) {
                row.parent = Some(fake_parent);
            }
        }
        if let Some(duplicate) = self.faults.duplicate {
            if let Some(row) = rows.iter().find(|row| row.id == duplicate).cloned() {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn insert_text(&mut self, table: TextTable, value: &str) -> Result<TextId, StoreError> {
        self.inner.insert_text(table, value)
    }

    fn select_text(&self, table: TextTable, id: TextId) -> Result<Option<String>, StoreError> {
        self.inner.select_text(table, id)
    }

    fn insert_node_attributes(
        &mut self,
        attributes: &NewNodeAttributes,
    ) -> Result<AttributesId, StoreError> {
        if self.faults.fail_attributes_insert {
            return Err(injected());
        }
        self.inner.insert_node_attributes(attributes)
    }

    fn select_latest_attributes_id(
        &self,
        node: NodeId,
        max_revision: RevisionId,
    ) -> Result<Option<AttributesId>, StoreError> {
        self.inner.select_latest_attributes_id(node, max_revision)
    }

    fn select_attributes(
        &self,
        id: AttributesId,
    ) -> Result<Option<NodeAttributesRecord>, StoreError> {
        self.inner.select_attributes(id)
    }

    fn select_max_revision_id(&self) -> Result<Option<RevisionId>, StoreError> {
        self.inner.select_max_revision_id()
    }

    fn insert_revision(&mut self, revision: &RevisionRecord) -> Result<(), StoreError> {
        self.inner.insert_revision(revision)
    }

    fn select_revision(&self, id: RevisionId) -> Result<Option<RevisionRecord>, StoreError> {
        self.inner.select_revision(id)
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<UserId, StoreError> {
        self.inner.insert_user(user)
    }

    fn select_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.inner.select_user_by_id(id)
    }

    fn select_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        self.inner.select_user_by_username(username)
    }

    fn insert_reference_list(&mut self, nodes: &[NodeId]) -> Result<ListId, StoreError> {
        self.inner.insert_reference_list(nodes)
    }

    fn select_reference_list(&self, list: ListId) -> Result<Vec<NodeId>, StoreError> {
        self.inner.select_reference_list(list)
    }

    fn insert_comment(&mut self, text: &str) -> Result<CommentId, StoreError> {
        self.inner.insert_comment(text)
    }

    fn insert_comment_list(&mut self, comments: &[CommentId]) -> Result<ListId, StoreError> {
        self.inner.insert_comment_list(comments)
    }

    fn select_comment_list(&self, list: ListId) -> Result<Vec<CommentRecord>, StoreError> {
        self.inner.select_comment_list(list)
    }

    fn insert_attachment(
        &mut self,
        file_name: &str,
        data: &[u8],
    ) -> Result<AttachmentId, StoreError> {
        self.inner.insert_attachment(file_name, data)
    }

    fn insert_attachment_list(
        &mut self,
        attachments: &[AttachmentId],
    ) -> Result<ListId, StoreError> {
        self.inner.insert_attachment_list(attachments)
    }

    fn select_attachment_list(&self, list: ListId) -> Result<Vec<AttachmentRecord>, StoreError> {
        self.inner.select_attachment_list(list)
    }
}
