#![forbid(unsafe_code)]

//! The caller-facing model: one store, one loaded tree, one acting user.
//!
//! Every write goes through a revision envelope and then patches the in-memory tree in place,
//! so the tree keeps reflecting the latest revision without a reload. Observers are told about
//! each change synchronously.

mod events;
mod lists;
mod requests;

pub use events::ModelEvent;
pub use requests::{AddNodeRequest, UpdateNodeRequest};

use crate::config::StoreConfig;
use crate::ledger::with_revision;
use crate::loader::load_tree;
use crate::resolver::resolve_attributes;
use crate::store::{
    NewNodeAttributes, NewUser, RelationalStore, SqliteStore, StoreError, TextTable, UserRecord,
    hash_password, verify_password,
};
use alm_core::{Item, ItemAttributes, NodeId, RevisionId, Tree, UserId, UserType, validate_name};
use events::Observer;
use std::path::Path;
use tracing::{debug, info, instrument};

pub struct DataModel<S: RelationalStore = SqliteStore> {
    store: S,
    tree: Tree,
    revision: Option<RevisionId>,
    loaded: bool,
    acting_user: Option<UserRecord>,
    observers: Vec<Observer>,
}

impl DataModel<SqliteStore> {
    /// Opens (or creates) the database in `storage_dir`. The tree starts empty and unloaded.
    pub fn open(storage_dir: impl AsRef<Path>, config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self::new(SqliteStore::open(storage_dir, config)?))
    }
}

impl<S: RelationalStore> DataModel<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tree: Tree::new(),
            revision: None,
            loaded: false,
            acting_user: None,
            observers: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    /// Disconnects from the store and drops the loaded tree. Later store work fails with
    /// [`StoreError::NotConnected`].
    pub fn close(&mut self) {
        self.store.close();
        self.tree = Tree::new();
        self.revision = None;
        self.loaded = false;
        self.acting_user = None;
        self.emit(ModelEvent::Reset { revision: None });
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The revision the in-memory tree reflects.
    pub fn revision(&self) -> Option<RevisionId> {
        self.revision
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn acting_user(&self) -> Option<&UserRecord> {
        self.acting_user.as_ref()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&ModelEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Sets the user every following revision is stamped with.
    pub fn login(&mut self, username: &str, password: &str) -> Result<&UserRecord, StoreError> {
        let user = self
            .store
            .select_user_by_username(username)?
            .ok_or(StoreError::NotFound("user"))?;
        if !verify_password(&user.password, password) {
            return Err(StoreError::AuthenticationFailed);
        }
        info!(user = %user.id, username = %user.username, "logged in");
        Ok(self.acting_user.insert(user))
    }

    pub fn logout(&mut self) {
        self.acting_user = None;
    }

    /// Creates a login. Only an acting administrator may do this; no revision is stamped.
    pub fn add_user(
        &mut self,
        user_type: UserType,
        full_name: &str,
        username: &str,
        password: &str,
    ) -> Result<UserId, StoreError> {
        let acting = self.acting_user.as_ref().ok_or(StoreError::NoActingUser)?;
        if acting.user_type != UserType::Administrator {
            return Err(StoreError::validation("only administrators can add users"));
        }
        validate_name(full_name)?;
        validate_name(username)?;
        if password.is_empty() {
            return Err(StoreError::validation("password must not be empty"));
        }
        if self.store.select_user_by_username(username.trim())?.is_some() {
            return Err(StoreError::validation("username is already taken"));
        }

        let user = NewUser {
            user_type,
            full_name: full_name.trim().to_string(),
            username: username.trim().to_string(),
            password_hash: hash_password(password),
        };
        self.store.begin_transaction()?;
        let id = match self.store.insert_user(&user) {
            Ok(id) => id,
            Err(err) => {
                let _ = self.store.rollback();
                return Err(err);
            }
        };
        if let Err(err) = self.store.commit() {
            let _ = self.store.rollback();
            return Err(err);
        }
        info!(user = %id, username = %user.username, "user added");
        Ok(id)
    }

    /// Latest committed revision in the store.
    pub fn current_revision(&self) -> Result<Option<RevisionId>, StoreError> {
        self.store.select_max_revision_id()
    }

    /// Replaces the tree with a fresh load at `revision`, or at the latest revision when `None`.
    ///
    /// A failed load keeps the previous tree.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&mut self, revision: Option<RevisionId>) -> Result<(), StoreError> {
        let target = match revision {
            Some(revision) => {
                self.store
                    .select_revision(revision)?
                    .ok_or(StoreError::NotFound("revision"))?;
                Some(revision)
            }
            None => self.store.select_max_revision_id()?,
        };
        let tree = match target {
            Some(target) => load_tree(&self.store, target)?,
            None => Tree::new(),
        };

        self.tree = tree;
        self.revision = target;
        self.loaded = true;
        debug!(revision = ?target, items = self.tree.len(), "model loaded");
        self.emit(ModelEvent::Reset { revision: target });
        Ok(())
    }

    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.load(None)
    }

    /// Description text of a loaded item, if it has one.
    pub fn description(&self, id: NodeId) -> Result<Option<String>, StoreError> {
        let item = self.loaded_item(id)?;
        let Some(text) = item.attributes().description else {
            return Ok(None);
        };
        let description = self
            .store
            .select_text(TextTable::NodeDescription, text)?
            .ok_or_else(|| {
                StoreError::structural(format!("description text {text} of node {id} is missing"))
            })?;
        Ok(Some(description))
    }

    /// Creates a node in its own revision and attaches it to the loaded tree.
    #[instrument(level = "debug", skip(self, request), fields(name = %request.name))]
    pub fn add_node(&mut self, request: AddNodeRequest) -> Result<&Item, StoreError> {
        let AddNodeRequest {
            parent,
            node_type,
            name,
            description,
        } = request;

        let user = self.acting_user_id()?;
        validate_name(&name)?;
        let name = name.trim().to_string();
        self.ensure_loaded()?;
        if let Some(parent) = parent {
            if !self.tree.contains(parent) {
                return Err(StoreError::validation(format!(
                    "parent {parent} is not in the loaded tree"
                )));
            }
        }
        self.ensure_current()?;

        let (revision, attributes) = with_revision(&mut self.store, user, |store, revision| {
            let node = store.insert_node(parent, node_type)?;
            let name_id = store.insert_text(TextTable::NodeName, &name)?;
            let description_id = if description.is_empty() {
                None
            } else {
                Some(store.insert_text(TextTable::NodeDescription, &description)?)
            };
            let attributes = NewNodeAttributes {
                node,
                revision: revision.id,
                name: name_id,
                description: description_id,
                references: None,
                attachments: None,
                comments: None,
                active: true,
            };
            store.insert_node_attributes(&attributes)?;
            Ok(attributes)
        })?;

        let id = attributes.node;
        self.tree.insert(Item::new(
            id,
            parent,
            node_type,
            item_attributes(&attributes, name),
        ))?;
        self.revision = Some(revision.id);
        info!(node = %id, revision = %revision.id, "node added");
        self.emit(ModelEvent::NodeAdded {
            id,
            parent,
            revision: revision.id,
        });
        self.tree.get(id).ok_or(StoreError::NotFound("item"))
    }

    /// Writes a new attribute snapshot when the request changes anything.
    ///
    /// Returns `false`, without stamping a revision, when every requested value already matches
    /// the loaded item. `active: Some(false)` removes the node and its subtree from the tree.
    pub fn update_node(
        &mut self,
        id: NodeId,
        request: UpdateNodeRequest,
    ) -> Result<bool, StoreError> {
        let UpdateNodeRequest {
            name,
            description,
            active,
        } = request;

        self.acting_user_id()?;
        let name = match name {
            Some(name) => {
                validate_name(&name)?;
                Some(name.trim().to_string())
            }
            None => None,
        };
        let item = self.loaded_item(id)?;

        let name = name.filter(|name| name != item.name());
        let description = match description {
            Some(text) if text.is_empty() => item.attributes().description.is_some().then_some(text),
            Some(text) => {
                let current = self.description(id)?;
                (current.as_deref() != Some(text.as_str())).then_some(text)
            }
            None => None,
        };
        let deactivate = active == Some(false);
        if name.is_none() && description.is_none() && !deactivate {
            debug!(node = %id, "update is a no-op");
            return Ok(false);
        }

        self.rewrite_attributes(id, |store, next| {
            if let Some(name) = &name {
                next.name = store.insert_text(TextTable::NodeName, name)?;
            }
            if let Some(description) = &description {
                next.description = if description.is_empty() {
                    None
                } else {
                    Some(store.insert_text(TextTable::NodeDescription, description)?)
                };
            }
            if deactivate {
                next.active = false;
            }
            Ok(())
        })?;
        Ok(true)
    }

    /// Copies the node's current snapshot forward into a new revision, lets `change` edit it,
    /// then patches the loaded tree and notifies observers.
    fn rewrite_attributes<T, F>(
        &mut self,
        id: NodeId,
        change: F,
    ) -> Result<(RevisionId, T), StoreError>
    where
        F: FnOnce(&mut S, &mut NewNodeAttributes) -> Result<T, StoreError>,
    {
        let user = self.acting_user_id()?;
        self.loaded_item(id)?;
        self.ensure_current()?;

        let (revision, (next, name, value)) =
            with_revision(&mut self.store, user, |store, revision| {
                let current = resolve_attributes(&*store, id, revision.id)?;
                if !current.active {
                    return Err(StoreError::structural(format!(
                        "node {id} is loaded but inactive in the store"
                    )));
                }
                let mut next = current.carry_forward(revision.id);
                let value = change(store, &mut next)?;
                store.insert_node_attributes(&next)?;
                let name = store
                    .select_text(TextTable::NodeName, next.name)?
                    .ok_or_else(|| {
                        StoreError::structural(format!("name text {} is missing", next.name))
                    })?;
                Ok((next, name, value))
            })?;

        self.revision = Some(revision.id);
        if next.active {
            self.tree.set_attributes(id, item_attributes(&next, name))?;
            info!(node = %id, revision = %revision.id, "node updated");
            self.emit(ModelEvent::NodeUpdated {
                id,
                revision: revision.id,
            });
        } else {
            let removed = self.tree.remove_subtree(id)?;
            info!(node = %id, revision = %revision.id, removed = removed.len(), "node removed");
            self.emit(ModelEvent::NodeRemoved {
                id,
                revision: revision.id,
            });
        }
        Ok((revision.id, value))
    }

    fn acting_user_id(&self) -> Result<UserId, StoreError> {
        self.acting_user
            .as_ref()
            .map(|user| user.id)
            .ok_or(StoreError::NoActingUser)
    }

    fn ensure_loaded(&self) -> Result<(), StoreError> {
        if self.loaded {
            Ok(())
        } else {
            Err(StoreError::validation("load the tree before changing it"))
        }
    }

    fn loaded_item(&self, id: NodeId) -> Result<&Item, StoreError> {
        self.ensure_loaded()?;
        self.tree.get(id).ok_or_else(|| {
            StoreError::validation(format!("node {id} is not in the loaded tree"))
        })
    }

    /// Writes are only accepted against a tree that shows the latest revision.
    fn ensure_current(&self) -> Result<(), StoreError> {
        let latest = self.store.select_max_revision_id()?;
        if latest != self.revision {
            return Err(StoreError::validation(format!(
                "tree is loaded at revision {:?} but the store is at {:?}; reload first",
                self.revision.map(RevisionId::get),
                latest.map(RevisionId::get)
            )));
        }
        Ok(())
    }

    fn emit(&mut self, event: ModelEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

fn item_attributes(attributes: &NewNodeAttributes, name: String) -> ItemAttributes {
    ItemAttributes {
        revision: attributes.revision,
        name,
        description: attributes.description,
        references: attributes.references,
        attachments: attributes.attachments,
        comments: attributes.comments,
    }
}
