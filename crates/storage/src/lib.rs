#![forbid(unsafe_code)]

//! Revisioned node tree storage on an embedded SQLite file.
//!
//! Node structure (`Node`) is immutable; everything mutable lives in per-revision attribute
//! snapshots. Any past revision can be loaded back into a [`alm_core::Tree`].

pub mod config;
pub mod ledger;
pub mod loader;
pub mod model;
pub mod resolver;
pub mod store;

pub use config::StoreConfig;
pub use ledger::{abort_revision, finish_revision, start_revision, with_revision};
pub use loader::{Loaded, load_node, load_subtree, load_tree};
pub use model::{AddNodeRequest, DataModel, ModelEvent, UpdateNodeRequest};
pub use resolver::resolve_attributes;
pub use store::{
    AttachmentRecord, CommentRecord, Field, NewNodeAttributes, NewUser, NodeAttributesRecord,
    NodeRecord, RelationalStore, RevisionRecord, SqliteStore, StoreError, TextTable, UserRecord,
};
