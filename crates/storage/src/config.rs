#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Settings for opening a [`crate::SqliteStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File name inside the storage directory.
    pub database_file: String,
    pub busy_timeout_ms: u64,
    /// Holds the file lock for the whole connection lifetime so a second process cannot write.
    pub exclusive_locking: bool,
    /// Only read when a fresh database is created.
    pub default_admin_password: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_file: "database.db3".to_string(),
            busy_timeout_ms: 5_000,
            exclusive_locking: true,
            default_admin_password: "admin".to_string(),
        }
    }
}
