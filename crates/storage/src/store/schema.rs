#![forbid(unsafe_code)]

use super::error::StoreError;
use super::users::hash_password;
use crate::config::StoreConfig;
use alm_core::UserType;
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::time::Duration;

/// `SAlA(man)DE(r) Al(m)`.
pub(crate) const APPLICATION_ID: i64 = 0x5A1A_DEA1;
pub(crate) const SCHEMA_VERSION: i64 = 1;

const REQUIRED_TABLES: [&str; 14] = [
    "User",
    "Revision",
    "Node",
    "NodeName",
    "NodeDescription",
    "NodeReferenceList",
    "NodeReferenceItem",
    "NodeComment",
    "NodeCommentList",
    "NodeCommentItem",
    "NodeAttachment",
    "NodeAttachmentList",
    "NodeAttachmentItem",
    "NodeAttributes",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Preflight {
    Fresh,
    Existing,
}

pub(crate) fn apply_runtime_config(
    conn: &Connection,
    config: &StoreConfig,
) -> Result<(), StoreError> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA case_sensitive_like = OFF;")?;
    if config.exclusive_locking {
        conn.execute_batch("PRAGMA locking_mode = EXCLUSIVE;")?;
    }
    Ok(())
}

/// An empty file is fresh; anything else has to pass [`validate`].
pub(crate) fn preflight_gate(conn: &Connection) -> Result<Preflight, StoreError> {
    if list_tables(conn)?.is_empty() {
        return Ok(Preflight::Fresh);
    }
    validate(conn)?;
    Ok(Preflight::Existing)
}

pub(crate) fn validate(conn: &Connection) -> Result<(), StoreError> {
    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if integrity != "ok" {
        return Err(StoreError::SchemaMismatch("integrity check failed"));
    }

    let application_id: i64 = conn.query_row("PRAGMA application_id", [], |row| row.get(0))?;
    if application_id != APPLICATION_ID {
        return Err(StoreError::SchemaMismatch(
            "application id does not match (foreign database)",
        ));
    }

    let user_version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if user_version != SCHEMA_VERSION {
        return Err(StoreError::SchemaMismatch("schema version mismatch"));
    }

    let tables = list_tables(conn)?;
    if REQUIRED_TABLES
        .iter()
        .any(|table| !tables.contains(*table))
    {
        return Err(StoreError::SchemaMismatch("required table is missing"));
    }
    Ok(())
}

pub(crate) fn install_schema(conn: &Connection, config: &StoreConfig) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        r#"
        CREATE TABLE User (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          Type INTEGER NOT NULL,
          FullName TEXT NOT NULL,
          Username TEXT NOT NULL UNIQUE,
          Password TEXT NOT NULL
        );

        CREATE TABLE Revision (
          Id INTEGER PRIMARY KEY,
          Timestamp TEXT NOT NULL,
          User INTEGER NOT NULL REFERENCES User(Id)
        );

        CREATE TABLE Node (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          Parent INTEGER REFERENCES Node(Id),
          Type INTEGER NOT NULL,
          CHECK(Parent IS NULL OR Parent <> Id)
        );

        CREATE INDEX idx_node_parent ON Node(Parent, Id);

        CREATE TABLE NodeName (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          Text TEXT NOT NULL
        );

        CREATE TABLE NodeDescription (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          Text TEXT NOT NULL
        );

        CREATE TABLE NodeReferenceList (
          Id INTEGER PRIMARY KEY AUTOINCREMENT
        );

        CREATE TABLE NodeReferenceItem (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          List INTEGER NOT NULL REFERENCES NodeReferenceList(Id),
          Node INTEGER NOT NULL REFERENCES Node(Id)
        );

        CREATE TABLE NodeComment (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          Text TEXT NOT NULL
        );

        CREATE TABLE NodeCommentList (
          Id INTEGER PRIMARY KEY AUTOINCREMENT
        );

        CREATE TABLE NodeCommentItem (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          List INTEGER NOT NULL REFERENCES NodeCommentList(Id),
          Comment INTEGER NOT NULL REFERENCES NodeComment(Id)
        );

        CREATE TABLE NodeAttachment (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          FileName TEXT NOT NULL,
          FileData BLOB NOT NULL
        );

        CREATE TABLE NodeAttachmentList (
          Id INTEGER PRIMARY KEY AUTOINCREMENT
        );

        CREATE TABLE NodeAttachmentItem (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          List INTEGER NOT NULL REFERENCES NodeAttachmentList(Id),
          Attachment INTEGER NOT NULL REFERENCES NodeAttachment(Id)
        );

        CREATE TABLE NodeAttributes (
          Id INTEGER PRIMARY KEY AUTOINCREMENT,
          Node INTEGER NOT NULL REFERENCES Node(Id),
          Revision INTEGER NOT NULL REFERENCES Revision(Id),
          Name INTEGER NOT NULL REFERENCES NodeName(Id),
          Description INTEGER REFERENCES NodeDescription(Id),
          "References" INTEGER REFERENCES NodeReferenceList(Id),
          Attachments INTEGER REFERENCES NodeAttachmentList(Id),
          Comments INTEGER REFERENCES NodeCommentList(Id),
          Active INTEGER NOT NULL,
          UNIQUE(Node, Revision)
        );
        "#,
    )?;

    tx.execute(
        "INSERT INTO User(Type, FullName, Username, Password) VALUES (?1, ?2, ?3, ?4)",
        params![
            UserType::Administrator.code(),
            "Administrator",
            "admin",
            hash_password(&config.default_admin_password),
        ],
    )?;

    tx.execute_batch(&format!(
        "PRAGMA application_id = {APPLICATION_ID}; PRAGMA user_version = {SCHEMA_VERSION};"
    ))?;
    tx.commit()?;
    Ok(())
}

fn list_tables(conn: &Connection) -> Result<BTreeSet<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }
    Ok(tables)
}
