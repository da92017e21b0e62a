#![forbid(unsafe_code)]

mod support;

use alm_core::{NodeType, UserType};
use alm_storage::{AddNodeRequest, DataModel, RelationalStore, SqliteStore, StoreConfig, StoreError};
use rusqlite::Connection;
use support::{db_path, open_model, open_store, temp_dir};

#[test]
fn fresh_database_is_stamped_and_seeded() {
    let dir = temp_dir();
    let store = open_store(dir.path());
    assert!(store.is_open());
    assert_eq!(store.db_path(), db_path(dir.path()));
    store.validate().expect("fresh store validates");

    let admin = store
        .select_user_by_username("admin")
        .expect("select")
        .expect("admin seeded");
    assert_eq!(admin.user_type, UserType::Administrator);
    assert_eq!(admin.full_name, "Administrator");
    drop(store);

    let conn = Connection::open(db_path(dir.path())).expect("raw open");
    let application_id: i64 = conn
        .query_row("PRAGMA application_id", [], |row| row.get(0))
        .expect("application id");
    let user_version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .expect("user version");
    assert_eq!(application_id, 0x5A1A_DEA1);
    assert_eq!(user_version, 1);
}

#[test]
fn reopening_keeps_the_data() {
    let dir = temp_dir();
    let mut model = open_model(dir.path());
    model
        .add_node(AddNodeRequest {
            parent: None,
            node_type: NodeType::Project,
            name: "Kept".to_string(),
            description: String::new(),
        })
        .expect("add");
    model.close();

    let model = open_model(dir.path());
    let names: Vec<&str> = model.tree().items().map(|item| item.name()).collect();
    assert_eq!(names, vec!["Kept"]);
}

#[test]
fn foreign_database_is_rejected_untouched() {
    let dir = temp_dir();
    let path = db_path(dir.path());
    let conn = Connection::open(&path).expect("raw open");
    conn.execute_batch("CREATE TABLE notes(id INTEGER PRIMARY KEY, body TEXT);")
        .expect("foreign schema");
    drop(conn);
    let before = std::fs::read(&path).expect("read file");

    let err = SqliteStore::open(dir.path(), &StoreConfig::default()).expect_err("foreign db");
    assert!(matches!(err, StoreError::SchemaMismatch(_)));
    assert_eq!(std::fs::read(&path).expect("read file"), before);
}

#[test]
fn missing_table_is_a_schema_mismatch() {
    let dir = temp_dir();
    drop(open_store(dir.path()));

    let conn = Connection::open(db_path(dir.path())).expect("raw open");
    conn.execute_batch("DROP TABLE NodeAttachmentItem;")
        .expect("drop table");
    drop(conn);

    let err = SqliteStore::open(dir.path(), &StoreConfig::default()).expect_err("incomplete");
    assert_eq!(err.code(), "SCHEMA_MISMATCH");
}

#[test]
fn newer_schema_version_is_a_schema_mismatch() {
    let dir = temp_dir();
    drop(open_store(dir.path()));

    let conn = Connection::open(db_path(dir.path())).expect("raw open");
    conn.execute_batch("PRAGMA user_version = 2;")
        .expect("bump version");
    drop(conn);

    let err = SqliteStore::open(dir.path(), &StoreConfig::default()).expect_err("version");
    assert_eq!(err.code(), "SCHEMA_MISMATCH");
}

#[test]
fn exclusive_lock_keeps_a_second_connection_out() {
    let dir = temp_dir();
    let first = open_store(dir.path());

    let config = StoreConfig {
        busy_timeout_ms: 0,
        ..StoreConfig::default()
    };
    let err = SqliteStore::open(dir.path(), &config).expect_err("database is locked");
    assert_eq!(err.code(), "SQL");

    drop(first);
    SqliteStore::open(dir.path(), &config).expect("lock released on close");
}

#[test]
fn everything_fails_with_not_connected_after_close() {
    let dir = temp_dir();
    let mut model = open_model(dir.path());
    model.close();
    assert!(!model.is_open());
    assert!(!model.is_loaded());

    assert!(matches!(model.load(None), Err(StoreError::NotConnected)));
    assert!(matches!(model.current_revision(), Err(StoreError::NotConnected)));
    assert!(matches!(
        model.login("admin", "admin"),
        Err(StoreError::NotConnected)
    ));
    assert!(matches!(
        model.store().select_nodes_by_parent(None),
        Err(StoreError::NotConnected)
    ));
}

#[test]
fn configured_admin_password_is_used_for_fresh_databases() {
    let dir = temp_dir();
    let config = StoreConfig {
        default_admin_password: "s3cret".to_string(),
        ..StoreConfig::default()
    };
    let mut model = DataModel::open(dir.path(), &config).expect("open");
    let err = model.login("admin", "admin").expect_err("default password");
    assert!(matches!(err, StoreError::AuthenticationFailed));
    model.login("admin", "s3cret").expect("configured password");
}
