#![forbid(unsafe_code)]

mod support;

use alm_core::{RevisionId, UserId};
use alm_storage::{
    RelationalStore, StoreError, abort_revision, finish_revision, start_revision, with_revision,
};
use support::{admin_id, open_store, temp_dir};

#[test]
fn revisions_start_at_one_and_stay_gapless() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());
    let admin = admin_id(&store);
    assert_eq!(store.select_max_revision_id().expect("max"), None);

    for expected in 1..=3 {
        let revision = start_revision(&mut store, admin).expect("start");
        assert_eq!(revision.id, RevisionId::new(expected));
        assert_eq!(revision.user, admin);
        finish_revision(&mut store, &revision).expect("finish");
    }
    assert_eq!(
        store.select_max_revision_id().expect("max"),
        Some(RevisionId::new(3))
    );
}

#[test]
fn aborted_revision_is_not_persisted_and_id_is_reused() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());
    let admin = admin_id(&store);

    let revision = start_revision(&mut store, admin).expect("start");
    assert_eq!(revision.id, RevisionId::FIRST);
    abort_revision(&mut store);

    assert_eq!(store.select_max_revision_id().expect("max"), None);
    assert_eq!(store.select_revision(RevisionId::FIRST).expect("select"), None);

    let retry = start_revision(&mut store, admin).expect("start again");
    assert_eq!(retry.id, RevisionId::FIRST);
    finish_revision(&mut store, &retry).expect("finish");
}

#[test]
fn committed_revision_round_trips_with_millisecond_timestamp() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());
    let admin = admin_id(&store);

    let revision = start_revision(&mut store, admin).expect("start");
    finish_revision(&mut store, &revision).expect("finish");

    let stored = store
        .select_revision(revision.id)
        .expect("select")
        .expect("revision exists");
    assert_eq!(stored, revision);
    assert_eq!(stored.timestamp.nanosecond() % 1_000_000, 0);
}

#[test]
fn failing_write_inside_envelope_rolls_back_everything() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());
    let admin = admin_id(&store);

    let err = with_revision(&mut store, admin, |store, _revision| {
        store.insert_node(None, alm_core::NodeType::Project)?;
        Err::<(), _>(StoreError::Validation("stop".to_string()))
    })
    .expect_err("write fails");
    assert_eq!(err.code(), "VALIDATION");

    assert_eq!(store.select_max_revision_id().expect("max"), None);
    assert!(store.select_nodes_by_parent(None).expect("roots").is_empty());

    let (revision, ()) = with_revision(&mut store, admin, |_, _| Ok(())).expect("next write");
    assert_eq!(revision.id, RevisionId::FIRST);
}

#[test]
fn nested_start_is_a_transaction_failure() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());
    let admin = admin_id(&store);

    let outer = start_revision(&mut store, admin).expect("start");
    let err = start_revision(&mut store, admin).expect_err("nested start fails");
    assert!(matches!(
        err,
        StoreError::TransactionFailure { op: "begin", .. }
    ));

    finish_revision(&mut store, &outer).expect("outer still commits");
    assert_eq!(
        store.select_max_revision_id().expect("max"),
        Some(RevisionId::FIRST)
    );
}

#[test]
fn unknown_user_cannot_stamp_a_revision() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());

    start_revision(&mut store, UserId::new(999)).expect_err("foreign key violation");
    assert_eq!(store.select_max_revision_id().expect("max"), None);

    let admin = admin_id(&store);
    let revision = start_revision(&mut store, admin).expect("transaction was rolled back");
    assert_eq!(revision.id, RevisionId::FIRST);
    abort_revision(&mut store);
}

#[test]
fn commit_without_transaction_fails() {
    let dir = temp_dir();
    let mut store = open_store(dir.path());
    let err = store.commit().expect_err("nothing to commit");
    assert_eq!(err.code(), "TRANSACTION_FAILURE");
    store.rollback().expect("rollback outside a transaction is a no-op");
}
