#![forbid(unsafe_code)]

//! Write envelope: one transaction, one revision.
//!
//! Every logical write runs between [`start_revision`] and either [`finish_revision`] or
//! [`abort_revision`]. Revision ids are allocated as `max + 1` inside the transaction, so an
//! aborted write never consumes an id and committed ids stay gapless.

use crate::store::{RelationalStore, RevisionRecord, StoreError, now_utc};
use alm_core::{RevisionId, UserId};
use tracing::{debug, info, warn};

/// Opens a transaction and stamps the next revision for `user`.
///
/// On failure after the transaction was opened, it is rolled back before returning.
pub fn start_revision<S>(store: &mut S, user: UserId) -> Result<RevisionRecord, StoreError>
where
    S: RelationalStore + ?Sized,
{
    store.begin_transaction()?;
    match stamp_revision(store, user) {
        Ok(revision) => {
            debug!(revision = %revision.id, user = %user, "revision started");
            Ok(revision)
        }
        Err(err) => {
            abort_revision(store);
            Err(err)
        }
    }
}

fn stamp_revision<S>(store: &mut S, user: UserId) -> Result<RevisionRecord, StoreError>
where
    S: RelationalStore + ?Sized,
{
    let next = match store.select_max_revision_id()? {
        Some(max) => max.next(),
        None => RevisionId::FIRST,
    };
    let revision = RevisionRecord {
        id: next,
        timestamp: now_utc(),
        user,
    };
    store.insert_revision(&revision)?;
    Ok(revision)
}

/// Commits the open transaction. A failed commit is rolled back.
pub fn finish_revision<S>(store: &mut S, revision: &RevisionRecord) -> Result<(), StoreError>
where
    S: RelationalStore + ?Sized,
{
    match store.commit() {
        Ok(()) => {
            info!(revision = %revision.id, user = %revision.user, "revision committed");
            Ok(())
        }
        Err(err) => {
            abort_revision(store);
            Err(err)
        }
    }
}

/// Rolls back the open transaction. Never fails visibly.
pub fn abort_revision<S>(store: &mut S)
where
    S: RelationalStore + ?Sized,
{
    if let Err(err) = store.rollback() {
        warn!(error = %err, "rollback failed");
    } else {
        warn!("revision aborted");
    }
}

/// Runs `write` inside a fresh revision, committing on `Ok` and aborting on `Err`.
pub fn with_revision<S, T, F>(
    store: &mut S,
    user: UserId,
    write: F,
) -> Result<(RevisionRecord, T), StoreError>
where
    S: RelationalStore + ?Sized,
    F: FnOnce(&mut S, &RevisionRecord) -> Result<T, StoreError>,
{
    let revision = start_revision(store, user)?;
    let value = match write(store, &revision) {
        Ok(value) => value,
        Err(err) => {
            abort_revision(store);
            return Err(err);
        }
    };
    finish_revision(store, &revision)?;
    Ok((revision, value))
}
