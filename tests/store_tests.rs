//! SQLite store: canonical rows, natural-key dedupe, draft-only deletes,
//! finalized filtering and submission crash recovery.

use draftsheet::db::pool::DbPool;
use draftsheet::{DraftRow, DraftStore, SqliteStore};
use tempfile::TempDir;

fn draft(date: &str, time_in: &str, time_out: &str, desc: &str) -> DraftRow {
    DraftRow {
        id: None,
        date: date.to_string(),
        time_in: time_in.to_string(),
        time_out: time_out.to_string(),
        project: "DEV".to_string(),
        tool: Some("CAD".to_string()),
        charge_code: Some("DEV-100".to_string()),
        task_description: desc.to_string(),
        hours: None,
    }
}

/// On-disk store plus a second connection for poking at rows directly.
fn disk_store() -> (TempDir, SqliteStore, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draft.sqlite");
    let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
    let pool = DbPool::new(path.to_str().unwrap()).unwrap();
    (dir, store, pool)
}

#[tokio::test]
async fn upsert_assigns_identity_and_recomputes_hours() {
    let store = SqliteStore::open_in_memory().unwrap();

    let canonical = store
        .upsert(&draft("2025-07-14", "09:00", "10:30", "fixture design"))
        .await
        .unwrap();

    assert!(canonical.id.is_some());
    assert_eq!(canonical.hours, Some(1.5));
    assert_eq!(canonical.time_in, "09:00");
    assert_eq!(canonical.time_out, "10:30");
}

#[tokio::test]
async fn upsert_with_identity_updates_in_place() {
    let store = SqliteStore::open_in_memory().unwrap();

    let first = store
        .upsert(&draft("2025-07-14", "09:00", "10:00", "fixture design"))
        .await
        .unwrap();

    let mut edited = first.clone();
    edited.time_out = "11:00".to_string();
    let second = store.upsert(&edited).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.hours, Some(2.0));
    assert_eq!(store.load_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn natural_key_conflict_does_not_duplicate() {
    let store = SqliteStore::open_in_memory().unwrap();

    // same date/time-in/project/description, no identity on either write:
    // a retried insert after a lost response
    let first = store
        .upsert(&draft("2025-07-14", "09:00", "10:00", "fixture design"))
        .await
        .unwrap();
    let second = store
        .upsert(&draft("2025-07-14", "09:00", "10:30", "fixture design"))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.time_out, "10:30");
    assert_eq!(store.load_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejects_malformed_rows() {
    let store = SqliteStore::open_in_memory().unwrap();

    let off_step = draft("2025-07-14", "09:07", "10:00", "x");
    assert!(store.upsert(&off_step).await.is_err());

    let inverted = draft("2025-07-14", "10:00", "09:00", "x");
    assert!(store.upsert(&inverted).await.is_err());

    let mut no_desc = draft("2025-07-14", "09:00", "10:00", "x");
    no_desc.task_description.clear();
    assert!(store.upsert(&no_desc).await.is_err());
}

#[tokio::test]
async fn delete_only_touches_drafts() {
    let (_dir, store, pool) = disk_store();

    let kept = store
        .upsert(&draft("2025-07-14", "09:00", "10:00", "submitted work"))
        .await
        .unwrap();
    let gone = store
        .upsert(&draft("2025-07-14", "10:00", "11:00", "draft work"))
        .await
        .unwrap();

    pool.conn
        .execute(
            "UPDATE timesheet SET status = 'Complete', submitted_at = datetime('now') WHERE id = ?1",
            [kept.id.unwrap()],
        )
        .unwrap();

    assert_eq!(store.delete(kept.id.unwrap()).await.unwrap(), 0);
    assert_eq!(store.delete(gone.id.unwrap()).await.unwrap(), 1);
}

#[tokio::test]
async fn load_all_excludes_finalized_rows() {
    let (_dir, store, pool) = disk_store();

    let finalized = store
        .upsert(&draft("2025-07-14", "09:00", "10:00", "submitted work"))
        .await
        .unwrap();
    store
        .upsert(&draft("2025-07-15", "09:00", "10:00", "draft work"))
        .await
        .unwrap();

    pool.conn
        .execute(
            "UPDATE timesheet SET status = 'Complete', submitted_at = datetime('now') WHERE id = ?1",
            [finalized.id.unwrap()],
        )
        .unwrap();

    let drafts = store.load_all().await.unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].task_description, "draft work");

    let archive = store.load_finalized().await.unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].task_description, "submitted work");
    assert!(archive[0].submitted_at.is_some());
}

#[tokio::test]
async fn stuck_submissions_recover_to_failed_then_back_to_draft() {
    let (_dir, store, pool) = disk_store();

    let row = store
        .upsert(&draft("2025-07-14", "09:00", "10:00", "stuck work"))
        .await
        .unwrap();
    pool.conn
        .execute(
            "UPDATE timesheet
             SET status = 'Submitting',
                 submission_started_at = datetime('now', '-60 minutes')
             WHERE id = ?1",
            [row.id.unwrap()],
        )
        .unwrap();

    assert!(store.load_all().await.unwrap().is_empty());

    assert_eq!(store.recover_stuck(30).await.unwrap(), 1);
    // failed rows are still not drafts until explicitly reset
    assert!(store.load_all().await.unwrap().is_empty());

    assert_eq!(store.reset_failed().await.unwrap(), 1);
    assert_eq!(store.load_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn recent_submissions_are_not_recovered() {
    let (_dir, store, pool) = disk_store();

    let row = store
        .upsert(&draft("2025-07-14", "09:00", "10:00", "in progress"))
        .await
        .unwrap();
    pool.conn
        .execute(
            "UPDATE timesheet
             SET status = 'Submitting',
                 submission_started_at = datetime('now', '-5 minutes')
             WHERE id = ?1",
            [row.id.unwrap()],
        )
        .unwrap();

    assert_eq!(store.recover_stuck(30).await.unwrap(), 0);
}
