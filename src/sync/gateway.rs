//! Persistence gateway: the async boundary between the sync engine and the
//! row store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::queries::{self, FinalizedEntry};
use crate::db::recovery;
use crate::errors::AppResult;
use crate::models::draft_row::DraftRow;

/// Store contract consumed by the sync engine.
///
/// Implementations own their timeout/failure reporting; the engine treats
/// every error as a non-fatal persistence failure and never retries on its
/// own.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Create (no identity) or update (by identity). Returns the canonical
    /// row: identity assigned, derived fields recomputed.
    async fn upsert(&self, row: &DraftRow) -> AppResult<DraftRow>;

    /// Delete a draft by identity; returns the affected count.
    async fn delete(&self, id: i64) -> AppResult<usize>;

    /// Every draft row, in grid order. Excludes rows already finalized
    /// externally.
    async fn load_all(&self) -> AppResult<Vec<DraftRow>>;
}

/// SQLite-backed store. One connection behind an async mutex: calls are
/// short and local, and the app is the only process touching the file.
pub struct SqliteStore {
    pool: Mutex<DbPool>,
}

impl SqliteStore {
    pub fn open(path: &str) -> AppResult<Self> {
        let pool = DbPool::new(path)?;
        init_db(&pool.conn)?;
        Ok(Self {
            pool: Mutex::new(pool),
        })
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let pool = DbPool::open_in_memory()?;
        init_db(&pool.conn)?;
        Ok(Self {
            pool: Mutex::new(pool),
        })
    }

    /// Archive view: externally finalized entries, newest first.
    pub async fn load_finalized(&self) -> AppResult<Vec<FinalizedEntry>> {
        let pool = self.pool.lock().await;
        queries::load_finalized(&pool.conn)
    }

    /// Startup recovery: rows stuck mid-submission become 'Failed'.
    pub async fn recover_stuck(&self, max_age_minutes: i64) -> AppResult<usize> {
        let pool = self.pool.lock().await;
        recovery::recover_stuck(&pool.conn, max_age_minutes)
    }

    /// Put failed submissions back into the draft grid.
    pub async fn reset_failed(&self) -> AppResult<usize> {
        let pool = self.pool.lock().await;
        recovery::reset_failed(&pool.conn)
    }
}

#[async_trait]
impl DraftStore for SqliteStore {
    async fn upsert(&self, row: &DraftRow) -> AppResult<DraftRow> {
        let pool = self.pool.lock().await;
        queries::upsert_draft(&pool.conn, row)
    }

    async fn delete(&self, id: i64) -> AppResult<usize> {
        let pool = self.pool.lock().await;
        queries::delete_draft(&pool.conn, id)
    }

    async fn load_all(&self) -> AppResult<Vec<DraftRow>> {
        let pool = self.pool.lock().await;
        queries::load_drafts(&pool.conn)
    }
}
