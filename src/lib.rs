//! draftsheet library root.
//! Core of a desktop work-log app: a grid of draft rows that auto-persist
//! to SQLite with debounce coalescing, race-safe reconciliation and a
//! clean/syncing/dirty save indicator.

pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod sync;
pub mod utils;

pub use config::Config;
pub use errors::{AppError, AppResult};
pub use models::draft_row::DraftRow;
pub use models::row_state::{RowState, SaveStatus, SheetStatus};
pub use sync::engine::{DraftSyncEngine, EngineConfig, EngineEvent};
pub use sync::gateway::{DraftStore, SqliteStore};
