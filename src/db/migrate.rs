use rusqlite::{Connection, OptionalExtension, Result};
use tracing::info;

/// Check if the `timesheet` table exists.
fn timesheet_table_exists(conn: &Connection) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='timesheet'")?;
    let exists: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

/// Check if the `timesheet` table has a given column.
fn timesheet_has_column(conn: &Connection, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare("PRAGMA table_info('timesheet')")?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Create the `timesheet` table with the modern schema.
///
/// Times are stored as minutes since midnight; `hours` is recomputed on
/// every write. `status` is NULL for draft rows, otherwise one of the
/// submission states. The natural key keeps a retried insert from
/// duplicating a row the store already has.
fn create_timesheet_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS timesheet (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            date                  TEXT NOT NULL,
            time_in               INTEGER NOT NULL,
            time_out              INTEGER NOT NULL,
            hours                 REAL NOT NULL DEFAULT 0,
            project               TEXT NOT NULL,
            tool                  TEXT,
            detail_charge_code    TEXT,
            task_description      TEXT NOT NULL,
            status                TEXT CHECK(status IN ('Submitting','Failed','Complete')),
            submission_started_at TEXT,
            submitted_at          TEXT,
            created_at            TEXT NOT NULL,
            UNIQUE(date, time_in, project, task_description)
        );

        CREATE INDEX IF NOT EXISTS idx_timesheet_status ON timesheet(status);
        CREATE INDEX IF NOT EXISTS idx_timesheet_date_time ON timesheet(date, time_in);
        "#,
    )?;
    Ok(())
}

/// Early installs stored no precomputed hours; add the column and backfill.
fn migrate_add_hours_column(conn: &Connection) -> Result<()> {
    if timesheet_has_column(conn, "hours")? {
        return Ok(());
    }

    info!("adding 'hours' column to timesheet table");

    conn.execute_batch(
        r#"
        ALTER TABLE timesheet ADD COLUMN hours REAL NOT NULL DEFAULT 0;
        UPDATE timesheet SET hours = (time_out - time_in) / 60.0;
        "#,
    )?;

    info!("'hours' column added and backfilled");
    Ok(())
}

/// Early installs tracked no submission bookkeeping; add the columns.
fn migrate_add_submission_columns(conn: &Connection) -> Result<()> {
    if !timesheet_has_column(conn, "submission_started_at")? {
        info!("adding 'submission_started_at' column to timesheet table");
        conn.execute_batch("ALTER TABLE timesheet ADD COLUMN submission_started_at TEXT;")?;
    }
    if !timesheet_has_column(conn, "submitted_at")? {
        info!("adding 'submitted_at' column to timesheet table");
        conn.execute_batch("ALTER TABLE timesheet ADD COLUMN submitted_at TEXT;")?;
    }
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    if !timesheet_table_exists(conn)? {
        create_timesheet_table(conn)?;
        info!("created timesheet table (modern schema)");
        return Ok(());
    }

    // Existing installs: make sure the indexes and late columns are there.
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_timesheet_status ON timesheet(status);
        CREATE INDEX IF NOT EXISTS idx_timesheet_date_time ON timesheet(date, time_in);
        "#,
    )?;

    migrate_add_hours_column(conn)?;
    migrate_add_submission_columns(conn)?;

    Ok(())
}
