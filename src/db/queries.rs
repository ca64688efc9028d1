use crate::errors::{AppError, AppResult};
use crate::models::draft_row::DraftRow;
use crate::utils::time::{minutes_to_time_str, on_time_step, parse_time, time_to_minutes};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

/// Map a `timesheet` row into a DraftRow, converting stored minutes back
/// to "HH:MM" strings.
pub fn map_draft_row(row: &Row) -> Result<DraftRow> {
    let time_in: i64 = row.get("time_in")?;
    let time_out: i64 = row.get("time_out")?;

    Ok(DraftRow {
        id: Some(row.get("id")?),
        date: row.get("date")?,
        time_in: minutes_to_time_str(time_in),
        time_out: minutes_to_time_str(time_out),
        project: row.get("project")?,
        tool: row.get("tool")?,
        charge_code: row.get("detail_charge_code")?,
        task_description: row.get("task_description")?,
        hours: Some(row.get("hours")?),
    })
}

/// All draft rows (status IS NULL), in grid order.
/// Rows already picked up by a submission are not drafts any more.
pub fn load_drafts(conn: &Connection) -> AppResult<Vec<DraftRow>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM timesheet
         WHERE status IS NULL
         ORDER BY date ASC, time_in ASC",
    )?;

    let rows = stmt.query_map([], map_draft_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn select_draft(conn: &Connection, id: i64) -> AppResult<Option<DraftRow>> {
    let mut stmt = conn.prepare("SELECT * FROM timesheet WHERE id = ?1")?;
    let row = stmt.query_row(params![id], map_draft_row).optional()?;
    Ok(row)
}

/// Parse and check a grid time for storage. Times snap to the quarter-hour.
fn storage_minutes(value: &str) -> AppResult<i64> {
    let t = parse_time(value).ok_or_else(|| AppError::InvalidTime(value.to_string()))?;
    let mins = time_to_minutes(t);
    if !on_time_step(mins) {
        return Err(AppError::InvalidTime(value.to_string()));
    }
    Ok(mins)
}

/// Insert or update a draft row and return its canonical form: identity
/// assigned, times zero-padded, hours recomputed, status reset to draft.
pub fn upsert_draft(conn: &Connection, row: &DraftRow) -> AppResult<DraftRow> {
    if row.date.is_empty() {
        return Err(AppError::Persistence("date is required".to_string()));
    }
    crate::utils::date::parse_date_strict(&row.date)?;
    if row.project.is_empty() {
        return Err(AppError::Persistence("project is required".to_string()));
    }
    if row.task_description.is_empty() {
        return Err(AppError::Persistence("task description is required".to_string()));
    }

    let time_in = storage_minutes(&row.time_in)?;
    let time_out = storage_minutes(&row.time_out)?;
    if time_out <= time_in {
        return Err(AppError::Persistence(
            "time out must be after time in".to_string(),
        ));
    }

    let hours = (time_out - time_in) as f64 / 60.0;

    let id = if let Some(id) = row.id {
        conn.execute(
            "UPDATE timesheet
             SET date = ?1, time_in = ?2, time_out = ?3, hours = ?4,
                 project = ?5, tool = ?6, detail_charge_code = ?7,
                 task_description = ?8, status = NULL
             WHERE id = ?9",
            params![
                row.date,
                time_in,
                time_out,
                hours,
                row.project,
                row.tool.as_deref(),
                row.charge_code.as_deref(),
                row.task_description,
                id
            ],
        )?;
        id
    } else {
        conn.execute(
            "INSERT INTO timesheet
             (date, time_in, time_out, hours, project, tool, detail_charge_code,
              task_description, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, datetime('now'))
             ON CONFLICT(date, time_in, project, task_description) DO UPDATE SET
               time_out = excluded.time_out,
               hours = excluded.hours,
               tool = excluded.tool,
               detail_charge_code = excluded.detail_charge_code,
               status = NULL",
            params![
                row.date,
                time_in,
                time_out,
                hours,
                row.project,
                row.tool.as_deref(),
                row.charge_code.as_deref(),
                row.task_description
            ],
        )?;

        // last_insert_rowid() lies when the conflict branch ran; the natural
        // key identifies the row either way.
        conn.query_row(
            "SELECT id FROM timesheet
             WHERE date = ?1 AND time_in = ?2 AND project = ?3 AND task_description = ?4",
            params![row.date, time_in, row.project, row.task_description],
            |r| r.get(0),
        )?
    };

    select_draft(conn, id)?
        .ok_or_else(|| AppError::Persistence(format!("draft row {} vanished after write", id)))
}

/// Delete a draft row. Rows in any submission state are left alone.
pub fn delete_draft(conn: &Connection, id: i64) -> AppResult<usize> {
    let n = conn.execute(
        "DELETE FROM timesheet WHERE id = ?1 AND status IS NULL",
        params![id],
    )?;
    Ok(n)
}

/// A finalized (externally submitted) entry, for the archive view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FinalizedEntry {
    pub id: i64,
    pub date: String,
    pub time_in: String,
    pub time_out: String,
    pub hours: f64,
    pub project: String,
    pub tool: Option<String>,
    pub charge_code: Option<String>,
    pub task_description: String,
    pub submitted_at: Option<String>,
}

/// All finalized entries, newest first.
pub fn load_finalized(conn: &Connection) -> AppResult<Vec<FinalizedEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, time_in, time_out, hours, project, tool,
                detail_charge_code, task_description, submitted_at
         FROM timesheet
         WHERE status = 'Complete'
         ORDER BY date DESC, time_in DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(FinalizedEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            time_in: minutes_to_time_str(row.get(2)?),
            time_out: minutes_to_time_str(row.get(3)?),
            hours: row.get(4)?,
            project: row.get(5)?,
            tool: row.get(6)?,
            charge_code: row.get(7)?,
            task_description: row.get(8)?,
            submitted_at: row.get(9)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
