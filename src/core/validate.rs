//! Row and sheet validation. Deterministic, no I/O; advisory for the UI
//! and the gate for which rows the sync engine actually persists.

use crate::core::catalog::project_by_code;
use crate::models::draft_row::DraftRow;
use crate::models::row_state::{RowState, SheetStatus};
use crate::utils::date::parse_date;
use crate::utils::time::{on_time_step, parse_time, time_to_minutes};

/// Classify a single row.
///
/// Complete = every field the catalog requires for the row's project is
/// filled and format-valid. Partial = on the way there. Invalid = a filled
/// field violates a rule, regardless of how much else is filled.
pub fn classify_row(row: &DraftRow) -> RowState {
    if row.is_blank() {
        return RowState::Empty;
    }

    let mut filled = 0usize;
    let mut required = 4usize; // date, times, project, description
    let mut invalid = false;

    if row.date.is_empty() {
        // missing, counts against completeness
    } else if parse_date(&row.date).is_some() {
        filled += 1;
    } else {
        invalid = true;
    }

    match (parse_time(&row.time_in), parse_time(&row.time_out)) {
        (Some(t_in), Some(t_out)) => {
            let (m_in, m_out) = (time_to_minutes(t_in), time_to_minutes(t_out));
            if on_time_step(m_in) && on_time_step(m_out) && m_out > m_in {
                filled += 1;
            } else {
                invalid = true;
            }
        }
        _ => {
            if (!row.time_in.is_empty() && parse_time(&row.time_in).is_none())
                || (!row.time_out.is_empty() && parse_time(&row.time_out).is_none())
            {
                invalid = true;
            }
        }
    }

    let def = if row.project.is_empty() {
        None
    } else {
        match project_by_code(&row.project) {
            Some(d) => {
                filled += 1;
                Some(d)
            }
            None => {
                invalid = true;
                None
            }
        }
    };

    if !row.task_description.is_empty() {
        filled += 1;
    }

    if let Some(def) = def {
        if def.requires_tool() {
            required += 1;
            match &row.tool {
                Some(t) if def.admits_tool(t) => filled += 1,
                Some(_) => invalid = true,
                None => {}
            }
        }
        if def.requires_charge_code() {
            required += 1;
            match &row.charge_code {
                Some(c) if def.admits_charge_code(c) => filled += 1,
                Some(_) => invalid = true,
                None => {}
            }
        }
    }

    if invalid {
        RowState::Invalid
    } else if filled == required {
        RowState::Complete
    } else {
        RowState::Partial
    }
}

/// Minute range of a complete row, for overlap checks.
fn row_range(row: &DraftRow) -> Option<(String, i64, i64)> {
    let t_in = parse_time(&row.time_in)?;
    let t_out = parse_time(&row.time_out)?;
    Some((
        row.date.clone(),
        time_to_minutes(t_in),
        time_to_minutes(t_out),
    ))
}

/// True when two complete rows on the same date overlap in time.
/// Adjacent ranges (one ends exactly when the next begins) do not overlap.
pub fn rows_overlap(a: &DraftRow, b: &DraftRow) -> bool {
    match (row_range(a), row_range(b)) {
        (Some((da, sa, ea)), Some((db, sb, eb))) => da == db && sa < eb && sb < ea,
        _ => false,
    }
}

/// Aggregate grid status.
///
/// Ready: every non-empty row complete, no same-date overlaps.
/// Warning: anything partial, invalid or overlapping.
/// Neutral: nothing entered yet.
pub fn sheet_status(rows: &[DraftRow]) -> SheetStatus {
    let mut any = false;
    let mut warning = false;
    let mut complete: Vec<&DraftRow> = Vec::new();

    for row in rows {
        match classify_row(row) {
            RowState::Empty => {}
            RowState::Complete => {
                any = true;
                complete.push(row);
            }
            RowState::Partial | RowState::Invalid => {
                any = true;
                warning = true;
            }
        }
    }

    if !warning {
        'outer: for (i, a) in complete.iter().enumerate() {
            for b in &complete[i + 1..] {
                if rows_overlap(a, b) {
                    warning = true;
                    break 'outer;
                }
            }
        }
    }

    if !any {
        SheetStatus::Neutral
    } else if warning {
        SheetStatus::Warning
    } else {
        SheetStatus::Ready
    }
}
