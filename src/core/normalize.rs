//! Row normalizer: the dependency cascade.
//!
//! Runs synchronously on every edit, before any persistence is scheduled,
//! so a debounced save can never carry a dependent value its project no
//! longer admits.

use crate::core::catalog::project_by_code;
use crate::models::draft_row::DraftRow;

/// Trim a free-text field in place.
fn tidy(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

/// Canonicalize an optional field: trim, and collapse blanks to None.
fn tidy_opt(s: &mut Option<String>) {
    if let Some(v) = s {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            *s = None;
        } else if trimmed.len() != v.len() {
            *s = Some(trimmed.to_string());
        }
    }
}

/// Produce the normalized form of a row:
/// - free-text fields trimmed, blank optionals collapsed to None;
/// - each dependent field cleared when the current project does not admit
///   it (unknown and empty projects admit nothing).
pub fn normalize_row(row: &DraftRow) -> DraftRow {
    let mut out = row.clone();
    tidy(&mut out.date);
    tidy(&mut out.time_in);
    tidy(&mut out.time_out);
    tidy(&mut out.project);
    tidy(&mut out.task_description);
    tidy_opt(&mut out.tool);
    tidy_opt(&mut out.charge_code);

    match project_by_code(&out.project) {
        Some(def) => {
            if !def.requires_tool() {
                out.tool = None;
            }
            if !def.requires_charge_code() {
                out.charge_code = None;
            }
        }
        None => {
            // no project (or an unrecognized one) governs nothing
            out.tool = None;
            out.charge_code = None;
        }
    }

    out
}
