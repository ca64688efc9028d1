use serde::{Deserialize, Serialize};

/// One work-log unit as edited in the grid.
///
/// `id` is absent until the first successful persist; `hours` is derived by
/// the store on every upsert and is advisory in memory. Rows are replaced
/// wholesale at a position, never mutated in place, so content comparisons
/// stay meaningful while a save is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRow {
    pub id: Option<i64>,
    pub date: String, // "YYYY-MM-DD"
    #[serde(rename = "timeIn")]
    pub time_in: String, // "HH:MM"
    #[serde(rename = "timeOut")]
    pub time_out: String, // "HH:MM"
    pub project: String,
    pub tool: Option<String>,
    #[serde(rename = "chargeCode")]
    pub charge_code: Option<String>,
    #[serde(rename = "taskDescription")]
    pub task_description: String,
    #[serde(default)]
    pub hours: Option<f64>,
}

impl DraftRow {
    /// Fresh row for the trailing blank slot of the grid.
    pub fn blank() -> Self {
        Self {
            id: None,
            date: String::new(),
            time_in: String::new(),
            time_out: String::new(),
            project: String::new(),
            tool: None,
            charge_code: None,
            task_description: String::new(),
            hours: None,
        }
    }

    /// True when every user-editable field is empty.
    pub fn is_blank(&self) -> bool {
        self.date.is_empty()
            && self.time_in.is_empty()
            && self.time_out.is_empty()
            && self.project.is_empty()
            && self.tool.is_none()
            && self.charge_code.is_none()
            && self.task_description.is_empty()
    }

    /// Compare the user-entered fields only. Identity and derived fields are
    /// excluded: a canonical row returned by the store must count as "equal"
    /// to the draft it was written from.
    pub fn same_content(&self, other: &DraftRow) -> bool {
        self.date == other.date
            && self.time_in == other.time_in
            && self.time_out == other.time_out
            && self.project == other.project
            && self.tool == other.tool
            && self.charge_code == other.charge_code
            && self.task_description == other.task_description
    }

    /// Merge identity and derived fields from a canonical store row.
    /// Returns true when anything changed.
    pub fn merge_canonical(&mut self, canonical: &DraftRow) -> bool {
        let mut changed = false;
        if self.id.is_none() && canonical.id.is_some() {
            self.id = canonical.id;
            changed = true;
        }
        if self.same_content(canonical) && self.hours != canonical.hours {
            self.hours = canonical.hours;
            changed = true;
        }
        changed
    }
}
