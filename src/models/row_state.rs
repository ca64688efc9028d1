use serde::Serialize;

/// Classification of a single row, as computed by the validator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum RowState {
    /// Every user field is blank.
    Empty,
    /// Some required fields are filled, the filled ones are valid.
    Partial,
    /// Every required field is filled and format-valid.
    Complete,
    /// At least one filled field violates a format or catalog rule.
    Invalid,
}

impl RowState {
    pub fn is_complete(&self) -> bool {
        matches!(self, RowState::Complete)
    }
}

/// Aggregate classification of the whole grid.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum SheetStatus {
    /// Every non-empty row is complete and no two rows overlap.
    Ready,
    /// Something is incomplete, invalid or overlapping.
    Warning,
    /// No non-empty rows at all.
    Neutral,
}

/// The 3-state save indicator shown in the UI.
///
/// A projection only, never a durability guarantee.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing pending, in flight or unsynced.
    Clean,
    /// At least one persistence call is in flight.
    Syncing,
    /// Unsynced rows exist but nothing is in flight.
    Dirty,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Clean => "clean",
            SaveStatus::Syncing => "syncing",
            SaveStatus::Dirty => "dirty",
        }
    }
}
