pub mod draft_row;
pub mod row_state;
