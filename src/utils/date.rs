use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn date_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"))
}

/// Strict "YYYY-MM-DD" parse. The shape check keeps single-digit months and
/// days out even where chrono would tolerate them.
pub fn parse_date(d: &str) -> Option<NaiveDate> {
    if !date_shape().is_match(d) {
        return None;
    }
    NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()
}

pub fn parse_date_strict(d: &str) -> AppResult<NaiveDate> {
    parse_date(d).ok_or_else(|| AppError::InvalidDate(d.to_string()))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
