//! Time utilities: parsing HH:MM, duration computations, formatting minutes, etc.

use crate::errors::{AppError, AppResult};
use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;

/// Grid times snap to quarter hours.
pub const TIME_STEP_MINUTES: i64 = 15;

fn time_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").expect("static regex"))
}

/// Strict "HH:MM" parse. Rejects loose shapes chrono would accept ("9:5").
pub fn parse_time(t: &str) -> Option<NaiveTime> {
    if !time_shape().is_match(t) {
        return None;
    }
    NaiveTime::parse_from_str(t, "%H:%M").ok()
}

pub fn parse_time_strict(t: &str) -> AppResult<NaiveTime> {
    parse_time(t).ok_or_else(|| AppError::InvalidTime(t.to_string()))
}

pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    let duration = end - start;
    duration.num_minutes()
}

/// Minutes since midnight, the storage representation for grid times.
pub fn time_to_minutes(t: NaiveTime) -> i64 {
    minutes_between(NaiveTime::MIN, t)
}

pub fn minutes_to_time_str(mins: i64) -> String {
    let m = mins.rem_euclid(24 * 60);
    format!("{:02}:{:02}", m / 60, m % 60)
}

pub fn on_time_step(mins: i64) -> bool {
    mins % TIME_STEP_MINUTES == 0
}

pub fn format_minutes(mins: i64) -> String {
    let sign = if mins < 0 { "-" } else { "" };
    let m = mins.abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}
