use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// `Jan 15, 2024, 10:00 AM`
pub fn format_last_updated<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%b %-d, %Y, %-I:%M %p").to_string()
}

/// Formats an epoch-millisecond timestamp in local time.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(at) => format_last_updated(&at.with_timezone(&Local)),
        None => "Invalid date".to_string(),
    }
}

pub fn file_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
