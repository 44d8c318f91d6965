use std::collections::HashMap;

use chrono::{
    DateTime, Local, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc,
};
use serde_json::Value;

use crate::config::{DashboardConfig, DEFAULT_CARD_COLOR};
use crate::models::{InspectionRecord, InspectionStatus, Snapshot};

use super::gviz::RawRow;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const COL_STATUS: usize = 0;
const COL_PRESS: usize = 1;
const COL_PART: usize = 2;
const COL_LINK: usize = 3;
const COL_TIMESTAMP: usize = 4;
const COL_COLOR: usize = 5;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Turns raw sheet rows into a [`Snapshot`].
///
/// Column order is fixed: status, press, part, link, timestamp, color.
/// A bad row never fails the parse; missing pieces are defaulted.
#[derive(Debug, Clone)]
pub struct SnapshotParser {
    stale_after: TimeDelta,
    default_color: String,
}

impl Default for SnapshotParser {
    fn default() -> Self {
        Self {
            stale_after: TimeDelta::hours(1),
            default_color: DEFAULT_CARD_COLOR.to_string(),
        }
    }
}

impl SnapshotParser {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            stale_after: config.stale_after,
            default_color: config.default_color.clone(),
        }
    }

    pub fn parse(&self, rows: &[RawRow], now: DateTime<Utc>) -> Snapshot {
        let mut ids = IdAllocator::default();
        let records = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| self.parse_row(index, row, now, &mut ids))
            .collect();
        Snapshot::new(records)
    }

    fn parse_row(
        &self,
        index: usize,
        row: &RawRow,
        now: DateTime<Utc>,
        ids: &mut IdAllocator,
    ) -> Option<InspectionRecord> {
        if !row.has_cells() {
            return None;
        }

        let raw_status = row.text(COL_STATUS).unwrap_or_default();
        let press = row
            .text(COL_PRESS)
            .and_then(|label| first_digit_run(&label).map(str::to_string))
            .unwrap_or_else(|| (index + 1).to_string());
        let part_number = row.text(COL_PART).unwrap_or_default();
        let link = row.text(COL_LINK);
        let color_tag = row
            .text(COL_COLOR)
            .unwrap_or_else(|| self.default_color.clone());

        let timestamp = match row.value(COL_TIMESTAMP) {
            Some(value) if is_present(value) => parse_timestamp(value).unwrap_or_else(|| {
                log_warn!("Invalid date for press {press}, using current time");
                now
            }),
            _ => {
                log_warn!("Missing date for press {press}, using current time");
                now
            }
        };

        let notified = now.signed_duration_since(timestamp) > self.stale_after;
        let id = ids.allocate(&press, &part_number);
        log_debug!("parsed row {} as {id} (notified={notified})", index + 1);

        Some(InspectionRecord {
            id,
            press,
            part_number,
            timestamp: timestamp.timestamp_millis(),
            status: InspectionStatus::normalize(raw_status.trim()),
            link,
            color_tag,
            notified,
        })
    }
}

/// Hands out ids derived from press and part, suffixing repeats so every id
/// stays unique inside one snapshot.
#[derive(Debug, Default)]
struct IdAllocator {
    seen: HashMap<String, usize>,
}

impl IdAllocator {
    fn allocate(&mut self, press: &str, part_number: &str) -> String {
        let slug = slugify(part_number);
        let base = if slug.is_empty() {
            format!("press-{press}")
        } else {
            format!("press-{press}-{slug}")
        };

        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}-{count}")
        }
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn first_digit_run(text: &str) -> Option<&str> {
    text.split(|ch: char| !ch.is_ascii_digit())
        .find(|run| !run.is_empty())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

/// Reads a timestamp cell: the sheet's `Date(...)` literal, epoch
/// milliseconds, or a date string.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with("Date(") {
                parse_date_literal(text)
            } else {
                parse_date_string(text)
            }
        }
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|ms| ms as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// `Date(year, month, day[, hour, minute, second[, millis]])` with a
/// zero-based month, read in local time. Out-of-range parts roll over into
/// the next unit.
fn parse_date_literal(text: &str) -> Option<DateTime<Utc>> {
    let inner = text.strip_prefix("Date(")?.strip_suffix(')')?;
    let parts = inner
        .split(',')
        .map(|part| {
            let part = part.trim();
            if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                part.parse::<u32>().ok()
            } else {
                None
            }
        })
        .collect::<Option<Vec<u32>>>()?;

    if !(parts.len() == 3 || parts.len() == 6 || parts.len() == 7) {
        return None;
    }

    let part = |index: usize| i64::from(parts.get(index).copied().unwrap_or(0));
    let year = i32::try_from(parts[0]).ok()?;
    let month_start = NaiveDate::from_ymd_opt(year, 1, 1)?.checked_add_months(Months::new(parts[1]))?;

    let offset = TimeDelta::try_days(part(2) - 1)?
        .checked_add(&TimeDelta::try_hours(part(3))?)?
        .checked_add(&TimeDelta::try_minutes(part(4))?)?
        .checked_add(&TimeDelta::try_seconds(part(5))?)?
        .checked_add(&TimeDelta::try_milliseconds(part(6))?)?;

    let naive = month_start.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)?;
    local_to_utc(naive)
}

fn parse_date_string(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return local_to_utc(naive);
        }
    }

    // ISO date-only strings are UTC midnight; slash dates are local.
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%m/%d/%Y") {
        return local_to_utc(date.and_hms_opt(0, 0, 0)?);
    }

    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        // Wall-clock times skipped by a DST jump move forward an hour.
        .or_else(|| {
            naive
                .checked_add_signed(TimeDelta::hours(1))
                .and_then(|shifted| Local.from_local_datetime(&shifted).earliest())
        })
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn row(values: Vec<Value>) -> RawRow {
        RawRow::from_values(values)
    }

    #[test]
    fn parses_reference_row() {
        let now = local(2024, 1, 15, 10, 30, 0);
        let rows = vec![row(vec![
            json!("Accept"),
            json!("12"),
            json!("WidgetA"),
            json!(""),
            json!("Date(2024,0,15,10,0,0)"),
            json!("#fff"),
        ])];

        let snapshot = SnapshotParser::default().parse(&rows, now);
        assert_eq!(snapshot.len(), 1);
        let record = &snapshot.records()[0];
        assert_eq!(record.press, "12");
        assert_eq!(record.part_number, "WidgetA");
        assert_eq!(record.status, InspectionStatus::Approved);
        assert_eq!(record.timestamp, local(2024, 1, 15, 10, 0, 0).timestamp_millis());
        assert_eq!(record.link, None);
        assert_eq!(record.color_tag, "#fff");
        assert!(!record.notified);
        assert_eq!(record.id, "press-12-widgeta");
    }

    #[test]
    fn old_rows_are_notified() {
        let now = local(2024, 1, 15, 12, 0, 1);
        let rows = vec![row(vec![
            json!("Accept"),
            json!("12"),
            json!("WidgetA"),
            json!(""),
            json!("Date(2024,0,15,10,0,0)"),
        ])];
        let snapshot = SnapshotParser::default().parse(&rows, now);
        assert!(snapshot.records()[0].notified);
    }

    #[test]
    fn missing_or_bad_timestamp_uses_parse_time() {
        let now = local(2024, 3, 1, 8, 0, 0);
        let rows = vec![
            row(vec![json!("New"), json!("Press 7")]),
            row(vec![json!("New"), json!("8"), json!(""), json!(""), json!("not a date")]),
        ];
        let snapshot = SnapshotParser::default().parse(&rows, now);
        assert_eq!(snapshot.len(), 2);
        for record in snapshot.iter() {
            assert_eq!(record.timestamp, now.timestamp_millis());
            assert!(!record.notified);
        }
        assert_eq!(snapshot.records()[0].press, "7");
        assert_eq!(snapshot.records()[0].color_tag, DEFAULT_CARD_COLOR);
    }

    #[test]
    fn press_without_digits_falls_back_to_row_number() {
        let now = Utc::now();
        let rows = vec![
            RawRow::empty(),
            row(vec![json!("ghost"), json!("Spare")]),
            row(vec![json!("ghost"), json!(null)]),
            row(vec![json!("ghost"), json!(14.0)]),
        ];
        let snapshot = SnapshotParser::default().parse(&rows, now);
        let presses: Vec<&str> = snapshot.iter().map(|r| r.press.as_str()).collect();
        assert_eq!(presses, vec!["2", "3", "14"]);
    }

    #[test]
    fn rows_without_cells_are_dropped() {
        let rows = vec![RawRow::empty(), RawRow::empty()];
        assert!(SnapshotParser::default().parse(&rows, Utc::now()).is_empty());
    }

    #[test]
    fn duplicate_rows_get_distinct_ids() {
        let rows = vec![
            row(vec![json!("new"), json!("3"), json!("Bracket #2")]),
            row(vec![json!("new"), json!("3"), json!("Bracket #2")]),
            row(vec![json!("new"), json!("3")]),
        ];
        let snapshot = SnapshotParser::default().parse(&rows, Utc::now());
        let ids: Vec<&str> = snapshot.ids().collect();
        assert_eq!(ids, vec!["press-3-bracket-2", "press-3-bracket-2-2", "press-3"]);
    }

    #[test]
    fn ids_are_stable_across_parses() {
        let rows = vec![row(vec![json!("new"), json!("5"), json!("Hinge")])];
        let parser = SnapshotParser::default();
        let first = parser.parse(&rows, Utc::now());
        let second = parser.parse(&rows, Utc::now() + TimeDelta::minutes(5));
        assert_eq!(first.records()[0].id, second.records()[0].id);
    }

    #[test]
    fn date_literal_month_is_zero_based_and_rolls_over() {
        assert_eq!(
            parse_timestamp(&json!("Date(2024,0,31,23,59,59)")),
            Some(local(2024, 1, 31, 23, 59, 59))
        );
        assert_eq!(
            parse_timestamp(&json!("Date(2023,12,1,0,0,0)")),
            Some(local(2024, 1, 1, 0, 0, 0))
        );
        assert_eq!(parse_timestamp(&json!("Date(2024,1,15)")), Some(local(2024, 2, 15, 0, 0, 0)));
        assert_eq!(parse_timestamp(&json!("Date(2024,0)")), None);
        assert_eq!(parse_timestamp(&json!("Date(2024,-1,15)")), None);
    }

    #[test]
    fn out_of_range_date_literal_falls_back_to_now() {
        // Representable in UTC, but not after shifting into every local zone.
        let literal = json!("Date(262142,11,31,23,59,59)");
        let parsed = parse_timestamp(&literal);
        let _ = local_to_utc(NaiveDateTime::MAX);

        let now = Utc::now();
        let rows = vec![row(vec![json!("New"), json!("3"), json!("Gear"), json!(""), literal])];
        let snapshot = SnapshotParser::default().parse(&rows, now);
        assert_eq!(snapshot.len(), 1);
        let expected = parsed.unwrap_or(now).timestamp_millis();
        assert_eq!(snapshot.records()[0].timestamp, expected);
    }

    #[test]
    fn generic_date_strings() {
        assert_eq!(
            parse_timestamp(&json!("2024-01-15T10:00:00Z")),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(&json!("2024-01-15")),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(&json!("1/15/2024 10:05:00")),
            Some(local(2024, 1, 15, 10, 5, 0))
        );
        assert_eq!(
            parse_timestamp(&json!(1_705_312_800_000_i64)),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
    }
}
