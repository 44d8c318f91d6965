use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::status::InspectionStatus;

pub type RecordId = String;

/// One card on the dashboard, built from a single sheet row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: RecordId,
    pub press: String,
    pub part_number: String,
    /// Last known update, epoch milliseconds.
    pub timestamp: i64,
    pub status: InspectionStatus,
    pub link: Option<String>,
    pub color_tag: String,
    pub notified: bool,
}

impl InspectionRecord {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>, stale_after: TimeDelta) -> bool {
        now.timestamp_millis().saturating_sub(self.timestamp) > stale_after.num_milliseconds()
    }

    pub fn form_link(&self) -> Option<&str> {
        self.link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Records produced by one parse cycle, in sheet order.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Snapshot {
    records: Vec<InspectionRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<InspectionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[InspectionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InspectionRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, InspectionRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&InspectionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut InspectionRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|record| record.id.as_str())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a InspectionRecord;
    type IntoIter = std::slice::Iter<'a, InspectionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(timestamp: DateTime<Utc>) -> InspectionRecord {
        InspectionRecord {
            id: "press-4".into(),
            press: "4".into(),
            part_number: String::new(),
            timestamp: timestamp.timestamp_millis(),
            status: InspectionStatus::New,
            link: Some(String::new()),
            color_tag: "#fff".into(),
            notified: false,
        }
    }

    #[test]
    fn staleness_is_strictly_greater_than_threshold() {
        let updated = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let rec = record(updated);
        let hour = TimeDelta::hours(1);
        assert!(!rec.is_stale_at(updated + hour, hour));
        assert!(rec.is_stale_at(updated + hour + TimeDelta::milliseconds(1), hour));
        assert_eq!(rec.updated_at(), Some(updated));
    }

    #[test]
    fn empty_link_is_not_a_form() {
        let rec = record(Utc::now());
        assert_eq!(rec.form_link(), None);
    }
}
