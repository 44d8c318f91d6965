use std::collections::HashSet;

use crate::models::{RecordId, Snapshot};

/// Ids whose notification should be (re)armed after a refresh.
///
/// Only records that already existed in `previous` and are flagged as stale
/// qualify; new or vanished rows are not change events. Nothing is reported
/// on first load or while detection is switched off.
pub fn detect_stale_changes(previous: &Snapshot, current: &Snapshot, enabled: bool) -> Vec<RecordId> {
    if !enabled || previous.is_empty() {
        return Vec::new();
    }

    let known: HashSet<&str> = previous.ids().collect();
    current
        .iter()
        .filter(|record| record.notified && known.contains(record.id.as_str()))
        .map(|record| record.id.clone())
        .collect()
}
