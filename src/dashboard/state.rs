use std::mem;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::DashboardConfig;
use crate::models::{InspectionRecord, RecordId, Snapshot};
use crate::sheets::{RawRow, SnapshotParser};

use super::detector::detect_stale_changes;
use super::notifications::{ArmedNotification, NotificationScheduler};
use super::selection::{bulk_actions, BulkActions, QueryFilter, SelectionSet};

/// What a snapshot swap did besides replacing the records.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub armed: Vec<ArmedNotification>,
    pub cancelled: Vec<RecordId>,
    pub pruned_selection: usize,
}

/// All mutable dashboard state: the current and previous snapshot, the
/// selection, the active filter and the pending notification timers.
///
/// Every method takes `now` explicitly so the whole thing runs without real
/// timers.
#[derive(Debug)]
pub struct DashboardState {
    current: Snapshot,
    previous: Snapshot,
    selection: SelectionSet,
    filter: QueryFilter,
    scheduler: NotificationScheduler,
    parser: SnapshotParser,
    stale_after: TimeDelta,
    change_detection_enabled: bool,
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            current: Snapshot::default(),
            previous: Snapshot::default(),
            selection: SelectionSet::new(),
            filter: QueryFilter::default(),
            scheduler: NotificationScheduler::new(config.notification_timeout),
            parser: SnapshotParser::from_config(config),
            stale_after: config.stale_after,
            change_detection_enabled: config.change_detection_enabled,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn change_detection_enabled(&self) -> bool {
        self.change_detection_enabled
    }

    pub fn set_change_detection(&mut self, enabled: bool) {
        self.change_detection_enabled = enabled;
    }

    pub fn ingest(&mut self, rows: &[RawRow], now: DateTime<Utc>) -> IngestReport {
        let snapshot = self.parser.parse(rows, now);
        self.replace_snapshot(snapshot, now)
    }

    /// Swaps in a freshly parsed snapshot.
    ///
    /// Timers and selections of vanished ids are dropped, stale records that
    /// survived from the previous snapshot are re-armed, and every other
    /// notified record is backed by a timer.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> IngestReport {
        self.previous = mem::replace(&mut self.current, snapshot);

        let current = &self.current;
        let cancelled = self.scheduler.retain(|id| current.contains(id));
        let pruned_selection = self.selection.prune(&self.current);

        let rearm = detect_stale_changes(&self.previous, &self.current, self.change_detection_enabled);
        let mut armed = self.arm(&rearm, now);
        armed.extend(self.reconcile_flags(now));

        IngestReport {
            armed,
            cancelled,
            pruned_selection,
        }
    }

    /// Recomputes staleness against `now` without a new fetch.
    pub fn recompute_staleness(&mut self, now: DateTime<Utc>) -> Vec<ArmedNotification> {
        let stale_after = self.stale_after;
        for record in self.current.iter_mut() {
            record.notified = record.is_stale_at(now, stale_after);
        }
        self.reconcile_flags(now)
    }

    // A pending timer keeps its record flagged; a flagged record without a
    // timer gets one.
    fn reconcile_flags(&mut self, now: DateTime<Utc>) -> Vec<ArmedNotification> {
        let mut armed = Vec::new();
        for record in self.current.iter_mut() {
            if self.scheduler.is_pending(&record.id) {
                record.notified = true;
            } else if record.notified {
                armed.push(self.scheduler.arm(&record.id, now));
            }
        }
        armed
    }

    /// Flags the given records and (re)starts their clear-timers. Ids that
    /// are not in the current snapshot are skipped.
    pub fn arm(&mut self, ids: &[RecordId], now: DateTime<Utc>) -> Vec<ArmedNotification> {
        let mut armed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.current.get_mut(id) {
                record.notified = true;
                armed.push(self.scheduler.arm(id, now));
            }
        }
        armed
    }

    /// Clears the flag and cancels any timer; returns how many records changed.
    pub fn disarm(&mut self, ids: &[RecordId]) -> usize {
        let mut cleared = 0;
        for id in ids {
            self.scheduler.disarm(id);
            if let Some(record) = self.current.get_mut(id) {
                if record.notified {
                    cleared += 1;
                }
                record.notified = false;
            }
        }
        cleared
    }

    pub fn notify_selected(&mut self, now: DateTime<Utc>) -> Vec<ArmedNotification> {
        let ids = self.selected_ids();
        self.arm(&ids, now)
    }

    pub fn stop_notifying_selected(&mut self) -> usize {
        let ids = self.selected_ids();
        self.disarm(&ids)
    }

    /// Clears every notification whose timer ran out by `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<RecordId> {
        let expired = self.scheduler.tick(now);
        for id in &expired {
            if let Some(record) = self.current.get_mut(id) {
                record.notified = false;
            }
        }
        expired
    }

    /// Runtime hook for a waiter that slept until its deadline.
    pub fn fire_notification(&mut self, id: &str, generation: u64) -> bool {
        if !self.scheduler.fire(id, generation) {
            return false;
        }
        if let Some(record) = self.current.get_mut(id) {
            record.notified = false;
        }
        true
    }

    pub fn cancel_timers(&mut self) {
        self.scheduler.cancel_all();
    }

    /// Ignores ids that are not on the board.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        if !self.current.contains(id) {
            return false;
        }
        self.selection.toggle(id)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.current.ids());
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn set_filter(&mut self, filter: QueryFilter) {
        self.filter = filter;
    }

    pub fn set_status_filter(&mut self, status: &str) {
        let search = mem::take(&mut self.filter.search);
        self.filter = QueryFilter::new(status, &search);
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.trim().to_lowercase();
    }

    pub fn visible_records(&self) -> Vec<&InspectionRecord> {
        self.filter.apply(&self.current)
    }

    pub fn bulk_actions(&self) -> BulkActions {
        bulk_actions(&self.selection, &self.current)
    }

    /// Selected records in board order.
    pub fn selected_records(&self) -> Vec<&InspectionRecord> {
        self.current
            .iter()
            .filter(|record| self.selection.contains(&record.id))
            .collect()
    }

    pub fn selected_form_link(&self) -> Option<&str> {
        if self.selection.len() != 1 {
            return None;
        }
        let id = self.selection.ids().next()?;
        self.current.get(id)?.form_link()
    }

    fn selected_ids(&self) -> Vec<RecordId> {
        self.selection.ids().map(str::to_string).collect()
    }
}
