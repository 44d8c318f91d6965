use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::models::RecordId;

/// A freshly armed notification. The runtime waits on `token` until
/// `deadline`, then reports back with `generation`.
#[derive(Debug, Clone)]
pub struct ArmedNotification {
    pub id: RecordId,
    pub deadline: DateTime<Utc>,
    pub generation: u64,
    pub token: CancellationToken,
}

#[derive(Debug)]
struct PendingNotification {
    deadline: DateTime<Utc>,
    generation: u64,
    token: CancellationToken,
}

/// Owns at most one pending clear-timer per record.
///
/// Every entry leaves the map in exactly one of three ways: it is disarmed,
/// it expires, or a newer `arm` replaces it. In all three cases its token is
/// cancelled so nothing keeps waiting on it.
#[derive(Debug)]
pub struct NotificationScheduler {
    timeout: TimeDelta,
    pending: HashMap<RecordId, PendingNotification>,
    next_generation: u64,
}

impl NotificationScheduler {
    pub fn new(timeout: TimeDelta) -> Self {
        Self {
            timeout,
            pending: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    /// Starts (or restarts) the clear-timer for `id`. Last call wins.
    pub fn arm(&mut self, id: &str, now: DateTime<Utc>) -> ArmedNotification {
        let generation = self.next_generation;
        self.next_generation += 1;

        let pending = PendingNotification {
            deadline: now + self.timeout,
            generation,
            token: CancellationToken::new(),
        };
        let armed = ArmedNotification {
            id: id.to_string(),
            deadline: pending.deadline,
            generation,
            token: pending.token.clone(),
        };

        if let Some(previous) = self.pending.insert(id.to_string(), pending) {
            previous.token.cancel();
        }
        armed
    }

    /// Cancels the timer for `id`; returns false when nothing was pending.
    pub fn disarm(&mut self, id: &str) -> bool {
        match self.pending.remove(id) {
            Some(pending) => {
                pending.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn deadline(&self, id: &str) -> Option<DateTime<Utc>> {
        self.pending.get(id).map(|pending| pending.deadline)
    }

    /// Expires every timer whose deadline has passed and returns their ids.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<RecordId> {
        let mut due: Vec<RecordId> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        due.sort();

        for id in &due {
            self.disarm(id);
        }
        due
    }

    /// Called by a waiter whose sleep finished. Only the current generation
    /// for `id` may clear it; superseded waiters are ignored.
    pub fn fire(&mut self, id: &str, generation: u64) -> bool {
        let current = self
            .pending
            .get(id)
            .is_some_and(|pending| pending.generation == generation);
        if current {
            self.disarm(id);
        }
        current
    }

    /// Drops and cancels every timer whose id fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<RecordId> {
        let mut dropped: Vec<RecordId> = self
            .pending
            .keys()
            .filter(|id| !keep(id.as_str()))
            .cloned()
            .collect();
        dropped.sort();

        for id in &dropped {
            self.disarm(id);
        }
        dropped
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.token.cancel();
        }
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    fn scheduler() -> NotificationScheduler {
        NotificationScheduler::new(TimeDelta::minutes(20))
    }

    #[test]
    fn arming_twice_keeps_one_timer() {
        let mut scheduler = scheduler();
        let first = scheduler.arm("press-1", t0());
        let second = scheduler.arm("press-1", t0() + TimeDelta::minutes(5));

        assert_eq!(scheduler.pending_count(), 1);
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert_eq!(scheduler.deadline("press-1"), Some(t0() + TimeDelta::minutes(25)));

        // The superseded waiter cannot clear the newer timer.
        assert!(!scheduler.fire("press-1", first.generation));
        assert!(scheduler.is_pending("press-1"));
        assert!(scheduler.fire("press-1", second.generation));
        assert!(!scheduler.is_pending("press-1"));
        assert!(second.token.is_cancelled());
    }

    #[test]
    fn disarm_without_timer_is_noop() {
        let mut scheduler = scheduler();
        assert!(!scheduler.disarm("missing"));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn tick_expires_only_due_timers() {
        let mut scheduler = scheduler();
        scheduler.arm("a", t0());
        scheduler.arm("b", t0() + TimeDelta::minutes(10));

        assert!(scheduler.tick(t0() + TimeDelta::minutes(19)).is_empty());
        assert_eq!(scheduler.tick(t0() + TimeDelta::minutes(20)), vec!["a".to_string()]);
        assert_eq!(scheduler.tick(t0() + TimeDelta::hours(1)), vec!["b".to_string()]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn retain_cancels_dropped_timers() {
        let mut scheduler = scheduler();
        let gone = scheduler.arm("gone", t0());
        let kept = scheduler.arm("kept", t0());

        let dropped = scheduler.retain(|id| id == "kept");
        assert_eq!(dropped, vec!["gone".to_string()]);
        assert!(gone.token.is_cancelled());
        assert!(!kept.token.is_cancelled());
        assert!(!scheduler.fire("gone", gone.generation));
    }

    #[test]
    fn dropping_scheduler_cancels_waiters() {
        let mut scheduler = scheduler();
        let armed = scheduler.arm("a", t0());
        drop(scheduler);
        assert!(armed.token.is_cancelled());
    }
}
