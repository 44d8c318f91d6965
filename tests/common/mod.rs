#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use pressboard_lib::dashboard::{DashboardEvent, EventSink};
use pressboard_lib::presentation::DashboardView;
use pressboard_lib::{DashboardError, DataSource, RawRow, SheetLocator};

pub const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1PressBoard_test-ID/edit#gid=0";

#[derive(Default)]
struct FakeInner {
    rows: Mutex<Vec<RawRow>>,
    fail: AtomicBool,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

/// In-memory sheet whose rows, latency and failure mode tests can flip.
#[derive(Clone, Default)]
pub struct FakeSource {
    inner: Arc<FakeInner>,
}

impl FakeSource {
    pub fn with_rows(rows: Vec<RawRow>) -> Self {
        let source = Self::default();
        source.set_rows(rows);
        source
    }

    pub fn set_rows(&self, rows: Vec<RawRow>) {
        *self.inner.rows.lock().unwrap() = rows;
    }

    pub fn set_failing(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

impl DataSource for FakeSource {
    async fn fetch_rows(&self, _locator: &SheetLocator) -> Result<Vec<RawRow>, DashboardError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.inner.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(DashboardError::data_source("Network response was not ok (503)"));
        }
        Ok(self.inner.rows.lock().unwrap().clone())
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DashboardEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DashboardEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|event| event.name() == name).count()
    }

    pub fn last_view(&self) -> Option<DashboardView> {
        self.events().into_iter().rev().find_map(|event| match event {
            DashboardEvent::Rendered { view } => Some(view),
            _ => None,
        })
    }

    pub fn last_error(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|event| match event {
            DashboardEvent::RefreshFailed { message } | DashboardEvent::ConnectFailed { message } => {
                Some(message)
            }
            _ => None,
        })
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DashboardEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn row(status: &str, press: &str, part: &str, updated: DateTime<Utc>) -> RawRow {
    RawRow::from_values([
        json!(status),
        json!(press),
        json!(part),
        json!(""),
        json!(updated.to_rfc3339()),
        json!("#fff"),
    ])
}

pub fn row_with_link(status: &str, press: &str, part: &str, link: &str, updated: DateTime<Utc>) -> RawRow {
    RawRow::from_values([
        json!(status),
        json!(press),
        json!(part),
        json!(link),
        json!(updated.to_rfc3339()),
    ])
}
