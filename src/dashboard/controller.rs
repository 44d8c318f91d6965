use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    config::DashboardConfig,
    errors::DashboardError,
    models::Snapshot,
    presentation::{build_report, DashboardView, ExportDocument},
    settings::SettingsStore,
    sheets::{DataSource, RawRow, SheetLocator},
    utils::Clock,
};

use super::{
    events::{DashboardEvent, EventSink},
    notifications::ArmedNotification,
    state::DashboardState,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Drives a [`DashboardState`]: fetches, polls, runs notification timers and
/// pushes a fresh view to the sink after every change.
pub struct DashboardController<S: DataSource> {
    state: Arc<Mutex<DashboardState>>,
    source: Arc<S>,
    settings: Arc<SettingsStore>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    refresh_interval: Duration,
    refresher: Arc<Mutex<Option<JoinHandle<()>>>>,
    refreshes_in_flight: Arc<AtomicUsize>,
}

impl<S: DataSource> Clone for DashboardController<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            source: self.source.clone(),
            settings: self.settings.clone(),
            sink: self.sink.clone(),
            clock: self.clock.clone(),
            refresh_interval: self.refresh_interval,
            refresher: self.refresher.clone(),
            refreshes_in_flight: self.refreshes_in_flight.clone(),
        }
    }
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<S: DataSource> DashboardController<S> {
    pub fn new(
        config: &DashboardConfig,
        source: S,
        settings: Arc<SettingsStore>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(DashboardState::new(config))),
            source: Arc::new(source),
            settings,
            sink,
            clock,
            refresh_interval: config.refresh_interval,
            refresher: Arc::new(Mutex::new(None)),
            refreshes_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn view(&self) -> DashboardView {
        let state = self.state.lock().await;
        DashboardView::from_state(&state)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.snapshot().clone()
    }

    pub async fn with_state<R>(&self, read: impl FnOnce(&DashboardState) -> R) -> R {
        let state = self.state.lock().await;
        read(&state)
    }

    /// Locator of the saved sheet, if the settings name a usable one.
    pub fn saved_locator(&self) -> Option<SheetLocator> {
        let url = self.settings.saved_google_sheet()?;
        match SheetLocator::from_url(&url) {
            Ok(locator) => Some(locator),
            Err(err) => {
                log_warn!("Saved sheet url is unusable: {err}");
                None
            }
        }
    }

    /// Starts polling the saved sheet right away. Returns false when no
    /// sheet was saved.
    pub async fn resume_saved(&self) -> bool {
        if self.saved_locator().is_none() {
            return false;
        }
        self.spawn_refresher(true).await;
        true
    }

    /// Validates `url`, loads the sheet, remembers it and starts polling.
    ///
    /// Nothing changes when the URL is malformed or the first fetch fails.
    pub async fn connect(&self, url: &str) -> Result<(), DashboardError> {
        let result = self.try_connect(url).await;
        if let Err(err) = &result {
            log_error!("Failed to connect: {}", err.detail());
            self.sink.emit(DashboardEvent::ConnectFailed {
                message: err.to_string(),
            });
        }
        result
    }

    async fn try_connect(&self, url: &str) -> Result<(), DashboardError> {
        let locator = SheetLocator::from_url(url)?;
        let rows = {
            let _in_flight = InFlight::enter(&self.refreshes_in_flight);
            self.source.fetch_rows(&locator).await?
        };

        self.settings
            .save_google_sheet(url.trim())
            .map_err(|err| DashboardError::Settings(format!("{err:#}")))?;

        self.apply_rows(&rows).await;
        log_info!("Connected to sheet {}", locator.sheet_id());
        self.sink.emit(DashboardEvent::Connected {
            sheet_id: locator.sheet_id().to_string(),
        });

        self.spawn_refresher(false).await;
        Ok(())
    }

    /// Re-fetches the connected sheet. `Ok(false)` when nothing is connected.
    ///
    /// On failure the current snapshot stays as it was.
    pub async fn refresh(&self) -> Result<bool, DashboardError> {
        let Some(locator) = self.saved_locator() else {
            return Ok(false);
        };

        let _in_flight = InFlight::enter(&self.refreshes_in_flight);
        self.sink.emit(DashboardEvent::RefreshStarted);

        match self.source.fetch_rows(&locator).await {
            Ok(rows) => {
                self.apply_rows(&rows).await;
                Ok(true)
            }
            Err(err) => {
                log_error!("Refresh of sheet {} failed: {}", locator.sheet_id(), err.detail());
                self.sink.emit(DashboardEvent::RefreshFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn scheduled_refresh(&self) {
        if self.refreshes_in_flight.load(Ordering::Acquire) > 0 {
            log_warn!("Refresh already in flight; skipping scheduled tick");
            return;
        }
        // Failures are already reported; the next tick retries.
        let _ = self.refresh().await;
    }

    pub async fn start_auto_refresh(&self) {
        self.spawn_refresher(true).await;
    }

    async fn spawn_refresher(&self, fetch_now: bool) {
        let mut refresher = self.refresher.lock().await;
        if let Some(handle) = refresher.take() {
            handle.abort();
        }

        let controller = self.clone();
        let period = self.refresh_interval;
        let handle = tokio::spawn(async move {
            let start = if fetch_now {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                controller.scheduled_refresh().await;
            }
        });

        *refresher = Some(handle);
    }

    /// Stops polling. Pending notifications keep running.
    pub async fn stop(&self) {
        if let Some(handle) = self.refresher.lock().await.take() {
            handle.abort();
        }
    }

    /// Stops polling and cancels every notification timer.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.state.lock().await.cancel_timers();
    }

    pub async fn notify_selected(&self) -> usize {
        self.update(|state, now| {
            let armed = state.notify_selected(now);
            (armed.len(), armed)
        })
        .await
    }

    pub async fn stop_notifying_selected(&self) -> usize {
        self.update(|state, _| (state.stop_notifying_selected(), Vec::new()))
            .await
    }

    pub async fn toggle_selection(&self, id: &str) -> bool {
        self.update(|state, _| (state.toggle_selection(id), Vec::new()))
            .await
    }

    pub async fn select_all(&self) {
        self.update(|state, _| (state.select_all(), Vec::new())).await
    }

    pub async fn deselect_all(&self) {
        self.update(|state, _| (state.deselect_all(), Vec::new())).await
    }

    pub async fn set_status_filter(&self, status: &str) {
        self.update(|state, _| (state.set_status_filter(status), Vec::new()))
            .await
    }

    pub async fn set_search(&self, term: &str) {
        self.update(|state, _| (state.set_search(term), Vec::new()))
            .await
    }

    pub async fn set_change_detection(&self, enabled: bool) {
        self.state.lock().await.set_change_detection(enabled);
    }

    pub async fn selected_form_link(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.selected_form_link().map(str::to_string)
    }

    pub async fn export_selected(&self) -> Option<ExportDocument> {
        let today = self.clock.now().date_naive();
        let state = self.state.lock().await;
        build_report(&state.selected_records(), today)
    }

    async fn update<R>(
        &self,
        apply: impl FnOnce(&mut DashboardState, DateTime<Utc>) -> (R, Vec<ArmedNotification>),
    ) -> R {
        let now = self.clock.now();
        let (result, armed, view) = {
            let mut state = self.state.lock().await;
            let (result, armed) = apply(&mut state, now);
            (result, armed, DashboardView::from_state(&state))
        };

        self.spawn_waiters(armed);
        self.sink.emit(DashboardEvent::Rendered { view });
        result
    }

    async fn apply_rows(&self, rows: &[RawRow]) {
        let now = self.clock.now();
        let (report, view) = {
            let mut state = self.state.lock().await;
            let report = state.ingest(rows, now);
            (report, DashboardView::from_state(&state))
        };

        log_info!(
            "Applied snapshot: {} cards, {} timers armed, {} cancelled, {} selections pruned",
            view.total,
            report.armed.len(),
            report.cancelled.len(),
            report.pruned_selection
        );

        self.spawn_waiters(report.armed);
        self.sink.emit(DashboardEvent::Rendered { view });
    }

    fn spawn_waiters(&self, armed: Vec<ArmedNotification>) {
        for notification in armed {
            let wait = (notification.deadline - self.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let state = self.state.clone();
            let sink = self.sink.clone();

            tokio::spawn(async move {
                tokio::select! {
                    _ = notification.token.cancelled() => {}
                    _ = time::sleep(wait) => {
                        let view = {
                            let mut guard = state.lock().await;
                            if !guard.fire_notification(&notification.id, notification.generation) {
                                return;
                            }
                            DashboardView::from_state(&guard)
                        };
                        sink.emit(DashboardEvent::Rendered { view });
                    }
                }
            });
        }
    }
}
