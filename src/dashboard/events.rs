use serde::Serialize;

use crate::presentation::DashboardView;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DashboardEvent {
    /// The board changed and should be redrawn.
    Rendered { view: DashboardView },
    RefreshStarted,
    RefreshFailed { message: String },
    Connected { sheet_id: String },
    ConnectFailed { message: String },
}

impl DashboardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::Rendered { .. } => "dashboard-rendered",
            DashboardEvent::RefreshStarted => "refresh-started",
            DashboardEvent::RefreshFailed { .. } => "refresh-failed",
            DashboardEvent::Connected { .. } => "data-source-connected",
            DashboardEvent::ConnectFailed { .. } => "connect-failed",
        }
    }
}

/// Receiver for everything the controller wants drawn or reported.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: DashboardEvent);
}

/// Writes events to the log; used by the headless runner.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: DashboardEvent) {
        match &event {
            DashboardEvent::Rendered { view } => {
                log::info!(
                    "{}: {} of {} cards shown, {} notified",
                    event.name(),
                    view.cards.len(),
                    view.total,
                    view.notified
                );
                for card in &view.cards {
                    log::info!(
                        "  press {:<4} {:<20} {:<12} {}{}",
                        card.press,
                        card.part_number,
                        card.status_label,
                        card.last_updated,
                        if card.notified { "  [!]" } else { "" }
                    );
                }
            }
            DashboardEvent::RefreshStarted => log::debug!("{}", event.name()),
            DashboardEvent::RefreshFailed { message } | DashboardEvent::ConnectFailed { message } => {
                log::error!("{}: {message}", event.name())
            }
            DashboardEvent::Connected { sheet_id } => {
                log::info!("{}: {sheet_id}", event.name())
            }
        }
    }
}
