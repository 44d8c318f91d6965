pub mod controller;
pub mod detector;
pub mod events;
pub mod notifications;
pub mod selection;
pub mod state;

pub use controller::DashboardController;
pub use events::{DashboardEvent, EventSink, LogSink};
pub use notifications::{ArmedNotification, NotificationScheduler};
pub use selection::{filter, BulkActions, QueryFilter, SelectionSet, StatusFilter};
pub use state::{DashboardState, IngestReport};
