pub mod export;
pub mod format;
pub mod view;

pub use export::{build_report, ExportDocument, ExportPage, PageItem};
pub use format::{format_last_updated, format_timestamp};
pub use view::{CardView, DashboardView};
