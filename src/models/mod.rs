pub mod inspection;
pub mod status;

pub use inspection::{InspectionRecord, RecordId, Snapshot};
pub use status::{normalize_status, InspectionStatus};
