use std::fmt::Display;

use thiserror::Error;

/// User-facing failure raised by connect and refresh actions.
///
/// Row-level defects never show up here; the parser absorbs them.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Malformed or missing sheet locator. Raised before any state changes.
    #[error("{0}")]
    Configuration(String),
    /// Fetch failed or the payload could not be decoded as a table.
    #[error("Failed to load data. Please ensure the sheet is shared publicly.")]
    DataSource { reason: String },
    #[error("failed to save settings: {0}")]
    Settings(String),
}

impl DashboardError {
    pub fn data_source(reason: impl Display) -> Self {
        DashboardError::DataSource {
            reason: reason.to_string(),
        }
    }

    /// Detail for logs; the `Display` text is what the operator sees.
    pub fn detail(&self) -> String {
        match self {
            DashboardError::DataSource { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}
