use std::sync::LazyLock;

use regex::Regex;

use crate::errors::DashboardError;

static SHEET_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid sheet id pattern"));
const GVIZ_ENDPOINT: &str = "https://docs.google.com/spreadsheets/d";

/// Spreadsheet id pulled out of a sharing URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocator {
    sheet_id: String,
}

impl SheetLocator {
    pub fn from_url(url: &str) -> Result<Self, DashboardError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DashboardError::Configuration(
                "Please enter a Google Sheets URL".into(),
            ));
        }

        SHEET_ID_PATTERN
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|id| Self {
                sheet_id: id.as_str().to_string(),
            })
            .ok_or_else(|| DashboardError::Configuration("Invalid Google Sheets URL format".into()))
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    /// Query endpoint that returns the sheet as a gviz JSON response.
    pub fn gviz_url(&self) -> String {
        format!("{GVIZ_ENDPOINT}/{}/gviz/tq?tqx=out:json", self.sheet_id)
    }
}
