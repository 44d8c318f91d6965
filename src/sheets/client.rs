use std::future::Future;

use reqwest::{Client, Url};

use crate::config::DashboardConfig;
use crate::errors::DashboardError;

use super::gviz::{decode_gviz, decode_proxy_envelope, RawRow};
use super::locator::SheetLocator;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Anything that can hand back the current rows of a sheet.
pub trait DataSource: Send + Sync + 'static {
    fn fetch_rows(
        &self,
        locator: &SheetLocator,
    ) -> impl Future<Output = Result<Vec<RawRow>, DashboardError>> + Send;
}

/// Reads a publicly shared Google Sheet through its gviz endpoint.
#[derive(Debug, Clone)]
pub struct GoogleSheetsSource {
    client: Client,
    proxy_url: Option<String>,
}

impl GoogleSheetsSource {
    pub fn new(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| DashboardError::Configuration(format!("http client: {err}")))?;

        Ok(Self {
            client,
            proxy_url: config.proxy_url.clone(),
        })
    }

    fn request_url(&self, locator: &SheetLocator) -> Result<Url, DashboardError> {
        let target = locator.gviz_url();
        match &self.proxy_url {
            Some(proxy) => Url::parse_with_params(proxy, &[("url", target.as_str())])
                .map_err(|err| DashboardError::Configuration(format!("invalid proxy url: {err}"))),
            None => Url::parse(&target)
                .map_err(|err| DashboardError::Configuration(format!("invalid sheet url: {err}"))),
        }
    }
}

impl DataSource for GoogleSheetsSource {
    async fn fetch_rows(&self, locator: &SheetLocator) -> Result<Vec<RawRow>, DashboardError> {
        let url = self.request_url(locator)?;
        log_debug!("fetching sheet {} via {}", locator.sheet_id(), url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DashboardError::data_source(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::data_source(format!(
                "Network response was not ok ({status})"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| DashboardError::data_source(format!("reading body failed: {err}")))?;

        if self.proxy_url.is_some() {
            decode_proxy_envelope(&body)
        } else {
            decode_gviz(&body)
        }
    }
}
