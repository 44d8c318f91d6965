pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod presentation;
pub mod settings;
pub mod sheets;
pub mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use log::{info, warn};

pub use config::DashboardConfig;
pub use dashboard::{DashboardController, DashboardEvent, DashboardState, EventSink, LogSink};
pub use errors::DashboardError;
pub use models::{normalize_status, InspectionRecord, InspectionStatus, RecordId, Snapshot};
pub use settings::SettingsStore;
pub use sheets::{DataSource, GoogleSheetsSource, RawRow, SheetLocator, SnapshotParser};
pub use utils::{Clock, ManualClock, SystemClock};

const SETTINGS_FILE: &str = "pressboard-settings.json";

fn settings_path() -> PathBuf {
    std::env::var_os("PRESSBOARD_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

/// Headless entry point: connects to the sheet given on the command line, or
/// the saved one, then polls and logs the board until Ctrl-C.
pub fn run() {
    let config = DashboardConfig::from_env();

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(if config.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    log::info!("Pressboard starting up...");

    let result = tokio::runtime::Runtime::new()
        .context("failed to start async runtime")
        .and_then(|runtime| runtime.block_on(run_dashboard(config)));

    if let Err(err) = result {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run_dashboard(config: DashboardConfig) -> anyhow::Result<()> {
    let settings = Arc::new(SettingsStore::new(settings_path())?);
    let source = GoogleSheetsSource::new(&config)?;
    let controller = DashboardController::new(
        &config,
        source,
        settings,
        Arc::new(LogSink),
        Arc::new(SystemClock),
    );

    if let Some(url) = std::env::args().nth(1) {
        controller.connect(&url).await?;
    } else if controller.resume_saved().await {
        info!("Resuming saved Google Sheet");
    } else {
        warn!("No data source configured; pass a Google Sheets URL to connect");
        return Ok(());
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down");
    controller.shutdown().await;
    Ok(())
}
