use std::time::Duration;

use chrono::TimeDelta;

pub const DEFAULT_CARD_COLOR: &str = "#3498db";

/// Tunables for polling, staleness and notification timing.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Cadence of the background re-fetch while a sheet is connected
    pub refresh_interval: Duration,

    /// How long a notified card keeps blinking before it clears itself
    pub notification_timeout: TimeDelta,

    /// Age after which a card counts as stale
    pub stale_after: TimeDelta,

    pub default_color: String,
    pub change_detection_enabled: bool,

    /// Optional allorigins-style proxy; requests go straight to Google when unset
    pub proxy_url: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,

    pub debug: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(5 * 60),
            notification_timeout: TimeDelta::minutes(20),
            stale_after: TimeDelta::hours(1),
            default_color: DEFAULT_CARD_COLOR.to_string(),
            change_detection_enabled: true,
            proxy_url: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            debug: false,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup("PRESSBOARD_DEBUG") {
            self.debug = value == "1" || value.eq_ignore_ascii_case("true");
        }

        if let Some(proxy) = lookup("PRESSBOARD_PROXY_URL") {
            let proxy = proxy.trim();
            self.proxy_url = (!proxy.is_empty()).then(|| proxy.to_string());
        }

        if let Some(secs) = lookup("PRESSBOARD_REFRESH_SECS").and_then(|raw| raw.parse::<u64>().ok()) {
            if secs > 0 {
                self.refresh_interval = Duration::from_secs(secs);
            }
        }

        self
    }
}
