//! Client Configuration
//!
//! Settings shared by the HTTP repository, the event stream and the identity
//! resolver. Defaults can be overridden from `CHIFOUMI_*` environment variables.

use std::time::Duration;
use tracing::warn;

use crate::network::auth::DEFAULT_IDENTITY_CLAIMS;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Delay before re-opening a dropped event stream.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Capacity of the bounded event channel behind a subscription.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Timeout for request/response calls and for establishing connections.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash.
    pub api_url: String,
    /// Fixed delay between event stream reconnect attempts.
    pub reconnect_delay: Duration,
    /// Event channel capacity (values below 1 are clamped to 1).
    pub event_channel_capacity: usize,
    /// Request timeout. Applied to connection setup only for the event stream.
    pub request_timeout: Duration,
    /// Claim names tried, in order, when extracting the player identity.
    pub identity_claims: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            identity_claims: DEFAULT_IDENTITY_CLAIMS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// - `CHIFOUMI_API_URL`
    /// - `CHIFOUMI_RECONNECT_DELAY_MS`
    /// - `CHIFOUMI_EVENT_CHANNEL_CAPACITY`
    /// - `CHIFOUMI_REQUEST_TIMEOUT_MS`
    /// - `CHIFOUMI_IDENTITY_CLAIMS` (comma separated)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("CHIFOUMI_API_URL")
                .map(|url| normalize_url(&url))
                .unwrap_or(defaults.api_url),
            reconnect_delay: env_millis("CHIFOUMI_RECONNECT_DELAY_MS")
                .unwrap_or(defaults.reconnect_delay),
            event_channel_capacity: env_parse::<usize>("CHIFOUMI_EVENT_CHANNEL_CAPACITY")
                .unwrap_or(defaults.event_channel_capacity)
                .max(1),
            request_timeout: env_millis("CHIFOUMI_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout),
            identity_claims: std::env::var("CHIFOUMI_IDENTITY_CLAIMS")
                .ok()
                .map(|v| parse_claims(&v))
                .filter(|claims| !claims.is_empty())
                .unwrap_or(defaults.identity_claims),
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl AsRef<str>) -> Self {
        self.api_url = normalize_url(url.as_ref());
        self
    }

    /// Set the reconnect delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Build an absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_claims(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}
