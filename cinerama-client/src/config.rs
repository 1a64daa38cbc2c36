use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub checkout: CheckoutRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token for the authenticated endpoints, if any
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutRules {
    /// Length of the checkout hold window, in seconds
    #[serde(default = "default_hold_window_secs")]
    pub hold_window_secs: u64,
    /// Delay before the live seat feed reconnects after channel loss
    #[serde(default = "default_feed_reconnect_secs")]
    pub feed_reconnect_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_hold_window_secs() -> u64 {
    300
}

fn default_feed_reconnect_secs() -> u64 {
    5
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // E.g. `CINERAMA__API__BASE_URL=...`
            .add_source(config::Environment::with_prefix("CINERAMA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for CheckoutRules {
    fn default() -> Self {
        Self {
            hold_window_secs: default_hold_window_secs(),
            feed_reconnect_secs: default_feed_reconnect_secs(),
        }
    }
}
