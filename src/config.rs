//! Configuration loading
//!
//! TOML file plus a `ROULETTE__`-prefixed environment overlay, so every
//! setting can be driven from the environment in deployment.

use crate::error::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub casino: CasinoConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Discord webhook channel; absent = disabled
    pub discord: Option<DiscordConfig>,
    /// Local HTTP sink; absent = disabled
    pub local_sink: Option<LocalSinkConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ROULETTE").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CasinoConfig {
    /// Page rendering the live table
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for CasinoConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            table_name: default_table_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// DevTools ports probed in order when attaching
    #[serde(default = "default_debug_ports")]
    pub debug_ports: Vec<u16>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_ports: default_debug_ports(),
            width: default_width(),
            height: default_height(),
            headless: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
    /// In-memory outcome history cap (FIFO eviction)
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_settle_min")]
    pub settle_delay_min_secs: f64,
    #[serde(default = "default_settle_max")]
    pub settle_delay_max_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
            history_size: default_history_size(),
            settle_delay_min_secs: default_settle_min(),
            settle_delay_max_secs: default_settle_max(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    /// Same-number reads inside this window are treated as re-reads
    #[serde(default = "default_dedup_window")]
    pub dedup_window_secs: i64,
    /// Result element candidates, most specific first
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            dedup_window_secs: default_dedup_window(),
            selectors: default_selectors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: String,
    /// Send startup/shutdown status embeds
    #[serde(default = "default_true")]
    pub notify_lifecycle: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalSinkConfig {
    #[serde(default = "default_local_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_table_name() -> String {
    "Immersive Roulette".to_string()
}

fn default_debug_ports() -> Vec<u16> {
    vec![9222, 9223, 9224, 9225, 9226]
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_timeout_minutes() -> u64 {
    120
}

fn default_history_size() -> usize {
    100
}

fn default_settle_min() -> f64 {
    3.0
}

fn default_settle_max() -> f64 {
    7.0
}

fn default_scan_interval() -> u64 {
    1
}

fn default_dedup_window() -> i64 {
    30
}

fn default_selectors() -> Vec<String> {
    [
        ".result-number",
        ".roulette-result",
        ".game-result",
        "[data-result]",
        ".number-display",
        ".result-display",
        ".winning-number",
        ".last-result",
        ".result",
        ".number",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_local_endpoint() -> String {
    "http://localhost:3001/result".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}
