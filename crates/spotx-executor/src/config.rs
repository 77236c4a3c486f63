//! Executor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a precision rejection is repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPolicy {
    /// Drop the last fractional digit of the rejected value.
    #[default]
    DropLastDigit,
    /// Floor to the product's declared increment first; fall back to
    /// dropping a digit when the value is already aligned.
    ProductIncrement,
}

/// Tunables for submission, polling and listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum repair retries per submission. Default: 5.
    #[serde(default = "default_max_repair_retries")]
    pub max_repair_retries: u32,
    /// Pause before resubmitting a repaired order (ms). Default: 50.
    #[serde(default = "default_repair_delay_ms")]
    pub repair_delay_ms: u64,
    #[serde(default)]
    pub repair_policy: RepairPolicy,
    /// Order status poll interval (ms). Default: 5,000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Page size for the one-time account listing. Default: 250.
    #[serde(default = "default_account_page_limit")]
    pub account_page_limit: u32,
    /// Number of recent trades scanned for high/low. Default: 1000.
    #[serde(default = "default_trade_window")]
    pub trade_window: u32,
    /// Page size for order and fill listings. Default: 250.
    #[serde(default = "default_order_page_limit")]
    pub order_page_limit: u32,
    /// Lookback when searching orders to cancel (hours). Default: 24.
    #[serde(default = "default_order_lookback_hours")]
    pub order_lookback_hours: i64,
    /// Window around now for fill queries (seconds). Default: 300.
    #[serde(default = "default_fills_window_secs")]
    pub fills_window_secs: i64,
}

fn default_max_repair_retries() -> u32 {
    5
}

fn default_repair_delay_ms() -> u64 {
    50
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_account_page_limit() -> u32 {
    250
}

fn default_trade_window() -> u32 {
    1_000
}

fn default_order_page_limit() -> u32 {
    250
}

fn default_order_lookback_hours() -> i64 {
    24
}

fn default_fills_window_secs() -> i64 {
    300
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_repair_retries: default_max_repair_retries(),
            repair_delay_ms: default_repair_delay_ms(),
            repair_policy: RepairPolicy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            account_page_limit: default_account_page_limit(),
            trade_window: default_trade_window(),
            order_page_limit: default_order_page_limit(),
            order_lookback_hours: default_order_lookback_hours(),
            fills_window_secs: default_fills_window_secs(),
        }
    }
}

impl ExecutorConfig {
    pub fn repair_delay(&self) -> Duration {
        Duration::from_millis(self.repair_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn order_lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(self.order_lookback_hours)
    }

    pub fn fills_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.fills_window_secs)
    }
}
