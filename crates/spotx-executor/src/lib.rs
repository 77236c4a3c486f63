//! Spot order execution for spotx.
//!
//! Sits between callers and an exchange [`Gateway`](spotx_gateway::Gateway):
//!
//! - [`AccountCache`]: ticker to account id index, built once, balances
//!   fetched fresh every call
//! - [`MarketDataFetcher`]: product snapshot plus high/low over recent trades,
//!   with an optional 24h volatility gate
//! - [`OrderSubmitter`]: GTC limit submission that repairs precision
//!   rejections and resubmits within a bounded retry budget
//! - [`CompletionWatcher`]: polls an order until filled, terminated, expired
//!   or past its deadline
//! - [`OrderManager`]: cancellation by client order id fragment, open orders
//!   and fills
//! - [`TradingClient`]: all of the above behind one handle

pub mod accounts;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod market_data;
pub mod submit;
pub mod watcher;

pub use accounts::AccountCache;
pub use cancel::{cancel_orders, OrderManager};
pub use client::TradingClient;
pub use config::{ExecutorConfig, RepairPolicy};
pub use error::{ExecutorError, ExecutorResult};
pub use market_data::MarketDataFetcher;
pub use submit::{OrderSubmitter, Repair};
pub use watcher::CompletionWatcher;
