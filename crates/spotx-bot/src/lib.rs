//! spotx command-line client.
//!
//! Wires configuration, logging and the REST gateway into a
//! [`TradingClient`](spotx_executor::TradingClient) and exposes its
//! operations as subcommands.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;

pub use app::Application;
pub use cli::{Args, Command};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
