//! Structured logging for spotx.
//!
//! Installs a `tracing` subscriber once per process: JSON lines in
//! production (`RUST_ENV=production`), pretty multi-line output otherwise.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, LoggingConfig};
