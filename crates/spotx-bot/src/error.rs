//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] spotx_telemetry::TelemetryError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] spotx_gateway::GatewayError),

    #[error("Executor error: {0}")]
    Executor(#[from] spotx_executor::ExecutorError),

    #[error("Invalid argument: {0}")]
    Argument(#[from] spotx_core::CoreError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
