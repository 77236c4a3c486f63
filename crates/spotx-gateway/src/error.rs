//! Gateway error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Scripted failure: {0}")]
    Scripted(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
