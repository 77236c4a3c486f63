//! Executor error types.

use rust_decimal::Decimal;
use spotx_core::{CoreError, Order};
use spotx_gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Caller input was malformed; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    /// Transport or remote failure. Never retried here.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The exchange declined the order.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// The order reached a terminal state other than filled.
    #[error("Order failed with status '{status}': {message}")]
    OrderFailed {
        order: Box<Order>,
        status: String,
        message: String,
    },

    /// The order expired; a cancellation was attempted.
    #[error("Order '{0}' expired")]
    OrderExpired(String),

    /// The watch deadline passed before a terminal state.
    #[error("Order '{0}' has timed out")]
    Timeout(String),

    #[error("{0} account not available")]
    AccountNotFound(String),

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("24h change {change}% does not exceed {threshold}%")]
    InsufficientVolatility { change: Decimal, threshold: Decimal },

    #[error("Price parse error: {0}")]
    PriceParse(String),

    #[error("No results returned for cancel request")]
    NoCancelResult,

    #[error("Cancel failed: {0}")]
    CancelFailed(String),
}

impl ExecutorError {
    /// Exchange order id tied to this error, when the order exists.
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::OrderFailed { order, .. } => Some(&order.order_id),
            Self::OrderExpired(id) | Self::Timeout(id) => Some(id),
            _ => None,
        }
    }

    /// Order snapshot carried by the error, if any.
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::OrderFailed { order, .. } => Some(order),
            _ => None,
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
