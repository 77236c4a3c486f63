//! Completion watcher: polls an order until it reaches a terminal state.
//!
//! # Status Handling
//!
//! | Status | Outcome |
//! |--------|---------|
//! | `OPEN` | wait `poll_interval`, poll again |
//! | `FILLED` | `Ok(order)` |
//! | `CANCELLED` / `FAILED` | `OrderFailed` with the termination text |
//! | `EXPIRED` | cancel the order, `OrderExpired` |
//! | anything else | `OrderFailed` (unknown issue) |
//!
//! The deadline is checked before every fetch, so a deadline already in the
//! past makes no gateway calls.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use spotx_core::{Order, OrderStatus};
use spotx_gateway::DynGateway;

use crate::cancel::cancel_orders;
use crate::error::{ExecutorError, ExecutorResult};

pub struct CompletionWatcher {
    gateway: DynGateway,
    poll_interval: Duration,
}

impl CompletionWatcher {
    #[must_use]
    pub fn new(gateway: DynGateway, poll_interval: Duration) -> Self {
        Self {
            gateway,
            poll_interval,
        }
    }

    /// Poll `order_id` until filled, terminated, or `deadline` passes.
    pub async fn await_completion(&self, order_id: &str, deadline: Instant) -> ExecutorResult<Order> {
        let mut announced = false;

        loop {
            if Instant::now() > deadline {
                warn!(order_id, "Order watch deadline passed");
                return Err(ExecutorError::Timeout(order_id.to_string()));
            }

            let order = self.gateway.get_order(order_id).await?;

            match &order.status {
                Some(status) if !status.is_terminal() => {
                    if !announced {
                        info!(order_id, "Waiting for order to be filled");
                        announced = true;
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
                Some(OrderStatus::Filled) => {
                    info!(order_id, "Order filled");
                    return Ok(order);
                }
                Some(status @ (OrderStatus::Cancelled | OrderStatus::Failed)) => {
                    let status = status.to_string();
                    let message = order.termination_text();
                    warn!(order_id, %status, %message, "Order terminated");
                    return Err(ExecutorError::OrderFailed {
                        order: Box::new(order),
                        status,
                        message,
                    });
                }
                Some(OrderStatus::Expired) => {
                    debug!(order_id, "Order expired, cancelling");
                    if let Err(e) =
                        cancel_orders(self.gateway.as_ref(), vec![order_id.to_string()]).await
                    {
                        warn!(order_id, error = %e, "Cancel after expiry failed");
                    }
                    return Err(ExecutorError::OrderExpired(order_id.to_string()));
                }
                other => {
                    let status = other.as_ref().map(ToString::to_string).unwrap_or_default();
                    return Err(ExecutorError::OrderFailed {
                        message: format!("unknown issue with the order: {status}"),
                        order: Box::new(order),
                        status,
                    });
                }
            }
        }
    }
}
