//! Cancellation and order/fill queries.

use chrono::Utc;
use tracing::{debug, info, warn};

use spotx_core::{Fill, Order, OrderSide, OrderStatus, OrderType, ProductId};
use spotx_gateway::{DynGateway, Gateway, ListFillsFilter, ListOrdersFilter};

use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, ExecutorResult};

/// Cancel a batch of orders.
///
/// Only the first per-order result is inspected; an empty result set is an
/// error.
pub async fn cancel_orders(gateway: &dyn Gateway, order_ids: Vec<String>) -> ExecutorResult<()> {
    let results = gateway.cancel_orders(order_ids).await?;

    let Some(first) = results.first() else {
        return Err(ExecutorError::NoCancelResult);
    };
    if !first.success {
        return Err(ExecutorError::CancelFailed(first.failure_reason.clone()));
    }

    debug!(order_id = %first.order_id, "Order cancelled");
    Ok(())
}

/// Order housekeeping: cancel by fragment, list open orders, fetch fills.
pub struct OrderManager {
    gateway: DynGateway,
    order_page_limit: u32,
    order_lookback: chrono::Duration,
    fills_window: chrono::Duration,
}

impl OrderManager {
    #[must_use]
    pub fn new(gateway: DynGateway, config: &ExecutorConfig) -> Self {
        Self {
            gateway,
            order_page_limit: config.order_page_limit,
            order_lookback: config.order_lookback(),
            fills_window: config.fills_window(),
        }
    }

    pub async fn get_order(&self, order_id: &str) -> ExecutorResult<Order> {
        Ok(self.gateway.get_order(order_id).await?)
    }

    pub async fn cancel_orders(&self, order_ids: Vec<String>) -> ExecutorResult<()> {
        cancel_orders(self.gateway.as_ref(), order_ids).await
    }

    /// Cancel every recent order of `order_type` on `product_id` whose client
    /// order id contains `fragment`.
    ///
    /// Stops at the first cancellation failure. Returns the ids cancelled.
    pub async fn cancel_existing_orders(
        &self,
        fragment: &str,
        product_id: &ProductId,
        order_type: OrderType,
    ) -> ExecutorResult<Vec<String>> {
        let now = Utc::now();
        let orders = self
            .gateway
            .list_orders(ListOrdersFilter {
                product_id: product_id.clone(),
                statuses: Vec::new(),
                side: None,
                order_type: Some(order_type),
                start: Some(now - self.order_lookback),
                end: Some(now),
                limit: self.order_page_limit,
            })
            .await?;

        let mut cancelled = Vec::new();
        for order in orders
            .iter()
            .filter(|o| o.client_order_id_str().contains(fragment))
        {
            self.cancel_orders(vec![order.order_id.clone()])
                .await
                .map_err(|e| {
                    warn!(order_id = %order.order_id, error = %e, "Cancel existing order failed");
                    e
                })?;
            cancelled.push(order.order_id.clone());
        }

        info!(
            product_id = %product_id,
            fragment,
            scanned = orders.len(),
            cancelled = cancelled.len(),
            "Cancelled existing orders"
        );
        Ok(cancelled)
    }

    /// Open orders on `product_id` for `side`.
    pub async fn open_orders(&self, product_id: &ProductId, side: OrderSide) -> ExecutorResult<Vec<Order>> {
        let orders = self
            .gateway
            .list_orders(ListOrdersFilter {
                product_id: product_id.clone(),
                statuses: vec![OrderStatus::Open],
                side: Some(side),
                order_type: None,
                start: None,
                end: None,
                limit: self.order_page_limit,
            })
            .await?;
        Ok(orders)
    }

    /// Fills for `order_id` within the fills window around now.
    pub async fn order_fills(&self, order_id: &str, product_id: &ProductId) -> ExecutorResult<Vec<Fill>> {
        let now = Utc::now();
        let fills = self
            .gateway
            .list_fills(ListFillsFilter {
                order_id: order_id.to_string(),
                product_id: product_id.clone(),
                start: now - self.fills_window,
                end: now + self.fills_window,
                limit: self.order_page_limit,
            })
            .await?;
        Ok(fills)
    }
}
