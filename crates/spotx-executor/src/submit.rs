//! Order submission with precision repair.
//!
//! # Attempt Loop
//!
//! 1. Validate the request (no network call on failure)
//! 2. Assign a correlation id if empty
//! 3. Stamp the correlation id with the current millisecond, bumped past
//!    the previous attempt's stamp, and derive the client order id so every
//!    attempt is unique at the exchange
//! 4. Create a GTC limit order
//! 5. Transport failure -> `Gateway`, no retry
//! 6. Exchange validation failure:
//!    - `INVALID_PRICE_PRECISION` -> repair price, retry
//!    - `INSUFFICIENT_FUND` -> repair quantity, retry
//!    - `INVALID_SIZE_PRECISION` (too many decimals) -> repair quantity, retry
//!    - anything else, or retry budget spent -> `OrderRejected`
//! 7. Accepted -> re-fetch the order; `OPEN`/`FILLED` is success, any other
//!    status is `OrderFailed` carrying the snapshot

use std::time::Duration;

use tracing::{debug, info, warn};

use spotx_core::{
    new_correlation_id, stamp_correlation_id, ClientOrderId, Order, OrderRequest, Product,
};
use spotx_gateway::{CreateOrderFailure, CreateOrderRequest, DynGateway, GatewayError};

use crate::config::{ExecutorConfig, RepairPolicy};
use crate::error::{ExecutorError, ExecutorResult};

pub const INVALID_PRICE_PRECISION: &str = "INVALID_PRICE_PRECISION";
pub const INSUFFICIENT_FUND: &str = "INSUFFICIENT_FUND";
pub const INVALID_SIZE_PRECISION: &str = "INVALID_SIZE_PRECISION";

/// What a rejected attempt needs before it can be resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    Price,
    Quantity,
}

impl Repair {
    /// Classify an exchange validation failure. `None` means not repairable.
    pub fn classify(failure: &CreateOrderFailure) -> Option<Self> {
        match failure.error.as_str() {
            INVALID_PRICE_PRECISION => Some(Self::Price),
            INSUFFICIENT_FUND => Some(Self::Quantity),
            INVALID_SIZE_PRECISION
                if failure.message.to_ascii_lowercase().contains("too many decimals") =>
            {
                Some(Self::Quantity)
            }
            _ => None,
        }
    }
}

pub struct OrderSubmitter {
    gateway: DynGateway,
    max_repair_retries: u32,
    repair_delay: Duration,
    repair_policy: RepairPolicy,
}

impl OrderSubmitter {
    #[must_use]
    pub fn new(gateway: DynGateway, config: &ExecutorConfig) -> Self {
        Self {
            gateway,
            max_repair_retries: config.max_repair_retries,
            repair_delay: config.repair_delay(),
            repair_policy: config.repair_policy,
        }
    }

    /// Submit `request`, repairing and resubmitting on precision errors.
    ///
    /// The request is updated in place: generated correlation id, repaired
    /// price/quantity, and the retry count.
    pub async fn submit(&self, request: &mut OrderRequest) -> ExecutorResult<Order> {
        request.validate()?;

        if request.id.is_empty() {
            request.id = new_correlation_id();
        }

        let product_id = request.product_id();
        // Lazily fetched once for increment-based repair; a miss is kept too.
        let mut product: Option<Option<Product>> = None;
        // Stamps strictly increase within one submission, even inside a
        // single millisecond.
        let mut last_stamp: Option<i64> = None;

        loop {
            let now_ms = chrono::Utc::now().timestamp_millis();
            let stamp = last_stamp.map_or(now_ms, |last| now_ms.max(last + 1));
            last_stamp = Some(stamp);

            let correlation = stamp_correlation_id(&request.id, stamp);
            let client_order_id = ClientOrderId::for_order(
                request.side,
                &request.base_ticker,
                &request.quote_ticker,
                &correlation,
            );

            let create = CreateOrderRequest::limit_gtc(
                client_order_id,
                product_id.clone(),
                request.side,
                request.price,
                request.quantity,
            );
            debug!(
                client_order_id = %create.client_order_id,
                limit_price = %create.limit_price(),
                base_size = %create.base_size(),
                attempt = request.retries + 1,
                "Creating limit order"
            );

            let response = self.gateway.create_order(create).await?;

            if response.success {
                let order_id = response
                    .order_id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| GatewayError::EmptyResponse("create order id".to_string()))?;
                return self.confirm(&order_id).await;
            }

            let failure = response.failure.unwrap_or_default();
            let message = failure.display_message();

            let Some(repair) = Repair::classify(&failure) else {
                warn!(
                    product_id = %product_id,
                    error = %failure.error,
                    %message,
                    "Order rejected"
                );
                return Err(ExecutorError::OrderRejected(message));
            };

            if request.retries >= self.max_repair_retries {
                warn!(
                    product_id = %product_id,
                    retries = request.retries,
                    error = %failure.error,
                    "Repair retries exhausted"
                );
                return Err(ExecutorError::OrderRejected(message));
            }

            if self.repair_policy == RepairPolicy::ProductIncrement && product.is_none() {
                product = Some(self.gateway.get_product(&product_id).await?);
            }
            self.apply_repair(request, repair, product.as_ref().and_then(Option::as_ref));

            if !request.price.is_positive() || !request.quantity.is_positive() {
                warn!(
                    product_id = %product_id,
                    price = %request.price,
                    quantity = %request.quantity,
                    "Repair reduced order to zero"
                );
                return Err(ExecutorError::OrderRejected(message));
            }

            request.retries += 1;
            tokio::time::sleep(self.repair_delay).await;
        }
    }

    fn apply_repair(&self, request: &mut OrderRequest, repair: Repair, product: Option<&Product>) {
        match repair {
            Repair::Price => {
                let old = request.price;
                request.price = match (self.repair_policy, product) {
                    (RepairPolicy::ProductIncrement, Some(p)) => {
                        let floored = old.floor_to_increment(p.quote_increment);
                        if floored == old {
                            old.drop_last_digit()
                        } else {
                            floored
                        }
                    }
                    _ => old.drop_last_digit(),
                };
                info!(
                    current_price = %old,
                    new_price = %request.price,
                    "Invalid price precision, repairing"
                );
            }
            Repair::Quantity => {
                let old = request.quantity;
                request.quantity = match (self.repair_policy, product) {
                    (RepairPolicy::ProductIncrement, Some(p)) => {
                        let floored = old.floor_to_increment(p.base_increment);
                        if floored == old {
                            old.drop_last_digit()
                        } else {
                            floored
                        }
                    }
                    _ => old.drop_last_digit(),
                };
                info!(
                    current_quantity = %old,
                    new_quantity = %request.quantity,
                    "Invalid quantity, repairing"
                );
            }
        }
    }

    /// Re-fetch an accepted order and classify its status.
    async fn confirm(&self, order_id: &str) -> ExecutorResult<Order> {
        let order = self.gateway.get_order(order_id).await?;

        match &order.status {
            Some(status) if status.is_accepted() => {
                info!(order_id, %status, "Order accepted");
                Ok(order)
            }
            Some(status) => {
                let status = status.to_string();
                let message = order.rejection_text();
                warn!(order_id, %status, %message, "Order not live after creation");
                Err(ExecutorError::OrderFailed {
                    order: Box::new(order),
                    status,
                    message,
                })
            }
            None => Err(ExecutorError::OrderFailed {
                order: Box::new(order),
                status: String::new(),
                message: "unknown order issue".to_string(),
            }),
        }
    }
}
