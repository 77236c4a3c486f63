//! Gateway port: the capability set the order engine depends on.
//!
//! The trait is dyn-compatible so the engine can hold an
//! `Arc<dyn Gateway>` and swap the REST implementation for the scripted
//! mock in tests, or for any other transport.

use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use spotx_core::{
    Account, ClientOrderId, Fill, Order, OrderSide, OrderStatus, OrderType, Price, Product,
    ProductId, Size, Trade,
};

use crate::error::GatewayResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Order configuration sent on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderConfiguration {
    /// Good-till-cancelled limit order.
    LimitLimitGtc {
        base_size: String,
        limit_price: String,
        #[serde(default)]
        post_only: bool,
    },
}

/// Order creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub client_order_id: ClientOrderId,
    pub product_id: ProductId,
    pub side: OrderSide,
    pub order_configuration: OrderConfiguration,
}

impl CreateOrderRequest {
    /// GTC limit order with price and size rendered as fixed-point strings.
    pub fn limit_gtc(
        client_order_id: ClientOrderId,
        product_id: ProductId,
        side: OrderSide,
        price: Price,
        quantity: Size,
    ) -> Self {
        Self {
            client_order_id,
            product_id,
            side,
            order_configuration: OrderConfiguration::LimitLimitGtc {
                base_size: quantity.to_fixed(),
                limit_price: price.to_fixed(),
                post_only: false,
            },
        }
    }

    pub fn limit_price(&self) -> &str {
        match &self.order_configuration {
            OrderConfiguration::LimitLimitGtc { limit_price, .. } => limit_price,
        }
    }

    pub fn base_size(&self) -> &str {
        match &self.order_configuration {
            OrderConfiguration::LimitLimitGtc { base_size, .. } => base_size,
        }
    }
}

/// Validation failure reported by the exchange for an accepted call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderFailure {
    /// Machine-readable code, e.g. `INVALID_PRICE_PRECISION`.
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_details: String,
}

impl CreateOrderFailure {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            error_details: String::new(),
        }
    }

    /// Human-readable text, falling back to the code.
    pub fn display_message(&self) -> String {
        if !self.message.is_empty() {
            self.message.clone()
        } else if !self.error.is_empty() {
            self.error.clone()
        } else {
            "order creation failed without a reason".to_string()
        }
    }
}

/// Order creation acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub failure: Option<CreateOrderFailure>,
}

impl CreateOrderResponse {
    pub fn accepted(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            order_id: Some(order_id.into()),
            failure: None,
        }
    }

    pub fn rejected(failure: CreateOrderFailure) -> Self {
        Self {
            success: false,
            order_id: None,
            failure: Some(failure),
        }
    }
}

/// Result of cancelling one order in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResult {
    pub success: bool,
    #[serde(default)]
    pub failure_reason: String,
    #[serde(default)]
    pub order_id: String,
}

impl CancelResult {
    pub fn ok(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            failure_reason: String::new(),
            order_id: order_id.into(),
        }
    }

    pub fn failed(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            failure_reason: reason.into(),
            order_id: order_id.into(),
        }
    }
}

/// Order listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOrdersFilter {
    pub product_id: ProductId,
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
    #[serde(default)]
    pub side: Option<OrderSide>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    pub limit: u32,
}

/// Fill listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFillsFilter {
    pub order_id: String,
    pub product_id: ProductId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
}

/// Exchange capability set used by the order engine.
///
/// Implementations own transport, authentication and wire format.
pub trait Gateway: Send + Sync {
    /// Submit an order. Exchange-side validation failures come back as
    /// `Ok` with `success == false`; `Err` means the call itself failed.
    fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> BoxFuture<'_, GatewayResult<CreateOrderResponse>>;

    /// Fetch the current snapshot of an order.
    fn get_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, GatewayResult<Order>>;

    /// Cancel a batch of orders.
    fn cancel_orders(&self, order_ids: Vec<String>)
        -> BoxFuture<'_, GatewayResult<Vec<CancelResult>>>;

    fn list_orders(&self, filter: ListOrdersFilter) -> BoxFuture<'_, GatewayResult<Vec<Order>>>;

    fn list_fills(&self, filter: ListFillsFilter) -> BoxFuture<'_, GatewayResult<Vec<Fill>>>;

    fn list_accounts(&self, limit: u32) -> BoxFuture<'_, GatewayResult<Vec<Account>>>;

    fn get_account<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, GatewayResult<Account>>;

    /// Product snapshot; `None` when the exchange returns no data.
    fn get_product<'a>(
        &'a self,
        product_id: &'a ProductId,
    ) -> BoxFuture<'a, GatewayResult<Option<Product>>>;

    /// Most recent public trades, newest first.
    fn get_recent_trades<'a>(
        &'a self,
        product_id: &'a ProductId,
        limit: u32,
    ) -> BoxFuture<'a, GatewayResult<Vec<Trade>>>;
}

/// Arc wrapper for Gateway trait objects.
pub type DynGateway = Arc<dyn Gateway>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limit_gtc_renders_fixed_point() {
        let request = CreateOrderRequest::limit_gtc(
            ClientOrderId::for_order(OrderSide::Buy, "YFI", "BTC", "abc"),
            ProductId::new("YFI", "BTC"),
            OrderSide::Buy,
            Price::new(dec!(0.4012)),
            Size::new(dec!(0.035252)),
        );
        assert_eq!(request.limit_price(), "0.401200");
        assert_eq!(request.base_size(), "0.035252");
    }

    #[test]
    fn test_create_order_request_serialization() {
        let request = CreateOrderRequest::limit_gtc(
            ClientOrderId::from_string("coid".to_string()),
            ProductId::new("LTC", "BTC"),
            OrderSide::Sell,
            Price::new(dec!(0.00396)),
            Size::new(dec!(1)),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["side"], "SELL");
        assert_eq!(json["product_id"], "LTC-BTC");
        assert_eq!(
            json["order_configuration"]["limit_limit_gtc"]["limit_price"],
            "0.003960"
        );
    }

    #[test]
    fn test_failure_display_falls_back_to_code() {
        let failure = CreateOrderFailure::new("INSUFFICIENT_FUND", "");
        assert_eq!(failure.display_message(), "INSUFFICIENT_FUND");
    }
}
