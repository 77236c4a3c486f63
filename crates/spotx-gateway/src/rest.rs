//! REST implementation of the gateway port.
//!
//! Talks JSON to a brokerage-style REST API (`/orders`, `/accounts`,
//! `/products`). Public trade prints come from a separate market-data
//! endpoint because the brokerage API does not serve them; both base URLs
//! are configuration, so one gateway covers the primary and supplementary
//! data sources.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use spotx_core::{
    Account, ClientOrderId, Fill, Order, OrderSide, OrderStatus, OrderType, Price, Product,
    ProductId, Size, Trade,
};

use crate::error::{GatewayError, GatewayResult};
use crate::port::{
    BoxFuture, CancelResult, CreateOrderFailure, CreateOrderRequest, CreateOrderResponse, Gateway,
    ListFillsFilter, ListOrdersFilter,
};

/// REST gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestGatewayConfig {
    /// Brokerage API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Public market-data API base URL (trade prints).
    #[serde(default = "default_market_data_url")]
    pub market_data_url: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_base_url() -> String {
    "https://api.coinbase.com/api/v3/brokerage".to_string()
}

fn default_market_data_url() -> String {
    "https://api.exchange.coinbase.com".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_token_env() -> String {
    "SPOTX_API_TOKEN".to_string()
}

impl Default for RestGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            market_data_url: default_market_data_url(),
            timeout_ms: default_timeout_ms(),
            token_env: default_token_env(),
        }
    }
}

/// Gateway backed by HTTP/JSON.
pub struct RestGateway {
    client: Client,
    base_url: String,
    market_data_url: String,
    token: Option<String>,
}

impl RestGateway {
    /// Create a gateway, reading the bearer token from `config.token_env`.
    pub fn new(config: &RestGatewayConfig) -> GatewayResult<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty());
        Self::with_token(config, token)
    }

    pub fn with_token(config: &RestGatewayConfig, token: Option<String>) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| GatewayError::Client(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            market_data_url: config.market_data_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode, mapping 404 to `None`.
    async fn send_optional<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> GatewayResult<Option<T>> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| GatewayError::Http(format!("{what}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%what, "Resource not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("{what}: {e}")))?;
        trace!(%what, "Response received");

        if body.is_null() {
            return Err(GatewayError::EmptyResponse(what.to_string()));
        }

        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| GatewayError::Decode(format!("{what}: {e}")))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> GatewayResult<T> {
        self.send_optional(builder, what).await?.ok_or_else(|| GatewayError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            body: format!("{what}: not found"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Gateway for RestGateway {
    fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> BoxFuture<'_, GatewayResult<CreateOrderResponse>> {
        Box::pin(async move {
            debug!(
                client_order_id = %request.client_order_id,
                product_id = %request.product_id,
                side = %request.side,
                limit_price = %request.limit_price(),
                base_size = %request.base_size(),
                "Submitting order"
            );
            let builder = self.client.post(self.url("/orders")).json(&request);
            let wire: WireCreateOrderResponse = self.send(builder, "create order").await?;
            Ok(wire.into())
        })
    }

    fn get_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, GatewayResult<Order>> {
        Box::pin(async move {
            let builder = self
                .client
                .get(self.url(&format!("/orders/historical/{order_id}")));
            let wire: WireOrderEnvelope = self.send(builder, "get order").await?;
            wire.order
                .map(Order::from)
                .ok_or_else(|| GatewayError::EmptyResponse("get order".to_string()))
        })
    }

    fn cancel_orders(
        &self,
        order_ids: Vec<String>,
    ) -> BoxFuture<'_, GatewayResult<Vec<CancelResult>>> {
        Box::pin(async move {
            let builder = self
                .client
                .post(self.url("/orders/batch_cancel"))
                .json(&serde_json::json!({ "order_ids": order_ids }));
            let wire: WireCancelResponse = self.send(builder, "cancel orders").await?;
            Ok(wire.results)
        })
    }

    fn list_orders(&self, filter: ListOrdersFilter) -> BoxFuture<'_, GatewayResult<Vec<Order>>> {
        Box::pin(async move {
            let mut query: Vec<(&str, String)> = vec![
                ("product_id", filter.product_id.to_string()),
                ("limit", filter.limit.to_string()),
            ];
            for status in &filter.statuses {
                query.push(("order_status", status.to_string()));
            }
            if let Some(side) = filter.side {
                query.push(("order_side", side.to_string()));
            }
            if let Some(order_type) = filter.order_type {
                query.push(("order_type", order_type.to_string()));
            }
            if let Some(start) = filter.start {
                query.push(("start_date", rfc3339(start)));
            }
            if let Some(end) = filter.end {
                query.push(("end_date", rfc3339(end)));
            }

            let builder = self
                .client
                .get(self.url("/orders/historical/batch"))
                .query(&query);
            let wire: WireOrdersResponse = self.send(builder, "list orders").await?;
            Ok(wire.orders.into_iter().map(Order::from).collect())
        })
    }

    fn list_fills(&self, filter: ListFillsFilter) -> BoxFuture<'_, GatewayResult<Vec<Fill>>> {
        Box::pin(async move {
            let query = [
                ("order_id", filter.order_id.clone()),
                ("product_id", filter.product_id.to_string()),
                ("start_sequence_timestamp", rfc3339(filter.start)),
                ("end_sequence_timestamp", rfc3339(filter.end)),
                ("limit", filter.limit.to_string()),
            ];
            let builder = self
                .client
                .get(self.url("/orders/historical/fills"))
                .query(&query);
            let wire: WireFillsResponse = self.send(builder, "list fills").await?;
            Ok(wire.fills.into_iter().map(Fill::from).collect())
        })
    }

    fn list_accounts(&self, limit: u32) -> BoxFuture<'_, GatewayResult<Vec<Account>>> {
        Box::pin(async move {
            let builder = self
                .client
                .get(self.url("/accounts"))
                .query(&[("limit", limit.to_string())]);
            let wire: WireAccountsResponse = self.send(builder, "list accounts").await?;
            Ok(wire.accounts.into_iter().map(Account::from).collect())
        })
    }

    fn get_account<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, GatewayResult<Account>> {
        Box::pin(async move {
            let builder = self.client.get(self.url(&format!("/accounts/{account_id}")));
            let wire: WireAccountEnvelope = self.send(builder, "get account").await?;
            Ok(wire.account.into())
        })
    }

    fn get_product<'a>(
        &'a self,
        product_id: &'a ProductId,
    ) -> BoxFuture<'a, GatewayResult<Option<Product>>> {
        Box::pin(async move {
            let builder = self.client.get(self.url(&format!("/products/{product_id}")));
            let wire: Option<WireProduct> = self.send_optional(builder, "get product").await?;
            Ok(wire.map(Product::from))
        })
    }

    fn get_recent_trades<'a>(
        &'a self,
        product_id: &'a ProductId,
        limit: u32,
    ) -> BoxFuture<'a, GatewayResult<Vec<Trade>>> {
        Box::pin(async move {
            let url = format!("{}/products/{product_id}/trades", self.market_data_url);
            let builder = self.client.get(url).query(&[("limit", limit.to_string())]);
            let wire: Vec<WireTrade> = self.send(builder, "recent trades").await?;
            Ok(wire.into_iter().map(Trade::from).collect())
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Decimal fields arrive as strings and are often empty; absent or
/// unparsable values read as zero.
fn parse_decimal(raw: &Option<String>) -> Decimal {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn parse_optional_decimal(raw: &Option<String>) -> Option<Decimal> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

fn parse_time(raw: &Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct WireCreateOrderResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    success_response: Option<WireSuccessResponse>,
    #[serde(default)]
    error_response: Option<CreateOrderFailure>,
}

#[derive(Debug, Deserialize)]
struct WireSuccessResponse {
    #[serde(default)]
    order_id: Option<String>,
}

impl From<WireCreateOrderResponse> for CreateOrderResponse {
    fn from(wire: WireCreateOrderResponse) -> Self {
        let order_id = wire
            .order_id
            .filter(|id| !id.is_empty())
            .or_else(|| wire.success_response.and_then(|r| r.order_id));
        Self {
            success: wire.success,
            order_id,
            failure: wire.error_response,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireOrderEnvelope {
    #[serde(default)]
    order: Option<WireOrder>,
}

#[derive(Debug, Deserialize)]
struct WireOrdersResponse {
    #[serde(default)]
    orders: Vec<WireOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireLimitGtc {
    base_size: Option<String>,
    limit_price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireOrderConfiguration {
    limit_limit_gtc: Option<WireLimitGtc>,
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    order_id: String,
    product_id: String,
    side: OrderSide,
    #[serde(default)]
    client_order_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    order_type: Option<String>,
    #[serde(default)]
    order_configuration: Option<WireOrderConfiguration>,
    #[serde(default)]
    filled_size: Option<String>,
    #[serde(default)]
    average_filled_price: Option<String>,
    #[serde(default)]
    cancel_message: Option<String>,
    #[serde(default)]
    reject_message: Option<String>,
    #[serde(default)]
    reject_reason: Option<String>,
    #[serde(default)]
    created_time: Option<String>,
}

impl From<WireOrder> for Order {
    fn from(wire: WireOrder) -> Self {
        let limit = wire
            .order_configuration
            .and_then(|c| c.limit_limit_gtc)
            .unwrap_or_default();
        Self {
            order_id: wire.order_id,
            product_id: ProductId::from_string(wire.product_id),
            side: wire.side,
            client_order_id: wire
                .client_order_id
                .filter(|c| !c.is_empty())
                .map(ClientOrderId::from_string),
            status: wire
                .status
                .filter(|s| !s.is_empty())
                .map(OrderStatus::from),
            order_type: wire.order_type.and_then(|t| t.parse::<OrderType>().ok()),
            limit_price: parse_optional_decimal(&limit.limit_price).map(Price::new),
            base_size: parse_optional_decimal(&limit.base_size).map(Size::new),
            filled_size: parse_optional_decimal(&wire.filled_size).map(Size::new),
            average_filled_price: parse_optional_decimal(&wire.average_filled_price)
                .map(Price::new),
            cancel_message: wire.cancel_message.unwrap_or_default(),
            reject_message: wire.reject_message.unwrap_or_default(),
            reject_reason: wire.reject_reason.unwrap_or_default(),
            created_time: parse_time(&wire.created_time),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireCancelResponse {
    #[serde(default)]
    results: Vec<CancelResult>,
}

#[derive(Debug, Deserialize)]
struct WireFillsResponse {
    #[serde(default)]
    fills: Vec<WireFill>,
}

#[derive(Debug, Deserialize)]
struct WireFill {
    #[serde(default)]
    entry_id: String,
    #[serde(default)]
    trade_id: String,
    order_id: String,
    product_id: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    commission: Option<String>,
    side: OrderSide,
    #[serde(default)]
    trade_time: Option<String>,
}

impl From<WireFill> for Fill {
    fn from(wire: WireFill) -> Self {
        Self {
            entry_id: wire.entry_id,
            trade_id: wire.trade_id,
            order_id: wire.order_id,
            product_id: ProductId::from_string(wire.product_id),
            price: Price::new(parse_decimal(&wire.price)),
            size: Size::new(parse_decimal(&wire.size)),
            commission: parse_decimal(&wire.commission),
            side: wire.side,
            trade_time: parse_time(&wire.trade_time),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAccountsResponse {
    #[serde(default)]
    accounts: Vec<WireAccount>,
}

#[derive(Debug, Deserialize)]
struct WireAccountEnvelope {
    account: WireAccount,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireBalance {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    uuid: String,
    #[serde(default)]
    name: String,
    currency: String,
    #[serde(default)]
    available_balance: WireBalance,
    #[serde(default)]
    hold: WireBalance,
    #[serde(default)]
    active: bool,
}

impl From<WireAccount> for Account {
    fn from(wire: WireAccount) -> Self {
        Self {
            uuid: wire.uuid,
            name: wire.name,
            currency: wire.currency,
            available_balance: parse_decimal(&wire.available_balance.value),
            hold: parse_decimal(&wire.hold.value),
            active: wire.active,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    product_id: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    price_percentage_change_24h: Option<String>,
    #[serde(default)]
    volume_24h: Option<String>,
    #[serde(default)]
    base_increment: Option<String>,
    #[serde(default)]
    quote_increment: Option<String>,
    #[serde(default)]
    base_min_size: Option<String>,
    #[serde(default)]
    base_max_size: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    trading_disabled: bool,
}

impl From<WireProduct> for Product {
    fn from(wire: WireProduct) -> Self {
        Self {
            product_id: ProductId::from_string(wire.product_id),
            price: Price::new(parse_decimal(&wire.price)),
            price_percentage_change_24h: parse_decimal(&wire.price_percentage_change_24h),
            volume_24h: parse_decimal(&wire.volume_24h),
            base_increment: parse_decimal(&wire.base_increment),
            quote_increment: parse_decimal(&wire.quote_increment),
            base_min_size: parse_decimal(&wire.base_min_size),
            base_max_size: parse_decimal(&wire.base_max_size),
            status: wire.status,
            trading_disabled: wire.trading_disabled,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireTrade {
    #[serde(default, deserialize_with = "id_as_string")]
    trade_id: String,
    price: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    side: Option<String>,
    #[serde(default)]
    time: Option<String>,
}

/// Trade ids are numbers on the public feed and strings elsewhere.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl From<WireTrade> for Trade {
    fn from(wire: WireTrade) -> Self {
        Self {
            trade_id: wire.trade_id,
            price: wire.price,
            size: wire.size,
            side: wire.side.and_then(|s| s.parse().ok()),
            time: parse_time(&wire.time),
        }
    }
}
