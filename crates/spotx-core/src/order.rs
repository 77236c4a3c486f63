//! Order-related types and identifiers.
//!
//! Provides order side, status, type, the client order ID scheme used for
//! later cancellation lookup, the caller-facing [`OrderRequest`], and the
//! gateway-owned [`Order`] snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::{Price, Size};
use crate::error::{CoreError, Result};
use crate::market::ProductId;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(CoreError::InvalidSide(other.to_string())),
        }
    }
}

/// Exchange order status.
///
/// Statuses the exchange may add later are preserved verbatim in
/// [`OrderStatus::Other`] and treated as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Failed,
    Expired,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "OPEN",
            Self::Filled => "FILLED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
            Self::Other(s) => s,
        }
    }

    /// Whether no further transition is expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Whether a freshly created order is considered live.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Open | Self::Filled)
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OPEN" => Self::Open,
            "FILLED" => Self::Filled,
            "CANCELLED" => Self::Cancelled,
            "FAILED" => Self::Failed,
            "EXPIRED" => Self::Expired,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
            Self::Stop => "STOP",
            Self::StopLimit => "STOP_LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MARKET" => Ok(Self::Market),
            "LIMIT" => Ok(Self::Limit),
            "STOP" => Ok(Self::Stop),
            "STOP_LIMIT" => Ok(Self::StopLimit),
            other => Err(CoreError::InvalidOrderType(other.to_string())),
        }
    }
}

/// Prefix shared by every client order ID this crate produces.
pub const CLIENT_ORDER_ID_PREFIX: &str = "create-market-order";

/// Client order ID used to find an order again without its exchange ID.
///
/// Format: `create-market-order-{SIDE}-{BASE}-{QUOTE}-{correlation}`.
/// Lookups match by substring, so any fragment of the correlation part
/// is enough to locate the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    pub fn for_order(side: OrderSide, base: &str, quote: &str, correlation: &str) -> Self {
        Self(format!(
            "{CLIENT_ORDER_ID_PREFIX}-{side}-{base}-{quote}-{correlation}"
        ))
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.0.contains(fragment)
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fresh random correlation token.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Append a millisecond timestamp so each submission attempt is unique.
pub fn stamp_correlation_id(correlation: &str, now_ms: i64) -> String {
    format!("{correlation}-{now_ms}")
}

/// Caller-facing limit order request.
///
/// Mutated in place by the submission engine: the correlation id is
/// filled in when empty, repaired price/quantity replace the originals,
/// and `retries` counts repair attempts across the whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Caller correlation string (empty = generate one).
    #[serde(default)]
    pub id: String,
    pub base_ticker: String,
    pub quote_ticker: String,
    pub price: Price,
    pub quantity: Size,
    pub side: OrderSide,
    /// Minimum absolute 24h change (1.0 = 1%) required to trade.
    #[serde(default)]
    pub min_pct_change_24h: Option<rust_decimal::Decimal>,
    #[serde(default)]
    pub retries: u32,
}

impl OrderRequest {
    pub fn limit(
        side: OrderSide,
        base_ticker: impl Into<String>,
        quote_ticker: impl Into<String>,
        price: Price,
        quantity: Size,
    ) -> Self {
        Self {
            id: String::new(),
            base_ticker: base_ticker.into(),
            quote_ticker: quote_ticker.into(),
            price,
            quantity,
            side,
            min_pct_change_24h: None,
            retries: 0,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_min_pct_change(mut self, pct: rust_decimal::Decimal) -> Self {
        self.min_pct_change_24h = Some(pct);
        self
    }

    pub fn product_id(&self) -> ProductId {
        ProductId::new(&self.base_ticker, &self.quote_ticker)
    }

    /// Check required fields before anything is sent.
    pub fn validate(&self) -> Result<()> {
        if self.base_ticker.trim().is_empty() {
            return Err(CoreError::MissingField("base_ticker"));
        }
        if self.quote_ticker.trim().is_empty() {
            return Err(CoreError::MissingField("quote_ticker"));
        }
        if !self.price.is_positive() {
            return Err(CoreError::InvalidPrice(self.price.to_string()));
        }
        if !self.quantity.is_positive() {
            return Err(CoreError::InvalidSize(self.quantity.to_string()));
        }
        Ok(())
    }
}

/// Order snapshot as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub product_id: ProductId,
    pub side: OrderSide,
    #[serde(default)]
    pub client_order_id: Option<ClientOrderId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub limit_price: Option<Price>,
    #[serde(default)]
    pub base_size: Option<Size>,
    #[serde(default)]
    pub filled_size: Option<Size>,
    #[serde(default)]
    pub average_filled_price: Option<Price>,
    #[serde(default)]
    pub cancel_message: String,
    #[serde(default)]
    pub reject_message: String,
    #[serde(default)]
    pub reject_reason: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

impl Order {
    pub fn status_str(&self) -> &str {
        self.status.as_ref().map(OrderStatus::as_str).unwrap_or("")
    }

    pub fn client_order_id_str(&self) -> &str {
        self.client_order_id
            .as_ref()
            .map(ClientOrderId::as_str)
            .unwrap_or("")
    }

    /// Message attached to a rejected order right after creation.
    pub fn rejection_text(&self) -> String {
        join_messages(&self.cancel_message, &self.reject_message)
    }

    /// Message attached to an order that ended cancelled or failed.
    pub fn termination_text(&self) -> String {
        join_messages(&self.cancel_message, &self.reject_reason)
    }
}

fn join_messages(first: &str, second: &str) -> String {
    format!("{first} {second}").trim().to_string()
}
