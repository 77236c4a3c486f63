//! Product, trade, and market snapshot types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Price, Size};
use crate::order::OrderSide;

/// Tradable ticker pair, rendered as `BASE-QUOTE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(base: &str, quote: &str) -> Self {
        Self(format!("{base}-{quote}"))
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Product snapshot from the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub price: Price,
    /// 24h change in percent (1.0 = 1%).
    pub price_percentage_change_24h: Decimal,
    #[serde(default)]
    pub volume_24h: Decimal,
    /// Smallest size step.
    #[serde(default)]
    pub base_increment: Decimal,
    /// Smallest price step.
    #[serde(default)]
    pub quote_increment: Decimal,
    #[serde(default)]
    pub base_min_size: Decimal,
    #[serde(default)]
    pub base_max_size: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub trading_disabled: bool,
}

/// Public trade print. The price stays a string until scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(default)]
    pub trade_id: String,
    pub price: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub side: Option<OrderSide>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Execution against one of our orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub entry_id: String,
    pub trade_id: String,
    pub order_id: String,
    pub product_id: ProductId,
    pub price: Price,
    pub size: Size,
    #[serde(default)]
    pub commission: Decimal,
    pub side: OrderSide,
    #[serde(default)]
    pub trade_time: Option<DateTime<Utc>>,
}

/// Derived market view used to size orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    pub high_24h: Price,
    pub low_24h: Price,
    pub price: Price,
    pub pct_change_24h: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_format() {
        assert_eq!(ProductId::new("LTC", "BTC").as_str(), "LTC-BTC");
    }
}
