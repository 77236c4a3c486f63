//! Wallet accounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One currency wallet. Balances are a point-in-time snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    pub currency: String,
    pub available_balance: Decimal,
    #[serde(default)]
    pub hold: Decimal,
    #[serde(default)]
    pub active: bool,
}

/// Current balances for a ticker pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub base_account: Account,
    pub quote_account: Account,
    pub base_available: Decimal,
    pub quote_available: Decimal,
}
