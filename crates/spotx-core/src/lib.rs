//! Core domain types for the spotx spot-order client.
//!
//! This crate provides the types shared by the gateway and executor:
//! - `Price`, `Size`: Precision-safe numeric types with the fixed-point
//!   rendering and drop-last-digit repair used on rejected orders
//! - `OrderRequest`, `Order`, `OrderStatus`, `ClientOrderId`: order lifecycle
//! - `Account`, `Product`, `Trade`, `Fill`, `MarketData`: read-side snapshots

pub mod account;
pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use account::{Account, Balances};
pub use decimal::{drop_last_digit, floor_to_increment, format_fixed, Price, Size, FIXED_DECIMALS};
pub use error::{CoreError, Result};
pub use market::{Fill, MarketData, Product, ProductId, Trade};
pub use order::{
    new_correlation_id, stamp_correlation_id, ClientOrderId, Order, OrderRequest, OrderSide,
    OrderStatus, OrderType, CLIENT_ORDER_ID_PREFIX,
};
