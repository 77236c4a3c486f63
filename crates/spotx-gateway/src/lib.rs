//! Exchange gateway for spotx.
//!
//! Defines the port the order engine talks to and ships two implementations:
//!
//! - [`RestGateway`]: HTTP/JSON client for the brokerage API, with a second
//!   base URL for public market data (trade prints)
//! - [`MockGateway`]: Scripted in-memory gateway that records every call

pub mod error;
pub mod mock;
pub mod port;
pub mod rest;

pub use error::{GatewayError, GatewayResult};
pub use mock::{GatewayCall, MockGateway};
pub use port::{
    BoxFuture, CancelResult, CreateOrderFailure, CreateOrderRequest, CreateOrderResponse,
    DynGateway, Gateway, ListFillsFilter, ListOrdersFilter, OrderConfiguration,
};
pub use rest::{RestGateway, RestGatewayConfig};
