//! Command-line interface.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use spotx_core::{OrderSide, OrderType};

/// Spot order client: balances, market data, limit orders and cancellation.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file path (can also be set via SPOTX_CONFIG env var)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Ticker pair shared by most subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct Pair {
    /// Base ticker, e.g. BTC
    pub base: String,
    /// Quote ticker, e.g. USD
    pub quote: String,
}

/// Limit order parameters.
#[derive(clap::Args, Debug, Clone)]
pub struct OrderArgs {
    #[command(flatten)]
    pub pair: Pair,
    /// Limit price
    #[arg(long)]
    pub price: Decimal,
    /// Base quantity
    #[arg(long)]
    pub quantity: Decimal,
    /// Correlation id embedded in the client order id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
    /// Refuse to trade unless |24h change| exceeds this percentage
    #[arg(long)]
    pub min_pct_change: Option<Decimal>,
    /// Watch the order until filled, for at most this many seconds
    #[arg(long)]
    pub wait: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Available balances for a ticker pair
    Balances(Pair),
    /// Price, 24h change and high/low over recent trades
    Market {
        #[command(flatten)]
        pair: Pair,
        #[arg(long)]
        min_pct_change: Option<Decimal>,
    },
    /// Product snapshot
    Product(Pair),
    /// Place a GTC limit buy
    Buy(OrderArgs),
    /// Place a GTC limit sell
    Sell(OrderArgs),
    /// Fetch an order by exchange id
    Order { order_id: String },
    /// Cancel orders by exchange id
    Cancel {
        #[arg(required = true)]
        order_ids: Vec<String>,
    },
    /// Cancel recent orders whose client order id contains a fragment
    CancelExisting {
        #[command(flatten)]
        pair: Pair,
        /// Client order id fragment, usually the correlation id
        #[arg(long)]
        id: String,
        #[arg(long, default_value = "limit", value_parser = parse_order_type)]
        order_type: OrderType,
    },
    /// Open orders for a pair and side
    OpenOrders {
        #[command(flatten)]
        pair: Pair,
        #[arg(long, value_parser = parse_side)]
        side: OrderSide,
    },
    /// Fills for an order
    Fills {
        #[command(flatten)]
        pair: Pair,
        order_id: String,
    },
}

fn parse_side(s: &str) -> Result<OrderSide, String> {
    s.parse().map_err(|e: spotx_core::CoreError| e.to_string())
}

fn parse_order_type(s: &str) -> Result<OrderType, String> {
    s.parse().map_err(|e: spotx_core::CoreError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_buy_with_wait() {
        let args = Args::try_parse_from([
            "spotx", "buy", "YFI", "BTC", "--price", "0.4012", "--quantity", "0.035252", "--id",
            "grid-1", "--wait", "60",
        ])
        .unwrap();

        match args.command {
            Command::Buy(order) => {
                assert_eq!(order.pair.base, "YFI");
                assert_eq!(order.price, dec!(0.4012));
                assert_eq!(order.quantity, dec!(0.035252));
                assert_eq!(order.id.as_deref(), Some("grid-1"));
                assert_eq!(order.wait, Some(60));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cancel_existing_defaults_to_limit() {
        let args = Args::try_parse_from([
            "spotx", "--config", "x.toml", "cancel-existing", "LTC", "BTC", "--id", "grid-1",
        ])
        .unwrap();

        assert_eq!(args.config.as_deref(), Some("x.toml"));
        assert!(matches!(
            args.command,
            Command::CancelExisting { order_type: OrderType::Limit, .. }
        ));
    }

    #[test]
    fn test_parse_open_orders_side() {
        let args =
            Args::try_parse_from(["spotx", "open-orders", "LTC", "BTC", "--side", "sell"]).unwrap();
        assert!(matches!(
            args.command,
            Command::OpenOrders { side: OrderSide::Sell, .. }
        ));
        assert!(Args::try_parse_from(["spotx", "open-orders", "LTC", "BTC", "--side", "hold"]).is_err());
    }

    #[test]
    fn test_cancel_requires_ids() {
        assert!(Args::try_parse_from(["spotx", "cancel"]).is_err());
    }
}
