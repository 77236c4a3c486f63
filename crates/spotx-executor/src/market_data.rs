//! Market data: current price, 24h change, and high/low from recent trades.

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use spotx_core::{MarketData, Price, Product, ProductId, Trade};
use spotx_gateway::DynGateway;

use crate::error::{ExecutorError, ExecutorResult};

pub struct MarketDataFetcher {
    gateway: DynGateway,
    trade_window: u32,
}

impl MarketDataFetcher {
    #[must_use]
    pub fn new(gateway: DynGateway, trade_window: u32) -> Self {
        Self {
            gateway,
            trade_window,
        }
    }

    /// Product snapshot for `base-quote`.
    pub async fn product(&self, base: &str, quote: &str) -> ExecutorResult<Product> {
        let product_id = ProductId::new(base, quote);
        self.gateway
            .get_product(&product_id)
            .await?
            .ok_or_else(|| ExecutorError::ProductUnavailable(product_id.to_string()))
    }

    /// Market view for `base-quote`.
    ///
    /// With `min_pct_change` set, a product whose absolute 24h change does
    /// not exceed it fails with `InsufficientVolatility` before any trades
    /// are fetched.
    pub async fn market_data(
        &self,
        base: &str,
        quote: &str,
        min_pct_change: Option<Decimal>,
    ) -> ExecutorResult<MarketData> {
        let product = self.product(base, quote).await?;
        let change = product.price_percentage_change_24h;

        if let Some(threshold) = min_pct_change {
            if change.abs() <= threshold {
                debug!(
                    product_id = %product.product_id,
                    %change,
                    %threshold,
                    "24h change below threshold, skipping trade scan"
                );
                return Err(ExecutorError::InsufficientVolatility { change, threshold });
            }
        }

        let trades = self
            .gateway
            .get_recent_trades(&product.product_id, self.trade_window)
            .await?;
        let (high, low) = scan_high_low(&trades)?;

        trace!(
            product_id = %product.product_id,
            trades = trades.len(),
            %high,
            %low,
            "Scanned recent trades"
        );

        Ok(MarketData {
            high_24h: high,
            low_24h: low,
            price: product.price,
            pct_change_24h: change,
        })
    }
}

/// High/low over trade prices, seeded from the first trade.
///
/// A bad seed price is an error; later unparsable prices are skipped.
fn scan_high_low(trades: &[Trade]) -> ExecutorResult<(Price, Price)> {
    let Some((first, rest)) = trades.split_first() else {
        warn!("No recent trades returned");
        return Ok((Price::ZERO, Price::ZERO));
    };

    let seed: Price = first
        .price
        .parse()
        .map_err(|e| ExecutorError::PriceParse(format!("'{}': {e}", first.price)))?;

    let (mut high, mut low) = (seed, seed);
    for trade in rest {
        let Ok(price) = trade.price.parse::<Price>() else {
            trace!(price = %trade.price, "Skipping unparsable trade price");
            continue;
        };
        high = high.max(price);
        low = low.min(price);
    }

    Ok((high, low))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spotx_gateway::MockGateway;
    use std::sync::Arc;

    fn product(change: Decimal) -> Product {
        Product {
            product_id: ProductId::new("LTC", "BTC"),
            price: Price::new(dec!(0.00396)),
            price_percentage_change_24h: change,
            volume_24h: dec!(2344.85),
            base_increment: dec!(0.00000001),
            quote_increment: dec!(0.000001),
            base_min_size: dec!(0.0043),
            base_max_size: dec!(13000),
            status: "online".to_string(),
            trading_disabled: false,
        }
    }

    fn trade(price: &str) -> Trade {
        Trade {
            trade_id: String::new(),
            price: price.to_string(),
            size: "1".to_string(),
            side: None,
            time: None,
        }
    }

    fn setup(change: Decimal, prices: &[&str]) -> (Arc<MockGateway>, MarketDataFetcher) {
        let mock = Arc::new(MockGateway::new());
        mock.set_product(Some(product(change)));
        mock.set_trades(prices.iter().map(|p| trade(p)).collect());
        let fetcher = MarketDataFetcher::new(mock.clone(), 1000);
        (mock, fetcher)
    }

    #[tokio::test]
    async fn test_low_volatility_short_circuits() {
        let (mock, fetcher) = setup(dec!(0.05), &["0.004"]);

        let err = fetcher
            .market_data("LTC", "BTC", Some(dec!(0.1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InsufficientVolatility { .. }));
        assert_eq!(mock.get_recent_trades_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_change_uses_absolute_value() {
        let (mock, fetcher) = setup(dec!(-5), &["0.004"]);

        assert!(fetcher
            .market_data("LTC", "BTC", Some(dec!(0.1)))
            .await
            .is_ok());
        assert_eq!(mock.get_recent_trades_count(), 1);
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_insufficient() {
        let (_mock, fetcher) = setup(dec!(0.1), &["0.004"]);

        let err = fetcher
            .market_data("LTC", "BTC", Some(dec!(0.1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InsufficientVolatility { .. }));
    }

    #[tokio::test]
    async fn test_high_low_bound_all_trades() {
        let prices = ["0.00396", "0.00401", "0.00389", "0.00400", "0.00392"];
        let (mock, fetcher) = setup(dec!(5), &prices);

        let data = fetcher
            .market_data("LTC", "BTC", Some(dec!(0.1)))
            .await
            .unwrap();
        assert_eq!(data.high_24h, Price::new(dec!(0.00401)));
        assert_eq!(data.low_24h, Price::new(dec!(0.00389)));
        assert_eq!(data.price, Price::new(dec!(0.00396)));
        assert_eq!(data.pct_change_24h, dec!(5));
        for p in prices {
            let p: Price = p.parse().unwrap();
            assert!(data.low_24h <= p && p <= data.high_24h);
        }
        assert_eq!(
            mock.calls().last(),
            Some(&spotx_gateway::GatewayCall::GetRecentTrades(
                ProductId::new("LTC", "BTC"),
                1000
            ))
        );
    }

    #[tokio::test]
    async fn test_no_threshold_always_scans() {
        let (mock, fetcher) = setup(dec!(0), &["1", "2"]);
        let data = fetcher.market_data("LTC", "BTC", None).await.unwrap();
        assert_eq!(data.high_24h, Price::new(dec!(2)));
        assert_eq!(mock.get_recent_trades_count(), 1);
    }

    #[tokio::test]
    async fn test_bad_seed_price_fails() {
        let (_mock, fetcher) = setup(dec!(5), &["n/a", "0.004"]);
        let err = fetcher.market_data("LTC", "BTC", None).await.unwrap_err();
        assert!(matches!(err, ExecutorError::PriceParse(_)));
    }

    #[tokio::test]
    async fn test_bad_later_price_skipped() {
        let (_mock, fetcher) = setup(dec!(5), &["0.004", "garbage", "0.005"]);
        let data = fetcher.market_data("LTC", "BTC", None).await.unwrap();
        assert_eq!(data.high_24h, Price::new(dec!(0.005)));
        assert_eq!(data.low_24h, Price::new(dec!(0.004)));
    }

    #[tokio::test]
    async fn test_missing_product() {
        let mock = Arc::new(MockGateway::new());
        let fetcher = MarketDataFetcher::new(mock.clone(), 1000);
        let err = fetcher.market_data("LTC", "BTC", None).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ProductUnavailable(ref p) if p == "LTC-BTC"));
    }
}
