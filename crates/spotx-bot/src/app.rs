//! Application: builds the trading client and dispatches subcommands.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use spotx_core::{OrderRequest, OrderSide, Price, ProductId, Size};
use spotx_executor::{ExecutorConfig, TradingClient};
use spotx_gateway::{DynGateway, RestGateway};

use crate::cli::{Command, OrderArgs};
use crate::config::AppConfig;
use crate::error::AppResult;

pub struct Application {
    client: TradingClient,
}

impl Application {
    /// Build against the REST gateway described by `config`.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let gateway = RestGateway::new(&config.gateway)?;
        info!(base_url = %config.gateway.base_url, "REST gateway ready");
        Ok(Self::with_gateway(
            std::sync::Arc::new(gateway),
            config.executor.clone(),
        ))
    }

    pub fn with_gateway(gateway: DynGateway, executor: ExecutorConfig) -> Self {
        Self {
            client: TradingClient::new(gateway, executor),
        }
    }

    pub fn client(&self) -> &TradingClient {
        &self.client
    }

    /// Run one subcommand and render its result as pretty JSON.
    pub async fn run(&self, command: Command) -> AppResult<String> {
        match command {
            Command::Balances(pair) => render(&self.client.balances(&pair.base, &pair.quote).await?),
            Command::Market {
                pair,
                min_pct_change,
            } => render(
                &self
                    .client
                    .market_data(&pair.base, &pair.quote, min_pct_change)
                    .await?,
            ),
            Command::Product(pair) => render(&self.client.get_product(&pair.base, &pair.quote).await?),
            Command::Buy(args) => self.place(OrderSide::Buy, args).await,
            Command::Sell(args) => self.place(OrderSide::Sell, args).await,
            Command::Order { order_id } => render(&self.client.get_order(&order_id).await?),
            Command::Cancel { order_ids } => {
                self.client.cancel_orders(order_ids.clone()).await?;
                render(&order_ids)
            }
            Command::CancelExisting {
                pair,
                id,
                order_type,
            } => {
                let product_id = ProductId::new(&pair.base, &pair.quote);
                let cancelled = self
                    .client
                    .cancel_existing_orders(&id, &product_id, order_type)
                    .await?;
                render(&cancelled)
            }
            Command::OpenOrders { pair, side } => {
                let product_id = ProductId::new(&pair.base, &pair.quote);
                render(&self.client.open_orders(&product_id, side).await?)
            }
            Command::Fills { pair, order_id } => {
                let product_id = ProductId::new(&pair.base, &pair.quote);
                render(&self.client.order_fills(&order_id, &product_id).await?)
            }
        }
    }

    async fn place(&self, side: OrderSide, args: OrderArgs) -> AppResult<String> {
        let mut request = OrderRequest::limit(
            side,
            args.pair.base,
            args.pair.quote,
            Price::new(args.price),
            Size::new(args.quantity),
        )
        .with_id(args.id.unwrap_or_default());

        if let Some(threshold) = args.min_pct_change {
            request = request.with_min_pct_change(threshold);
            // Gate only; the figures are not used for pricing.
            self.client
                .market_data(&request.base_ticker, &request.quote_ticker, Some(threshold))
                .await?;
        }

        let result = match args.wait {
            Some(secs) => {
                let deadline = Instant::now() + Duration::from_secs(secs);
                self.client.create_order_and_wait(&mut request, deadline).await
            }
            None => self.client.create_limit_order(&mut request).await,
        };

        match result {
            Ok(order) => {
                info!(
                    order_id = %order.order_id,
                    correlation_id = %request.id,
                    retries = request.retries,
                    "Order complete"
                );
                render(&order)
            }
            Err(e) => {
                if let Some(order_id) = e.order_id() {
                    warn!(order_id, correlation_id = %request.id, error = %e, "Order did not complete");
                }
                Err(e.into())
            }
        }
    }
}

fn render<T: Serialize>(value: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Pair;
    use crate::error::AppError;
    use rust_decimal_macros::dec;
    use spotx_core::{ClientOrderId, Order, OrderStatus, OrderType, Product};
    use spotx_executor::ExecutorError;
    use spotx_gateway::{CreateOrderResponse, MockGateway};
    use std::sync::Arc;

    fn pair() -> Pair {
        Pair {
            base: "LTC".to_string(),
            quote: "BTC".to_string(),
        }
    }

    fn order_args(wait: Option<u64>) -> OrderArgs {
        OrderArgs {
            pair: pair(),
            price: dec!(0.00396),
            quantity: dec!(1.5),
            id: Some("cli-1".to_string()),
            min_pct_change: None,
            wait,
        }
    }

    fn snapshot(status: OrderStatus) -> Order {
        Order {
            order_id: "o-1".to_string(),
            product_id: ProductId::new("LTC", "BTC"),
            side: OrderSide::Sell,
            client_order_id: Some(ClientOrderId::from_string(
                "create-market-order-SELL-LTC-BTC-cli-1-1".to_string(),
            )),
            status: Some(status),
            order_type: Some(OrderType::Limit),
            limit_price: None,
            base_size: None,
            filled_size: None,
            average_filled_price: None,
            cancel_message: String::new(),
            reject_message: String::new(),
            reject_reason: String::new(),
            created_time: None,
        }
    }

    fn setup() -> (Arc<MockGateway>, Application) {
        let mock = Arc::new(MockGateway::new());
        let app = Application::with_gateway(mock.clone(), ExecutorConfig::default());
        (mock, app)
    }

    #[tokio::test(start_paused = true)]
    async fn test_buy_renders_order() {
        let (mock, app) = setup();
        mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
        mock.push_order(Ok(snapshot(OrderStatus::Open)));

        let out = app.run(Command::Buy(order_args(None))).await.unwrap();
        assert!(out.contains("\"order_id\": \"o-1\""));

        let sent = &mock.create_requests()[0];
        assert_eq!(sent.side, OrderSide::Buy);
        assert_eq!(sent.base_size(), "1.500000");
        assert!(sent.client_order_id.contains("cli-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sell_with_wait_watches_until_filled() {
        let (mock, app) = setup();
        mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
        mock.push_order(Ok(snapshot(OrderStatus::Open)));
        mock.push_order(Ok(snapshot(OrderStatus::Filled)));

        let out = app.run(Command::Sell(order_args(Some(30)))).await.unwrap();
        assert!(out.contains("FILLED"));
        assert_eq!(mock.get_order_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_volatility_gate_blocks_submission() {
        let (mock, app) = setup();
        mock.set_product(Some(Product {
            product_id: ProductId::new("LTC", "BTC"),
            price: Price::new(dec!(0.00396)),
            price_percentage_change_24h: dec!(0.02),
            volume_24h: dec!(0),
            base_increment: dec!(0),
            quote_increment: dec!(0),
            base_min_size: dec!(0),
            base_max_size: dec!(0),
            status: String::new(),
            trading_disabled: false,
        }));

        let mut args = order_args(None);
        args.min_pct_change = Some(dec!(1));
        let err = app.run(Command::Buy(args)).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Executor(ExecutorError::InsufficientVolatility { .. })
        ));
        assert!(mock.create_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_existing_lists_cancelled_ids() {
        let (mock, app) = setup();
        mock.set_orders(vec![snapshot(OrderStatus::Open)]);

        let out = app
            .run(Command::CancelExisting {
                pair: pair(),
                id: "cli-1".to_string(),
                order_type: OrderType::Limit,
            })
            .await
            .unwrap();

        assert!(out.contains("o-1"));
        assert_eq!(mock.cancel_requests(), vec![vec!["o-1".to_string()]]);
    }

    #[tokio::test]
    async fn test_invalid_order_is_rejected_locally() {
        let (mock, app) = setup();
        let mut args = order_args(None);
        args.quantity = dec!(0);

        let err = app.run(Command::Buy(args)).await.unwrap_err();
        assert!(matches!(err, AppError::Executor(ExecutorError::Validation(_))));
        assert!(mock.calls().is_empty());
    }
}
