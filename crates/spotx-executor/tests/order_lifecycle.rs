//! End-to-end order lifecycle through `TradingClient` against the scripted
//! gateway.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::time::Instant;

use spotx_core::{
    Account, Order, OrderRequest, OrderSide, OrderStatus, OrderType, Price, Product, ProductId,
    Size, Trade,
};
use spotx_executor::{ExecutorConfig, ExecutorError, RepairPolicy, TradingClient};
use spotx_gateway::{
    CancelResult, CreateOrderFailure, CreateOrderResponse, GatewayCall, MockGateway,
};

fn client(mock: &Arc<MockGateway>) -> TradingClient {
    TradingClient::new(mock.clone(), ExecutorConfig::default())
}

fn snapshot(order_id: &str, status: OrderStatus) -> Order {
    Order {
        order_id: order_id.to_string(),
        product_id: ProductId::new("YFI", "BTC"),
        side: OrderSide::Buy,
        client_order_id: None,
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

fn buy(price: Decimal, quantity: Decimal) -> OrderRequest {
    OrderRequest::limit(
        OrderSide::Buy,
        "YFI",
        "BTC",
        Price::new(price),
        Size::new(quantity),
    )
    .with_id("lifecycle")
}

fn precision_error() -> CreateOrderResponse {
    CreateOrderResponse::rejected(CreateOrderFailure::new(
        "INVALID_PRICE_PRECISION",
        "Too many decimals in order price",
    ))
}

#[tokio::test(start_paused = true)]
async fn first_attempt_accepted_makes_one_create_and_one_fetch() {
    let mock = Arc::new(MockGateway::new());
    mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));

    let mut request = buy(dec!(0.4012), dec!(0.035252));
    let order = client(&mock).create_limit_order(&mut request).await.unwrap();

    assert!(order.status.as_ref().is_some_and(OrderStatus::is_accepted));
    assert_eq!(
        mock.calls(),
        vec![
            GatewayCall::CreateOrder(mock.create_requests()[0].clone()),
            GatewayCall::GetOrder("o-1".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn price_precision_failures_truncate_one_digit_each() {
    for k in 0..=5usize {
        let mock = Arc::new(MockGateway::new());
        for _ in 0..k {
            mock.push_create(Ok(precision_error()));
        }
        mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
        mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));

        let mut request = buy(dec!(123.654321), dec!(1));
        client(&mock).create_limit_order(&mut request).await.unwrap();

        let expected = ["123.654321", "123.65432", "123.6543", "123.654", "123.65", "123.6"][k];
        assert_eq!(request.price, expected.parse::<Price>().unwrap(), "k = {k}");
        assert_eq!(mock.create_requests().len(), k + 1, "k = {k}");
        assert_eq!(request.retries as usize, k);
    }
}

#[tokio::test(start_paused = true)]
async fn retry_budget_caps_at_six_attempts() {
    let mock = Arc::new(MockGateway::new());
    for _ in 0..8 {
        mock.push_create(Ok(precision_error()));
    }

    let mut request = buy(dec!(123.654321), dec!(1));
    let err = client(&mock)
        .create_limit_order(&mut request)
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::OrderRejected(_)));
    assert_eq!(mock.create_requests().len(), 6);
    assert_eq!(mock.get_order_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn increment_policy_repairs_literal_precision_error() {
    let mock = Arc::new(MockGateway::new());
    mock.set_product(Some(Product {
        product_id: ProductId::new("YFI", "BTC"),
        price: Price::new(dec!(0.4)),
        price_percentage_change_24h: dec!(2),
        volume_24h: dec!(10),
        base_increment: dec!(0.0001),
        quote_increment: dec!(0.01),
        base_min_size: dec!(0.0001),
        base_max_size: dec!(1000),
        status: "online".to_string(),
        trading_disabled: false,
    }));
    mock.push_create(Ok(precision_error()));
    mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));

    let config = ExecutorConfig {
        repair_policy: RepairPolicy::ProductIncrement,
        ..ExecutorConfig::default()
    };
    let client = TradingClient::new(mock.clone(), config);
    let mut request = buy(dec!(0.401234), dec!(1));
    client.create_limit_order(&mut request).await.unwrap();

    assert_eq!(mock.create_requests()[1].limit_price(), "0.400000");
}

#[tokio::test(start_paused = true)]
async fn past_deadline_times_out_without_calls() {
    let mock = Arc::new(MockGateway::new());
    let deadline = Instant::now();
    tokio::time::advance(Duration::from_secs(1)).await;

    let err = client(&mock)
        .await_completion("o-1", deadline)
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::Timeout(_)));
    assert!(mock.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn open_open_filled_takes_three_fetches_and_two_sleeps() {
    let mock = Arc::new(MockGateway::new());
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Filled)));

    let start = Instant::now();
    let order = client(&mock)
        .await_completion("o-1", start + Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(order.status, Some(OrderStatus::Filled));
    assert_eq!(mock.get_order_count(), 3);
    assert_eq!(start.elapsed(), 2 * ExecutorConfig::default().poll_interval());
}

#[tokio::test(start_paused = true)]
async fn expired_order_cancels_exactly_once() {
    for outcome in [
        Ok(vec![CancelResult::ok("o-1")]),
        Ok(vec![CancelResult::failed("o-1", "UNKNOWN_CANCEL_ORDER")]),
        Ok(Vec::new()),
    ] {
        let mock = Arc::new(MockGateway::new());
        mock.push_order(Ok(snapshot("o-1", OrderStatus::Expired)));
        mock.push_cancel(outcome);

        let err = client(&mock)
            .await_completion("o-1", Instant::now() + Duration::from_secs(60))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::OrderExpired(_)));
        assert_eq!(mock.cancel_requests().len(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn create_and_wait_until_filled() {
    let mock = Arc::new(MockGateway::new());
    mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Filled)));

    let mut request = buy(dec!(0.4012), dec!(1));
    let order = client(&mock)
        .create_order_and_wait(&mut request, Instant::now() + Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(order.order_id, "o-1");
    // One confirmation fetch after creation, then two watch polls.
    assert_eq!(mock.get_order_count(), 3);
}

#[tokio::test]
async fn balances_list_accounts_once() {
    let mock = Arc::new(MockGateway::new());
    mock.set_accounts(
        [("a-yfi", "YFI"), ("a-btc", "BTC"), ("a-usd", "USD")]
            .into_iter()
            .map(|(uuid, currency)| Account {
                uuid: uuid.to_string(),
                name: String::new(),
                currency: currency.to_string(),
                available_balance: dec!(1),
                hold: Decimal::ZERO,
                active: true,
            })
            .collect(),
    );
    let client = client(&mock);

    client.balances("YFI", "BTC").await.unwrap();
    client.balances("YFI", "BTC").await.unwrap();

    assert_eq!(mock.list_accounts_count(), 1);
    assert_eq!(mock.get_account_count(), 4);
}

#[tokio::test]
async fn volatility_gate_and_trade_scan() {
    let product = |change| Product {
        product_id: ProductId::new("YFI", "BTC"),
        price: Price::new(dec!(0.4)),
        price_percentage_change_24h: change,
        volume_24h: Decimal::ZERO,
        base_increment: Decimal::ZERO,
        quote_increment: Decimal::ZERO,
        base_min_size: Decimal::ZERO,
        base_max_size: Decimal::ZERO,
        status: String::new(),
        trading_disabled: false,
    };
    let prices = ["0.41", "0.39", "0.40", "0.43", "0.38"];
    let mock = Arc::new(MockGateway::new());
    mock.set_trades(
        prices
            .iter()
            .map(|p| Trade {
                trade_id: String::new(),
                price: p.to_string(),
                size: "1".to_string(),
                side: None,
                time: None,
            })
            .collect(),
    );
    let client = client(&mock);

    mock.set_product(Some(product(dec!(0.05))));
    let err = client
        .market_data("YFI", "BTC", Some(dec!(0.1)))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::InsufficientVolatility { .. }));
    assert_eq!(mock.get_recent_trades_count(), 0);

    mock.set_product(Some(product(dec!(5))));
    let data = client
        .market_data("YFI", "BTC", Some(dec!(0.1)))
        .await
        .unwrap();
    assert!(data.high_24h >= data.low_24h && data.low_24h >= Price::ZERO);
    for p in prices {
        let p: Price = p.parse().unwrap();
        assert!(data.low_24h <= p && p <= data.high_24h);
    }
}

#[tokio::test(start_paused = true)]
async fn submitted_order_found_by_cancel_existing() {
    let mock = Arc::new(MockGateway::new());
    mock.push_create(Ok(CreateOrderResponse::accepted("o-1")));
    mock.push_order(Ok(snapshot("o-1", OrderStatus::Open)));
    let client = client(&mock);

    let mut request = buy(dec!(0.4012), dec!(1)).with_id("grid-42");
    client.create_limit_order(&mut request).await.unwrap();

    let sent = mock.create_requests()[0].client_order_id.clone();
    let mut listed = snapshot("o-1", OrderStatus::Open);
    listed.client_order_id = Some(sent);
    mock.set_orders(vec![listed, snapshot("o-2", OrderStatus::Open)]);

    let cancelled = client
        .cancel_existing_orders(&request.id, &request.product_id(), OrderType::Limit)
        .await
        .unwrap();
    assert_eq!(cancelled, vec!["o-1".to_string()]);
}
