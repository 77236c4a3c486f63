//! Trading client: one handle over the account cache, market data,
//! submission, completion watching and order housekeeping.

use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::info;

use spotx_core::{Balances, Fill, MarketData, Order, OrderSide, OrderRequest, OrderType, Product, ProductId};
use spotx_gateway::DynGateway;

use crate::accounts::AccountCache;
use crate::cancel::OrderManager;
use crate::config::ExecutorConfig;
use crate::error::ExecutorResult;
use crate::market_data::MarketDataFetcher;
use crate::submit::OrderSubmitter;
use crate::watcher::CompletionWatcher;

pub struct TradingClient {
    accounts: AccountCache,
    market: MarketDataFetcher,
    submitter: OrderSubmitter,
    watcher: CompletionWatcher,
    orders: OrderManager,
}

impl TradingClient {
    #[must_use]
    pub fn new(gateway: DynGateway, config: ExecutorConfig) -> Self {
        Self {
            accounts: AccountCache::new(gateway.clone(), config.account_page_limit),
            market: MarketDataFetcher::new(gateway.clone(), config.trade_window),
            submitter: OrderSubmitter::new(gateway.clone(), &config),
            watcher: CompletionWatcher::new(gateway.clone(), config.poll_interval()),
            orders: OrderManager::new(gateway, &config),
        }
    }

    pub async fn balances(&self, base: &str, quote: &str) -> ExecutorResult<Balances> {
        self.accounts.balances(base, quote).await
    }

    pub async fn get_product(&self, base: &str, quote: &str) -> ExecutorResult<Product> {
        self.market.product(base, quote).await
    }

    pub async fn market_data(
        &self,
        base: &str,
        quote: &str,
        min_pct_change: Option<Decimal>,
    ) -> ExecutorResult<MarketData> {
        self.market.market_data(base, quote, min_pct_change).await
    }

    /// Submit a GTC limit order with precision repair.
    pub async fn create_limit_order(&self, request: &mut OrderRequest) -> ExecutorResult<Order> {
        self.submitter.submit(request).await
    }

    pub async fn await_completion(&self, order_id: &str, deadline: Instant) -> ExecutorResult<Order> {
        self.watcher.await_completion(order_id, deadline).await
    }

    /// Submit, then watch until filled or `deadline`.
    pub async fn create_order_and_wait(
        &self,
        request: &mut OrderRequest,
        deadline: Instant,
    ) -> ExecutorResult<Order> {
        let placed = self.submitter.submit(request).await?;
        info!(order_id = %placed.order_id, status = placed.status_str(), "Order placed, watching");
        self.watcher.await_completion(&placed.order_id, deadline).await
    }

    pub async fn get_order(&self, order_id: &str) -> ExecutorResult<Order> {
        self.orders.get_order(order_id).await
    }

    pub async fn cancel_orders(&self, order_ids: Vec<String>) -> ExecutorResult<()> {
        self.orders.cancel_orders(order_ids).await
    }

    pub async fn cancel_existing_orders(
        &self,
        fragment: &str,
        product_id: &ProductId,
        order_type: OrderType,
    ) -> ExecutorResult<Vec<String>> {
        self.orders
            .cancel_existing_orders(fragment, product_id, order_type)
            .await
    }

    pub async fn open_orders(&self, product_id: &ProductId, side: OrderSide) -> ExecutorResult<Vec<Order>> {
        self.orders.open_orders(product_id, side).await
    }

    pub async fn order_fills(&self, order_id: &str, product_id: &ProductId) -> ExecutorResult<Vec<Fill>> {
        self.orders.order_fills(order_id, product_id).await
    }
}
