//! Scripted in-memory gateway for testing.
//!
//! Responses for the order lifecycle (create, get, cancel) are queued and
//! consumed in order; read-side data (accounts, product, trades, orders,
//! fills) is static and returned on every call. Every call is recorded so
//! tests can assert exact call counts and arguments.

use std::collections::VecDeque;

use parking_lot::Mutex;

use spotx_core::{Account, Fill, Order, Product, ProductId, Trade};

use crate::error::{GatewayError, GatewayResult};
use crate::port::{
    BoxFuture, CancelResult, CreateOrderRequest, CreateOrderResponse, Gateway, ListFillsFilter,
    ListOrdersFilter,
};

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    CreateOrder(CreateOrderRequest),
    GetOrder(String),
    CancelOrders(Vec<String>),
    ListOrders(ListOrdersFilter),
    ListFills(ListFillsFilter),
    ListAccounts(u32),
    GetAccount(String),
    GetProduct(ProductId),
    GetRecentTrades(ProductId, u32),
}

/// Mock gateway for testing.
#[derive(Debug, Default)]
pub struct MockGateway {
    create_responses: Mutex<VecDeque<GatewayResult<CreateOrderResponse>>>,
    order_snapshots: Mutex<VecDeque<GatewayResult<Order>>>,
    cancel_results: Mutex<VecDeque<GatewayResult<Vec<CancelResult>>>>,
    accounts: Mutex<Vec<Account>>,
    list_accounts_failure: Mutex<Option<GatewayError>>,
    product: Mutex<Option<Product>>,
    trades: Mutex<Vec<Trade>>,
    orders: Mutex<Vec<Order>>,
    fills: Mutex<Vec<Fill>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockGateway {
    /// Create a new mock gateway with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `create_order` result.
    pub fn push_create(&self, response: GatewayResult<CreateOrderResponse>) {
        self.create_responses.lock().push_back(response);
    }

    /// Queue the next `get_order` result.
    pub fn push_order(&self, snapshot: GatewayResult<Order>) {
        self.order_snapshots.lock().push_back(snapshot);
    }

    /// Queue the next `cancel_orders` result. Unscripted cancels succeed.
    pub fn push_cancel(&self, results: GatewayResult<Vec<CancelResult>>) {
        self.cancel_results.lock().push_back(results);
    }

    pub fn set_accounts(&self, accounts: Vec<Account>) {
        *self.accounts.lock() = accounts;
    }

    /// Make every `list_accounts` call fail until cleared with `None`.
    pub fn set_list_accounts_failure(&self, failure: Option<GatewayError>) {
        *self.list_accounts_failure.lock() = failure;
    }

    /// Update the balance served for an account.
    pub fn set_available_balance(&self, account_id: &str, value: rust_decimal::Decimal) {
        if let Some(account) = self
            .accounts
            .lock()
            .iter_mut()
            .find(|a| a.uuid == account_id)
        {
            account.available_balance = value;
        }
    }

    pub fn set_product(&self, product: Option<Product>) {
        *self.product.lock() = product;
    }

    pub fn set_trades(&self, trades: Vec<Trade>) {
        *self.trades.lock() = trades;
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock() = orders;
    }

    pub fn set_fills(&self, fills: Vec<Fill>) {
        *self.fills.lock() = fills;
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Recorded creation requests in order.
    pub fn create_requests(&self) -> Vec<CreateOrderRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::CreateOrder(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded cancel batches in order.
    pub fn cancel_requests(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::CancelOrders(ids) => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn get_order_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::GetOrder(_)))
    }

    pub fn list_accounts_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::ListAccounts(_)))
    }

    pub fn get_account_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::GetAccount(_)))
    }

    pub fn get_product_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::GetProduct(_)))
    }

    pub fn get_recent_trades_count(&self) -> usize {
        self.count(|c| matches!(c, GatewayCall::GetRecentTrades(..)))
    }

    fn count(&self, pred: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }
}

fn unscripted(method: &str) -> GatewayError {
    GatewayError::Scripted(format!("no scripted response for {method}"))
}

impl Gateway for MockGateway {
    fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> BoxFuture<'_, GatewayResult<CreateOrderResponse>> {
        Box::pin(async move {
            self.record(GatewayCall::CreateOrder(request));
            let next = self.create_responses.lock().pop_front();
            next.unwrap_or_else(|| Err(unscripted("create_order")))
        })
    }

    fn get_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, GatewayResult<Order>> {
        Box::pin(async move {
            self.record(GatewayCall::GetOrder(order_id.to_string()));
            let next = self.order_snapshots.lock().pop_front();
            next.unwrap_or_else(|| Err(unscripted("get_order")))
        })
    }

    fn cancel_orders(
        &self,
        order_ids: Vec<String>,
    ) -> BoxFuture<'_, GatewayResult<Vec<CancelResult>>> {
        Box::pin(async move {
            self.record(GatewayCall::CancelOrders(order_ids.clone()));
            let next = self.cancel_results.lock().pop_front();
            next.unwrap_or_else(|| Ok(order_ids.into_iter().map(CancelResult::ok).collect()))
        })
    }

    fn list_orders(&self, filter: ListOrdersFilter) -> BoxFuture<'_, GatewayResult<Vec<Order>>> {
        Box::pin(async move {
            let orders = self
                .orders
                .lock()
                .iter()
                .filter(|o| o.product_id == filter.product_id)
                .filter(|o| filter.side.map_or(true, |side| o.side == side))
                .filter(|o| {
                    filter.statuses.is_empty()
                        || o.status.as_ref().is_some_and(|s| filter.statuses.contains(s))
                })
                .take(filter.limit as usize)
                .cloned()
                .collect();
            self.record(GatewayCall::ListOrders(filter));
            Ok(orders)
        })
    }

    fn list_fills(&self, filter: ListFillsFilter) -> BoxFuture<'_, GatewayResult<Vec<Fill>>> {
        Box::pin(async move {
            let fills = self
                .fills
                .lock()
                .iter()
                .filter(|f| f.order_id == filter.order_id)
                .take(filter.limit as usize)
                .cloned()
                .collect();
            self.record(GatewayCall::ListFills(filter));
            Ok(fills)
        })
    }

    fn list_accounts(&self, limit: u32) -> BoxFuture<'_, GatewayResult<Vec<Account>>> {
        Box::pin(async move {
            self.record(GatewayCall::ListAccounts(limit));
            if let Some(err) = self.list_accounts_failure.lock().clone() {
                return Err(err);
            }
            Ok(self
                .accounts
                .lock()
                .iter()
                .take(limit as usize)
                .cloned()
                .collect())
        })
    }

    fn get_account<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, GatewayResult<Account>> {
        Box::pin(async move {
            self.record(GatewayCall::GetAccount(account_id.to_string()));
            let found = self
                .accounts
                .lock()
                .iter()
                .find(|a| a.uuid == account_id)
                .cloned();
            found.ok_or_else(|| GatewayError::Status {
                status: 404,
                body: format!("account {account_id} not found"),
            })
        })
    }

    fn get_product<'a>(
        &'a self,
        product_id: &'a ProductId,
    ) -> BoxFuture<'a, GatewayResult<Option<Product>>> {
        Box::pin(async move {
            self.record(GatewayCall::GetProduct(product_id.clone()));
            Ok(self.product.lock().clone())
        })
    }

    fn get_recent_trades<'a>(
        &'a self,
        product_id: &'a ProductId,
        limit: u32,
    ) -> BoxFuture<'a, GatewayResult<Vec<Trade>>> {
        Box::pin(async move {
            self.record(GatewayCall::GetRecentTrades(product_id.clone(), limit));
            Ok(self
                .trades
                .lock()
                .iter()
                .take(limit as usize)
                .cloned()
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spotx_core::OrderSide;

    fn account(uuid: &str, currency: &str) -> Account {
        Account {
            uuid: uuid.to_string(),
            name: format!("{currency} Wallet"),
            currency: currency.to_string(),
            available_balance: dec!(1),
            hold: dec!(0),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_unscripted_create_fails() {
        let mock = MockGateway::new();
        let request = CreateOrderRequest::limit_gtc(
            spotx_core::ClientOrderId::from_string("c".to_string()),
            ProductId::new("A", "B"),
            OrderSide::Buy,
            spotx_core::Price::new(dec!(1)),
            spotx_core::Size::new(dec!(1)),
        );
        assert!(mock.create_order(request).await.is_err());
        assert_eq!(mock.create_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unscripted_cancel_succeeds() {
        let mock = MockGateway::new();
        let results = mock.cancel_orders(vec!["o-1".to_string()]).await.unwrap();
        assert_eq!(results, vec![CancelResult::ok("o-1")]);
        assert_eq!(mock.cancel_requests(), vec![vec!["o-1".to_string()]]);
    }

    #[tokio::test]
    async fn test_accounts_served_and_counted() {
        let mock = MockGateway::new();
        mock.set_accounts(vec![account("a-1", "BTC"), account("a-2", "USD")]);

        assert_eq!(mock.list_accounts(250).await.unwrap().len(), 2);
        assert_eq!(mock.get_account("a-2").await.unwrap().currency, "USD");
        assert!(mock.get_account("missing").await.is_err());
        assert_eq!(mock.list_accounts_count(), 1);
        assert_eq!(mock.get_account_count(), 2);
    }

    #[tokio::test]
    async fn test_balance_update_visible() {
        let mock = MockGateway::new();
        mock.set_accounts(vec![account("a-1", "BTC")]);
        mock.set_available_balance("a-1", dec!(3.5));
        assert_eq!(
            mock.get_account("a-1").await.unwrap().available_balance,
            dec!(3.5)
        );
    }
}
