//! Account cache: ticker -> account id, populated once.
//!
//! The index is built from a single account listing on first use and kept
//! for the life of the process. Balances are never cached; every call
//! fetches both accounts again.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use spotx_core::Balances;
use spotx_gateway::DynGateway;

use crate::error::{ExecutorError, ExecutorResult};

pub struct AccountCache {
    gateway: DynGateway,
    /// `None` until the first successful listing.
    ///
    /// Held for the whole lookup/populate/fetch sequence so two first
    /// callers cannot both populate.
    index: Mutex<Option<HashMap<String, String>>>,
    page_limit: u32,
}

impl AccountCache {
    #[must_use]
    pub fn new(gateway: DynGateway, page_limit: u32) -> Self {
        Self {
            gateway,
            index: Mutex::new(None),
            page_limit,
        }
    }

    /// Current balances for `base`/`quote`.
    ///
    /// Tickers beyond the first `page_limit` accounts are never indexed
    /// and report `AccountNotFound`.
    pub async fn balances(&self, base: &str, quote: &str) -> ExecutorResult<Balances> {
        let mut guard = self.index.lock().await;

        if guard.is_none() {
            debug!("Account index not populated, listing accounts");
            let accounts = self
                .gateway
                .list_accounts(self.page_limit)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Account listing failed");
                    e
                })?;

            let index: HashMap<String, String> = accounts
                .into_iter()
                .map(|a| (a.currency, a.uuid))
                .collect();
            info!(accounts = index.len(), "Account index populated");
            *guard = Some(index);
        }

        let index = guard.as_ref().map(|i| (i.get(base).cloned(), i.get(quote).cloned()));
        let (base_id, quote_id) = match index {
            Some((Some(b), Some(q))) => (b, q),
            Some((Some(_), None)) => {
                return Err(ExecutorError::AccountNotFound(quote.to_string()))
            }
            _ => return Err(ExecutorError::AccountNotFound(base.to_string())),
        };

        let base_account = self.gateway.get_account(&base_id).await?;
        let quote_account = self.gateway.get_account(&quote_id).await?;
        drop(guard);

        debug!(
            base,
            quote,
            base_available = %base_account.available_balance,
            quote_available = %quote_account.available_balance,
            "Fetched balances"
        );

        Ok(Balances {
            base_available: base_account.available_balance,
            quote_available: quote_account.available_balance,
            base_account,
            quote_account,
        })
    }

    /// Whether the one-time listing has happened.
    pub async fn is_populated(&self) -> bool {
        self.index.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spotx_core::Account;
    use spotx_gateway::{GatewayError, MockGateway};
    use std::sync::Arc;

    fn account(uuid: &str, currency: &str, available: rust_decimal::Decimal) -> Account {
        Account {
            uuid: uuid.to_string(),
            name: format!("{currency} Wallet"),
            currency: currency.to_string(),
            available_balance: available,
            hold: dec!(0),
            active: true,
        }
    }

    fn setup() -> (Arc<MockGateway>, AccountCache) {
        let mock = Arc::new(MockGateway::new());
        mock.set_accounts(vec![
            account("acc-yfi", "YFI", dec!(0.25)),
            account("acc-btc", "BTC", dec!(0.01)),
        ]);
        let cache = AccountCache::new(mock.clone(), 250);
        (mock, cache)
    }

    #[tokio::test]
    async fn test_balances_lists_once_fetches_every_time() {
        let (mock, cache) = setup();

        let first = cache.balances("YFI", "BTC").await.unwrap();
        assert_eq!(first.base_available, dec!(0.25));
        assert_eq!(first.quote_available, dec!(0.01));

        mock.set_available_balance("acc-btc", dec!(0.02));
        let second = cache.balances("YFI", "BTC").await.unwrap();
        assert_eq!(second.quote_available, dec!(0.02));

        assert_eq!(mock.list_accounts_count(), 1);
        assert_eq!(mock.get_account_count(), 4);
    }

    #[tokio::test]
    async fn test_missing_ticker() {
        let (mock, cache) = setup();

        let err = cache.balances("YFI", "USD").await.unwrap_err();
        assert!(matches!(err, ExecutorError::AccountNotFound(ref t) if t == "USD"));

        let err = cache.balances("DOGE", "BTC").await.unwrap_err();
        assert!(matches!(err, ExecutorError::AccountNotFound(ref t) if t == "DOGE"));

        // Index is never refreshed after population.
        assert_eq!(mock.list_accounts_count(), 1);
        assert_eq!(mock.get_account_count(), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_leaves_index_unpopulated() {
        let (mock, cache) = setup();
        mock.set_list_accounts_failure(Some(GatewayError::Http("down".to_string())));

        let err = cache.balances("YFI", "BTC").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Gateway(_)));
        assert!(!cache.is_populated().await);

        mock.set_list_accounts_failure(None);
        assert!(cache.balances("YFI", "BTC").await.is_ok());
        assert_eq!(mock.list_accounts_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_populate_once() {
        let (mock, cache) = setup();
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.balances("YFI", "BTC").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(mock.list_accounts_count(), 1);
        assert_eq!(mock.get_account_count(), 16);
    }
}
