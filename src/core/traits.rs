//! Core traits - Seams for valuation, persistence and the exchange

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::catalog::NewBundle;
use crate::core::{Result, types::*};
use crate::gateway::{Currency, FeeSchedule, SubmittedOrder};
use crate::orders::OrderData;

/// Per-asset reference values.
///
/// Implementations may be randomized for unknown assets; tests inject a
/// deterministic one.
pub trait ValuationSource: Send + Sync {
    /// Value of one asset identifier
    fn asset_value(&self, asset: &str) -> Decimal;

    /// Synthetic daily percentage change in [-5, 5)
    fn day_change(&self) -> Decimal;
}

/// Bundle storage. The trade path only reads it.
#[async_trait]
pub trait BundleCatalog: Send + Sync {
    /// Look up a bundle by id
    async fn get(&self, id: BundleId) -> Result<Option<Bundle>>;

    /// All bundles in id order
    async fn list(&self) -> Result<Vec<Bundle>>;

    /// Validate and store a new bundle under the next id
    async fn create(&self, new: NewBundle) -> Result<Bundle>;
}

/// User balances and holdings.
///
/// `apply_purchase` is the only balance-affecting call and must check the
/// balance and apply the purchase as one critical section per account.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fetch an account, creating it with the starting balance if absent
    async fn get_or_create_account(&self, user: &UserId) -> Result<UserAccount>;

    /// Fetch an account without creating it
    async fn find_account(&self, user: &UserId) -> Result<Option<UserAccount>>;

    /// Fetch the holding for a (user, bundle) pair
    async fn find_holding(&self, user: &UserId, bundle_id: BundleId) -> Result<Option<Holding>>;

    /// Debit `cost` and credit `shares`, or fail with `InsufficientFunds`
    /// leaving the account untouched
    async fn apply_purchase(&self, purchase: &Purchase) -> Result<PurchaseOutcome>;
}

/// Remote orderbook
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Gateway name (e.g. "doma")
    fn name(&self) -> &str;

    /// Submit an offer, returning the orderbook's order id
    async fn submit_offer(&self, order: &OrderData) -> Result<SubmittedOrder>;

    /// Fulfillment data for a listing
    async fn get_listing_fulfillment(&self, order_id: &str, buyer: &UserId) -> Result<serde_json::Value>;

    /// Marketplace fee schedule
    async fn get_fees(&self, orderbook: &str, chain_id: &str, contract: &str) -> Result<FeeSchedule>;

    /// Currencies accepted for a contract
    async fn get_supported_currencies(
        &self,
        chain_id: &str,
        contract: &str,
        orderbook: &str,
    ) -> Result<Vec<Currency>>;

    /// Cancel a listing
    async fn cancel_listing(&self, order_id: &str, signature: &str) -> Result<serde_json::Value>;
}
