//! Bundle service - The surface the UI/HTTP layer talks to
//!
//! Wires catalog, ledger, valuation, order builder and (optionally) the
//! exchange gateway from one `Config`, and exposes listing, creation,
//! buying and portfolio reads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::{InMemoryCatalog, NewBundle};
use crate::core::{
    Bundle, BundleCatalog, BundleId, BundleQuote, Config, Error, ExchangeGateway, Holding, Ledger,
    Result, UserId,
};
use crate::execution::{TradeExecutor, TradeReceipt};
use crate::gateway::{Currency, DomaClient, FeeSchedule};
use crate::ledger::InMemoryLedger;
use crate::orders::{OrderBuilder, OrderData};
use crate::valuation::{ReferenceValuation, ValuationEngine};

/// Buy request as received from a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub bundle_id: u64,
    pub buyer: String,
    /// Signed so that negative counts reach validation instead of failing to parse
    pub shares: i64,
    #[serde(default)]
    pub payment_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    #[serde(flatten)]
    pub holding: Holding,
    pub bundle: Bundle,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_share: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub profit_loss: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub user: UserId,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    pub holdings: Vec<HoldingView>,
}

pub struct BundleService {
    catalog: Arc<dyn BundleCatalog>,
    ledger: Arc<dyn Ledger>,
    executor: TradeExecutor,
}

impl BundleService {
    pub fn new(catalog: Arc<dyn BundleCatalog>, ledger: Arc<dyn Ledger>, executor: TradeExecutor) -> Self {
        Self {
            catalog,
            ledger,
            executor,
        }
    }

    /// In-memory service. Submission runs only when the gateway is enabled
    /// and a credential is present; otherwise orders get mock ids.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog: Arc<dyn BundleCatalog> = Arc::new(InMemoryCatalog::new(config.catalog.default_shares));
        let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new(config.ledger.starting_balance));
        let valuation = ValuationEngine::new(Arc::new(ReferenceValuation::from_config(&config.valuation)));
        let builder = OrderBuilder::new(config.orders.clone());

        let mut executor = TradeExecutor::new(catalog.clone(), ledger.clone(), valuation, builder);

        if config.gateway.submission_enabled() {
            let client = DomaClient::from_config(&config.gateway)?;
            info!("Order submission enabled via {}", config.gateway.base_url);
            executor = executor.with_gateway(
                Arc::new(client),
                Duration::from_millis(config.gateway.submit_timeout_ms),
            );
        } else if config.gateway.enabled {
            warn!("⚠️ Gateway enabled but no API key set, order submission deferred");
        } else {
            info!("Order submission disabled, orders get mock ids");
        }

        Ok(Self::new(catalog, ledger, executor))
    }

    pub fn executor(&self) -> &TradeExecutor {
        &self.executor
    }

    /// All bundles with a live valuation
    pub async fn list_bundles(&self) -> Result<Vec<BundleQuote>> {
        let valuation = self.executor.valuation();
        self.catalog
            .list()
            .await?
            .iter()
            .map(|bundle| valuation.quote(bundle))
            .collect()
    }

    pub async fn get_bundle(&self, id: BundleId) -> Result<BundleQuote> {
        let bundle = self
            .catalog
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("bundle {}", id)))?;
        self.executor.valuation().quote(&bundle)
    }

    pub async fn create_bundle(&self, new: NewBundle) -> Result<BundleQuote> {
        let bundle = self.catalog.create(new).await?;
        self.executor.valuation().quote(&bundle)
    }

    pub async fn buy(&self, request: &BuyRequest) -> Result<TradeReceipt> {
        let shares = u64::try_from(request.shares)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| Error::invalid("shares", format!("{} is not a positive integer", request.shares)))?;

        self.executor
            .buy(
                BundleId(request.bundle_id),
                &UserId::new(request.buyer.as_str()),
                shares,
                request.payment_token.as_deref(),
            )
            .await
    }

    /// Balance and holdings, each priced at a live per-share price
    pub async fn holdings(&self, user: &UserId) -> Result<PortfolioView> {
        let account = self
            .ledger
            .find_account(user)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user)))?;

        let valuation = self.executor.valuation();
        let mut holdings = Vec::with_capacity(account.holdings.len());
        for holding in account.holdings.into_values() {
            let Some(bundle) = self.catalog.get(holding.bundle_id).await? else {
                warn!("Holding of {} references missing bundle {}", user, holding.bundle_id);
                continue;
            };
            let price_per_share = valuation.quote(&bundle)?.price_per_share;
            let current_value = price_per_share * Decimal::from(holding.shares_owned);
            holdings.push(HoldingView {
                profit_loss: current_value - holding.total_invested,
                holding,
                bundle,
                price_per_share,
                current_value,
            });
        }

        Ok(PortfolioView {
            user: account.user,
            balance: account.balance,
            holdings,
        })
    }

    fn gateway(&self) -> Result<&Arc<dyn ExchangeGateway>> {
        self.executor
            .gateway()
            .ok_or_else(|| Error::Gateway("exchange gateway is disabled".into()))
    }

    /// Fee schedule for a contract on the configured orderbook and chain
    pub async fn fees(&self, contract: &str) -> Result<FeeSchedule> {
        let orders = self.executor.builder().config();
        self.gateway()?
            .get_fees(&orders.orderbook, &orders.chain_id, contract)
            .await
    }

    pub async fn supported_currencies(&self, contract: &str) -> Result<Vec<Currency>> {
        let orders = self.executor.builder().config();
        self.gateway()?
            .get_supported_currencies(&orders.chain_id, contract, &orders.orderbook)
            .await
    }

    pub async fn listing_fulfillment(&self, order_id: &str, buyer: &UserId) -> Result<serde_json::Value> {
        self.gateway()?.get_listing_fulfillment(order_id, buyer).await
    }

    pub async fn cancel_listing(&self, order_id: &str, signature: &str) -> Result<serde_json::Value> {
        self.gateway()?.cancel_listing(order_id, signature).await
    }

    /// Retry the orderbook submission of a committed trade
    pub async fn resubmit(&self, order: &OrderData) -> Result<String> {
        self.executor.resubmit(order).await
    }
}
