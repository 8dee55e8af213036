//! Execution layer - Validates, prices and applies bundle purchases
//!
//! A purchase is priced from a live valuation, checked against the buyer's
//! balance and committed to the ledger in one per-account critical section.
//! Only then is the order handed to the exchange gateway, outside any lock.
//! A failed or timed-out submission does not undo the ledger: the receipt
//! reports it and carries the order so the submission alone can be retried.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::{
    BundleCatalog, BundleId, Error, ExchangeGateway, Holding, Ledger, Purchase, Result, UserId,
};
use crate::orders::{OrderBuilder, OrderData};
use crate::signer::{OrderSigner, PlaceholderSigner, SignerType};
use crate::valuation::ValuationEngine;

/// What happened to the order after the ledger committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Accepted by the orderbook
    Submitted,
    /// Gateway disabled; the order id is a local placeholder
    Deferred,
    /// Ledger committed but the orderbook did not take the order
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    pub transaction_id: String,
    pub bundle_id: BundleId,
    pub bundle_name: String,
    pub buyer: UserId,
    pub shares: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_share: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance_after: Decimal,
    pub holding: Holding,
    pub order_id: Option<String>,
    pub submission: SubmissionStatus,
    pub order: OrderData,
    pub executed_at: DateTime<Utc>,
}

impl TradeReceipt {
    /// Trade committed but the order still has to reach the orderbook
    pub fn needs_resubmission(&self) -> bool {
        matches!(self.submission, SubmissionStatus::Failed { .. })
    }
}

pub struct TradeExecutor {
    catalog: Arc<dyn BundleCatalog>,
    ledger: Arc<dyn Ledger>,
    valuation: ValuationEngine,
    builder: OrderBuilder,
    gateway: Option<Arc<dyn ExchangeGateway>>,
    signer: Arc<dyn OrderSigner>,
    submit_timeout: Duration,
}

impl TradeExecutor {
    /// Executor with order submission deferred
    pub fn new(
        catalog: Arc<dyn BundleCatalog>,
        ledger: Arc<dyn Ledger>,
        valuation: ValuationEngine,
        builder: OrderBuilder,
    ) -> Self {
        Self {
            catalog,
            ledger,
            valuation,
            builder,
            gateway: None,
            signer: Arc::new(PlaceholderSigner),
            submit_timeout: Duration::from_secs(10),
        }
    }

    /// Submit orders through `gateway`, giving up after `timeout`
    pub fn with_gateway(mut self, gateway: Arc<dyn ExchangeGateway>, timeout: Duration) -> Self {
        self.gateway = Some(gateway);
        self.submit_timeout = timeout;
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn OrderSigner>) -> Self {
        info!("Orders signed by {:?} signer", signer.signer_type());
        self.signer = signer;
        self
    }

    pub fn gateway(&self) -> Option<&Arc<dyn ExchangeGateway>> {
        self.gateway.as_ref()
    }

    pub fn signer_type(&self) -> SignerType {
        self.signer.signer_type()
    }

    pub fn submission_enabled(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn valuation(&self) -> &ValuationEngine {
        &self.valuation
    }

    pub fn builder(&self) -> &OrderBuilder {
        &self.builder
    }

    /// Buy `shares` of a bundle for `buyer`.
    ///
    /// Rejections (`InvalidArgument`, `NotFound`, `InsufficientFunds`) leave
    /// the ledger untouched. Any `Ok` means the ledger committed exactly once;
    /// check [`TradeReceipt::submission`] for the orderbook side.
    pub async fn buy(
        &self,
        bundle_id: BundleId,
        buyer: &UserId,
        shares: u64,
        payment_token: Option<&str>,
    ) -> Result<TradeReceipt> {
        let result = self.execute(bundle_id, buyer, shares, payment_token).await;
        match &result {
            Err(e) if e.is_rejection() => {
                warn!("buy rejected: bundle {} buyer {} shares {}: {}", bundle_id, buyer, shares, e)
            }
            Err(e) => error!("buy failed: bundle {} buyer {} shares {}: {}", bundle_id, buyer, shares, e),
            Ok(_) => {}
        }
        result
    }

    async fn execute(
        &self,
        bundle_id: BundleId,
        buyer: &UserId,
        shares: u64,
        payment_token: Option<&str>,
    ) -> Result<TradeReceipt> {
        if shares == 0 {
            return Err(Error::invalid("shares", "must be a positive integer"));
        }
        if buyer.is_empty() {
            return Err(Error::invalid("buyer", "required"));
        }

        let bundle = self
            .catalog
            .get(bundle_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("bundle {}", bundle_id)))?;

        // Price from a fresh valuation, never a stored one
        let quote = self.valuation.quote(&bundle)?;
        let price_per_share = quote.price_per_share;
        let total_cost = price_per_share
            .checked_mul(Decimal::from(shares))
            .ok_or_else(|| Error::invalid("shares", format!("cost of {} shares overflows", shares)))?;

        let mut order = self
            .builder
            .build_order(&bundle, buyer, shares, payment_token, total_cost)?;
        order.signature = self.signer.sign_order(&order)?;

        let account = self.ledger.get_or_create_account(buyer).await?;
        if account.balance < total_cost {
            return Err(Error::InsufficientFunds {
                user: buyer.to_string(),
                available: account.balance,
                required: total_cost,
            });
        }

        let executed_at = Utc::now();
        // Re-checks the balance under the account lock
        let outcome = self
            .ledger
            .apply_purchase(&Purchase {
                user: buyer.clone(),
                bundle_id,
                shares,
                cost: total_cost,
                at: executed_at,
            })
            .await?;

        let transaction_id = format!("tx_{}", Uuid::new_v4().simple());
        info!(
            "{} executed: {} bought {} x {} @ {} = {}, balance {}",
            transaction_id, buyer, shares, bundle.symbol, price_per_share, total_cost, outcome.balance_after
        );

        let (order_id, submission) = self.submit(&transaction_id, &order).await;

        Ok(TradeReceipt {
            transaction_id,
            bundle_id,
            bundle_name: bundle.name,
            buyer: buyer.clone(),
            shares,
            price_per_share,
            total_cost,
            balance_after: outcome.balance_after,
            holding: outcome.holding,
            order_id,
            submission,
            order,
            executed_at,
        })
    }

    async fn submit(&self, transaction_id: &str, order: &OrderData) -> (Option<String>, SubmissionStatus) {
        let Some(gateway) = &self.gateway else {
            let mock_id = format!("mock_order_{}", Uuid::new_v4().simple());
            return (Some(mock_id), SubmissionStatus::Deferred);
        };

        match tokio::time::timeout(self.submit_timeout, gateway.submit_offer(order)).await {
            Ok(Ok(submitted)) => {
                info!("{} order {} accepted by {}", transaction_id, submitted.order_id, gateway.name());
                (Some(submitted.order_id), SubmissionStatus::Submitted)
            }
            Ok(Err(e)) => {
                warn!("{} committed but submission to {} failed: {}", transaction_id, gateway.name(), e);
                (None, SubmissionStatus::Failed { reason: e.to_string() })
            }
            Err(_) => {
                let reason = format!("submission timed out after {:?}", self.submit_timeout);
                warn!("{} committed but {}", transaction_id, reason);
                (None, SubmissionStatus::Failed { reason })
            }
        }
    }

    /// Retry just the orderbook submission of an already committed trade
    pub async fn resubmit(&self, order: &OrderData) -> Result<String> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| Error::Gateway("order submission is disabled".into()))?;

        let submitted = tokio::time::timeout(self.submit_timeout, gateway.submit_offer(order))
            .await
            .map_err(|_| Error::Gateway(format!("submission timed out after {:?}", self.submit_timeout)))??;

        info!("Resubmitted order accepted as {}", submitted.order_id);
        Ok(submitted.order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, NewBundle};
    use crate::core::config::OrderConfig;
    use crate::gateway::{Currency, FeeSchedule, SubmittedOrder};
    use crate::ledger::InMemoryLedger;
    use crate::valuation::ReferenceValuation;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Gateway double that records submissions and replies with a canned result
    struct StubGateway {
        reply: Mutex<Option<Result<SubmittedOrder>>>,
        delay: Duration,
        submitted: Mutex<Vec<OrderData>>,
    }

    impl StubGateway {
        fn new(reply: Result<SubmittedOrder>, delay: Duration) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                delay,
                submitted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExchangeGateway for StubGateway {
        fn name(&self) -> &str {
            "stub"
        }

        async fn submit_offer(&self, order: &OrderData) -> Result<SubmittedOrder> {
            tokio::time::sleep(self.delay).await;
            self.submitted.lock().push(order.clone());
            self.reply
                .lock()
                .take()
                .unwrap_or_else(|| Ok(SubmittedOrder { order_id: "again".into() }))
        }

        async fn get_listing_fulfillment(&self, _: &str, _: &UserId) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn get_fees(&self, _: &str, _: &str, _: &str) -> Result<FeeSchedule> {
            Ok(FeeSchedule::default())
        }

        async fn get_supported_currencies(&self, _: &str, _: &str, _: &str) -> Result<Vec<Currency>> {
            Ok(vec![])
        }

        async fn cancel_listing(&self, _: &str, _: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    struct FixedSigner;

    impl OrderSigner for FixedSigner {
        fn sign_order(&self, _order: &OrderData) -> Result<String> {
            Ok("0xsigned".into())
        }
        fn signer_type(&self) -> SignerType {
            SignerType::External
        }
    }

    async fn setup(balance: i64) -> (TradeExecutor, Arc<InMemoryLedger>, BundleId) {
        let catalog = Arc::new(InMemoryCatalog::new(1000));
        let bundle = catalog
            .create(NewBundle {
                name: "Premium".into(),
                symbol: "PETH".into(),
                domains: vec!["a.eth".into(), "b.eth".into()],
                ..NewBundle::default()
            })
            .await
            .unwrap();

        let ledger = Arc::new(InMemoryLedger::new(Decimal::from(balance)));
        let valuation = ValuationEngine::new(Arc::new(ReferenceValuation::deterministic(
            [("a.eth", Decimal::from(50_000)), ("b.eth", Decimal::from(30_000))],
            Decimal::from(10_000),
        )));
        let executor = TradeExecutor::new(
            catalog,
            ledger.clone(),
            valuation,
            OrderBuilder::new(OrderConfig::default()),
        );
        (executor, ledger, bundle.id)
    }

    #[tokio::test]
    async fn test_buy_debits_and_defers_submission() {
        let (executor, ledger, id) = setup(1000).await;
        let buyer = UserId::new("0xbuyer");

        let receipt = executor.buy(id, &buyer, 10, None).await.unwrap();
        assert_eq!(receipt.price_per_share, Decimal::from(80));
        assert_eq!(receipt.total_cost, Decimal::from(800));
        assert_eq!(receipt.balance_after, Decimal::from(200));
        assert_eq!(receipt.submission, SubmissionStatus::Deferred);
        assert!(receipt.order_id.as_deref().unwrap().starts_with("mock_order_"));
        assert!(receipt.transaction_id.starts_with("tx_"));
        assert_eq!(receipt.bundle_name, "Premium");

        let holding = ledger.find_holding(&buyer, id).await.unwrap().unwrap();
        assert_eq!((holding.shares_owned, holding.total_invested), (10, Decimal::from(800)));
    }

    #[tokio::test]
    async fn test_receipt_json_keeps_full_precision() {
        let (executor, _, _) = setup(1000).await;
        let thirds = executor
            .catalog
            .create(NewBundle {
                name: "Thirds".into(),
                symbol: "THR".into(),
                domains: vec!["a.eth".into(), "b.eth".into()],
                shares: Some(300),
                ..NewBundle::default()
            })
            .await
            .unwrap();

        let receipt = executor.buy(thirds.id, &UserId::new("0xbuyer"), 1, None).await.unwrap();
        assert_eq!(receipt.total_cost, Decimal::from(80_000) / Decimal::from(300));

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["totalCost"], receipt.total_cost.to_string());
        assert_eq!(json["balanceAfter"], receipt.balance_after.to_string());
        assert_eq!(json["holding"]["totalInvested"], receipt.total_cost.to_string());

        let back: TradeReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(back.price_per_share, receipt.price_per_share);
        assert_eq!(back.total_cost, receipt.total_cost);
        assert_eq!(back.balance_after, receipt.balance_after);
        assert_eq!(back.holding, receipt.holding);
    }

    #[tokio::test]
    async fn test_transaction_ids_unique() {
        let (executor, _, id) = setup(1_000_000).await;
        let buyer = UserId::new("0xbuyer");
        let a = executor.buy(id, &buyer, 1, None).await.unwrap();
        let b = executor.buy(id, &buyer, 1, None).await.unwrap();
        assert_ne!(a.transaction_id, b.transaction_id);
    }

    #[tokio::test]
    async fn test_rejections_do_not_touch_ledger() {
        let (executor, ledger, id) = setup(1000).await;
        let buyer = UserId::new("0xbuyer");

        let err = executor.buy(id, &buyer, 0, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { field: "shares", .. }));

        let err = executor.buy(BundleId(99), &buyer, 1, None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = executor.buy(id, &buyer, 1, Some("not-an-address")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { field: "paymentToken", .. }));

        assert!(ledger.find_account(&buyer).await.unwrap().is_none());

        let err = executor.buy(id, &buyer, 13, None).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        let account = ledger.find_account(&buyer).await.unwrap().unwrap();
        assert_eq!(account.balance, Decimal::from(1000));
        assert!(account.holdings.is_empty());
    }

    #[tokio::test]
    async fn test_submitted_order_id_and_signature() {
        let (executor, _, id) = setup(1000).await;
        let gateway = Arc::new(StubGateway::new(
            Ok(SubmittedOrder { order_id: "ord-1".into() }),
            Duration::ZERO,
        ));
        let executor = executor
            .with_gateway(gateway.clone(), Duration::from_secs(1))
            .with_signer(Arc::new(FixedSigner));

        let receipt = executor.buy(id, &UserId::new("0xbuyer"), 1, None).await.unwrap();
        assert_eq!(receipt.submission, SubmissionStatus::Submitted);
        assert_eq!(receipt.order_id.as_deref(), Some("ord-1"));
        assert_eq!(receipt.order.signature, "0xsigned");
        assert_eq!(executor.signer_type(), SignerType::External);
        assert_eq!(gateway.submitted.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_ledger_and_allows_retry() {
        let (executor, ledger, id) = setup(1000).await;
        let gateway = Arc::new(StubGateway::new(
            Err(Error::Gateway("503".into())),
            Duration::ZERO,
        ));
        let executor = executor.with_gateway(gateway, Duration::from_secs(1));
        let buyer = UserId::new("0xbuyer");

        let receipt = executor.buy(id, &buyer, 10, None).await.unwrap();
        assert!(receipt.needs_resubmission());
        assert!(receipt.order_id.is_none());
        assert_eq!(ledger.find_account(&buyer).await.unwrap().unwrap().balance, Decimal::from(200));

        let order_id = executor.resubmit(&receipt.order).await.unwrap();
        assert_eq!(order_id, "again");
    }

    #[tokio::test]
    async fn test_submission_timeout_is_reported() {
        let (executor, ledger, id) = setup(1000).await;
        let gateway = Arc::new(StubGateway::new(
            Ok(SubmittedOrder { order_id: "late".into() }),
            Duration::from_millis(200),
        ));
        let executor = executor.with_gateway(gateway, Duration::from_millis(20));
        let buyer = UserId::new("0xbuyer");

        let receipt = executor.buy(id, &buyer, 1, None).await.unwrap();
        match &receipt.submission {
            SubmissionStatus::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ledger.find_holding(&buyer, id).await.unwrap().unwrap().shares_owned, 1);
    }

    #[tokio::test]
    async fn test_resubmit_requires_gateway() {
        let (executor, _, id) = setup(1000).await;
        let receipt = executor.buy(id, &UserId::new("0xbuyer"), 1, None).await.unwrap();
        assert!(matches!(executor.resubmit(&receipt.order).await, Err(Error::Gateway(_))));
    }
}
