//! End-to-end trading scenarios on the in-memory stack

use std::str::FromStr;
use std::sync::Arc;

use domain_etf::catalog::{InMemoryCatalog, NewBundle};
use domain_etf::core::config::OrderConfig;
use domain_etf::core::{BundleCatalog, BundleId, Ledger, Purchase, UserId};
use domain_etf::ledger::InMemoryLedger;
use domain_etf::orders::{OrderBuilder, from_base_units, to_base_units};
use domain_etf::valuation::{ReferenceValuation, ValuationEngine};
use domain_etf::{Error, SubmissionStatus, TradeExecutor};
use num_bigint::BigUint;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn valuation() -> ValuationEngine {
    ValuationEngine::new(Arc::new(ReferenceValuation::deterministic(
        [("alpha.eth", Decimal::from(50_000)), ("beta.eth", Decimal::from(30_000))],
        Decimal::from(10_000),
    )))
}

async fn setup(balance: i64) -> (Arc<TradeExecutor>, Arc<InMemoryLedger>, BundleId) {
    let catalog = Arc::new(InMemoryCatalog::new(1000));
    let bundle = catalog
        .create(NewBundle {
            name: "Alpha Beta".into(),
            symbol: "AB".into(),
            domains: vec!["alpha.eth".into(), "beta.eth".into()],
            shares: Some(1000),
            ..NewBundle::default()
        })
        .await
        .unwrap();

    let ledger = Arc::new(InMemoryLedger::new(Decimal::from(balance)));
    let executor = TradeExecutor::new(
        catalog,
        ledger.clone(),
        valuation(),
        OrderBuilder::new(OrderConfig::default()),
    );
    (Arc::new(executor), ledger, bundle.id)
}

#[tokio::test]
async fn test_buy_then_insufficient_funds() {
    let (executor, ledger, id) = setup(1000).await;
    let buyer = UserId::new("0xbuyer");

    let receipt = executor.buy(id, &buyer, 10, None).await.unwrap();
    assert_eq!(receipt.price_per_share, Decimal::from(80));
    assert_eq!(receipt.total_cost, Decimal::from(800));
    assert_eq!(receipt.balance_after, Decimal::from(200));
    assert_eq!(receipt.holding.shares_owned, 10);
    assert_eq!(receipt.holding.total_invested, Decimal::from(800));
    assert_eq!(receipt.submission, SubmissionStatus::Deferred);

    let before = ledger.find_account(&buyer).await.unwrap().unwrap();

    let err = executor.buy(id, &buyer, 5, None).await.unwrap_err();
    match err {
        Error::InsufficientFunds { available, required, .. } => {
            assert_eq!(available, Decimal::from(200));
            assert_eq!(required, Decimal::from(400));
        }
        other => panic!("unexpected {:?}", other),
    }

    let after = ledger.find_account(&buyer).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_offer_amount_matches_cost() {
    let (executor, _, id) = setup(1000).await;
    let receipt = executor.buy(id, &UserId::new("0xbuyer"), 3, None).await.unwrap();

    let offer = &receipt.order.parameters.offer[0];
    let units = BigUint::from_str(&offer.start_amount).unwrap();
    assert_eq!(from_base_units(&units, 18).unwrap(), receipt.total_cost);
    assert_eq!(receipt.order.parameters.consideration[0].start_amount, "3");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_buys_same_user_one_wins() {
    let (executor, ledger, id) = setup(1000).await;
    let buyer = UserId::new("0xracer");

    // 800 each, 1600 together
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let executor = executor.clone();
            let buyer = buyer.clone();
            tokio::spawn(async move { executor.buy(id, &buyer, 10, None).await })
        })
        .collect();

    let mut ok = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => ok += 1,
            Err(Error::InsufficientFunds { .. }) => insufficient += 1,
            Err(e) => panic!("unexpected {:?}", e),
        }
    }
    assert_eq!((ok, insufficient), (1, 1));

    let account = ledger.find_account(&buyer).await.unwrap().unwrap();
    assert_eq!(account.balance, Decimal::from(200));
    assert_eq!(account.holding(id).unwrap().shares_owned, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_users_trade_independently() {
    let (executor, ledger, id) = setup(1000).await;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let executor = executor.clone();
            tokio::spawn(async move { executor.buy(id, &UserId::new(format!("0xuser{}", i)), 10, None).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(ledger.account_count(), 8);
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

proptest! {
    #[test]
    fn test_balance_drops_by_shares_times_price(shares in 1u64..=12) {
        let rt = runtime();
        let (executor, ledger, id) = rt.block_on(setup(1000));
        let buyer = UserId::new("0xbuyer");

        let receipt = rt.block_on(executor.buy(id, &buyer, shares, None)).unwrap();
        let account = rt.block_on(ledger.find_account(&buyer)).unwrap().unwrap();
        prop_assert_eq!(account.balance, Decimal::from(1000) - Decimal::from(shares) * Decimal::from(80));
        prop_assert_eq!(receipt.balance_after, account.balance);
    }

    #[test]
    fn test_holdings_aggregate_in_any_order(
        purchases in prop::collection::vec((1u64..100, 0i64..100_000), 1..20)
    ) {
        let rt = runtime();
        let forward = InMemoryLedger::new(Decimal::from(1_000_000_000));
        let backward = InMemoryLedger::new(Decimal::from(1_000_000_000));
        let user = UserId::new("0xbuyer");
        let purchase = |&(shares, cents): &(u64, i64)| Purchase {
            user: user.clone(),
            bundle_id: BundleId(1),
            shares,
            cost: Decimal::new(cents, 2),
            at: chrono::Utc::now(),
        };

        for p in purchases.iter().map(purchase) {
            rt.block_on(forward.apply_purchase(&p)).unwrap();
        }
        for p in purchases.iter().rev().map(purchase) {
            rt.block_on(backward.apply_purchase(&p)).unwrap();
        }

        let a = rt.block_on(forward.find_holding(&user, BundleId(1))).unwrap().unwrap();
        let b = rt.block_on(backward.find_holding(&user, BundleId(1))).unwrap().unwrap();
        let total_shares: u64 = purchases.iter().map(|(s, _)| s).sum();
        let total_cost: Decimal = purchases.iter().map(|(_, c)| Decimal::new(*c, 2)).sum();

        prop_assert_eq!(a.shares_owned, total_shares);
        prop_assert_eq!(b.shares_owned, total_shares);
        prop_assert_eq!(a.total_invested, total_cost);
        prop_assert_eq!(b.total_invested, total_cost);
    }

    #[test]
    fn test_base_units_round_trip(mantissa in 0i64..1_000_000_000, scale in 0u32..=18) {
        let amount = Decimal::new(mantissa, scale);
        let units = to_base_units(amount, 18).unwrap();
        prop_assert_eq!(from_base_units(&units, 18).unwrap(), amount);
    }

    #[test]
    fn test_price_times_shares_is_total(
        values in prop::collection::vec(1i64..1_000_000, 1..10),
        shares in 1u64..10_000_000
    ) {
        let domains: Vec<String> = (0..values.len()).map(|i| format!("d{}.eth", i)).collect();
        let engine = ValuationEngine::new(Arc::new(ReferenceValuation::deterministic(
            domains.iter().cloned().zip(values.iter().map(|v| Decimal::from(*v))),
            Decimal::ZERO,
        )));

        let total = engine.value(&domains);
        let price = engine.price_per_share(total, shares).unwrap();
        let drift = (price * Decimal::from(shares) - total).abs();
        prop_assert!(drift <= Decimal::new(1, 12), "drift {}", drift);
    }
}
