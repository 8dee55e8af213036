//! Core Types - Strong typing for safety

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wallet-style user identity (e.g. "0xabc...")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId::new(s)
    }
}

/// Numeric bundle identity, assigned sequentially by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(pub u64);

impl std::fmt::Display for BundleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk tier, derived from the bundle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_category(category: &str) -> Self {
        match category {
            "Conservative" => RiskTier::Low,
            "Speculative" => RiskTier::High,
            _ => RiskTier::Medium,
        }
    }
}

/// Fungible token standing in for a bundle's shares on the orderbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleToken {
    pub name: String,
    pub symbol: String,
    pub total_supply: u64,
    pub contract_address: String,
}

/// A curated set of domain-name assets sold as fractional shares.
///
/// Price is never stored here: it is derived from the valuation engine on
/// every read (see [`BundleQuote`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: BundleId,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub domains: Vec<String>,
    pub category: String,
    pub shares: u64,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub risk: RiskTier,
    pub badges: Vec<String>,
    pub token: BundleToken,
}

/// Bundle enriched with a live valuation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleQuote {
    #[serde(flatten)]
    pub bundle: Bundle,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_share: Decimal,
    /// Illustrative only, never used for accounting
    #[serde(with = "rust_decimal::serde::str")]
    pub day_change: Decimal,
}

/// A user's aggregated position in one bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub bundle_id: BundleId,
    pub shares_owned: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_invested: Decimal,
    pub first_purchase_at: DateTime<Utc>,
}

/// Balance plus at most one holding per bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user: UserId,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    pub holdings: BTreeMap<BundleId, Holding>,
}

impl UserAccount {
    pub fn new(user: UserId, balance: Decimal) -> Self {
        Self {
            user,
            balance,
            holdings: BTreeMap::new(),
        }
    }

    pub fn holding(&self, bundle_id: BundleId) -> Option<&Holding> {
        self.holdings.get(&bundle_id)
    }
}

/// A balance-affecting purchase, already priced
#[derive(Debug, Clone)]
pub struct Purchase {
    pub user: UserId,
    pub bundle_id: BundleId,
    pub shares: u64,
    pub cost: Decimal,
    pub at: DateTime<Utc>,
}

/// Ledger state right after a purchase was applied
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub balance_after: Decimal,
    pub holding: Holding,
}

