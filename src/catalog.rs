//! Bundle Catalog - In-memory bundle records
//!
//! Bundles are validated and assigned sequential ids here. The trading core
//! only ever reads them back through [`BundleCatalog`].

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::address::derive_token_address;
use crate::core::{Bundle, BundleCatalog, BundleId, BundleToken, Error, Result, RiskTier};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_CREATOR: &str = "Anonymous";
pub const NEW_BADGE: &str = "🆕 New";

/// Bundle creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBundle {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub domains: Vec<String>,
    pub category: Option<String>,
    pub creator: Option<String>,
    /// Total share supply; catalog default when absent
    pub shares: Option<u64>,
}

/// Token descriptor for a bundle's shares
pub fn bundle_token(name: &str, symbol: &str, shares: u64) -> BundleToken {
    BundleToken {
        name: format!("{} Portfolio Token", name),
        symbol: symbol.to_string(),
        total_supply: shares,
        contract_address: derive_token_address(name),
    }
}

/// In-memory catalog
pub struct InMemoryCatalog {
    bundles: RwLock<BTreeMap<BundleId, Bundle>>,
    default_shares: u64,
}

impl InMemoryCatalog {
    pub fn new(default_shares: u64) -> Self {
        Self {
            bundles: RwLock::new(BTreeMap::new()),
            default_shares,
        }
    }

    fn build(&self, id: BundleId, new: NewBundle) -> Result<Bundle> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::invalid("name", "required"));
        }
        let symbol = new.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(Error::invalid("symbol", "required"));
        }

        let domains: Vec<String> = new
            .domains
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        if domains.is_empty() {
            return Err(Error::invalid("domains", "at least one asset identifier is required"));
        }

        let shares = new.shares.unwrap_or(self.default_shares);
        if shares == 0 {
            return Err(Error::invalid("shares", "must be positive"));
        }

        let category = new
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let creator = new
            .creator
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CREATOR.to_string());

        Ok(Bundle {
            id,
            token: bundle_token(&name, &symbol, shares),
            risk: RiskTier::from_category(&category),
            name,
            symbol,
            description: new.description,
            domains,
            category,
            shares,
            creator,
            created_at: Utc::now(),
            badges: vec![NEW_BADGE.to_string()],
        })
    }
}

#[async_trait]
impl BundleCatalog for InMemoryCatalog {
    async fn get(&self, id: BundleId) -> Result<Option<Bundle>> {
        Ok(self.bundles.read().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Bundle>> {
        Ok(self.bundles.read().values().cloned().collect())
    }

    async fn create(&self, new: NewBundle) -> Result<Bundle> {
        let mut bundles = self.bundles.write();
        let id = BundleId(bundles.len() as u64 + 1);
        let bundle = self.build(id, new)?;

        info!(
            "Created bundle {} ({}) with {} assets, {} shares",
            bundle.id,
            bundle.symbol,
            bundle.domains.len(),
            bundle.shares
        );
        bundles.insert(id, bundle.clone());
        Ok(bundle)
    }
}
