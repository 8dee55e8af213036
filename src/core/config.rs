//! Configuration - Type-safe, validated config
//!
//! Loads from `config.toml`; the gateway credential comes from the
//! environment (`DOMA_API_KEY`, `.env` supported).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::NewBundle;
use crate::core::{Error, Result};

pub const API_KEY_ENV: &str = "DOMA_API_KEY";
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
/// Longest order validity accepted (ten years)
pub const MAX_VALIDITY_DAYS: i64 = 3650;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub catalog: CatalogConfig,
    pub valuation: ValuationConfig,
    pub gateway: GatewayConfig,
    pub orders: OrderConfig,

    /// Bundles loaded into the catalog at startup
    pub bundles: Vec<NewBundle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Balance granted to an account on its first trade
    pub starting_balance: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::from(10_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Total share supply for bundles created without an explicit count
    pub default_shares: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { default_shares: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Known asset values
    pub reference_values: BTreeMap<String, Decimal>,
    /// Lower bound (inclusive) for unknown assets
    pub unknown_min: Decimal,
    /// Upper bound (exclusive) for unknown assets
    pub unknown_max: Decimal,
    /// Fixed value for unknown assets; makes valuation deterministic
    pub deterministic_fallback: Option<Decimal>,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        let reference_values = [
            ("crypto.eth", 50_000),
            ("defi.eth", 30_000),
            ("web3.eth", 25_000),
            ("nft.eth", 20_000),
            ("play.eth", 15_000),
            ("game.eth", 12_000),
            ("meta.eth", 18_000),
            ("vr.eth", 8_000),
            ("ar.eth", 7_000),
            ("finance.eth", 40_000),
            ("bank.eth", 35_000),
            ("money.eth", 30_000),
            ("invest.eth", 25_000),
        ]
        .into_iter()
        .map(|(domain, value)| (domain.to_string(), Decimal::from(value)))
        .collect();

        Self {
            reference_values,
            unknown_min: Decimal::from(5_000),
            unknown_max: Decimal::from(25_000),
            deterministic_fallback: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Submit orders to the remote orderbook; when false orders get mock ids
    pub enabled: bool,
    pub base_url: String,
    /// API credential (loaded from env if not provided)
    pub api_key: Option<String>,
    pub submit_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api-testnet.doma.xyz".to_string(),
            api_key: None,
            submit_timeout_ms: 10_000,
        }
    }
}

impl GatewayConfig {
    /// Non-empty API credential, if any
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Gateway calls actually happen only with a credential
    pub fn submission_enabled(&self) -> bool {
        self.enabled && self.credential().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    pub orderbook: String,
    pub chain_id: String,
    pub validity_days: i64,
    /// Decimals of the payment asset's smallest unit
    pub payment_decimals: u32,
    pub default_payment_token: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            orderbook: "doma".to_string(),
            chain_id: "ethereum:11155111".to_string(),
            validity_days: 30,
            payment_decimals: 18,
            default_payment_token: ZERO_ADDRESS.to_string(),
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {}", path.display(), e)))?;

        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults
    pub fn load_default() -> Self {
        let candidates = [
            Path::new("config.toml"),
            Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")),
        ];

        Self::load_first(&candidates).unwrap_or_else(|| {
            tracing::warn!("⚠️ No usable config.toml found, using defaults");
            Self::default()
        })
    }

    /// First candidate that exists and loads; broken files are skipped with a warning
    pub fn load_first(candidates: &[&Path]) -> Option<Self> {
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(cfg) => {
                    tracing::info!("📋 Loaded config from {}", path.display());
                    return Some(cfg);
                }
                Err(e) => tracing::warn!("⚠️ Ignoring {}: {}", path.display(), e),
            }
        }
        None
    }

    /// Apply `DOMA_API_KEY` from the environment (and `.env`)
    pub fn with_env_overrides(mut self) -> Self {
        dotenv::dotenv().ok();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.gateway.api_key = Some(key);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger.starting_balance.is_sign_negative() {
            return Err(Error::Config("ledger.starting_balance must be non-negative".into()));
        }
        if self.catalog.default_shares == 0 {
            return Err(Error::Config("catalog.default_shares must be positive".into()));
        }
        for (asset, value) in &self.valuation.reference_values {
            if value.is_sign_negative() {
                return Err(Error::Config(format!(
                    "valuation.reference_values.\"{}\" must be non-negative, got {}",
                    asset, value
                )));
            }
        }
        if self.valuation.unknown_min.is_sign_negative() {
            return Err(Error::Config(format!(
                "valuation.unknown_min must be non-negative, got {}",
                self.valuation.unknown_min
            )));
        }
        if let Some(fallback) = self.valuation.deterministic_fallback {
            if fallback.is_sign_negative() {
                return Err(Error::Config(format!(
                    "valuation.deterministic_fallback must be non-negative, got {}",
                    fallback
                )));
            }
        }
        if self.valuation.unknown_min >= self.valuation.unknown_max {
            return Err(Error::Config(format!(
                "valuation.unknown_min ({}) must be below unknown_max ({})",
                self.valuation.unknown_min, self.valuation.unknown_max
            )));
        }
        if !(1..=MAX_VALIDITY_DAYS).contains(&self.orders.validity_days) {
            return Err(Error::Config(format!(
                "orders.validity_days must be in 1..={}, got {}",
                MAX_VALIDITY_DAYS, self.orders.validity_days
            )));
        }
        // rust_decimal carries at most 28 fractional digits
        if self.orders.payment_decimals > 28 {
            return Err(Error::Config(format!(
                "orders.payment_decimals {} exceeds 28",
                self.orders.payment_decimals
            )));
        }
        Ok(())
    }
}
