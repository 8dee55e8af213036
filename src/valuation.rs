//! Valuation Engine - Prices bundles from their constituent assets
//!
//! Known assets come from a reference table. Unknown assets get a
//! placeholder value drawn uniformly from a configured range, so repeated
//! reads of the same bundle may differ. Inject a deterministic source
//! where that matters.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::config::ValuationConfig;
use crate::core::{Bundle, BundleQuote, Error, Result, ValuationSource};

/// How assets missing from the reference table are valued
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnknownAssetPolicy {
    /// Uniform in [min, max), cent resolution
    Random { min: Decimal, max: Decimal },
    /// Always the same value
    Fixed(Decimal),
}

/// Reference-table valuation
pub struct ReferenceValuation {
    values: BTreeMap<String, Decimal>,
    unknown: UnknownAssetPolicy,
}

impl ReferenceValuation {
    pub fn new(values: BTreeMap<String, Decimal>, unknown: UnknownAssetPolicy) -> Self {
        Self { values, unknown }
    }

    pub fn from_config(config: &ValuationConfig) -> Self {
        let unknown = match config.deterministic_fallback {
            Some(value) => UnknownAssetPolicy::Fixed(value),
            None => UnknownAssetPolicy::Random {
                min: config.unknown_min,
                max: config.unknown_max,
            },
        };
        Self::new(config.reference_values.clone(), unknown)
    }

    /// Fully deterministic source: unknown assets get `fallback`, day change is zero
    pub fn deterministic<I, S>(values: I, fallback: Decimal) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(values, UnknownAssetPolicy::Fixed(fallback))
    }

    pub fn is_known(&self, asset: &str) -> bool {
        self.values.contains_key(asset)
    }
}

impl ValuationSource for ReferenceValuation {
    fn asset_value(&self, asset: &str) -> Decimal {
        if let Some(value) = self.values.get(asset) {
            return *value;
        }
        match self.unknown {
            UnknownAssetPolicy::Random { min, max } => random_between(min, max),
            UnknownAssetPolicy::Fixed(value) => value,
        }
    }

    fn day_change(&self) -> Decimal {
        match self.unknown {
            UnknownAssetPolicy::Random { .. } => random_between(Decimal::from(-5), Decimal::from(5)),
            UnknownAssetPolicy::Fixed(_) => Decimal::ZERO,
        }
    }
}

fn random_between(min: Decimal, max: Decimal) -> Decimal {
    let span = ((max - min) * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u64()
        .unwrap_or(0);
    if span == 0 {
        return min;
    }
    let offset = rand::random::<u64>() % span;
    min + Decimal::new(offset as i64, 2)
}

/// Valuation Engine - Sums asset values and derives share prices
#[derive(Clone)]
pub struct ValuationEngine {
    source: Arc<dyn ValuationSource>,
}

impl ValuationEngine {
    pub fn new(source: Arc<dyn ValuationSource>) -> Self {
        Self { source }
    }

    /// Aggregate value of a set of asset identifiers
    pub fn value<S: AsRef<str>>(&self, domains: &[S]) -> Decimal {
        domains
            .iter()
            .map(|d| self.source.asset_value(d.as_ref()))
            .sum()
    }

    pub fn price_per_share(&self, total_value: Decimal, shares: u64) -> Result<Decimal> {
        if shares == 0 {
            return Err(Error::InvalidState("bundle has zero shares".into()));
        }
        Ok(total_value / Decimal::from(shares))
    }

    /// Live quote: value, price per share and day change, all from one read
    pub fn quote(&self, bundle: &Bundle) -> Result<BundleQuote> {
        let total_value = self.value(&bundle.domains);
        let price_per_share = self
            .price_per_share(total_value, bundle.shares)
            .map_err(|_| Error::InvalidState(format!("bundle {} has zero shares", bundle.id)))?;

        Ok(BundleQuote {
            bundle: bundle.clone(),
            total_value,
            price_per_share,
            day_change: self.source.day_change(),
        })
    }

    /// Illustrative only, never feeds balance-affecting logic
    pub fn day_change(&self) -> Decimal {
        self.source.day_change()
    }
}
