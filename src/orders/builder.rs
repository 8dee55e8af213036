//! Order Builder - Turns a priced purchase into an orderbook offer
//!
//! The buyer offers the payment token (amount in its smallest unit) and
//! receives the bundle's share token. Orders leave here unsigned.

use chrono::{DateTime, TimeDelta, Utc};
use num_bigint::BigUint;
use rust_decimal::Decimal;
use tracing::debug;

use crate::address::is_address;
use crate::core::config::{OrderConfig, ZERO_ADDRESS};
use crate::core::{Bundle, Error, Result, UserId};
use crate::signer::PLACEHOLDER_SIGNATURE;

use super::model::*;
use super::units::to_base_units;

pub const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

pub struct OrderBuilder {
    config: OrderConfig,
}

impl OrderBuilder {
    pub fn new(config: OrderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    /// Payment token to use: the requested one, or the configured default
    pub fn resolve_payment_token(&self, requested: Option<&str>) -> Result<String> {
        let token = requested
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.config.default_payment_token.as_str());

        if !is_address(token) {
            return Err(Error::invalid("paymentToken", format!("`{}` is not an address", token)));
        }
        Ok(token.to_string())
    }

    pub fn build_order(
        &self,
        bundle: &Bundle,
        buyer: &UserId,
        shares: u64,
        payment_token: Option<&str>,
        total_cost: Decimal,
    ) -> Result<OrderData> {
        self.build_order_at(bundle, buyer, shares, payment_token, total_cost, Utc::now())
    }

    pub fn build_order_at(
        &self,
        bundle: &Bundle,
        buyer: &UserId,
        shares: u64,
        payment_token: Option<&str>,
        total_cost: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OrderData> {
        if buyer.is_empty() {
            return Err(Error::invalid("buyer", "required"));
        }
        if shares == 0 {
            return Err(Error::invalid("shares", "must be positive"));
        }

        let payment_token = self.resolve_payment_token(payment_token)?;
        let payment_units = to_base_units(total_cost, self.config.payment_decimals)?.to_string();

        let start_time = now.timestamp();
        let end_time = TimeDelta::try_days(self.config.validity_days)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| {
                Error::Config(format!("orders.validity_days {} is out of range", self.config.validity_days))
            })?
            .timestamp();

        let offer = vec![OfferItem {
            item_type: ItemType::Erc20,
            token: payment_token,
            identifier_or_criteria: "0".to_string(),
            start_amount: payment_units.clone(),
            end_amount: payment_units,
        }];

        let consideration = vec![ConsiderationItem {
            item_type: ItemType::Erc20,
            token: bundle.token.contract_address.clone(),
            identifier_or_criteria: "0".to_string(),
            start_amount: shares.to_string(),
            end_amount: shares.to_string(),
            recipient: buyer.to_string(),
        }];

        let parameters = OrderParameters {
            offerer: buyer.to_string(),
            zone: ZERO_ADDRESS.to_string(),
            order_type: OrderType::FullOpen,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            zone_hash: ZERO_HASH.to_string(),
            salt: random_salt(),
            total_original_consideration_items: consideration.len() as u32,
            offer,
            consideration,
            conduit_key: ZERO_HASH.to_string(),
            counter: "0".to_string(),
        };

        debug!(
            "Built order for {}: {} x {} for {} ({} base units)",
            buyer, shares, bundle.symbol, total_cost, parameters.offer[0].start_amount
        );

        Ok(OrderData {
            orderbook: self.config.orderbook.clone(),
            chain_id: self.config.chain_id.clone(),
            parameters,
            signature: PLACEHOLDER_SIGNATURE.to_string(),
        })
    }
}

/// 256 random bits as a decimal integer string
fn random_salt() -> String {
    let bytes: [u8; 32] = rand::random();
    BigUint::from_bytes_be(&bytes).to_string()
}
