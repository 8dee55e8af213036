//! Smallest-unit conversion
//!
//! Amounts stay in `Decimal` until the last step and are scaled with
//! arbitrary-precision integers, so 18-decimal tokens never pass through
//! floating point.

use num_bigint::BigUint;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{Error, Result};

/// `amount * 10^decimals` as an integer, rounded half-even at `decimals` places
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<BigUint> {
    if amount < Decimal::ZERO {
        return Err(Error::Conversion(format!("negative amount {}", amount)));
    }

    let rounded = amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
    let mantissa = u128::try_from(rounded.mantissa())
        .map_err(|_| Error::Conversion(format!("negative mantissa for {}", amount)))?;
    let exponent = decimals.saturating_sub(rounded.scale());

    Ok(BigUint::from(mantissa) * BigUint::from(10u32).pow(exponent))
}

/// Inverse of [`to_base_units`]
pub fn from_base_units(units: &BigUint, decimals: u32) -> Result<Decimal> {
    let value = i128::try_from(units)
        .map_err(|_| Error::Conversion(format!("{} does not fit a decimal", units)))?;
    Decimal::try_from_i128_with_scale(value, decimals)
        .map(|d| d.normalize())
        .map_err(|e| Error::Conversion(format!("{} with {} decimals: {}", units, decimals, e)))
}
