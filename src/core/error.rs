//! Error handling - One hierarchy for the whole ledger

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Domain ETF error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input, rejected before any mutation
    #[error("Invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// Unknown bundle or user
    #[error("Not found: {0}")]
    NotFound(String),

    /// Balance below the cost of the trade
    #[error("Insufficient funds for {user}: available {available}, required {required}")]
    InsufficientFunds {
        user: String,
        available: Decimal,
        required: Decimal,
    },

    /// Amount cannot be expressed in the payment asset's smallest unit
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Exchange gateway rejected a call or is disabled
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Network/IO errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// True for failures that left the ledger untouched
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument { .. } | Error::NotFound(_) | Error::InsufficientFunds { .. }
        )
    }
}
