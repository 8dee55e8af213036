//! Domain ETF - Core Library
//! Fractional ownership of domain-name bundles: valuation, ledger and orderbook orders

// Public modules
pub mod core;
pub mod address;
pub mod valuation;
pub mod catalog;
pub mod ledger;
pub mod orders;
pub mod signer;
pub mod gateway;
pub mod execution;
pub mod service;

// Re-exports
pub use core::{Config, Error, Result};
pub use execution::{SubmissionStatus, TradeExecutor, TradeReceipt};
pub use service::{BundleService, BuyRequest, PortfolioView};
