//! Exchange Gateway - Remote orderbook access
//!
//! The trait lives in `core::traits`; this module holds the REST client and
//! its wire models.

pub mod client;
pub mod model;

pub use client::DomaClient;
pub use model::{Currency, FeeSchedule, MarketplaceFee, SubmittedOrder};
