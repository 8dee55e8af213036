//! Ledger Store - User balances and holdings

pub mod memory;

pub use memory::InMemoryLedger;
