//! In-memory ledger
//!
//! The account map is guarded by an `RwLock` that is only held long enough to
//! find or insert an account slot. Each account then has its own `Mutex`, so
//! a purchase's balance check and mutation form one critical section per
//! user while different users trade independently.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::core::{
    BundleId, Error, Holding, Ledger, Purchase, PurchaseOutcome, Result, UserAccount, UserId,
};

type AccountSlot = Arc<Mutex<UserAccount>>;

pub struct InMemoryLedger {
    accounts: RwLock<HashMap<UserId, AccountSlot>>,
    starting_balance: Decimal,
}

impl InMemoryLedger {
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            starting_balance,
        }
    }

    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    fn existing(&self, user: &UserId) -> Option<AccountSlot> {
        self.accounts.read().get(user).cloned()
    }

    fn slot(&self, user: &UserId) -> AccountSlot {
        if let Some(slot) = self.existing(user) {
            return slot;
        }

        let mut accounts = self.accounts.write();
        accounts
            .entry(user.clone())
            .or_insert_with(|| {
                debug!("Opened account {} with balance {}", user, self.starting_balance);
                Arc::new(Mutex::new(UserAccount::new(user.clone(), self.starting_balance)))
            })
            .clone()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get_or_create_account(&self, user: &UserId) -> Result<UserAccount> {
        let slot = self.slot(user);
        let account = slot.lock().clone();
        Ok(account)
    }

    async fn find_account(&self, user: &UserId) -> Result<Option<UserAccount>> {
        Ok(self.existing(user).map(|slot| slot.lock().clone()))
    }

    async fn find_holding(&self, user: &UserId, bundle_id: BundleId) -> Result<Option<Holding>> {
        Ok(self
            .existing(user)
            .and_then(|slot| slot.lock().holding(bundle_id).cloned()))
    }

    async fn apply_purchase(&self, purchase: &Purchase) -> Result<PurchaseOutcome> {
        if purchase.shares == 0 {
            return Err(Error::invalid("shares", "must be positive"));
        }
        if purchase.cost.is_sign_negative() {
            return Err(Error::invalid("cost", format!("negative cost {}", purchase.cost)));
        }

        let slot = self.slot(&purchase.user);
        let mut account = slot.lock();

        if account.balance < purchase.cost {
            return Err(Error::InsufficientFunds {
                user: purchase.user.to_string(),
                available: account.balance,
                required: purchase.cost,
            });
        }

        // Build the new holding before touching the balance so an overflow
        // leaves the account as it was.
        let holding = match account.holding(purchase.bundle_id) {
            Some(existing) => Holding {
                shares_owned: existing
                    .shares_owned
                    .checked_add(purchase.shares)
                    .ok_or_else(|| Error::invalid("shares", "holding would overflow"))?,
                total_invested: existing
                    .total_invested
                    .checked_add(purchase.cost)
                    .ok_or_else(|| Error::invalid("cost", "invested total would overflow"))?,
                ..existing.clone()
            },
            None => Holding {
                bundle_id: purchase.bundle_id,
                shares_owned: purchase.shares,
                total_invested: purchase.cost,
                first_purchase_at: purchase.at,
            },
        };

        account.balance -= purchase.cost;
        account.holdings.insert(purchase.bundle_id, holding.clone());

        Ok(PurchaseOutcome {
            balance_after: account.balance,
            holding,
        })
    }
}
