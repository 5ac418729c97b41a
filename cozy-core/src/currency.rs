//! Flower balance ledger.

use crate::KeyValueStore;
use crate::error::CozyResult;
use crate::events::{CozyEvent, EventBus};
use crate::storage::CozyRepository;

/// Credit/debit view over the persisted flower balance.
/// The balance is never negative.
pub struct FlowerLedger<'a, S: KeyValueStore> {
    repo: &'a CozyRepository<S>,
    events: &'a EventBus,
}

impl<'a, S: KeyValueStore> FlowerLedger<'a, S> {
    pub const fn new(repo: &'a CozyRepository<S>, events: &'a EventBus) -> Self {
        Self { repo, events }
    }

    #[must_use]
    pub fn balance(&self) -> u64 {
        self.repo.flowers()
    }

    #[must_use]
    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance() >= amount
    }

    /// Add `amount` flowers and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the new balance cannot be persisted.
    pub fn credit(&self, amount: u64) -> CozyResult<u64> {
        let balance = self.balance().saturating_add(amount);
        self.repo.set_flowers(balance)?;
        log::debug!("credited {amount} flowers, balance {balance}");
        self.events.emit(&CozyEvent::FlowersChanged { balance });
        Ok(balance)
    }

    /// Spend `amount` flowers. Returns `Ok(false)` without touching the
    /// balance when it is too low.
    ///
    /// # Errors
    ///
    /// Returns an error if the new balance cannot be persisted.
    pub fn debit(&self, amount: u64) -> CozyResult<bool> {
        let current = self.balance();
        if current < amount {
            log::debug!("debit of {amount} refused, balance {current}");
            return Ok(false);
        }
        let balance = current - amount;
        self.repo.set_flowers(balance)?;
        log::debug!("debited {amount} flowers, balance {balance}");
        self.events.emit(&CozyEvent::FlowersChanged { balance });
        Ok(true)
    }
}
