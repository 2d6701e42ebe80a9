//! Round-robin selection: cycle through accounts in input order.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::SelectionStrategy;
use crate::account::Account;

/// Cycles through the candidate list in order. The counter lives for the
/// strategy instance, not per account set: if the set changes size between
/// calls the effective position shifts (index is mod the current length).
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    counter: AtomicUsize,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobinStrategy {
    fn select_account(&self, accounts: &[Account]) -> Option<Account> {
        if accounts.is_empty() {
            return None;
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(accounts[n % accounts.len()].clone())
    }
}
