//! Least-loaded selection: prefer the account with the fewest in-flight jobs.

use std::collections::HashMap;
use std::sync::Mutex;

use super::SelectionStrategy;
use crate::account::Account;

/// Tracks a per-account load counter. Selection picks the candidate with the
/// minimal counter (first minimum wins, stable by input order) and counts the
/// selection as one in-flight job; `on_job_finished` releases it when the
/// dispatched job settles, so the counters reflect live load rather than
/// cumulative history.
#[derive(Debug, Default)]
pub struct LeastLoadedStrategy {
    loads: Mutex<HashMap<String, u64>>,
}

impl LeastLoadedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_load(&self, account_id: &str) {
        let mut loads = self.loads.lock().unwrap();
        *loads.entry(account_id.to_string()).or_insert(0) += 1;
    }

    pub fn decrement_load(&self, account_id: &str) {
        let mut loads = self.loads.lock().unwrap();
        if let Some(load) = loads.get_mut(account_id) {
            *load = load.saturating_sub(1);
        }
    }

    #[cfg(test)]
    fn load_of(&self, account_id: &str) -> u64 {
        *self.loads.lock().unwrap().get(account_id).unwrap_or(&0)
    }
}

impl SelectionStrategy for LeastLoadedStrategy {
    fn select_account(&self, accounts: &[Account]) -> Option<Account> {
        let mut loads = self.loads.lock().unwrap();

        let mut selected: Option<&Account> = None;
        let mut min_load = u64::MAX;
        for account in accounts {
            let load = *loads.entry(account.id.clone()).or_insert(0);
            if load < min_load {
                min_load = load;
                selected = Some(account);
            }
        }

        let selected = selected?;
        *loads.entry(selected.id.clone()).or_insert(0) += 1;
        Some(selected.clone())
    }

    fn on_job_finished(&self, account_id: &str) {
        self.decrement_load(account_id);
    }
}
