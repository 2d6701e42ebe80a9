//! Weighted-random selection: draw proportionally to account weights.

use rand::Rng;

use super::SelectionStrategy;
use crate::account::Account;

/// Stateless. Draws a uniform value in `[0, total_weight)` and walks the
/// list subtracting each account's weight until the remainder drops to or
/// below zero. Missing or non-positive weights count as 1. Falls back to the
/// first account if rounding keeps the remainder positive.
#[derive(Debug, Default)]
pub struct WeightedRandomStrategy;

impl SelectionStrategy for WeightedRandomStrategy {
    fn select_account(&self, accounts: &[Account]) -> Option<Account> {
        if accounts.is_empty() {
            return None;
        }

        let total: f64 = accounts.iter().map(Account::effective_weight).sum();
        let mut remaining = rand::thread_rng().gen::<f64>() * total;

        for account in accounts {
            remaining -= account.effective_weight();
            if remaining <= 0.0 {
                return Some(account.clone());
            }
        }
        accounts.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_accounts;
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn heavier_accounts_win_more_often() {
        let accounts = test_accounts(&[
            ("light", Some(1.0), None),
            ("heavy", Some(3.0), None),
            ("mid", Some(2.0), None),
        ]);
        let strategy = WeightedRandomStrategy;

        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..1000 {
            let picked = strategy.select_account(&accounts).unwrap();
            *counts.entry(picked.name).or_insert(0) += 1;
        }

        // Statistical, not exact: weight 3 beating weight 1 over 1000 draws
        // fails with negligible probability.
        assert!(counts["heavy"] > counts["light"]);
        assert_eq!(counts.values().sum::<u32>(), 1000);
    }

    #[test]
    fn missing_and_non_positive_weights_default_to_one() {
        let accounts = test_accounts(&[("a", None, None), ("b", Some(-2.0), None)]);
        let strategy = WeightedRandomStrategy;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(strategy.select_account(&accounts).unwrap().name);
        }
        // Equal effective weights: both should appear.
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn single_account_always_selected() {
        let accounts = test_accounts(&[("only", Some(0.5), None)]);
        let strategy = WeightedRandomStrategy;
        for _ in 0..10 {
            assert_eq!(strategy.select_account(&accounts).unwrap().name, "only");
        }
    }

    #[test]
    fn empty_list_yields_none() {
        assert!(WeightedRandomStrategy.select_account(&[]).is_none());
    }
}
