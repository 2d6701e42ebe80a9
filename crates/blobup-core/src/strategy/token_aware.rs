//! Balance-aware selection: pick the account with the most tokens.

use super::SelectionStrategy;
use crate::account::Account;

/// Stateless. Selects the account with the strictly highest balance; a
/// missing balance counts as zero, and ties resolve to the first maximal
/// account in input order.
#[derive(Debug, Default)]
pub struct TokenAwareStrategy;

impl SelectionStrategy for TokenAwareStrategy {
    fn select_account(&self, accounts: &[Account]) -> Option<Account> {
        accounts
            .iter()
            .reduce(|best, acc| {
                if acc.effective_balance() > best.effective_balance() {
                    acc
                } else {
                    best
                }
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_accounts;
    use super::*;

    #[test]
    fn picks_highest_balance() {
        let accounts = test_accounts(&[
            ("a", None, Some(100)),
            ("b", None, Some(500)),
            ("c", None, Some(200)),
        ]);
        let strategy = TokenAwareStrategy;
        assert_eq!(strategy.select_account(&accounts).unwrap().name, "b");
    }

    #[test]
    fn missing_balance_counts_as_zero() {
        let accounts = test_accounts(&[("a", None, None), ("b", None, Some(1))]);
        let strategy = TokenAwareStrategy;
        assert_eq!(strategy.select_account(&accounts).unwrap().name, "b");
    }

    #[test]
    fn ties_resolve_to_first_in_order() {
        let accounts = test_accounts(&[
            ("a", None, Some(300)),
            ("b", None, Some(300)),
            ("c", None, Some(10)),
        ]);
        let strategy = TokenAwareStrategy;
        assert_eq!(strategy.select_account(&accounts).unwrap().name, "a");
    }

    #[test]
    fn empty_list_yields_none() {
        assert!(TokenAwareStrategy.select_account(&[]).is_none());
    }
}
