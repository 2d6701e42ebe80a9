//! Pluggable account-selection strategies.
//!
//! A strategy picks one account from the configured set for each dispatch
//! decision. Strategies are shared between the scheduler loop and per-job
//! tasks, so stateful variants use interior mutability.

mod least_loaded;
mod round_robin;
mod token_aware;
mod weighted_random;

pub use least_loaded::LeastLoadedStrategy;
pub use round_robin::RoundRobinStrategy;
pub use token_aware::TokenAwareStrategy;
pub use weighted_random::WeightedRandomStrategy;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::account::Account;

/// Account-selection policy, polymorphic over one capability.
pub trait SelectionStrategy: Send + Sync {
    /// Choose an account from the candidate set, or `None` if the set is
    /// empty. Stateful strategies may record the selection (e.g. as an
    /// in-flight load increment).
    fn select_account(&self, accounts: &[Account]) -> Option<Account>;

    /// Completion hook: called when a dispatched job settles, so strategies
    /// tracking in-flight load can release it. Default is a no-op.
    fn on_job_finished(&self, _account_id: &str) {}
}

/// Strategy selector for config/CLI use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    RoundRobin,
    LeastLoaded,
    TokenAware,
    Weighted,
}

impl StrategyKind {
    pub fn build(self) -> Arc<dyn SelectionStrategy> {
        match self {
            StrategyKind::RoundRobin => Arc::new(RoundRobinStrategy::new()),
            StrategyKind::LeastLoaded => Arc::new(LeastLoadedStrategy::new()),
            StrategyKind::TokenAware => Arc::new(TokenAwareStrategy),
            StrategyKind::Weighted => Arc::new(WeightedRandomStrategy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyKind::RoundRobin => "round-robin",
            StrategyKind::LeastLoaded => "least-loaded",
            StrategyKind::TokenAware => "token-aware",
            StrategyKind::Weighted => "weighted",
        };
        f.write_str(s)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" => Ok(StrategyKind::RoundRobin),
            "least-loaded" => Ok(StrategyKind::LeastLoaded),
            "token-aware" => Ok(StrategyKind::TokenAware),
            "weighted" => Ok(StrategyKind::Weighted),
            other => Err(format!(
                "unknown strategy '{other}' (expected round-robin, least-loaded, token-aware or weighted)"
            )),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_accounts(specs: &[(&str, Option<f64>, Option<u64>)]) -> Vec<Account> {
    specs
        .iter()
        .map(|(name, weight, balance)| Account {
            id: format!("id-{name}"),
            name: name.to_string(),
            address: format!("0x{name}"),
            private_key: None,
            weight: *weight,
            balance: *balance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_all_variants() {
        for (s, kind) in [
            ("round-robin", StrategyKind::RoundRobin),
            ("least-loaded", StrategyKind::LeastLoaded),
            ("token-aware", StrategyKind::TokenAware),
            ("weighted", StrategyKind::Weighted),
        ] {
            assert_eq!(s.parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), s);
        }
        assert!("priority".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn every_strategy_handles_empty_input() {
        for kind in [
            StrategyKind::RoundRobin,
            StrategyKind::LeastLoaded,
            StrategyKind::TokenAware,
            StrategyKind::Weighted,
        ] {
            assert!(kind.build().select_account(&[]).is_none());
        }
    }
}
