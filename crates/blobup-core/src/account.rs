//! Upload account identity used by the selection strategies.

/// A credentialed upload account. The list of accounts is loaded from config
/// at startup and stays immutable for the lifetime of a scheduling run.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub address: String,
    /// Signing key, resolved from the environment at config-load time when
    /// referenced as `env:VAR`. Never logged.
    pub private_key: Option<String>,
    /// Relative weight for weighted-random selection (missing or
    /// non-positive values count as 1).
    pub weight: Option<f64>,
    /// Token balance in base units, for balance-aware selection
    /// (missing counts as zero).
    pub balance: Option<u64>,
}

impl Account {
    /// Effective weight for weighted-random selection.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w > 0.0 => w,
            _ => 1.0,
        }
    }

    /// Effective balance for balance-aware selection.
    pub fn effective_balance(&self) -> u64 {
        self.balance.unwrap_or(0)
    }
}
