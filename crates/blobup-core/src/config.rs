//! Configuration: accounts, global limits, and retry policy from
//! `~/.config/blobup/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::account::Account;

/// Errors raised at configuration-load time. All of these are fatal before
/// the scheduler starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not write default config: {0}")]
    Write(#[from] toml::ser::Error),
    #[error("no accounts configured; add at least one [[accounts]] entry")]
    NoAccounts,
    #[error("duplicate account id '{0}'")]
    DuplicateAccountId(String),
    #[error("global_limits.max_parallel_uploads must be at least 1")]
    InvalidParallelism,
    #[error("account '{account}' references environment variable {var}, which is not set")]
    MissingEnv { account: String, var: String },
}

/// One `[[accounts]]` entry. `private_key = "env:VAR"` defers the secret to
/// the environment; it is resolved when the account snapshot is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,
}

/// Scheduler-wide limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalLimits {
    /// Upper bound on concurrently running uploads (worker pool size).
    pub max_parallel_uploads: usize,
    /// Pause between scheduler polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for GlobalLimits {
    fn default() -> Self {
        Self {
            max_parallel_uploads: 5,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Retry policy for failed uploads: jobs are re-enqueued until they have
/// failed `max_attempts` times, with `backoff_ms * attempt` between tries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlobupConfig {
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub global_limits: GlobalLimits,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl BlobupConfig {
    /// Validate and build the immutable account snapshot used for a
    /// scheduling run, resolving `env:` key references.
    pub fn build_accounts(&self) -> Result<Vec<Account>, ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }
        if self.global_limits.max_parallel_uploads == 0 {
            return Err(ConfigError::InvalidParallelism);
        }

        let mut seen = std::collections::HashSet::new();
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for acc in &self.accounts {
            if !seen.insert(acc.id.as_str()) {
                return Err(ConfigError::DuplicateAccountId(acc.id.clone()));
            }
            let private_key = match acc.private_key.as_deref() {
                Some(key) => Some(resolve_key(&acc.name, key)?),
                None => None,
            };
            accounts.push(Account {
                id: acc.id.clone(),
                name: acc.name.clone(),
                address: acc.address.clone(),
                private_key,
                weight: acc.weight,
                balance: acc.balance,
            });
        }
        Ok(accounts)
    }
}

fn resolve_key(account: &str, key: &str) -> Result<String, ConfigError> {
    match key.strip_prefix("env:") {
        Some(var) => std::env::var(var).map_err(|_| ConfigError::MissingEnv {
            account: account.to_string(),
            var: var.to_string(),
        }),
        None => Ok(key.to_string()),
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("blobup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, writing a default file if none exists.
/// Account validation is deferred to `build_accounts` so read-only commands
/// (e.g. `status`) work against an unedited default config.
pub fn load_or_init() -> Result<BlobupConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BlobupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<BlobupConfig, ConfigError> {
    let data = fs::read_to_string(path)?;
    let cfg: BlobupConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_account() -> AccountConfig {
        AccountConfig {
            id: "acc-1".to_string(),
            name: "primary".to_string(),
            address: "0xabc".to_string(),
            private_key: None,
            weight: None,
            balance: None,
        }
    }

    #[test]
    fn default_config_values() {
        let cfg = BlobupConfig::default();
        assert!(cfg.accounts.is_empty());
        assert_eq!(cfg.global_limits.max_parallel_uploads, 5);
        assert_eq!(cfg.global_limits.poll_interval_ms, 500);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.backoff_ms, 1000);
    }

    #[test]
    fn config_toml_roundtrip() {
        let toml = r#"
            [[accounts]]
            id = "acc-1"
            name = "primary"
            address = "0xabc"
            weight = 2.5
            balance = 1000

            [[accounts]]
            id = "acc-2"
            name = "backup"
            address = "0xdef"

            [global_limits]
            max_parallel_uploads = 8
            poll_interval_ms = 250

            [retry]
            max_attempts = 5
            backoff_ms = 200
        "#;
        let cfg: BlobupConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.accounts.len(), 2);
        assert_eq!(cfg.accounts[0].weight, Some(2.5));
        assert_eq!(cfg.accounts[0].balance, Some(1000));
        assert_eq!(cfg.accounts[1].private_key, None);
        assert_eq!(cfg.global_limits.max_parallel_uploads, 8);
        assert_eq!(cfg.global_limits.poll_interval_ms, 250);
        assert_eq!(cfg.retry.max_attempts, 5);

        let back: BlobupConfig = toml::from_str(&toml::to_string_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(back.accounts.len(), 2);
        assert_eq!(back.global_limits.max_parallel_uploads, 8);
    }

    #[test]
    fn build_accounts_requires_accounts() {
        let cfg = BlobupConfig::default();
        assert!(matches!(
            cfg.build_accounts().unwrap_err(),
            ConfigError::NoAccounts
        ));
    }

    #[test]
    fn build_accounts_rejects_duplicate_ids() {
        let cfg = BlobupConfig {
            accounts: vec![one_account(), one_account()],
            ..Default::default()
        };
        assert!(matches!(
            cfg.build_accounts().unwrap_err(),
            ConfigError::DuplicateAccountId(id) if id == "acc-1"
        ));
    }

    #[test]
    fn build_accounts_rejects_zero_parallelism() {
        let cfg = BlobupConfig {
            accounts: vec![one_account()],
            global_limits: GlobalLimits {
                max_parallel_uploads: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            cfg.build_accounts().unwrap_err(),
            ConfigError::InvalidParallelism
        ));
    }

    #[test]
    fn env_key_reference_is_resolved() {
        std::env::set_var("BLOBUP_TEST_KEY", "sekrit");
        let mut acc = one_account();
        acc.private_key = Some("env:BLOBUP_TEST_KEY".to_string());
        let cfg = BlobupConfig {
            accounts: vec![acc],
            ..Default::default()
        };
        let accounts = cfg.build_accounts().unwrap();
        assert_eq!(accounts[0].private_key.as_deref(), Some("sekrit"));
        std::env::remove_var("BLOBUP_TEST_KEY");
    }

    #[test]
    fn missing_env_key_is_an_error() {
        let mut acc = one_account();
        acc.private_key = Some("env:BLOBUP_TEST_KEY_MISSING".to_string());
        let cfg = BlobupConfig {
            accounts: vec![acc],
            ..Default::default()
        };
        assert!(matches!(
            cfg.build_accounts().unwrap_err(),
            ConfigError::MissingEnv { var, .. } if var == "BLOBUP_TEST_KEY_MISSING"
        ));
    }

    #[test]
    fn literal_private_key_passes_through() {
        let mut acc = one_account();
        acc.private_key = Some("0xdeadbeef".to_string());
        let cfg = BlobupConfig {
            accounts: vec![acc],
            ..Default::default()
        };
        let accounts = cfg.build_accounts().unwrap();
        assert_eq!(accounts[0].private_key.as_deref(), Some("0xdeadbeef"));
    }
}
