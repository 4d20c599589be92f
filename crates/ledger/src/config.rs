//! Bank and registry configuration.
//!
//! Configs are plain serde structs. They can be read from JSON or assembled
//! from `BANKS_*` environment variables with built-in defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use banks_core::{BankError, BankResult};

use crate::tariff::{CreditCondition, DepositTier, MAX_BOUNDARY, Tariff};

pub const MAX_CLIENTS_ENV: &str = "BANKS_MAX_CLIENTS";
pub const MAX_CLIENT_ACCOUNTS_ENV: &str = "BANKS_MAX_CLIENT_ACCOUNTS";
pub const MAX_BANKS_ENV: &str = "BANKS_MAX_BANKS";

pub const DEFAULT_MAX_CLIENTS: usize = 1000;
pub const DEFAULT_MAX_CLIENT_ACCOUNTS: usize = 10;
pub const DEFAULT_MAX_BANKS: usize = 1024;

/// Serializable description of a deposit tier. A missing `upper` means
/// the tier is open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub lower: Decimal,
    #[serde(default)]
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

/// Serializable description of a [`Tariff`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffSpec {
    pub name: String,
    pub tiers: Vec<TierSpec>,
    pub debit_rate: Decimal,
    pub credit_lower_boundary: Decimal,
    pub credit_commission: Decimal,
    pub unverified_limit: Decimal,
}

impl TariffSpec {
    pub fn build(&self) -> BankResult<Tariff> {
        let tiers = self
            .tiers
            .iter()
            .map(|t| DepositTier::new(t.lower, t.upper.unwrap_or(MAX_BOUNDARY), t.rate))
            .collect::<BankResult<Vec<_>>>()?;

        Tariff::new(
            &self.name,
            tiers,
            self.debit_rate,
            CreditCondition::new(self.credit_lower_boundary, self.credit_commission)?,
            self.unverified_limit,
        )
    }
}

impl Default for TariffSpec {
    /// Three deposit tiers (1% below 50k, 3% below 100k, 4% above), 3%
    /// debit, credit down to -50k at 3%, 100k unverified limit.
    fn default() -> Self {
        let tier = |lower: i64, upper: Option<i64>, rate: Decimal| TierSpec {
            lower: Decimal::from(lower),
            upper: upper.map(Decimal::from),
            rate,
        };
        Self {
            name: "Default".to_string(),
            tiers: vec![
                tier(0, Some(50_000), Decimal::new(1, 2)),
                tier(50_000, Some(100_000), Decimal::new(3, 2)),
                tier(100_000, None, Decimal::new(4, 2)),
            ],
            debit_rate: Decimal::new(3, 2),
            credit_lower_boundary: Decimal::from(-50_000),
            credit_commission: Decimal::new(3, 2),
            unverified_limit: Decimal::from(100_000),
        }
    }
}

/// Per-bank settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    pub name: String,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default = "default_max_client_accounts")]
    pub max_client_accounts: usize,
    #[serde(default)]
    pub default_tariff: TariffSpec,
}

fn default_max_clients() -> usize {
    DEFAULT_MAX_CLIENTS
}

fn default_max_client_accounts() -> usize {
    DEFAULT_MAX_CLIENT_ACCOUNTS
}

impl BankConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_clients: DEFAULT_MAX_CLIENTS,
            max_client_accounts: DEFAULT_MAX_CLIENT_ACCOUNTS,
            default_tariff: TariffSpec::default(),
        }
    }

    pub fn with_limits(mut self, max_clients: usize, max_client_accounts: usize) -> Self {
        self.max_clients = max_clients;
        self.max_client_accounts = max_client_accounts;
        self
    }

    pub fn with_default_tariff(mut self, tariff: TariffSpec) -> Self {
        self.default_tariff = tariff;
        self
    }

    pub fn from_json_str(json: &str) -> BankResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BankError::validation(format!("invalid bank config: {e}")))
    }

    /// Limits from `BANKS_MAX_CLIENTS` / `BANKS_MAX_CLIENT_ACCOUNTS`.
    pub fn from_env(name: impl Into<String>) -> BankResult<Self> {
        Self::from_lookup(name, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(name: impl Into<String>, lookup: F) -> BankResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(name).with_limits(
            read_limit(&lookup, MAX_CLIENTS_ENV, DEFAULT_MAX_CLIENTS)?,
            read_limit(&lookup, MAX_CLIENT_ACCOUNTS_ENV, DEFAULT_MAX_CLIENT_ACCOUNTS)?,
        ))
    }
}

/// Registry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralBankConfig {
    #[serde(default = "default_max_banks")]
    pub max_banks: usize,
}

fn default_max_banks() -> usize {
    DEFAULT_MAX_BANKS
}

impl Default for CentralBankConfig {
    fn default() -> Self {
        Self {
            max_banks: DEFAULT_MAX_BANKS,
        }
    }
}

impl CentralBankConfig {
    pub fn from_env() -> BankResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BankResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            max_banks: read_limit(&lookup, MAX_BANKS_ENV, DEFAULT_MAX_BANKS)?,
        })
    }
}

fn read_limit<F>(lookup: &F, key: &str, default: usize) -> BankResult<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BankError::validation(format!("{key}='{raw}' is not a valid limit: {e}"))),
    }
}
