//! Banking ledger: tariffs, accounts, transactions, interest and the bank
//! orchestrator.
//!
//! Pure in-memory domain logic. Time comes from an injected
//! [`banks_core::Clock`]; client notifications go through
//! [`banks_events::NotificationService`].

pub mod account;
pub mod authorization;
pub mod bank;
pub mod central_bank;
pub mod config;
pub mod interest;
pub mod tariff;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use authorization::{AuthorizationContext, authorize, authorize_undo};
pub use bank::{Bank, BankLimits};
pub use central_bank::CentralBank;
pub use config::{BankConfig, CentralBankConfig, TariffSpec, TierSpec};
pub use interest::{Accrual, INTEREST_SCALE, calculate_interest};
pub use tariff::{CreditCondition, DepositTier, MAX_BOUNDARY, MIN_BOUNDARY, Tariff};
pub use transaction::{Entry, EntryKind, Transaction, TransactionKind};
