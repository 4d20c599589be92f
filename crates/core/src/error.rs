//! Ledger error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the ledger crates.
pub type BankResult<T> = Result<T, BankError>;

/// Ledger-level error.
///
/// Every check is local and synchronous; a returned error means the
/// triggering operation had no effect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    /// Malformed input to a constructor or mutator.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A configured ceiling (banks, clients, accounts per client) was reached.
    #[error("{entity} capacity exceeded (limit: {limit})")]
    CapacityExceeded { entity: &'static str, limit: usize },

    /// The referenced entity is not registered with this orchestrator.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The entity is already registered.
    #[error("duplicate {entity}: {id}")]
    Duplicate { entity: &'static str, id: String },

    /// The operation is not allowed in the current state.
    #[error("operation unavailable: {0}")]
    OperationUnavailable(String),

    /// Debit/deposit floor check failed.
    #[error("insufficient balance: balance {balance}, requested {requested}")]
    InsufficientBalance { balance: Decimal, requested: Decimal },
}

/// Class of a [`BankError`], without its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BankErrorKind {
    Validation,
    CapacityExceeded,
    NotFound,
    Duplicate,
    OperationUnavailable,
    InsufficientBalance,
}

impl BankError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn capacity(entity: &'static str, limit: usize) -> Self {
        Self::CapacityExceeded { entity, limit }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, id: impl ToString) -> Self {
        Self::Duplicate {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::OperationUnavailable(msg.into())
    }

    pub fn insufficient_balance(balance: Decimal, requested: Decimal) -> Self {
        Self::InsufficientBalance { balance, requested }
    }

    pub fn kind(&self) -> BankErrorKind {
        match self {
            Self::Validation(_) => BankErrorKind::Validation,
            Self::CapacityExceeded { .. } => BankErrorKind::CapacityExceeded,
            Self::NotFound { .. } => BankErrorKind::NotFound,
            Self::Duplicate { .. } => BankErrorKind::Duplicate,
            Self::OperationUnavailable(_) => BankErrorKind::OperationUnavailable,
            Self::InsufficientBalance { .. } => BankErrorKind::InsufficientBalance,
        }
    }
}
