//! Strongly-typed identifiers used across the ledger.
//!
//! Banks, clients and accounts get small sequential ids handed out by the
//! registry that owns them. Tariffs and transactions are created by callers
//! before any registry sees them, so they carry time-ordered UUIDs instead.

use core::marker::PhantomData;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BankError;

/// Identifier of a bank inside a central registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(u64);

/// Identifier of a client inside one bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u64);

/// Identifier of an account inside one bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

/// Identifier of a tariff (stable across banks).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TariffId(Uuid);

/// Identifier of a transaction or of one of its legs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

macro_rules! impl_sequential_id {
    ($t:ty, $prefix:literal) => {
        impl $t {
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(&self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl From<u64> for $t {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = BankError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                digits.parse::<u64>().map(Self).map_err(|e| {
                    BankError::validation(format!("invalid {} id '{}': {}", $prefix, s, e))
                })
            }
        }
    };
}

macro_rules! impl_uuid_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $t {
            type Err = BankError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| BankError::validation(format!("invalid {}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_sequential_id!(BankId, "bank");
impl_sequential_id!(ClientId, "client");
impl_sequential_id!(AccountId, "acc");

impl_uuid_id!(TariffId, "TariffId");
impl_uuid_id!(TransactionId, "TransactionId");

/// Monotonic id allocator owned by a registry.
#[derive(Debug, Clone)]
pub struct IdSequence<T> {
    next: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: From<u64>> IdSequence<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            _marker: PhantomData,
        }
    }

    /// Hand out the next id. Ids are never reused, even after removal.
    pub fn next_id(&mut self) -> T {
        let id = T::from(self.next);
        self.next += 1;
        id
    }
}

impl<T: From<u64>> Default for IdSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}
