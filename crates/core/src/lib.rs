//! `banks-core`: ledger foundation building blocks.
//!
//! Pure primitives shared by the ledger crates: error taxonomy, typed ids,
//! money helpers and the clock abstraction. No IO.

pub mod clock;
pub mod error;
pub mod id;
pub mod money;
pub mod names;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BankError, BankErrorKind, BankResult};
pub use id::{AccountId, BankId, ClientId, IdSequence, TariffId, TransactionId};
pub use money::{
    DAYS_IN_YEAR, checked_product, checked_sum, daily_rate, ensure_non_negative,
    ensure_non_positive,
};
pub use names::{NameCharset, is_word_sequence, validate_name};
