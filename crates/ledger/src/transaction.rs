//! Transactions and the history entries they leave on accounts.
//!
//! A [`Transaction`] is the unit a caller submits and undoes. It is made of
//! one or two [`Entry`] legs; each leg moves the balance of exactly one
//! account and is what ends up in that account's history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use banks_core::{AccountId, BankError, BankResult, TransactionId, ensure_non_negative};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Deposit,
    Withdraw,
    /// Posted by the interest sweep, never by callers.
    Interest,
}

impl EntryKind {
    /// Withdraw-type legs are the ones subject to floors and limits.
    pub fn is_outgoing(self) -> bool {
        matches!(self, EntryKind::Withdraw)
    }
}

/// One balance movement on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    id: TransactionId,
    transaction_id: TransactionId,
    account_id: AccountId,
    kind: EntryKind,
    amount: Decimal,
    signed_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl Entry {
    fn leg(
        id: TransactionId,
        transaction_id: TransactionId,
        account_id: AccountId,
        kind: EntryKind,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        let signed_amount = if kind.is_outgoing() { -amount } else { amount };
        Self {
            id,
            transaction_id,
            account_id,
            kind,
            amount,
            signed_amount,
            created_at,
        }
    }

    /// Interest posting; `interest` is negative for credit commission.
    pub(crate) fn interest(
        account_id: AccountId,
        interest: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        let id = TransactionId::new();
        Self {
            id,
            transaction_id: id,
            account_id,
            kind: EntryKind::Interest,
            amount: interest.abs(),
            signed_amount: interest,
            created_at,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Transaction this leg belongs to.
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Magnitude of the movement (never negative).
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Balance effect: `+amount` for deposits, `-amount` for withdrawals.
    pub fn signed_amount(&self) -> Decimal {
        self.signed_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn value_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// A deposit, withdrawal or transfer submitted to a bank.
///
/// Deposits and withdrawals have a single leg sharing the transaction id.
/// Transfers have a withdraw leg on the source followed by a deposit leg on
/// the destination, each with its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    id: TransactionId,
    kind: TransactionKind,
    amount: Decimal,
    created_at: DateTime<Utc>,
    canceled: bool,
    legs: Vec<Entry>,
}

impl Transaction {
    pub fn deposit(
        account: AccountId,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> BankResult<Self> {
        Self::single(TransactionKind::Deposit, EntryKind::Deposit, account, amount, created_at)
    }

    pub fn withdraw(
        account: AccountId,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> BankResult<Self> {
        Self::single(TransactionKind::Withdraw, EntryKind::Withdraw, account, amount, created_at)
    }

    pub fn transfer(
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> BankResult<Self> {
        let amount = ensure_non_negative(amount, "transaction amount")?;
        if from == to {
            return Err(BankError::unavailable(format!(
                "cannot transfer from {from} to itself"
            )));
        }

        let id = TransactionId::new();
        Ok(Self {
            id,
            kind: TransactionKind::Transfer,
            amount,
            created_at,
            canceled: false,
            legs: vec![
                Entry::leg(TransactionId::new(), id, from, EntryKind::Withdraw, amount, created_at),
                Entry::leg(TransactionId::new(), id, to, EntryKind::Deposit, amount, created_at),
            ],
        })
    }

    fn single(
        kind: TransactionKind,
        leg: EntryKind,
        account: AccountId,
        amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> BankResult<Self> {
        let amount = ensure_non_negative(amount, "transaction amount")?;
        let id = TransactionId::new();
        Ok(Self {
            id,
            kind,
            amount,
            created_at,
            canceled: false,
            legs: vec![Entry::leg(id, id, account, leg, amount, created_at)],
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Effect on the primary account. A transfer debits its source.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Deposit => self.amount,
            TransactionKind::Withdraw | TransactionKind::Transfer => -self.amount,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn legs(&self) -> &[Entry] {
        &self.legs
    }

    /// Account the transaction was issued against (transfer source).
    pub fn account_id(&self) -> AccountId {
        self.legs[0].account_id
    }

    /// Transfer destination, if any.
    pub fn counterparty(&self) -> Option<AccountId> {
        match self.kind {
            TransactionKind::Transfer => self.legs.get(1).map(Entry::account_id),
            _ => None,
        }
    }

    pub(crate) fn mark_canceled(&mut self) -> BankResult<()> {
        if self.canceled {
            return Err(BankError::unavailable(format!(
                "transaction {} has already been undone",
                self.id
            )));
        }
        self.canceled = true;
        Ok(())
    }
}
