//! Bank accounts: balance, history and the core execute/undo primitives.
//!
//! The primitives here apply movements unconditionally; policy (floors,
//! limits, blocking, deposit terms) lives in [`crate::authorization`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use banks_core::{
    AccountId, BankError, BankId, BankResult, ClientId, TariffId, TransactionId, checked_sum,
};

use crate::transaction::Entry;

/// Account flavour; selects the withdraw policy and the interest rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccountKind {
    Debit,
    /// Withdrawals are locked until `term` has passed.
    Deposit { term: DateTime<Utc> },
    Credit,
}

impl AccountKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccountKind::Debit => "debit",
            AccountKind::Deposit { .. } => "deposit",
            AccountKind::Credit => "credit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    id: AccountId,
    bank_id: BankId,
    client_id: ClientId,
    tariff_id: TariffId,
    kind: AccountKind,
    balance: Decimal,
    blocked: bool,
    created_at: DateTime<Utc>,
    history: Vec<Entry>,
    accrued_through: Option<NaiveDate>,
}

impl Account {
    pub(crate) fn open(
        id: AccountId,
        bank_id: BankId,
        client_id: ClientId,
        tariff_id: TariffId,
        kind: AccountKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bank_id,
            client_id,
            tariff_id,
            kind,
            balance: Decimal::ZERO,
            blocked: false,
            created_at,
            history: Vec::new(),
            accrued_through: None,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn bank_id(&self) -> BankId {
        self.bank_id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn tariff_id(&self) -> TariffId {
        self.tariff_id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Entries in posting order.
    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    /// Last day interest has been posted for, if any.
    pub fn accrued_through(&self) -> Option<NaiveDate> {
        self.accrued_through
    }

    /// First day not yet covered by a posted accrual.
    pub fn accrual_start(&self) -> NaiveDate {
        self.accrued_through
            .and_then(|d| d.succ_opt())
            .unwrap_or_else(|| self.created_at.date_naive())
    }

    pub fn contains_entry(&self, entry_id: TransactionId) -> bool {
        self.history.iter().any(|e| e.id() == entry_id)
    }

    /// Sum of history in posting order; equals `balance()` unless a partial
    /// sum leaves the decimal range.
    pub fn history_total(&self) -> BankResult<Decimal> {
        self.history
            .iter()
            .try_fold(Decimal::ZERO, |total, e| {
                checked_sum(total, e.signed_amount(), "history total")
            })
    }

    /// Balance after moving `signed_amount`; errors instead of overflowing.
    pub fn balance_after(&self, signed_amount: Decimal) -> BankResult<Decimal> {
        checked_sum(self.balance, signed_amount, "account balance")
    }

    /// Core execute: apply `entry` without any policy check.
    pub(crate) fn post(&mut self, entry: Entry) -> BankResult<()> {
        if self.contains_entry(entry.id()) {
            return Err(BankError::duplicate("history entry", entry.id()));
        }
        self.balance = self.balance_after(entry.signed_amount())?;
        self.history.push(entry);
        Ok(())
    }

    /// Core undo: remove `entry_id` from history and reverse its effect.
    pub(crate) fn reverse(&mut self, entry_id: TransactionId) -> BankResult<Entry> {
        let index = self
            .history
            .iter()
            .position(|e| e.id() == entry_id)
            .ok_or_else(|| BankError::not_found("history entry", entry_id))?;
        self.balance = self.balance_after(-self.history[index].signed_amount())?;
        Ok(self.history.remove(index))
    }

    pub(crate) fn block(&mut self) {
        self.blocked = true;
    }

    pub(crate) fn unblock(&mut self) {
        self.blocked = false;
    }

    pub(crate) fn set_tariff(&mut self, tariff_id: TariffId) {
        self.tariff_id = tariff_id;
    }

    pub(crate) fn mark_accrued_through(&mut self, date: NaiveDate) {
        self.accrued_through = Some(date);
    }
}
