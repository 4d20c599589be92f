//! Transaction policy, one rule set per account kind.
//!
//! Checks run in a fixed order and the first failure wins:
//! unverified-client limit, blocked flag, then the kind-specific floor or
//! term lock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use banks_core::{BankError, BankResult};

use crate::account::{Account, AccountKind};
use crate::tariff::Tariff;
use crate::transaction::{Entry, Transaction};

/// Facts about the account owner and tariff needed to authorize a leg.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext<'a> {
    pub client_verified: bool,
    pub tariff: &'a Tariff,
    pub now: DateTime<Utc>,
}

/// Decide whether `entry` may be applied to `account` right now.
pub fn authorize(
    account: &Account,
    entry: &Entry,
    ctx: &AuthorizationContext<'_>,
) -> BankResult<()> {
    let amount = entry.amount();
    let outgoing = entry.kind().is_outgoing();

    if outgoing && !ctx.client_verified && amount > ctx.tariff.unverified_limit() {
        return Err(BankError::unavailable(format!(
            "amount {amount} exceeds the unverified client limit {}",
            ctx.tariff.unverified_limit()
        )));
    }

    if account.is_blocked() {
        return Err(BankError::unavailable(format!(
            "account {} is blocked",
            account.id()
        )));
    }

    let remaining = account.balance_after(entry.signed_amount())?;
    if !outgoing {
        return Ok(());
    }

    match account.kind() {
        AccountKind::Debit => ensure_floor(account, remaining, amount),
        AccountKind::Deposit { term } => {
            if ctx.now <= term {
                return Err(BankError::unavailable(format!(
                    "deposit account {} is locked until {term}",
                    account.id()
                )));
            }
            ensure_floor(account, remaining, amount)
        }
        AccountKind::Credit => {
            let floor = ctx.tariff.credit_condition().lower_boundary();
            if remaining < floor {
                return Err(BankError::unavailable(format!(
                    "withdrawing {amount} would take account {} below its credit limit {floor}",
                    account.id()
                )));
            }
            Ok(())
        }
    }
}

/// Undo is only possible once per transaction.
pub fn authorize_undo(transaction: &Transaction) -> BankResult<()> {
    if transaction.is_canceled() {
        return Err(BankError::unavailable(format!(
            "transaction {} has already been undone",
            transaction.id()
        )));
    }
    Ok(())
}

fn ensure_floor(account: &Account, remaining: Decimal, amount: Decimal) -> BankResult<()> {
    if remaining < Decimal::ZERO {
        return Err(BankError::insufficient_balance(account.balance(), amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use banks_core::{AccountId, BankErrorKind, BankId, ClientId, TariffId};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use crate::tariff::{CreditCondition, DepositTier};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
    }

    fn tariff() -> Tariff {
        Tariff::new(
            "Standard",
            vec![DepositTier::open_ended(dec!(0), dec!(0.01)).unwrap()],
            dec!(0.03),
            CreditCondition::new(dec!(-500), dec!(0.05)).unwrap(),
            dec!(1000),
        )
        .unwrap()
    }

    fn funded(kind: AccountKind, balance: Decimal) -> Account {
        let mut account = Account::open(
            AccountId::from_raw(7),
            BankId::from_raw(0),
            ClientId::from_raw(0),
            TariffId::new(),
            kind,
            now() - Duration::days(30),
        );
        if !balance.is_zero() {
            let tx = Transaction::deposit(account.id(), balance, now()).unwrap();
            account.post(tx.legs()[0].clone()).unwrap();
        }
        account
    }

    fn withdraw(account: &Account, amount: Decimal) -> Entry {
        Transaction::withdraw(account.id(), amount, now()).unwrap().legs()[0].clone()
    }

    fn deposit(account: &Account, amount: Decimal) -> Entry {
        Transaction::deposit(account.id(), amount, now()).unwrap().legs()[0].clone()
    }

    fn kind_of(result: BankResult<()>) -> Option<BankErrorKind> {
        result.err().map(|e| e.kind())
    }

    #[test]
    fn debit_floor_is_zero() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: true, tariff: &tariff, now: now() };
        let account = funded(AccountKind::Debit, dec!(100));

        assert!(authorize(&account, &withdraw(&account, dec!(100)), &ctx).is_ok());
        assert_eq!(
            kind_of(authorize(&account, &withdraw(&account, dec!(100.01)), &ctx)),
            Some(BankErrorKind::InsufficientBalance)
        );
    }

    #[test]
    fn credit_floor_is_the_lower_boundary() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: true, tariff: &tariff, now: now() };
        let account = funded(AccountKind::Credit, dec!(0));

        assert!(authorize(&account, &withdraw(&account, dec!(500)), &ctx).is_ok());
        assert_eq!(
            kind_of(authorize(&account, &withdraw(&account, dec!(501)), &ctx)),
            Some(BankErrorKind::OperationUnavailable)
        );
    }

    #[test]
    fn deposit_is_locked_until_after_term() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: true, tariff: &tariff, now: now() };

        let locked = funded(AccountKind::Deposit { term: now() }, dec!(100));
        assert_eq!(
            kind_of(authorize(&locked, &withdraw(&locked, dec!(10)), &ctx)),
            Some(BankErrorKind::OperationUnavailable)
        );

        let term = now() - Duration::seconds(1);
        let matured = funded(AccountKind::Deposit { term }, dec!(100));
        assert!(authorize(&matured, &withdraw(&matured, dec!(10)), &ctx).is_ok());
        assert_eq!(
            kind_of(authorize(&matured, &withdraw(&matured, dec!(101)), &ctx)),
            Some(BankErrorKind::InsufficientBalance)
        );
    }

    #[test]
    fn deposits_into_locked_deposit_accounts_are_allowed() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: false, tariff: &tariff, now: now() };
        let term = now() + Duration::days(90);
        let account = funded(AccountKind::Deposit { term }, dec!(0));

        assert!(authorize(&account, &deposit(&account, dec!(50000)), &ctx).is_ok());
    }

    #[test]
    fn unverified_limit_applies_to_withdrawals_only() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: false, tariff: &tariff, now: now() };
        let account = funded(AccountKind::Debit, dec!(5000));

        assert!(authorize(&account, &withdraw(&account, dec!(1000)), &ctx).is_ok());
        assert_eq!(
            kind_of(authorize(&account, &withdraw(&account, dec!(1001)), &ctx)),
            Some(BankErrorKind::OperationUnavailable)
        );
        assert!(authorize(&account, &deposit(&account, dec!(5000)), &ctx).is_ok());
    }

    #[test]
    fn limit_is_checked_before_blocking_and_floor() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: false, tariff: &tariff, now: now() };
        let mut account = funded(AccountKind::Debit, dec!(0));
        account.block();

        let err = authorize(&account, &withdraw(&account, dec!(2000)), &ctx).unwrap_err();
        assert!(err.to_string().contains("unverified"));
    }

    #[test]
    fn blocked_account_rejects_every_kind() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: true, tariff: &tariff, now: now() };
        let mut account = funded(AccountKind::Credit, dec!(10));
        account.block();

        assert_eq!(
            kind_of(authorize(&account, &deposit(&account, dec!(1)), &ctx)),
            Some(BankErrorKind::OperationUnavailable)
        );
        assert_eq!(
            kind_of(authorize(&account, &withdraw(&account, dec!(1)), &ctx)),
            Some(BankErrorKind::OperationUnavailable)
        );
    }

    #[test]
    fn deposit_past_the_decimal_range_is_refused() {
        let tariff = tariff();
        let ctx = AuthorizationContext { client_verified: true, tariff: &tariff, now: now() };
        let account = funded(AccountKind::Debit, Decimal::MAX);

        assert_eq!(
            kind_of(authorize(&account, &deposit(&account, dec!(1)), &ctx)),
            Some(BankErrorKind::Validation)
        );
        assert!(authorize(&account, &deposit(&account, dec!(0)), &ctx).is_ok());
    }

    #[test]
    fn undo_is_refused_after_cancel() {
        let mut tx = Transaction::deposit(AccountId::from_raw(1), dec!(5), now()).unwrap();
        assert!(authorize_undo(&tx).is_ok());
        tx.mark_canceled().unwrap();
        assert_eq!(
            kind_of(authorize_undo(&tx)),
            Some(BankErrorKind::OperationUnavailable)
        );
    }
}
