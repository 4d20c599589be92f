//! Daily interest accrual.
//!
//! Replays an account's history day by day from the first un-accrued day
//! through the target date (inclusive) and applies the daily rate of the
//! account kind to each end-of-day balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use banks_core::{AccountId, BankError, BankResult, checked_product, checked_sum, daily_rate};

use crate::account::{Account, AccountKind};
use crate::tariff::Tariff;
use crate::transaction::Entry;

/// Decimal places interest is rounded to before posting.
pub const INTEREST_SCALE: u32 = 2;

/// Outcome of an interest calculation for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accrual {
    pub account_id: AccountId,
    /// First day covered; `None` when the window is empty.
    pub from: Option<NaiveDate>,
    pub through: NaiveDate,
    pub days: u32,
    /// Positive for earned interest, negative for credit commission.
    pub amount: Decimal,
}

#[derive(Debug, Copy, Clone)]
enum DailyRule {
    /// Rate applies while the balance is positive.
    OnPositive(Decimal),
    /// Rate is charged while the balance is negative.
    OnNegative(Decimal),
    Nothing,
}

impl DailyRule {
    fn for_account(account: &Account, tariff: &Tariff, history: &[&Entry]) -> Self {
        match account.kind() {
            AccountKind::Debit => DailyRule::OnPositive(daily_rate(tariff.debit_rate())),
            AccountKind::Deposit { .. } => {
                // The tier is picked once, from the opening amount.
                let opening = history.first().map(|e| e.signed_amount());
                match opening.and_then(|amount| tariff.tier_for(amount)) {
                    Some(tier) => DailyRule::OnPositive(daily_rate(tier.rate())),
                    None => DailyRule::Nothing,
                }
            }
            AccountKind::Credit => {
                DailyRule::OnNegative(daily_rate(tariff.credit_condition().commission()))
            }
        }
    }

    fn accrue(self, balance: Decimal) -> BankResult<Decimal> {
        match self {
            DailyRule::OnPositive(rate) if balance > Decimal::ZERO => {
                checked_product(balance, rate, "daily interest")
            }
            DailyRule::OnNegative(rate) if balance < Decimal::ZERO => {
                checked_product(balance, rate, "daily interest")
            }
            _ => Ok(Decimal::ZERO),
        }
    }
}

/// Interest owed on `account` from its accrual start through `through`.
///
/// `today` is the caller's current date; end dates before it are rejected.
pub fn calculate_interest(
    account: &Account,
    tariff: Option<&Tariff>,
    through: NaiveDate,
    today: NaiveDate,
) -> BankResult<Accrual> {
    if through < today {
        return Err(BankError::validation(format!(
            "interest end date {through} is before today ({today})"
        )));
    }
    let tariff = tariff.ok_or_else(|| BankError::not_found("tariff", account.tariff_id()))?;

    let start = account.accrual_start();
    if start > through {
        return Ok(Accrual {
            account_id: account.id(),
            from: None,
            through,
            days: 0,
            amount: Decimal::ZERO,
        });
    }

    let mut history: Vec<&Entry> = account.history().iter().collect();
    history.sort_by_key(|e| e.created_at());
    let rule = DailyRule::for_account(account, tariff, &history);

    let mut pending = history.iter().peekable();
    let mut balance = Decimal::ZERO;
    let mut total = Decimal::ZERO;
    let mut days = 0u32;

    for day in start.iter_days().take_while(|d| *d <= through) {
        while let Some(entry) = pending.next_if(|e| e.value_date() <= day) {
            balance = checked_sum(balance, entry.signed_amount(), "replayed balance")?;
        }
        total = checked_sum(total, rule.accrue(balance)?, "accrued interest")?;
        days += 1;
    }

    Ok(Accrual {
        account_id: account.id(),
        from: Some(start),
        through,
        days,
        amount: total.round_dp(INTEREST_SCALE),
    })
}
