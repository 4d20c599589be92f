//! Tariffs: deposit tier table, debit rate, credit condition and the
//! unverified-client transaction limit.
//!
//! The deposit tier table is kept *normalized*: sorted by lower bound,
//! contiguous, starting at zero and ending at [`MAX_BOUNDARY`]. Every
//! mutation of the table re-establishes that shape before returning.

use rust_decimal::Decimal;
use serde::Serialize;

use banks_core::{
    BankError, BankResult, NameCharset, TariffId, ensure_non_negative, ensure_non_positive,
    validate_name,
};

/// Lowest representable tier bound.
pub const MIN_BOUNDARY: Decimal = Decimal::ZERO;

/// Upper bound of the last tier; stands in for "no upper limit".
pub const MAX_BOUNDARY: Decimal = Decimal::MAX;

/// Annual rate applied to deposits whose initial balance falls in
/// `[lower, upper)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DepositTier {
    lower: Decimal,
    upper: Decimal,
    rate: Decimal,
}

impl DepositTier {
    pub fn new(lower: Decimal, upper: Decimal, rate: Decimal) -> BankResult<Self> {
        ensure_non_negative(lower, "tier lower bound")?;
        ensure_non_negative(rate, "tier rate")?;
        if upper <= lower {
            return Err(BankError::validation(format!(
                "tier upper bound {upper} must be above lower bound {lower}"
            )));
        }
        Ok(Self { lower, upper, rate })
    }

    /// Tier from `lower` with no upper limit.
    pub fn open_ended(lower: Decimal, rate: Decimal) -> BankResult<Self> {
        Self::new(lower, MAX_BOUNDARY, rate)
    }

    pub fn lower(&self) -> Decimal {
        self.lower
    }

    pub fn upper(&self) -> Decimal {
        self.upper
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn is_open_ended(&self) -> bool {
        self.upper == MAX_BOUNDARY
    }

    /// Half-open containment. The open-ended tier also owns `MAX_BOUNDARY`.
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.lower
            && (amount < self.upper || (self.is_open_ended() && amount == self.upper))
    }

    fn matches(&self, lower: Decimal, upper: Decimal) -> bool {
        self.lower == lower && self.upper == upper
    }

    // Unchecked: callers already hold valid bounds.
    fn span(lower: Decimal, upper: Decimal, rate: Decimal) -> Self {
        Self { lower, upper, rate }
    }
}

/// Overdraft floor and commission of credit accounts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct CreditCondition {
    lower_boundary: Decimal,
    commission: Decimal,
}

impl CreditCondition {
    pub fn new(lower_boundary: Decimal, commission: Decimal) -> BankResult<Self> {
        Ok(Self {
            lower_boundary: ensure_non_positive(lower_boundary, "credit lower boundary")?,
            commission: ensure_non_negative(commission, "credit commission")?,
        })
    }

    /// Lowest balance a credit account may reach.
    pub fn lower_boundary(&self) -> Decimal {
        self.lower_boundary
    }

    /// Annual rate charged while the balance is negative.
    pub fn commission(&self) -> Decimal {
        self.commission
    }
}

/// Rate and limit bundle shared by every account that references it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tariff {
    id: TariffId,
    name: String,
    tiers: Vec<DepositTier>,
    debit_rate: Decimal,
    credit: CreditCondition,
    unverified_limit: Decimal,
}

impl Tariff {
    /// Build a tariff and normalize its tier table.
    ///
    /// Input tiers may arrive in any order and with gaps; overlapping tiers
    /// are rejected.
    pub fn new(
        name: &str,
        tiers: Vec<DepositTier>,
        debit_rate: Decimal,
        credit: CreditCondition,
        unverified_limit: Decimal,
    ) -> BankResult<Self> {
        let name = validate_name(name, "tariff name", NameCharset::Alphanumeric)?;
        if tiers.is_empty() {
            return Err(BankError::validation("tariff needs at least one deposit tier"));
        }

        let mut tiers = tiers;
        tiers.sort_by(|a, b| a.lower.cmp(&b.lower));
        if let Some(pair) = tiers.windows(2).find(|w| w[0].upper > w[1].lower) {
            return Err(BankError::validation(format!(
                "deposit tiers [{}, {}) and [{}, {}) overlap",
                pair[0].lower, pair[0].upper, pair[1].lower, pair[1].upper
            )));
        }

        Ok(Self {
            id: TariffId::new(),
            name,
            tiers: normalize(tiers),
            debit_rate: ensure_non_negative(debit_rate, "debit rate")?,
            credit,
            unverified_limit: ensure_non_negative(unverified_limit, "unverified client limit")?,
        })
    }

    pub fn id(&self) -> TariffId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized tier table, sorted by lower bound.
    pub fn tiers(&self) -> &[DepositTier] {
        &self.tiers
    }

    pub fn debit_rate(&self) -> Decimal {
        self.debit_rate
    }

    pub fn credit_condition(&self) -> CreditCondition {
        self.credit
    }

    /// Largest withdraw-type amount an unverified client may move at once.
    pub fn unverified_limit(&self) -> Decimal {
        self.unverified_limit
    }

    /// Tier whose half-open range contains `amount`.
    pub fn tier_for(&self, amount: Decimal) -> Option<&DepositTier> {
        self.tiers.iter().find(|t| t.contains(amount))
    }

    /// Replace the rate of the tier with exactly these bounds.
    pub fn change_deposit_rate(
        &mut self,
        lower: Decimal,
        upper: Decimal,
        rate: Decimal,
    ) -> BankResult<()> {
        let rate = ensure_non_negative(rate, "tier rate")?;
        let tier = self
            .tiers
            .iter_mut()
            .find(|t| t.matches(lower, upper))
            .ok_or_else(|| BankError::not_found("deposit tier", format!("[{lower}, {upper})")))?;
        tier.rate = rate;
        Ok(())
    }

    /// Remove the tier `(lower, upper, rate)`; the hole it leaves is filled
    /// from the neighbouring tiers.
    pub fn remove_deposit_rate(
        &mut self,
        lower: Decimal,
        upper: Decimal,
        rate: Decimal,
    ) -> BankResult<()> {
        let index = self
            .tiers
            .iter()
            .position(|t| t.matches(lower, upper) && t.rate == rate)
            .ok_or_else(|| {
                BankError::not_found("deposit tier", format!("[{lower}, {upper}) at {rate}"))
            })?;
        if self.tiers.len() == 1 {
            return Err(BankError::unavailable(
                "cannot remove the only deposit tier of a tariff",
            ));
        }

        self.tiers.remove(index);
        self.tiers = normalize(std::mem::take(&mut self.tiers));
        Ok(())
    }

    /// Install `tier`, carving its range out of whatever tiers cover it now.
    pub fn add_deposit_rate(&mut self, tier: DepositTier) -> BankResult<()> {
        let mut carved = Vec::with_capacity(self.tiers.len() + 2);
        for existing in self.tiers.drain(..) {
            if existing.upper <= tier.lower || existing.lower >= tier.upper {
                carved.push(existing);
                continue;
            }
            if existing.lower < tier.lower {
                carved.push(DepositTier::span(existing.lower, tier.lower, existing.rate));
            }
            if existing.upper > tier.upper {
                carved.push(DepositTier::span(tier.upper, existing.upper, existing.rate));
            }
        }
        carved.push(tier);
        carved.sort_by(|a, b| a.lower.cmp(&b.lower));
        self.tiers = normalize(carved);
        Ok(())
    }

    pub fn set_debit_rate(&mut self, rate: Decimal) -> BankResult<()> {
        self.debit_rate = ensure_non_negative(rate, "debit rate")?;
        Ok(())
    }

    pub fn set_credit_lower_boundary(&mut self, lower_boundary: Decimal) -> BankResult<()> {
        self.credit = CreditCondition::new(lower_boundary, self.credit.commission)?;
        Ok(())
    }

    pub fn set_credit_commission(&mut self, commission: Decimal) -> BankResult<()> {
        self.credit = CreditCondition::new(self.credit.lower_boundary, commission)?;
        Ok(())
    }

    pub fn set_unverified_limit(&mut self, limit: Decimal) -> BankResult<()> {
        self.unverified_limit = ensure_non_negative(limit, "unverified client limit")?;
        Ok(())
    }
}

/// Close every gap of a sorted, non-overlapping tier list.
///
/// A gap takes the rate of the tier below it; the floor gap takes the rate
/// of the first tier. The last tier is stretched to `MAX_BOUNDARY` through an
/// extra tier with its rate.
fn normalize(sorted: Vec<DepositTier>) -> Vec<DepositTier> {
    let mut out: Vec<DepositTier> = Vec::with_capacity(sorted.len() + 2);

    for tier in sorted {
        match out.last() {
            None if tier.lower > MIN_BOUNDARY => {
                out.push(DepositTier::span(MIN_BOUNDARY, tier.lower, tier.rate));
            }
            Some(prev) if prev.upper < tier.lower => {
                out.push(DepositTier::span(prev.upper, tier.lower, prev.rate));
            }
            _ => {}
        }
        out.push(tier);
    }

    if let Some(last) = out.last().copied() {
        if last.upper < MAX_BOUNDARY {
            out.push(DepositTier::span(last.upper, MAX_BOUNDARY, last.rate));
        }
    }
    out
}
