//! Registry of banks.
//!
//! Holds the shared clock and hands out bank ids. There is no global
//! instance; whoever needs banks constructs a `CentralBank` and passes it on.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use banks_core::{BankError, BankId, BankResult, Clock, IdSequence};
use banks_events::NotificationService;

use crate::bank::Bank;
use crate::config::{BankConfig, CentralBankConfig};
use crate::interest::Accrual;

#[derive(Debug)]
pub struct CentralBank {
    max_banks: usize,
    clock: Arc<dyn Clock>,
    banks: Vec<Bank>,
    bank_ids: IdSequence<BankId>,
}

impl CentralBank {
    pub fn new(config: CentralBankConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_banks: config.max_banks,
            clock,
            banks: Vec::new(),
            bank_ids: IdSequence::new(),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn max_banks(&self) -> usize {
        self.max_banks
    }

    /// Change the ceiling. It cannot drop below the number of banks
    /// already registered.
    pub fn set_max_banks(&mut self, max_banks: usize) -> BankResult<()> {
        if max_banks < self.banks.len() {
            return Err(BankError::validation(format!(
                "max banks {max_banks} is below the {} banks already registered",
                self.banks.len()
            )));
        }
        self.max_banks = max_banks;
        Ok(())
    }

    /// Open a bank sharing this registry's clock.
    pub fn register_bank(
        &mut self,
        config: &BankConfig,
        notifier: Arc<dyn NotificationService>,
    ) -> BankResult<BankId> {
        if self.banks.len() >= self.max_banks {
            return Err(BankError::capacity("bank", self.max_banks));
        }

        let id = self.bank_ids.next_id();
        let bank = Bank::new(id, config, Arc::clone(&self.clock), notifier)?;
        self.banks.push(bank);
        info!(bank_id = %id, banks = self.banks.len(), "bank registered");
        Ok(id)
    }

    pub fn bank(&self, id: BankId) -> BankResult<&Bank> {
        self.banks
            .iter()
            .find(|b| b.id() == id)
            .ok_or_else(|| BankError::not_found("bank", id))
    }

    pub fn bank_mut(&mut self, id: BankId) -> BankResult<&mut Bank> {
        self.banks
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or_else(|| BankError::not_found("bank", id))
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// First bank registered under `name`.
    pub fn find_bank(&self, name: &str) -> Option<&Bank> {
        self.banks.iter().find(|b| b.name() == name)
    }

    /// Run the interest sweep of every bank through `through`.
    ///
    /// All banks are planned before any of them posts, so a bank that
    /// cannot accrue leaves every bank unchanged.
    pub fn apply_tariff_rates(
        &mut self,
        through: NaiveDate,
    ) -> BankResult<Vec<(BankId, Vec<Accrual>)>> {
        let today = self.clock.today();
        if through < today {
            return Err(BankError::validation(format!(
                "cannot apply tariff rates for {through}: date is in the past"
            )));
        }

        let plans = self
            .banks
            .iter()
            .map(|bank| bank.plan_accruals(through))
            .collect::<BankResult<Vec<_>>>()?;

        let mut swept = Vec::with_capacity(plans.len());
        for (bank, accruals) in self.banks.iter_mut().zip(plans) {
            bank.commit_accruals(through, &accruals)?;
            swept.push((bank.id(), accruals));
        }
        Ok(swept)
    }
}
