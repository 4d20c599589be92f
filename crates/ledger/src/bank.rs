//! Bank: owns clients, accounts, tariffs, the transaction journal and the
//! subscriber list, and is the only place state changes happen.
//!
//! Every public mutator validates first and mutates second, so a returned
//! error leaves the bank untouched. Notifications are sent after the state
//! change; a failed delivery is logged and otherwise ignored.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use banks_clients::{Address, Client, PassportId};
use banks_core::{
    AccountId, BankError, BankId, BankResult, ClientId, Clock, IdSequence, NameCharset, TariffId,
    TransactionId, validate_name,
};
use banks_events::{Notification, NotificationService, NotificationTopic};

use crate::account::{Account, AccountKind};
use crate::authorization::{AuthorizationContext, authorize, authorize_undo};
use crate::config::BankConfig;
use crate::interest::{Accrual, calculate_interest};
use crate::tariff::{DepositTier, Tariff};
use crate::transaction::{Entry, Transaction, TransactionKind};

/// Capacity limits of one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankLimits {
    pub max_clients: usize,
    pub max_client_accounts: usize,
}

#[derive(Debug)]
pub struct Bank {
    id: BankId,
    name: String,
    limits: BankLimits,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationService>,
    default_tariff: TariffId,
    tariffs: Vec<Tariff>,
    clients: BTreeMap<ClientId, Client>,
    accounts: BTreeMap<AccountId, Account>,
    journal: HashMap<TransactionId, Transaction>,
    subscribers: Vec<ClientId>,
    client_ids: IdSequence<ClientId>,
    account_ids: IdSequence<AccountId>,
}

impl Bank {
    /// Create a bank and install its default tariff.
    pub fn new(
        id: BankId,
        config: &BankConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationService>,
    ) -> BankResult<Self> {
        let name = validate_name(&config.name, "bank name", NameCharset::Alphanumeric)?;
        let default_tariff = config.default_tariff.build()?;

        info!(bank_id = %id, bank = %name, "bank opened");

        Ok(Self {
            id,
            name,
            limits: BankLimits {
                max_clients: config.max_clients,
                max_client_accounts: config.max_client_accounts,
            },
            clock,
            notifier,
            default_tariff: default_tariff.id(),
            tariffs: vec![default_tariff],
            clients: BTreeMap::new(),
            accounts: BTreeMap::new(),
            journal: HashMap::new(),
            subscribers: Vec::new(),
            client_ids: IdSequence::new(),
            account_ids: IdSequence::new(),
        })
    }

    // ---- read views -------------------------------------------------------

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> BankLimits {
        self.limits
    }

    /// Current instant of the bank's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn default_tariff_id(&self) -> TariffId {
        self.default_tariff
    }

    pub fn tariff(&self, id: TariffId) -> BankResult<&Tariff> {
        self.tariffs
            .iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| BankError::not_found("tariff", id))
    }

    /// Registered tariffs in registration order; the default comes first.
    pub fn tariffs(&self) -> &[Tariff] {
        &self.tariffs
    }

    pub fn client(&self, id: ClientId) -> BankResult<&Client> {
        self.clients
            .get(&id)
            .ok_or_else(|| BankError::not_found("client", id))
    }

    pub fn clients(&self) -> impl Iterator<Item = (ClientId, &Client)> {
        self.clients.iter().map(|(id, c)| (*id, c))
    }

    pub fn account(&self, id: AccountId) -> BankResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| BankError::not_found("account", id))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn client_accounts(&self, client: ClientId) -> impl Iterator<Item = &Account> {
        self.accounts.values().filter(move |a| a.client_id() == client)
    }

    pub fn transaction(&self, id: TransactionId) -> BankResult<&Transaction> {
        self.journal
            .get(&id)
            .ok_or_else(|| BankError::not_found("transaction", id))
    }

    pub fn subscribers(&self) -> &[ClientId] {
        &self.subscribers
    }

    pub fn is_subscribed(&self, client: ClientId) -> bool {
        self.subscribers.contains(&client)
    }

    // ---- clients ----------------------------------------------------------

    #[tracing::instrument(skip(self, client), fields(bank_id = %self.id))]
    pub fn register_client(&mut self, client: Client) -> BankResult<ClientId> {
        if self.clients.len() >= self.limits.max_clients {
            return Err(BankError::capacity("client", self.limits.max_clients));
        }
        if let Some(passport) = client.passport() {
            if self.clients.values().any(|c| c.passport() == Some(passport)) {
                return Err(BankError::duplicate("client", passport));
            }
        }

        let id = self.client_ids.next_id();
        info!(client_id = %id, client = %client.full_name(), "client registered");
        self.clients.insert(id, client);
        Ok(id)
    }

    /// Remove a client together with its accounts and subscription.
    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn remove_client(&mut self, client: ClientId) -> BankResult<()> {
        if self.clients.remove(&client).is_none() {
            return Err(BankError::not_found("client", client));
        }
        let closed: Vec<AccountId> = self
            .client_accounts(client)
            .map(Account::id)
            .collect();
        self.accounts.retain(|_, a| a.client_id() != client);
        self.forget_transactions_of(&closed);
        self.subscribers.retain(|c| *c != client);

        info!(client_id = %client, "client removed");
        Ok(())
    }

    pub fn set_client_address(
        &mut self,
        client: ClientId,
        address: Option<Address>,
    ) -> BankResult<()> {
        let entry = self
            .clients
            .get_mut(&client)
            .ok_or_else(|| BankError::not_found("client", client))?;
        entry.set_address(address);
        debug!(
            bank_id = %self.id,
            client_id = %client,
            verified = entry.is_verified(),
            "client address updated"
        );
        Ok(())
    }

    pub fn set_client_passport(
        &mut self,
        client: ClientId,
        passport: Option<PassportId>,
    ) -> BankResult<()> {
        if !self.clients.contains_key(&client) {
            return Err(BankError::not_found("client", client));
        }
        if let Some(p) = &passport {
            let taken = self
                .clients
                .iter()
                .any(|(id, c)| *id != client && c.passport() == Some(p));
            if taken {
                return Err(BankError::duplicate("client", p));
            }
        }

        let entry = self
            .clients
            .get_mut(&client)
            .ok_or_else(|| BankError::not_found("client", client))?;
        entry.set_passport(passport);
        debug!(
            bank_id = %self.id,
            client_id = %client,
            verified = entry.is_verified(),
            "client passport updated"
        );
        Ok(())
    }

    // ---- subscriptions ----------------------------------------------------

    pub fn add_subscription(&mut self, client: ClientId) -> BankResult<()> {
        self.client(client)?;
        if self.is_subscribed(client) {
            return Err(BankError::duplicate("subscription", client));
        }
        self.subscribers.push(client);
        debug!(bank_id = %self.id, client_id = %client, "client subscribed");
        Ok(())
    }

    /// Unsubscribing a client that is not subscribed is a no-op.
    pub fn remove_subscription(&mut self, client: ClientId) -> BankResult<()> {
        self.client(client)?;
        self.subscribers.retain(|c| *c != client);
        debug!(bank_id = %self.id, client_id = %client, "client unsubscribed");
        Ok(())
    }

    // ---- accounts ---------------------------------------------------------

    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn register_account(
        &mut self,
        client: ClientId,
        kind: AccountKind,
        tariff: TariffId,
    ) -> BankResult<AccountId> {
        self.client(client)?;
        self.tariff(tariff)?;

        let now = self.clock.now();
        if let AccountKind::Deposit { term } = kind {
            if term <= now {
                return Err(BankError::validation(format!(
                    "deposit term {term} must be in the future"
                )));
            }
        }
        let held = self.client_accounts(client).count();
        if held >= self.limits.max_client_accounts {
            return Err(BankError::capacity(
                "client account",
                self.limits.max_client_accounts,
            ));
        }

        let id = self.account_ids.next_id();
        self.accounts
            .insert(id, Account::open(id, self.id, client, tariff, kind, now));
        info!(account_id = %id, client_id = %client, kind = kind.name(), "account opened");
        Ok(id)
    }

    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn remove_bank_account(&mut self, account: AccountId) -> BankResult<()> {
        let removed = self
            .accounts
            .remove(&account)
            .ok_or_else(|| BankError::not_found("account", account))?;
        self.forget_transactions_of(&[account]);

        info!(account_id = %account, "account removed");
        let owner = removed.client_id();
        self.notify_where(
            NotificationTopic::AccountRemoved,
            &format!("account {account} was closed"),
            |c| c == owner,
        );
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn change_bank_account_tariff(
        &mut self,
        account: AccountId,
        tariff: TariffId,
    ) -> BankResult<()> {
        self.tariff(tariff)?;
        let entry = self
            .accounts
            .get_mut(&account)
            .ok_or_else(|| BankError::not_found("account", account))?;
        if entry.tariff_id() == tariff {
            return Err(BankError::duplicate("account tariff", tariff));
        }
        entry.set_tariff(tariff);
        let owner = entry.client_id();

        info!(account_id = %account, tariff_id = %tariff, "account tariff changed");
        self.notify_where(
            NotificationTopic::AccountTariffChanged,
            &format!("account {account} moved to tariff {tariff}"),
            |c| c == owner,
        );
        Ok(())
    }

    /// Lift the block placed by a tariff removal or a transfer undo.
    pub fn unblock_account(&mut self, account: AccountId) -> BankResult<()> {
        self.accounts
            .get_mut(&account)
            .ok_or_else(|| BankError::not_found("account", account))?
            .unblock();
        info!(bank_id = %self.id, account_id = %account, "account unblocked");
        Ok(())
    }

    // ---- tariffs ----------------------------------------------------------

    #[tracing::instrument(skip(self, tariff), fields(bank_id = %self.id, tariff_id = %tariff.id()))]
    pub fn add_tariff(&mut self, tariff: Tariff) -> BankResult<TariffId> {
        let id = tariff.id();
        if self.tariffs.iter().any(|t| t.id() == id) {
            return Err(BankError::duplicate("tariff", id));
        }

        let message = format!("new tariff '{}' is available", tariff.name());
        self.tariffs.push(tariff);
        info!("tariff added");
        self.notify_where(NotificationTopic::TariffAdded, &message, |_| true);
        Ok(id)
    }

    /// Remove a tariff. Accounts on it fall back to the default tariff and
    /// are blocked until reviewed.
    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn remove_tariff(&mut self, tariff: TariffId) -> BankResult<()> {
        if tariff == self.default_tariff {
            return Err(BankError::unavailable("the default tariff cannot be removed"));
        }
        let index = self
            .tariffs
            .iter()
            .position(|t| t.id() == tariff)
            .ok_or_else(|| BankError::not_found("tariff", tariff))?;

        let affected = self.tariff_users(tariff);
        let removed = self.tariffs.remove(index);
        let fallback = self.default_tariff;
        let mut moved = 0usize;
        for account in self.accounts.values_mut().filter(|a| a.tariff_id() == tariff) {
            account.set_tariff(fallback);
            account.block();
            moved += 1;
        }

        info!(moved, "tariff removed");
        self.notify_where(
            NotificationTopic::TariffRemoved,
            &format!(
                "tariff '{}' was withdrawn; your accounts were moved to the default tariff and blocked",
                removed.name()
            ),
            |c| affected.contains(&c),
        );
        Ok(())
    }

    pub fn change_deposit_interest_rate(
        &mut self,
        tariff: TariffId,
        lower: Decimal,
        upper: Decimal,
        rate: Decimal,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "deposit rate changed", |t| {
            t.change_deposit_rate(lower, upper, rate)
        })
    }

    pub fn remove_deposit_interest_rate(
        &mut self,
        tariff: TariffId,
        lower: Decimal,
        upper: Decimal,
        rate: Decimal,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "deposit rate removed", |t| {
            t.remove_deposit_rate(lower, upper, rate)
        })
    }

    pub fn add_deposit_interest_rate(
        &mut self,
        tariff: TariffId,
        tier: DepositTier,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "deposit rate added", |t| t.add_deposit_rate(tier))
    }

    pub fn change_debit_interest_rate(
        &mut self,
        tariff: TariffId,
        rate: Decimal,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "debit rate changed", |t| t.set_debit_rate(rate))
    }

    pub fn change_credit_condition_lower_boundary(
        &mut self,
        tariff: TariffId,
        lower_boundary: Decimal,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "credit limit changed", |t| {
            t.set_credit_lower_boundary(lower_boundary)
        })
    }

    pub fn change_credit_condition_commission(
        &mut self,
        tariff: TariffId,
        commission: Decimal,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "credit commission changed", |t| {
            t.set_credit_commission(commission)
        })
    }

    pub fn change_unverified_client_transaction_limit(
        &mut self,
        tariff: TariffId,
        limit: Decimal,
    ) -> BankResult<()> {
        self.update_tariff(tariff, "unverified client limit changed", |t| {
            t.set_unverified_limit(limit)
        })
    }

    /// Apply `change` to a registered tariff and tell its users.
    fn update_tariff<F>(&mut self, tariff: TariffId, what: &str, change: F) -> BankResult<()>
    where
        F: FnOnce(&mut Tariff) -> BankResult<()>,
    {
        let target = self
            .tariffs
            .iter_mut()
            .find(|t| t.id() == tariff)
            .ok_or_else(|| BankError::not_found("tariff", tariff))?;
        change(target)?;
        let message = format!("tariff '{}': {what}", target.name());

        info!(bank_id = %self.id, tariff_id = %tariff, change = what, "tariff updated");
        let users = self.tariff_users(tariff);
        self.notify_where(NotificationTopic::TariffTermsChanged, &message, |c| {
            users.contains(&c)
        });
        Ok(())
    }

    fn tariff_users(&self, tariff: TariffId) -> Vec<ClientId> {
        let mut users: Vec<ClientId> = self
            .accounts
            .values()
            .filter(|a| a.tariff_id() == tariff)
            .map(Account::client_id)
            .collect();
        users.sort();
        users.dedup();
        users
    }

    // ---- transactions -----------------------------------------------------

    /// Authorize every leg, then apply them all. Nothing is applied if any
    /// leg is refused.
    #[tracing::instrument(
        skip(self, transaction),
        fields(bank_id = %self.id, transaction_id = %transaction.id(), kind = %transaction.kind())
    )]
    pub fn do_transaction(&mut self, transaction: Transaction) -> BankResult<TransactionId> {
        let id = transaction.id();
        if self.journal.contains_key(&id) {
            return Err(BankError::duplicate("transaction", id));
        }

        if let Err(err) = self.authorize_legs(&transaction) {
            warn!(error = %err, "transaction rejected");
            return Err(err);
        }

        for leg in transaction.legs() {
            self.account_mut(leg.account_id())?.post(leg.clone())?;
        }

        let owner = self.account(transaction.account_id())?.client_id();
        let message = format!(
            "{} of {} on account {} completed",
            transaction.kind(),
            transaction.amount(),
            transaction.account_id()
        );
        info!(amount = %transaction.amount(), "transaction executed");
        self.journal.insert(id, transaction);
        self.notify_where(NotificationTopic::TransactionExecuted, &message, |c| c == owner);
        Ok(id)
    }

    fn authorize_legs(&self, transaction: &Transaction) -> BankResult<()> {
        let now = self.clock.now();
        for leg in transaction.legs() {
            let account = self.account(leg.account_id())?;
            if account.contains_entry(leg.id()) {
                return Err(BankError::duplicate("history entry", leg.id()));
            }
            let ctx = AuthorizationContext {
                client_verified: self.client(account.client_id())?.is_verified(),
                tariff: self.tariff(account.tariff_id())?,
                now,
            };
            authorize(account, leg, &ctx)?;
        }
        Ok(())
    }

    /// Reverse a previously executed transaction.
    ///
    /// Undoing a transfer whose destination can no longer cover the amount
    /// still goes through, but the destination account gets blocked.
    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn undo_transaction(&mut self, id: TransactionId) -> BankResult<()> {
        let transaction = self.transaction(id)?;
        authorize_undo(transaction)?;

        let legs: Vec<Entry> = transaction.legs().to_vec();
        let kind = transaction.kind();
        let amount = transaction.amount();
        let primary = transaction.account_id();
        let counterparty = transaction.counterparty();

        for leg in &legs {
            let account = self.account(leg.account_id())?;
            if !account.contains_entry(leg.id()) {
                return Err(BankError::not_found("history entry", leg.id()));
            }
            account.balance_after(-leg.signed_amount())?;
        }

        if let (TransactionKind::Transfer, Some(dest)) = (kind, counterparty) {
            let dest = self.account_mut(dest)?;
            if dest.balance_after(-amount)? < Decimal::ZERO {
                dest.block();
                warn!(
                    account_id = %dest.id(),
                    balance = %dest.balance(),
                    "undo overdraws transfer destination; account blocked"
                );
            }
        }

        for leg in &legs {
            self.account_mut(leg.account_id())?.reverse(leg.id())?;
        }
        self.journal
            .get_mut(&id)
            .ok_or_else(|| BankError::not_found("transaction", id))?
            .mark_canceled()?;

        info!(transaction_id = %id, "transaction undone");
        let owner = self.account(primary)?.client_id();
        self.notify_where(
            NotificationTopic::TransactionUndone,
            &format!("{kind} of {amount} on account {primary} was reverted"),
            |c| c == owner,
        );
        Ok(())
    }

    // ---- interest ---------------------------------------------------------

    /// Interest `account` would receive through `through`, without posting.
    pub fn calculate_interest(
        &self,
        account: AccountId,
        through: NaiveDate,
    ) -> BankResult<Accrual> {
        let account = self.account(account)?;
        let tariff = self.tariffs.iter().find(|t| t.id() == account.tariff_id());
        calculate_interest(account, tariff, through, self.clock.today())
    }

    /// Post accrued interest on every account through `through` and move
    /// each accrual watermark there.
    #[tracing::instrument(skip(self), fields(bank_id = %self.id))]
    pub fn apply_tariff_rates(&mut self, through: NaiveDate) -> BankResult<Vec<Accrual>> {
        let accruals = self.plan_accruals(through)?;
        self.commit_accruals(through, &accruals)?;
        Ok(accruals)
    }

    /// Compute every account's accrual and check that each one can be
    /// posted. Nothing is mutated.
    pub(crate) fn plan_accruals(&self, through: NaiveDate) -> BankResult<Vec<Accrual>> {
        let today = self.clock.today();
        if through < today {
            return Err(BankError::validation(format!(
                "cannot apply tariff rates for {through}: date is in the past"
            )));
        }

        self.accounts
            .values()
            .map(|a| {
                let tariff = self.tariffs.iter().find(|t| t.id() == a.tariff_id());
                let accrual = calculate_interest(a, tariff, through, today)?;
                a.balance_after(accrual.amount)?;
                Ok(accrual)
            })
            .collect()
    }

    /// Post accruals produced by [`Bank::plan_accruals`] with no state
    /// change in between; each posting was already checked there.
    pub(crate) fn commit_accruals(
        &mut self,
        through: NaiveDate,
        accruals: &[Accrual],
    ) -> BankResult<()> {
        let now = self.clock.now();
        for accrual in accruals {
            let account = self.account_mut(accrual.account_id)?;
            if !accrual.amount.is_zero() {
                account.post(Entry::interest(accrual.account_id, accrual.amount, now))?;
            }
            account.mark_accrued_through(through);
            debug!(
                account_id = %accrual.account_id,
                days = accrual.days,
                amount = %accrual.amount,
                "interest accrued"
            );
        }

        info!(
            accounts = accruals.len(),
            posted = accruals.iter().filter(|a| !a.amount.is_zero()).count(),
            through = %through,
            "tariff rates applied"
        );
        Ok(())
    }

    // ---- internals --------------------------------------------------------

    /// Drop journal records that touch any of `closed`. They can no longer
    /// be undone; surviving counterparties keep their history entries.
    fn forget_transactions_of(&mut self, closed: &[AccountId]) {
        self.journal.retain(|_, tx| {
            !tx.legs().iter().any(|leg| closed.contains(&leg.account_id()))
        });
    }

    fn account_mut(&mut self, id: AccountId) -> BankResult<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| BankError::not_found("account", id))
    }

    /// Send `message` to every subscriber accepted by `should_notify`.
    fn notify_where<P>(&self, topic: NotificationTopic, message: &str, should_notify: P)
    where
        P: Fn(ClientId) -> bool,
    {
        let now = self.clock.now();
        for client_id in self.subscribers.iter().copied().filter(|c| should_notify(*c)) {
            let Some(client) = self.clients.get(&client_id) else {
                continue;
            };
            let notification = Notification::new(self.id, client_id, topic, message, now);
            if let Err(err) = self.notifier.notify(client, &notification) {
                warn!(
                    bank_id = %self.id,
                    client_id = %client_id,
                    topic = %topic,
                    error = %err,
                    "notification not delivered"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banks_clients::{AddressBuilder, ClientBuilder};
    use banks_core::{BankErrorKind, ManualClock};
    use banks_events::{InMemoryNotifier, NotifyError};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use crate::config::TariffSpec;
    use crate::tariff::{CreditCondition, MAX_BOUNDARY};
    use crate::transaction::EntryKind;

    struct Fixture {
        bank: Bank,
        clock: ManualClock,
        notifier: Arc<InMemoryNotifier>,
    }

    fn fixture_with(max_clients: usize, max_client_accounts: usize) -> Fixture {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        let notifier = Arc::new(InMemoryNotifier::new());
        let config = BankConfig::new("Test Bank").with_limits(max_clients, max_client_accounts);
        let bank = Bank::new(
            BankId::from_raw(0),
            &config,
            Arc::new(clock.clone()),
            notifier.clone(),
        )
        .unwrap();
        Fixture { bank, clock, notifier }
    }

    fn fixture() -> Fixture {
        fixture_with(10, 5)
    }

    fn unverified(name: &str) -> Client {
        ClientBuilder::new().name(name).lastname("Petrov").build().unwrap()
    }

    fn verified(name: &str, passport: &str) -> Client {
        let address = AddressBuilder::new()
            .zip("101000")
            .country("Russia")
            .city("Moscow")
            .street("Arbat")
            .street_number(1)
            .build()
            .unwrap();
        ClientBuilder::new()
            .name(name)
            .lastname("Ivanova")
            .address(address)
            .passport(passport)
            .build()
            .unwrap()
    }

    fn premium() -> Tariff {
        Tariff::new(
            "Premium",
            vec![DepositTier::open_ended(dec!(0), dec!(0.05)).unwrap()],
            dec!(0.05),
            CreditCondition::new(dec!(-1000), dec!(0.1)).unwrap(),
            dec!(1000),
        )
        .unwrap()
    }

    #[derive(Debug)]
    struct RefusingNotifier;

    impl NotificationService for RefusingNotifier {
        fn notify(&self, _: &Client, _: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("mailbox full".to_string()))
        }
    }

    #[test]
    fn client_capacity_is_enforced() {
        let mut f = fixture_with(1, 5);
        f.bank.register_client(unverified("Ivan")).unwrap();

        let err = f.bank.register_client(unverified("Oleg")).unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::CapacityExceeded);
        assert_eq!(f.bank.clients().count(), 1);
    }

    #[test]
    fn same_passport_cannot_register_twice() {
        let mut f = fixture();
        f.bank.register_client(verified("Anna", "1111111111")).unwrap();

        let err = f
            .bank
            .register_client(verified("Olga", "1111111111"))
            .unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::Duplicate);
    }

    #[test]
    fn account_registration_checks_references() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let default = f.bank.default_tariff_id();

        let missing_client = f
            .bank
            .register_account(ClientId::from_raw(99), AccountKind::Debit, default)
            .unwrap_err();
        assert_eq!(missing_client.kind(), BankErrorKind::NotFound);

        let missing_tariff = f
            .bank
            .register_account(client, AccountKind::Debit, TariffId::new())
            .unwrap_err();
        assert_eq!(missing_tariff.kind(), BankErrorKind::NotFound);

        let past_term = AccountKind::Deposit { term: f.clock.now() - Duration::days(1) };
        let err = f.bank.register_account(client, past_term, default).unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::Validation);
        assert_eq!(f.bank.accounts().count(), 0);
    }

    #[test]
    fn per_client_account_limit() {
        let mut f = fixture_with(10, 2);
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let other = f.bank.register_client(unverified("Oleg")).unwrap();
        let default = f.bank.default_tariff_id();

        f.bank.register_account(client, AccountKind::Debit, default).unwrap();
        f.bank.register_account(client, AccountKind::Credit, default).unwrap();
        let err = f
            .bank
            .register_account(client, AccountKind::Debit, default)
            .unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::CapacityExceeded);

        assert!(f.bank.register_account(other, AccountKind::Debit, default).is_ok());
    }

    #[test]
    fn removing_a_client_drops_accounts_and_subscription() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let account = f
            .bank
            .register_account(client, AccountKind::Debit, f.bank.default_tariff_id())
            .unwrap();
        f.bank.add_subscription(client).unwrap();

        f.bank.remove_client(client).unwrap();

        assert!(f.bank.account(account).is_err());
        assert!(!f.bank.is_subscribed(client));
        assert_eq!(
            f.bank.remove_client(client).unwrap_err().kind(),
            BankErrorKind::NotFound
        );
    }

    #[test]
    fn subscriptions_are_unique() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();

        f.bank.add_subscription(client).unwrap();
        assert_eq!(
            f.bank.add_subscription(client).unwrap_err().kind(),
            BankErrorKind::Duplicate
        );

        f.bank.remove_subscription(client).unwrap();
        f.bank.remove_subscription(client).unwrap();
        assert!(f.bank.subscribers().is_empty());
    }

    #[test]
    fn new_tariff_is_announced_to_all_subscribers() {
        let mut f = fixture();
        let a = f.bank.register_client(unverified("Ivan")).unwrap();
        let b = f.bank.register_client(unverified("Oleg")).unwrap();
        let quiet = f.bank.register_client(unverified("Petr")).unwrap();
        f.bank.add_subscription(a).unwrap();
        f.bank.add_subscription(b).unwrap();

        let tariff = premium();
        let copy = tariff.clone();
        f.bank.add_tariff(tariff).unwrap();

        let delivered = f.notifier.delivered();
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|n| n.topic == NotificationTopic::TariffAdded));
        assert!(f.notifier.delivered_to(quiet).is_empty());

        assert_eq!(
            f.bank.add_tariff(copy).unwrap_err().kind(),
            BankErrorKind::Duplicate
        );
    }

    #[test]
    fn removing_a_tariff_moves_and_blocks_its_accounts() {
        let mut f = fixture();
        let user = f.bank.register_client(unverified("Ivan")).unwrap();
        let bystander = f.bank.register_client(unverified("Oleg")).unwrap();
        f.bank.add_subscription(user).unwrap();
        f.bank.add_subscription(bystander).unwrap();

        let premium = f.bank.add_tariff(premium()).unwrap();
        let moved = f.bank.register_account(user, AccountKind::Debit, premium).unwrap();
        let untouched = f
            .bank
            .register_account(bystander, AccountKind::Debit, f.bank.default_tariff_id())
            .unwrap();
        f.notifier.clear();

        f.bank.remove_tariff(premium).unwrap();

        let account = f.bank.account(moved).unwrap();
        assert_eq!(account.tariff_id(), f.bank.default_tariff_id());
        assert!(account.is_blocked());
        assert!(!f.bank.account(untouched).unwrap().is_blocked());
        assert!(f.bank.tariff(premium).is_err());

        let delivered = f.notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].client_id, user);
        assert_eq!(delivered[0].topic, NotificationTopic::TariffRemoved);
    }

    #[test]
    fn default_tariff_cannot_be_removed() {
        let mut f = fixture();
        let default = f.bank.default_tariff_id();
        assert_eq!(
            f.bank.remove_tariff(default).unwrap_err().kind(),
            BankErrorKind::OperationUnavailable
        );
        assert_eq!(
            f.bank.remove_tariff(TariffId::new()).unwrap_err().kind(),
            BankErrorKind::NotFound
        );
    }

    #[test]
    fn switching_to_the_current_tariff_is_a_duplicate() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        f.bank.add_subscription(client).unwrap();
        let default = f.bank.default_tariff_id();
        let account = f.bank.register_account(client, AccountKind::Debit, default).unwrap();

        assert_eq!(
            f.bank
                .change_bank_account_tariff(account, default)
                .unwrap_err()
                .kind(),
            BankErrorKind::Duplicate
        );

        let premium = f.bank.add_tariff(premium()).unwrap();
        f.notifier.clear();
        f.bank.change_bank_account_tariff(account, premium).unwrap();
        assert_eq!(f.bank.account(account).unwrap().tariff_id(), premium);
        assert_eq!(
            f.notifier.delivered()[0].topic,
            NotificationTopic::AccountTariffChanged
        );
    }

    #[test]
    fn tariff_changes_reach_only_its_users() {
        let mut f = fixture();
        let user = f.bank.register_client(unverified("Ivan")).unwrap();
        let other = f.bank.register_client(unverified("Oleg")).unwrap();
        f.bank.add_subscription(user).unwrap();
        f.bank.add_subscription(other).unwrap();
        let premium = f.bank.add_tariff(premium()).unwrap();
        f.bank.register_account(user, AccountKind::Debit, premium).unwrap();
        f.bank.register_account(user, AccountKind::Credit, premium).unwrap();
        f.notifier.clear();

        f.bank.change_debit_interest_rate(premium, dec!(0.07)).unwrap();
        f.bank
            .change_credit_condition_lower_boundary(premium, dec!(-2000))
            .unwrap();
        f.bank
            .change_credit_condition_commission(premium, dec!(0.2))
            .unwrap();
        f.bank
            .change_unverified_client_transaction_limit(premium, dec!(10))
            .unwrap();
        f.bank
            .change_deposit_interest_rate(premium, dec!(0), MAX_BOUNDARY, dec!(0.06))
            .unwrap();

        let tariff = f.bank.tariff(premium).unwrap();
        assert_eq!(tariff.debit_rate(), dec!(0.07));
        assert_eq!(tariff.credit_condition().lower_boundary(), dec!(-2000));
        assert_eq!(tariff.credit_condition().commission(), dec!(0.2));
        assert_eq!(tariff.unverified_limit(), dec!(10));
        assert_eq!(tariff.tiers()[0].rate(), dec!(0.06));

        assert_eq!(f.notifier.delivered_to(user).len(), 5);
        assert!(f.notifier.delivered_to(other).is_empty());
    }

    #[test]
    fn failed_tariff_change_leaves_tariff_untouched() {
        let mut f = fixture();
        let premium = f.bank.add_tariff(premium()).unwrap();

        let err = f
            .bank
            .change_debit_interest_rate(premium, dec!(-1))
            .unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::Validation);
        assert_eq!(f.bank.tariff(premium).unwrap().debit_rate(), dec!(0.05));

        assert_eq!(
            f.bank
                .change_debit_interest_rate(TariffId::new(), dec!(0.1))
                .unwrap_err()
                .kind(),
            BankErrorKind::NotFound
        );
    }

    #[test]
    fn delivery_failures_do_not_fail_operations() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        let mut bank = Bank::new(
            BankId::from_raw(3),
            &BankConfig::new("Flaky"),
            Arc::new(clock.clone()),
            Arc::new(RefusingNotifier),
        )
        .unwrap();
        let client = bank.register_client(unverified("Ivan")).unwrap();
        bank.add_subscription(client).unwrap();
        let account = bank
            .register_account(client, AccountKind::Debit, bank.default_tariff_id())
            .unwrap();

        let tx = Transaction::deposit(account, dec!(10), clock.now()).unwrap();
        bank.do_transaction(tx).unwrap();
        assert_eq!(bank.account(account).unwrap().balance(), dec!(10));
    }

    #[test]
    fn resubmitting_a_transaction_is_a_duplicate() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let account = f
            .bank
            .register_account(client, AccountKind::Debit, f.bank.default_tariff_id())
            .unwrap();

        let tx = Transaction::deposit(account, dec!(10), f.clock.now()).unwrap();
        f.bank.do_transaction(tx.clone()).unwrap();
        assert_eq!(
            f.bank.do_transaction(tx).unwrap_err().kind(),
            BankErrorKind::Duplicate
        );
        assert_eq!(f.bank.account(account).unwrap().balance(), dec!(10));
    }

    #[test]
    fn transfer_into_a_full_account_changes_nothing() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let default = f.bank.default_tariff_id();
        let source = f.bank.register_account(client, AccountKind::Debit, default).unwrap();
        let dest = f.bank.register_account(client, AccountKind::Debit, default).unwrap();
        let now = f.clock.now();
        f.bank
            .do_transaction(Transaction::deposit(source, dec!(10), now).unwrap())
            .unwrap();
        f.bank
            .do_transaction(Transaction::deposit(dest, Decimal::MAX, now).unwrap())
            .unwrap();

        let transfer = Transaction::transfer(source, dest, dec!(10), now).unwrap();
        let transfer_id = transfer.id();
        let err = f.bank.do_transaction(transfer).unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::Validation);

        assert_eq!(f.bank.account(source).unwrap().balance(), dec!(10));
        assert_eq!(f.bank.account(source).unwrap().history().len(), 1);
        assert_eq!(f.bank.account(dest).unwrap().balance(), Decimal::MAX);
        assert!(f.bank.transaction(transfer_id).is_err());

        let again = Transaction::deposit(dest, dec!(1), now).unwrap();
        assert_eq!(
            f.bank.do_transaction(again).unwrap_err().kind(),
            BankErrorKind::Validation
        );
        let dest = f.bank.account(dest).unwrap();
        assert_eq!(dest.history_total().unwrap(), Decimal::MAX);
    }

    #[test]
    fn sweep_that_cannot_post_leaves_every_account_untouched() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let steep = Tariff::new(
            "Steep",
            vec![DepositTier::open_ended(dec!(0), dec!(0.01)).unwrap()],
            dec!(730),
            CreditCondition::new(dec!(-10), dec!(0.1)).unwrap(),
            dec!(100),
        )
        .unwrap();
        let steep = f.bank.add_tariff(steep).unwrap();
        let plain = f
            .bank
            .register_account(client, AccountKind::Debit, f.bank.default_tariff_id())
            .unwrap();
        let huge = f.bank.register_account(client, AccountKind::Debit, steep).unwrap();
        let now = f.clock.now();
        f.bank
            .do_transaction(Transaction::deposit(plain, dec!(1000), now).unwrap())
            .unwrap();
        f.bank
            .do_transaction(Transaction::deposit(huge, Decimal::MAX, now).unwrap())
            .unwrap();

        let through = f.clock.today() + Duration::days(1);
        assert!(f.bank.apply_tariff_rates(through).is_err());

        let plain = f.bank.account(plain).unwrap();
        assert_eq!(plain.history().len(), 1);
        assert_eq!(plain.accrued_through(), None);
    }

    #[test]
    fn journal_forgets_transactions_of_removed_accounts() {
        let mut f = fixture();
        let ivan = f.bank.register_client(unverified("Ivan")).unwrap();
        let olga = f.bank.register_client(unverified("Olga")).unwrap();
        let default = f.bank.default_tariff_id();
        let kept = f.bank.register_account(ivan, AccountKind::Debit, default).unwrap();
        let closed = f.bank.register_account(olga, AccountKind::Debit, default).unwrap();
        let now = f.clock.now();

        let deposit = f
            .bank
            .do_transaction(Transaction::deposit(kept, dec!(100), now).unwrap())
            .unwrap();
        let transfer = f
            .bank
            .do_transaction(Transaction::transfer(kept, closed, dec!(40), now).unwrap())
            .unwrap();

        f.bank.remove_bank_account(closed).unwrap();
        assert_eq!(
            f.bank.transaction(transfer).unwrap_err().kind(),
            BankErrorKind::NotFound
        );
        assert_eq!(
            f.bank.undo_transaction(transfer).unwrap_err().kind(),
            BankErrorKind::NotFound
        );
        assert!(f.bank.transaction(deposit).is_ok());
        assert_eq!(f.bank.account(kept).unwrap().history().len(), 2);
        assert_eq!(f.bank.account(kept).unwrap().balance(), dec!(60));

        f.bank.remove_client(ivan).unwrap();
        assert!(f.bank.transaction(deposit).is_err());
    }

    #[test]
    fn refused_transfer_leg_leaves_both_accounts_untouched() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let default = f.bank.default_tariff_id();
        let premium = f.bank.add_tariff(premium()).unwrap();
        let source = f.bank.register_account(client, AccountKind::Debit, default).unwrap();
        let dest = f.bank.register_account(client, AccountKind::Debit, premium).unwrap();
        let now = f.clock.now();
        f.bank
            .do_transaction(Transaction::deposit(source, dec!(500), now).unwrap())
            .unwrap();

        f.bank.remove_tariff(premium).unwrap();
        assert!(f.bank.account(dest).unwrap().is_blocked());

        let err = f
            .bank
            .do_transaction(Transaction::transfer(source, dest, dec!(100), now).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), BankErrorKind::OperationUnavailable);
        assert_eq!(f.bank.account(source).unwrap().balance(), dec!(500));
        assert_eq!(f.bank.account(dest).unwrap().balance(), dec!(0));

        f.bank.unblock_account(dest).unwrap();
        f.bank
            .do_transaction(Transaction::transfer(source, dest, dec!(100), now).unwrap())
            .unwrap();
        assert_eq!(f.bank.account(dest).unwrap().balance(), dec!(100));
    }

    #[test]
    fn interest_sweep_posts_entries_and_advances_watermark() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let spec = TariffSpec {
            name: "Even".to_string(),
            debit_rate: dec!(0.365),
            ..TariffSpec::default()
        };
        let tariff = f.bank.add_tariff(spec.build().unwrap()).unwrap();
        let account = f.bank.register_account(client, AccountKind::Debit, tariff).unwrap();
        f.bank
            .do_transaction(Transaction::deposit(account, dec!(1000), f.clock.now()).unwrap())
            .unwrap();

        // 2025-03-01 through 2025-03-10 at 1 per day.
        let through = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let preview = f.bank.calculate_interest(account, through).unwrap();
        assert_eq!(preview.amount, dec!(10));
        assert_eq!(f.bank.account(account).unwrap().balance(), dec!(1000));

        let accruals = f.bank.apply_tariff_rates(through).unwrap();
        assert_eq!(accruals, vec![preview]);

        let account = f.bank.account(account).unwrap();
        assert_eq!(account.balance(), dec!(1010));
        assert_eq!(account.history_total().unwrap(), account.balance());
        assert_eq!(account.accrued_through(), Some(through));
        assert_eq!(
            account.history().last().map(Entry::kind),
            Some(EntryKind::Interest)
        );
    }

    #[test]
    fn sweep_twice_for_the_same_day_posts_nothing_new() {
        let mut f = fixture();
        let client = f.bank.register_client(unverified("Ivan")).unwrap();
        let account = f
            .bank
            .register_account(client, AccountKind::Debit, f.bank.default_tariff_id())
            .unwrap();
        f.bank
            .do_transaction(Transaction::deposit(account, dec!(36500), f.clock.now()).unwrap())
            .unwrap();

        let today = f.clock.today();
        f.bank.apply_tariff_rates(today).unwrap();
        let after_first = f.bank.account(account).unwrap().balance();
        let second = f.bank.apply_tariff_rates(today).unwrap();

        assert_eq!(second[0].amount, Decimal::ZERO);
        assert_eq!(f.bank.account(account).unwrap().balance(), after_first);
        assert_eq!(after_first, dec!(36503));
    }

    #[test]
    fn sweep_rejects_past_dates() {
        let mut f = fixture();
        let yesterday = f.clock.today() - Duration::days(1);
        assert_eq!(
            f.bank.apply_tariff_rates(yesterday).unwrap_err().kind(),
            BankErrorKind::Validation
        );
    }
}
