use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use banks_core::{BankId, ClientId};

/// What a notification is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTopic {
    AccountRemoved,
    TariffAdded,
    TariffRemoved,
    AccountTariffChanged,
    TariffTermsChanged,
    TransactionExecuted,
    TransactionUndone,
}

impl NotificationTopic {
    /// Stable topic name (e.g. "ledger.transaction.executed").
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationTopic::AccountRemoved => "ledger.account.removed",
            NotificationTopic::TariffAdded => "ledger.tariff.added",
            NotificationTopic::TariffRemoved => "ledger.tariff.removed",
            NotificationTopic::AccountTariffChanged => "ledger.account.tariff_changed",
            NotificationTopic::TariffTermsChanged => "ledger.tariff.terms_changed",
            NotificationTopic::TransactionExecuted => "ledger.transaction.executed",
            NotificationTopic::TransactionUndone => "ledger.transaction.undone",
        }
    }
}

impl core::fmt::Display for NotificationTopic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message addressed to one subscribed client.
///
/// Notifications are facts: they are built after the operation they describe
/// has already succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub bank_id: BankId,
    pub client_id: ClientId,
    pub topic: NotificationTopic,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        bank_id: BankId,
        client_id: ClientId,
        topic: NotificationTopic,
        message: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bank_id,
            client_id,
            topic,
            message: message.into(),
            occurred_at,
        }
    }
}
