//! Stock notifier implementations.

use std::sync::{Mutex, mpsc};

use banks_clients::Client;
use banks_core::ClientId;

use crate::notification::Notification;
use crate::service::{NotificationService, NotifyError, Subscription};

/// Writes every notification to the `tracing` pipeline.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingNotifier;

impl NotificationService for TracingNotifier {
    fn notify(&self, client: &Client, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            bank_id = %notification.bank_id,
            client_id = %notification.client_id,
            client = %client.full_name(),
            topic = %notification.topic,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Keeps every delivered notification in memory (tests, simulations).
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    delivered: Mutex<Vec<Notification>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all deliveries, oldest first.
    pub fn delivered(&self) -> Vec<Notification> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn delivered_to(&self, client_id: ClientId) -> Vec<Notification> {
        self.delivered()
            .into_iter()
            .filter(|n| n.client_id == client_id)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.delivered.lock() {
            guard.clear();
        }
    }
}

impl NotificationService for InMemoryNotifier {
    fn notify(&self, _client: &Client, notification: &Notification) -> Result<(), NotifyError> {
        let mut guard = self.delivered.lock().map_err(|_| NotifyError::Poisoned)?;
        guard.push(notification.clone());
        Ok(())
    }
}

/// Fan-out notifier: every subscription receives a copy of each delivery.
///
/// - No IO / no async
/// - Dead subscriptions are dropped while publishing
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    subscribers: Mutex<Vec<mpsc::Sender<Notification>>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();

        // A poisoned lock still yields a subscription; it just stays silent.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription::new(rx)
    }
}

impl NotificationService for ChannelNotifier {
    fn notify(&self, _client: &Client, notification: &Notification) -> Result<(), NotifyError> {
        let mut subs = self.subscribers.lock().map_err(|_| NotifyError::Poisoned)?;

        subs.retain(|tx| tx.send(notification.clone()).is_ok());

        Ok(())
    }
}
