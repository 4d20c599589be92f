//! Notification delivery boundary.
//!
//! The ledger calls into a [`NotificationService`] after each successful
//! state change. Delivery is best-effort: an error is reported back to the
//! caller for logging but never undoes the operation that triggered it.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use thiserror::Error;

use banks_clients::Client;

use crate::notification::Notification;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Internal lock poisoning inside the notifier.
    #[error("notifier state poisoned")]
    Poisoned,

    /// The transport refused the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivers notifications to clients.
///
/// Implementations must be `Send + Sync` so a bank can be moved across
/// threads together with its notifier.
pub trait NotificationService: Send + Sync + core::fmt::Debug {
    fn notify(&self, client: &Client, notification: &Notification) -> Result<(), NotifyError>;
}

impl<N> NotificationService for Arc<N>
where
    N: NotificationService + ?Sized,
{
    fn notify(&self, client: &Client, notification: &Notification) -> Result<(), NotifyError> {
        (**self).notify(client, notification)
    }
}

/// Receiving end of a [`crate::ChannelNotifier`]; sees every notification
/// delivered after it subscribed.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<Notification>,
}

impl Subscription {
    pub(crate) fn new(receiver: Receiver<Notification>) -> Self {
        Self { receiver }
    }

    /// Next queued notification, without blocking.
    pub fn next_pending(&self) -> Option<Notification> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }
}
