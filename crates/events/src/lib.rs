//! Ledger notifications: payload, delivery boundary and stock notifiers.

pub mod notification;
pub mod notifiers;
pub mod service;

pub use notification::{Notification, NotificationTopic};
pub use notifiers::{ChannelNotifier, InMemoryNotifier, TracingNotifier};
pub use service::{NotificationService, NotifyError, Subscription};
