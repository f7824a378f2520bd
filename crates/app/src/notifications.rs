//! User-facing notifications.

use std::{fmt::Debug, sync::Arc};

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::errors::CartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,

    /// Whether offering a retry makes sense.
    pub retryable: bool,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// Notification describing a failed cart operation.
    pub fn for_error(error: &CartError) -> Self {
        Self {
            level: Level::Error,
            message: messages::for_error(error),
            retryable: error.is_retryable(),
        }
    }

    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            retryable: false,
        }
    }
}

/// Delivers notifications to the shopper.
pub trait Notifier: Debug + Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            level,
            message,
            retryable,
        } = notification;

        match level {
            Level::Success | Level::Info => info!(retryable, "{message}"),
            Level::Warning => warn!(retryable, "{message}"),
            Level::Error => error!(retryable, "{message}"),
        }
    }
}

/// Keeps notifications in memory until drained.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    /// Messages received so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|notification| notification.message.clone())
            .collect()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// Delivers every notification to each inner notifier in turn.
#[derive(Debug)]
pub struct FanOutNotifier(Vec<Arc<dyn Notifier>>);

impl FanOutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self(notifiers)
    }
}

impl Notifier for FanOutNotifier {
    fn notify(&self, notification: Notification) {
        for notifier in &self.0 {
            notifier.notify(notification.clone());
        }
    }
}

/// Message catalogue.
pub mod messages {
    use crate::errors::{CartError, ErrorKind, ValidationCode};

    pub const NETWORK: &str = "Can't reach the store. Check your connection and try again.";
    pub const SERVER: &str = "Something went wrong on our side. Please try again.";
    pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";
    pub const NOT_ENOUGH_STOCK: &str = "Not enough stock for that quantity.";
    pub const ITEM_GONE: &str = "That item is no longer in your cart.";
    pub const STORAGE: &str = "Couldn't save your cart on this device.";
    pub const INVALID_REQUEST: &str = "That change isn't allowed.";

    pub const SYNC_NETWORK: &str =
        "We couldn't merge your saved cart. It's still here and we'll try again next time you sign in.";
    pub const SYNC_ALL_GONE: &str = "Items in your saved cart are no longer available.";
    pub const SYNC_ALL_SOLD_OUT: &str = "Items in your saved cart are out of stock.";
    pub const SYNC_ALL_FAILED: &str = "We couldn't add the items from your saved cart.";

    /// User message for a failed cart operation.
    pub fn for_error(error: &CartError) -> String {
        match error {
            CartError::Validation { code, message } => {
                if !message.trim().is_empty() {
                    return message.clone();
                }

                match code {
                    ValidationCode::StockExceeded => NOT_ENOUGH_STOCK.to_string(),
                    _ => INVALID_REQUEST.to_string(),
                }
            }
            _ => match error.kind() {
                ErrorKind::Network => NETWORK,
                ErrorKind::Auth => SESSION_EXPIRED,
                ErrorKind::NotFound => ITEM_GONE,
                ErrorKind::Storage => STORAGE,
                ErrorKind::Server | ErrorKind::Validation => SERVER,
            }
            .to_string(),
        }
    }

    pub fn synced(count: u32) -> String {
        format!("Added {count} {} from your saved cart.", items(count))
    }

    pub fn partially_synced(synced: u32, failed: usize) -> String {
        format!("{synced} {} added, {failed} unavailable.", items(synced))
    }

    /// Why entries were dropped; `None` when there is nothing to break down.
    pub fn sync_breakdown(deleted: usize, out_of_stock: usize) -> Option<String> {
        let mut parts = Vec::new();

        if deleted > 0 {
            parts.push(format!("{deleted} no longer available"));
        }

        if out_of_stock > 0 {
            parts.push(format!("{out_of_stock} out of stock"));
        }

        (!parts.is_empty()).then(|| format!("{}.", parts.join(", ")))
    }

    fn items(count: impl Into<u64>) -> &'static str {
        if count.into() == 1 { "item" } else { "items" }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::errors::ValidationCode;

    #[test]
    fn stock_error_without_message_gets_stock_text() {
        let error = CartError::Validation {
            code: ValidationCode::StockExceeded,
            message: String::new(),
        };

        assert_eq!(messages::for_error(&error), messages::NOT_ENOUGH_STOCK);
    }

    #[test]
    fn validation_message_is_verbatim() {
        let error = CartError::from_status(400, r#"{"message":"Size XL is sold out","code":"SIZE_INVALID"}"#);

        assert_eq!(messages::for_error(&error), "Size XL is sold out");
    }

    #[test]
    fn classified_messages() {
        let network = CartError::Network(Box::new(io::Error::from(io::ErrorKind::TimedOut)));

        assert_eq!(messages::for_error(&network), messages::NETWORK);
        assert_eq!(messages::for_error(&CartError::Unauthorized), messages::SESSION_EXPIRED);
        assert_eq!(
            messages::for_error(&CartError::from_status(500, "")),
            messages::SERVER
        );
        assert_eq!(
            messages::for_error(&CartError::from_status(404, "")),
            messages::ITEM_GONE
        );
    }

    #[test]
    fn error_notifications_offer_retry_when_retryable() {
        let notification = Notification::for_error(&CartError::from_status(503, ""));

        assert_eq!(notification.level, Level::Error);
        assert!(notification.retryable);
        assert!(!Notification::for_error(&CartError::Unauthorized).retryable);
    }

    #[test]
    fn breakdown_only_lists_nonzero_counts() {
        assert_eq!(
            messages::sync_breakdown(1, 0).as_deref(),
            Some("1 no longer available.")
        );
        assert_eq!(
            messages::sync_breakdown(2, 1).as_deref(),
            Some("2 no longer available, 1 out of stock.")
        );
        assert_eq!(messages::sync_breakdown(0, 0), None);
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();

        notifier.notify(Notification::info("first"));
        notifier.notify(Notification::warning("second"));

        assert_eq!(notifier.messages(), vec!["first", "second"]);
        assert_eq!(notifier.drain().len(), 2);
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn fan_out_reaches_every_notifier() {
        let first = Arc::new(RecordingNotifier::new());
        let second = Arc::new(RecordingNotifier::new());
        let notifier = FanOutNotifier::new(vec![
            first.clone(),
            second.clone(),
            Arc::new(TracingNotifier),
        ]);

        notifier.notify(Notification::success("done"));

        assert_eq!(first.messages(), vec!["done"]);
        assert_eq!(second.messages(), vec!["done"]);
    }
}
