//! Toast notifications
//!
//! A [`ToastStore`] is created once per application and passed by reference.
//! Every enqueue and every removal notifies all subscribers synchronously
//! with the full current list. Toasts expire after a fixed timeout, checked
//! by [`ToastStore::prune_expired`] from the event loop tick.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_TOAST_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Success => "✓",
            ToastKind::Error => "✗",
            ToastKind::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: Instant,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl Toast {
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&[Toast]) + Send>;

pub struct ToastStore {
    toasts: Vec<Toast>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    timeout: Duration,
}

impl Default for ToastStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TIMEOUT)
    }
}

impl fmt::Debug for ToastStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastStore")
            .field("toasts", &self.toasts)
            .field("listeners", &self.listeners.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToastStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[Toast]) + Send + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.publish(ToastKind::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.publish(ToastKind::Error, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> Uuid {
        self.publish(ToastKind::Info, message)
    }

    pub fn publish(&mut self, kind: ToastKind, message: impl Into<String>) -> Uuid {
        self.publish_at(kind, message, Instant::now())
    }

    pub fn publish_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: now,
            timestamp: chrono::Local::now(),
        };
        let id = toast.id;
        debug!("Toast {:?}: {}", kind, toast.message);
        self.toasts.push(toast);
        self.notify();
        id
    }

    /// Remove one toast early
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        let removed = self.toasts.len() != before;
        if removed {
            self.notify();
        }
        removed
    }

    /// Drop every toast older than the timeout. Subscribers hear about it
    /// only when something was removed.
    pub fn prune_expired(&mut self, now: Instant) -> usize {
        let timeout = self.timeout;
        let before = self.toasts.len();
        self.toasts.retain(|toast| !toast.is_expired(now, timeout));
        let removed = before - self.toasts.len();
        if removed > 0 {
            self.notify();
        }
        removed
    }

    /// Current toasts in insertion order
    pub fn current(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Drop all toasts and listeners without notifying
    pub fn dispose(&mut self) {
        self.toasts.clear();
        self.listeners.clear();
    }

    fn notify(&mut self) {
        let snapshot = self.toasts.as_slice();
        for (_, listener) in self.listeners.iter_mut() {
            listener(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(store: &mut ToastStore) -> (SubscriptionId, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |toasts| {
            let messages = toasts.iter().map(|t| t.message.clone()).collect();
            sink.lock().unwrap().push(messages);
        });
        (id, seen)
    }

    #[test]
    fn test_error_toast_appears_then_expires() {
        let mut store = ToastStore::default();
        let (_, seen) = recorder(&mut store);
        let start = Instant::now();

        store.publish_at(ToastKind::Error, "X", start);
        assert_eq!(seen.lock().unwrap().last().unwrap(), &vec!["X".to_string()]);
        assert_eq!(store.current()[0].kind, ToastKind::Error);

        assert_eq!(store.prune_expired(start + Duration::from_millis(2999)), 0);
        assert_eq!(store.current().len(), 1);

        assert_eq!(store.prune_expired(start + Duration::from_millis(3000)), 1);
        assert!(store.current().is_empty());
        assert!(seen.lock().unwrap().last().unwrap().is_empty());
    }

    #[test]
    fn test_insertion_order_and_no_dedup() {
        let mut store = ToastStore::default();
        store.info("same");
        store.success("other");
        store.info("same");
        let messages: Vec<&str> = store.current().iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["same", "other", "same"]);
    }

    #[test]
    fn test_every_change_notifies_all_listeners() {
        let mut store = ToastStore::default();
        let (_, first) = recorder(&mut store);
        let (second_id, second) = recorder(&mut store);

        let id = store.success("saved");
        store.dismiss(id);
        assert_eq!(first.lock().unwrap().len(), 2);
        assert_eq!(second.lock().unwrap().len(), 2);

        assert!(store.unsubscribe(second_id));
        assert!(!store.unsubscribe(second_id));
        store.info("later");
        assert_eq!(first.lock().unwrap().len(), 3);
        assert_eq!(second.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_custom_timeout_and_dispose() {
        let mut store = ToastStore::new(Duration::from_millis(500));
        let (_, seen) = recorder(&mut store);
        let start = Instant::now();
        store.publish_at(ToastKind::Info, "short", start);
        assert_eq!(store.prune_expired(start + Duration::from_millis(600)), 1);

        store.info("gone");
        store.dispose();
        assert!(store.is_empty());
        let calls = seen.lock().unwrap().len();
        store.info("unheard");
        assert_eq!(seen.lock().unwrap().len(), calls);
    }
}
