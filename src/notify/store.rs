//! # Notification Store
//!
//! In-memory per-namespace log of refresh notifications. Each namespace
//! holds a bounded FIFO; when full, the oldest entry is dropped before
//! a new one is appended. Lookups and updates scan under the same shard
//! guard as writes.

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::notify::{Notification, NotificationStatus};

/// Capacity of each per-namespace notification list.
pub const MAX_NOTIFICATIONS_PER_NAMESPACE: usize = 20;

#[derive(Debug, Default)]
pub struct NotifyStore {
    storage: DashMap<String, Vec<Notification>>,
}

impl NotifyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification, evicting the oldest entry at capacity.
    pub fn store(&self, namespace: &str, notification: Notification) {
        let mut entry = self.storage.entry(namespace.to_string()).or_default();
        if entry.len() >= MAX_NOTIFICATIONS_PER_NAMESPACE {
            let removed = entry.remove(0);
            debug!(namespace, id = %removed.id, "Removed oldest notification at capacity");
        }
        debug!(namespace, id = %notification.id, status = ?notification.status, "Stored notification");
        entry.push(notification);
    }

    /// Transform the notification with the given id in place, preserving
    /// its position. Returns the updated value, or `None` if no entry
    /// with that id exists.
    pub fn update<F>(&self, namespace: &str, id: &str, transform: F) -> Option<Notification>
    where
        F: FnOnce(Notification) -> Notification,
    {
        let mut entry = match self.storage.get_mut(namespace) {
            Some(entry) => entry,
            None => {
                warn!(namespace, id, "No notifications exist for namespace");
                return None;
            }
        };

        let position = entry.iter().position(|n| n.id == id);
        match position {
            Some(index) => {
                let updated = transform(entry[index].clone());
                entry[index] = updated.clone();
                debug!(namespace, id, status = ?updated.status, "Updated notification");
                Some(updated)
            }
            None => {
                warn!(namespace, id, "Notification not found");
                None
            }
        }
    }

    /// Up to `max` entries for a namespace, newest first.
    pub fn recent(&self, namespace: &str, max: usize) -> Vec<Notification> {
        let mut notifications = match self.storage.get(namespace) {
            Some(entry) => entry.clone(),
            None => return Vec::new(),
        };
        notifications.sort_by(|a, b| b.initiated_time.cmp(&a.initiated_time));
        notifications.truncate(max);
        notifications
    }

    /// Mark every IN_PROGRESS entry FAILED across all namespaces.
    /// Used when the notifier shuts down with callbacks still in flight.
    pub fn fail_in_progress(&self) -> usize {
        let mut failed = 0;
        for mut entry in self.storage.iter_mut() {
            for notification in entry.value_mut().iter_mut() {
                if notification.status == NotificationStatus::InProgress {
                    notification.status = NotificationStatus::Failed;
                    failed += 1;
                }
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_recent() {
        let store = NotifyStore::new();
        store.store("prod", Notification::initial("c1"));
        store.store("prod", Notification::initial("c2"));

        let recent = store.recent("prod", 10);
        assert_eq!(recent.len(), 2);
        assert!(store.recent("other", 10).is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let store = NotifyStore::new();
        for i in 0..MAX_NOTIFICATIONS_PER_NAMESPACE + 3 {
            store.store("prod", Notification::initial(format!("c{}", i)));
        }

        let recent = store.recent("prod", 100);
        assert_eq!(recent.len(), MAX_NOTIFICATIONS_PER_NAMESPACE);
        assert!(!recent.iter().any(|n| n.id == "c0"));
        assert!(!recent.iter().any(|n| n.id == "c2"));
        assert!(recent.iter().any(|n| n.id == "c3"));
    }

    #[test]
    fn test_update_preserves_position() {
        let store = NotifyStore::new();
        store.store("prod", Notification::initial("c1"));
        store.store("prod", Notification::initial("c2"));
        store.store("prod", Notification::initial("c3"));

        let updated = store.update("prod", "c2", Notification::with_success).unwrap();
        assert_eq!(updated.status, NotificationStatus::Success);

        // order unchanged, only the status moved
        let ids: Vec<String> =
            store.storage.get("prod").unwrap().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_update_missing_returns_none() {
        let store = NotifyStore::new();
        assert!(store.update("prod", "absent", Notification::with_success).is_none());
        store.store("prod", Notification::initial("c1"));
        assert!(store.update("prod", "absent", Notification::with_failure).is_none());
    }

    #[test]
    fn test_recent_is_newest_first_and_bounded() {
        let store = NotifyStore::new();
        for i in 0..5i64 {
            let mut n = Notification::initial(format!("c{}", i));
            n.initiated_time = chrono::Local::now() + chrono::Duration::seconds(i);
            store.store("prod", n);
        }

        let recent = store.recent("prod", 3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].id, "c4");
        assert_eq!(recent[1].id, "c3");
        assert_eq!(recent[2].id, "c2");
    }

    #[test]
    fn test_fail_in_progress_sweep() {
        let store = NotifyStore::new();
        store.store("prod", Notification::initial("c1"));
        store.store("prod", Notification::initial("c2").with_success());
        store.store("staging", Notification::initial("c3"));

        assert_eq!(store.fail_in_progress(), 2);
        let prod = store.recent("prod", 10);
        assert!(prod.iter().all(|n| n.status != NotificationStatus::InProgress));
        assert!(prod.iter().any(|n| n.status == NotificationStatus::Success));
    }
}
