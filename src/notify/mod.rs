//! # Refresh Notifications
//!
//! Best-effort HTTP callbacks that tell client applications to refresh
//! after a configuration write, plus the bounded in-memory log used to
//! report their outcomes.

pub mod notifier;
pub mod store;

pub use notifier::Notifier;
pub use store::{NotifyStore, MAX_NOTIFICATIONS_PER_NAMESPACE};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Delivery state of one refresh callback.
/// Transitions: `InProgress` → `Success` or `InProgress` → `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    InProgress,
    Success,
    Failed,
}

/// One tracked refresh callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Tracking id: the triggering commit id, or a generated id when no
    /// commit is associated
    pub id: String,
    pub status: NotificationStatus,
    pub initiated_time: DateTime<Local>,
}

impl Notification {
    pub fn initial<S: Into<String>>(id: S) -> Self {
        Self { id: id.into(), status: NotificationStatus::InProgress, initiated_time: Local::now() }
    }

    pub fn with_success(mut self) -> Self {
        self.status = NotificationStatus::Success;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.status = NotificationStatus::Failed;
        self
    }
}

/// Notification log view for one namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceNotifications {
    pub namespace: String,
    pub notifications: Vec<Notification>,
    pub total_notifications: usize,
    pub max_notifications: usize,
}
