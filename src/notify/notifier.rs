//! # Client Notifier
//!
//! Dispatches refresh callbacks to client applications after a
//! configuration write. Each callback runs as its own task on the
//! runtime; outcomes are recorded in the [`NotifyStore`] and failures
//! never propagate to the writer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{debug, error, info};

use crate::config::ConfigServerConfig;
use crate::notify::{Notification, NotifyStore};

/// Connect + read timeout for refresh callbacks.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Notifier {
    client: reqwest::Client,
    refresh_urls: HashMap<String, String>,
    store: Arc<NotifyStore>,
    shutting_down: AtomicBool,
    in_flight: Mutex<Vec<AbortHandle>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("refresh_urls", &self.refresh_urls.len())
            .field("shutting_down", &self.shutting_down.load(Ordering::Relaxed))
            .finish()
    }
}

impl Notifier {
    pub fn new(settings: &ConfigServerConfig, store: Arc<NotifyStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CALLBACK_TIMEOUT)
            .connect_timeout(CALLBACK_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            refresh_urls: settings.refresh_notify_url.clone(),
            store,
            shutting_down: AtomicBool::new(false),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Record a refresh notification for `namespace` and, when a callback
    /// URL is configured, POST `{"appName": ...}` to it asynchronously.
    /// Without a URL the notification is marked SUCCESS immediately.
    pub fn send_refresh(&self, namespace: &str, app_name: &str, commit_id: Option<&str>) {
        if self.shutting_down.load(Ordering::Acquire) {
            debug!(namespace, app_name, "Notifier is shutting down, refusing new notification");
            return;
        }

        let tracking_id = match commit_id {
            Some(id) => id.to_string(),
            None => format!("notify-{}-{}", chrono::Utc::now().timestamp_millis(), app_name),
        };

        self.store.store(namespace, Notification::initial(&tracking_id));
        debug!(namespace, tracking_id, "Created refresh notification");

        let url = match self.refresh_urls.get(namespace).filter(|u| !u.trim().is_empty()) {
            Some(url) => url.clone(),
            None => {
                debug!(namespace, "No refresh URL configured, marking notification successful");
                self.store.update(namespace, &tracking_id, Notification::with_success);
                return;
            }
        };

        // Callbacks run on the server runtime; writers may call in from
        // blocking worker threads, which still carry the runtime context.
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                error!(namespace, tracking_id, "No async runtime available for refresh callback");
                self.store.update(namespace, &tracking_id, Notification::with_failure);
                return;
            }
        };

        let client = self.client.clone();
        let store = Arc::clone(&self.store);
        let namespace = namespace.to_string();
        let app_name = app_name.to_string();

        let task = handle.spawn(async move {
            let payload = serde_json::json!({ "appName": app_name });
            debug!(url, %payload, "Sending refresh notification");

            let outcome = client.post(&url).json(&payload).send().await;
            let success = match outcome {
                Ok(response) if response.status().is_success() => true,
                Ok(response) => {
                    error!(url, status = %response.status(), "Refresh notification rejected");
                    false
                }
                Err(e) => {
                    error!(url, error = %e, "Failed to send refresh notification");
                    false
                }
            };

            let transform =
                if success { Notification::with_success } else { Notification::with_failure };
            if store.update(&namespace, &tracking_id, transform).is_none() {
                error!(namespace, tracking_id, "Failed to record notification outcome");
            }
        });

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(task.abort_handle());
    }

    /// Orderly shutdown: refuse new enqueues, abort in-flight callbacks,
    /// and mark any remaining IN_PROGRESS entries FAILED.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);

        let handles = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::take(&mut *in_flight)
        };
        for handle in &handles {
            handle.abort();
        }

        let failed = self.store.fail_in_progress();
        info!(aborted = handles.len(), failed, "Notifier shutdown complete");
    }
}
