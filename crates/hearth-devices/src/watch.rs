//! Watchers wiring the push channels to reconcilers and notifications.
//!
//! A watcher owns one channel subscription for its lifetime. Snapshots run
//! through the matching reconciler; the resulting transitions become
//! [`Notice`]s, and (for devices) the full list is published through a
//! `tokio::sync::watch` channel for whoever renders it. Connection edges
//! from the channel become the one-time "connection lost"/"connection
//! restored" notice pair.

use std::sync::Arc;

use futures::StreamExt as _;
use hearth_core::device::{Device, DeviceSnapshot, SystemHealth};
use hearth_core::notify::{Notice, Notify};
use hearth_core::retry::ReconnectConfig;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::channel::{ChannelConfig, ChannelEvent, subscribe};
use crate::health::{HealthEvent, HealthReconciler};
use crate::reconcile::{DeviceReconciler, Transition};

fn stream_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

// ─────────────────────────────────────────────────────────────────────────────
// DeviceWatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Long-lived consumer of `/api/devices/stream`.
pub struct DeviceWatcher {
    http: reqwest::Client,
    config: ChannelConfig,
    notifier: Arc<dyn Notify>,
    devices_tx: watch::Sender<Vec<Device>>,
}

impl DeviceWatcher {
    /// Create a watcher for the backend at `base_url`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        reconnect: ReconnectConfig,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        let (devices_tx, _) = watch::channel(Vec::new());
        Self {
            http,
            config: ChannelConfig {
                url: stream_url(base_url, "/api/devices/stream"),
                reconnect,
            },
            notifier,
            devices_tx,
        }
    }

    /// Subscribe to the published device list.
    ///
    /// The receiver always holds the latest full snapshot; it is replaced
    /// wholesale on every tick regardless of whether anything changed.
    #[must_use]
    pub fn devices(&self) -> watch::Receiver<Vec<Device>> {
        self.devices_tx.subscribe()
    }

    /// Drive the subscription until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut reconciler = DeviceReconciler::new();
        let mut seen_closed = false;

        let events = subscribe(self.http.clone(), self.config.clone(), cancel);
        futures::pin_mut!(events);

        while let Some(event) = events.next().await {
            match event {
                ChannelEvent::Open => {
                    if seen_closed {
                        self.notifier
                            .notify(Notice::success("Devices", "Connection restored"));
                        seen_closed = false;
                    }
                }
                ChannelEvent::Closed => {
                    self.notifier
                        .notify(Notice::warning("Devices", "Connection lost, retrying"));
                    seen_closed = true;
                }
                ChannelEvent::Message { event, data } if event == "devices" => {
                    match serde_json::from_str::<DeviceSnapshot>(&data) {
                        Ok(snapshot) => self.apply(&mut reconciler, snapshot),
                        Err(e) => warn!("undecodable device snapshot: {e}"),
                    }
                }
                ChannelEvent::Message { .. } => {} // other event names ignored
            }
        }
    }

    fn apply(&self, reconciler: &mut DeviceReconciler, snapshot: DeviceSnapshot) {
        let outcome = reconciler.observe(&snapshot.items);

        if !outcome.initial_offline.is_empty() {
            let names: Vec<&str> = outcome
                .initial_offline
                .iter()
                .map(|device| device.name.as_str())
                .collect();
            self.notifier.notify(Notice::info(
                "Devices currently offline",
                names.join(", "),
            ));
        }

        for transition in &outcome.transitions {
            let notice = match transition {
                Transition::WentOffline(device) => {
                    Notice::warning(device.name.clone(), "went offline")
                }
                Transition::CameOnline(device) => {
                    Notice::success(device.name.clone(), "back online")
                }
            };
            self.notifier.notify(notice);
        }

        // the full list replaces the prior one whether or not anything changed
        let _ = self.devices_tx.send(snapshot.items);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HealthWatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Long-lived consumer of `/api/system/stream`.
pub struct HealthWatcher {
    http: reqwest::Client,
    config: ChannelConfig,
    notifier: Arc<dyn Notify>,
    health_tx: watch::Sender<Option<SystemHealth>>,
}

impl HealthWatcher {
    /// Create a watcher for the backend at `base_url`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        reconnect: ReconnectConfig,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        let (health_tx, _) = watch::channel(None);
        Self {
            http,
            config: ChannelConfig {
                url: stream_url(base_url, "/api/system/stream"),
                reconnect,
            },
            notifier,
            health_tx,
        }
    }

    /// Subscribe to the latest health report.
    #[must_use]
    pub fn health(&self) -> watch::Receiver<Option<SystemHealth>> {
        self.health_tx.subscribe()
    }

    /// Drive the subscription until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut reconciler = HealthReconciler::new();
        let mut seen_closed = false;

        let events = subscribe(self.http.clone(), self.config.clone(), cancel);
        futures::pin_mut!(events);

        while let Some(event) = events.next().await {
            match event {
                ChannelEvent::Open => {
                    if seen_closed {
                        self.notifier
                            .notify(Notice::success("System", "Connection restored"));
                        seen_closed = false;
                    }
                }
                ChannelEvent::Closed => {
                    self.notifier
                        .notify(Notice::warning("System", "Connection lost, retrying"));
                    seen_closed = true;
                }
                // the system stream uses the `system` name, but some
                // deployments emit unnamed (default) events
                ChannelEvent::Message { event, data }
                    if event == "system" || event == "message" =>
                {
                    match serde_json::from_str::<SystemHealth>(&data) {
                        Ok(health) => {
                            for event in reconciler.observe(&health) {
                                self.notifier.notify(health_notice(event));
                            }
                            let _ = self.health_tx.send(Some(health));
                        }
                        Err(e) => warn!("undecodable health report: {e}"),
                    }
                }
                ChannelEvent::Message { .. } => {}
            }
        }
    }
}

fn health_notice(event: HealthEvent) -> Notice {
    match event {
        HealthEvent::AlreadyDown(flag) => Notice::warning(flag.label(), "is down"),
        HealthEvent::WentDown(flag) => Notice::error(flag.label(), "went down"),
        HealthEvent::Recovered(flag) => Notice::success(flag.label(), "recovered"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::notify::{MemoryNotifier, Severity};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_reconnect() -> ReconnectConfig {
        ReconnectConfig {
            base_delay_ms: 5,
            max_delay_ms: 10,
            jitter_factor: 0.0,
        }
    }

    async fn wait_for_notices(notifier: &MemoryNotifier, count: usize) {
        let deadline = std::time::Duration::from_secs(5);
        tokio::time::timeout(deadline, async {
            while notifier.len() < count {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("expected notices never arrived");
    }

    #[tokio::test]
    async fn device_transition_notifies_once_and_publishes_list() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: devices\n",
            "data: {\"ts\": 1, \"items\": [{\"id\": \"light.k\", \"name\": \"Kitchen\", \"type\": \"light\", \"state\": \"on\", \"online\": true}]}\n",
            "\n",
            "event: devices\n",
            "data: {\"ts\": 2, \"items\": [{\"id\": \"light.k\", \"name\": \"Kitchen\", \"type\": \"light\", \"state\": \"on\", \"online\": false}]}\n",
            "\n",
        );
        Mock::given(method("GET"))
            .and(path("/api/devices/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let notifier = Arc::new(MemoryNotifier::new());
        let watcher = Arc::new(DeviceWatcher::new(
            reqwest::Client::new(),
            &server.uri(),
            fast_reconnect(),
            notifier.clone(),
        ));
        let mut devices = watcher.devices();
        let cancel = CancellationToken::new();
        let task = {
            let watcher = watcher.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.run(cancel).await })
        };

        // one offline transition + one connection-lost edge
        wait_for_notices(&notifier, 2).await;
        cancel.cancel();
        task.await.unwrap();

        let notices = notifier.take();
        assert_eq!(notices[0].severity, Severity::Warning);
        assert_eq!(notices[0].title, "Kitchen");
        assert_eq!(notices[0].body, "went offline");
        assert_eq!(notices[1].title, "Devices");

        // the published list is the latest snapshot, offline device included
        let latest = devices.borrow_and_update();
        assert_eq!(latest.len(), 1);
        assert!(!latest[0].is_online());
    }

    #[tokio::test]
    async fn first_snapshot_offline_devices_get_summary_notice_only() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: devices\n",
            "data: {\"ts\": 1, \"items\": [{\"id\": \"cover.garage\", \"name\": \"Garage\", \"type\": \"cover\", \"state\": \"closed\", \"online\": false}]}\n",
            "\n",
        );
        Mock::given(method("GET"))
            .and(path("/api/devices/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let notifier = Arc::new(MemoryNotifier::new());
        let watcher = Arc::new(DeviceWatcher::new(
            reqwest::Client::new(),
            &server.uri(),
            fast_reconnect(),
            notifier.clone(),
        ));
        let cancel = CancellationToken::new();
        let task = {
            let watcher = watcher.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.run(cancel).await })
        };

        wait_for_notices(&notifier, 1).await;
        cancel.cancel();
        task.await.unwrap();

        let notices = notifier.take();
        // a "currently offline" summary, never a "went offline" transition
        assert_eq!(notices[0].severity, Severity::Info);
        assert_eq!(notices[0].title, "Devices currently offline");
        assert_eq!(notices[0].body, "Garage");
    }

    #[tokio::test]
    async fn health_edges_notify_per_flag() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: system\n",
            "data: {\"ts\": 1, \"uptime_s\": 5, \"ha_ok\": true, \"db_ok\": true}\n",
            "\n",
            "event: system\n",
            "data: {\"ts\": 2, \"uptime_s\": 6, \"ha_ok\": false, \"db_ok\": true}\n",
            "\n",
        );
        Mock::given(method("GET"))
            .and(path("/api/system/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let notifier = Arc::new(MemoryNotifier::new());
        let watcher = Arc::new(HealthWatcher::new(
            reqwest::Client::new(),
            &server.uri(),
            fast_reconnect(),
            notifier.clone(),
        ));
        let mut health = watcher.health();
        let cancel = CancellationToken::new();
        let task = {
            let watcher = watcher.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.run(cancel).await })
        };

        wait_for_notices(&notifier, 1).await;
        cancel.cancel();
        task.await.unwrap();

        let notices = notifier.take();
        assert_eq!(notices[0].severity, Severity::Error);
        assert_eq!(notices[0].title, "Home Assistant");
        assert_eq!(notices[0].body, "went down");

        let latest = health.borrow_and_update();
        assert!(!latest.as_ref().unwrap().ha_ok);
    }
}
