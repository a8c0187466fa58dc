//! Severity-aware, rate-limited notification dispatch.
//!
//! Change events pass through, in order: a severity-threshold filter
//! (alert events only), a governor rate limiter with a one-minute quota,
//! and severity-specific formatting. Accepted notifications join a
//! bounded FIFO queue and fan out over a broadcast channel.

use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use metrics::{counter, describe_counter};
use rand::Rng;
use socsim_core::detector::ChangeEvent;
use socsim_core::model::{
    AlertStatus, IntegrationStatus, Notification, NotificationAction, NotificationKind,
    PresenceStatus, Severity,
};
use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Broadcast capacity for the notification surface. Slow subscribers lag
/// rather than block dispatch.
const BROADCAST_CAPACITY: usize = 256;

/// Registers dispatch metric descriptions.
/// This should be called once during process initialization.
pub fn register_dispatch_metrics() {
    describe_counter!(
        "socsim_notifications_delivered_total",
        "Total number of notifications delivered to subscribers"
    );
    describe_counter!(
        "socsim_notifications_suppressed_total",
        "Total number of notifications suppressed below the severity threshold"
    );
    describe_counter!(
        "socsim_notifications_rate_limited_total",
        "Total number of notifications dropped by the rate limiter"
    );
}

/// Dispatch-side configuration, extracted from `SimulationConfig`.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Minimum severity for alert-derived notifications.
    pub severity_threshold: Severity,
    /// Rate limit over a one-minute window.
    pub max_per_minute: u32,
    /// Active-queue capacity; oldest entries evict first.
    pub queue_capacity: usize,
}

/// Counters exposed for inspection and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub suppressed: u64,
    pub rate_limited: u64,
}

/// Routes change events to the notification surface.
pub struct NotificationDispatcher {
    config: DispatcherConfig,
    limiter: DirectRateLimiter,
    active: Arc<RwLock<VecDeque<Notification>>>,
    sender: broadcast::Sender<Notification>,
    delivered: AtomicU64,
    suppressed: AtomicU64,
    rate_limited: AtomicU64,
}

impl NotificationDispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let per_minute =
            NonZeroU32::new(config.max_per_minute).unwrap_or(NonZeroU32::MIN);
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);

        Self {
            config,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            active: Arc::new(RwLock::new(VecDeque::new())),
            sender,
            delivered: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
        }
    }

    /// Subscribes to delivered notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Runs one event through the filter, the rate limiter, and the
    /// formatter. Returns the delivered notification, or `None` if the
    /// event was suppressed or rate-limited.
    pub async fn dispatch(&self, event: &ChangeEvent) -> Option<Notification> {
        if let Some(severity) = event.alert_severity() {
            if severity.rank() < self.config.severity_threshold.rank() {
                self.suppressed.fetch_add(1, Ordering::Relaxed);
                counter!("socsim_notifications_suppressed_total").increment(1);
                debug!(
                    event_type = event.event_type(),
                    severity = %severity,
                    "notification suppressed below severity threshold"
                );
                return None;
            }
        }

        if self.limiter.check().is_err() {
            self.rate_limited.fetch_add(1, Ordering::Relaxed);
            counter!("socsim_notifications_rate_limited_total").increment(1);
            warn!(
                event_type = event.event_type(),
                "notification dropped by rate limiter"
            );
            return None;
        }

        let notification = format_notification(event);
        self.push_active(notification.clone()).await;

        if !notification.persistent && !notification.duration.is_zero() {
            self.schedule_auto_dismiss(notification.id.clone(), notification.duration);
        }

        self.delivered.fetch_add(1, Ordering::Relaxed);
        counter!("socsim_notifications_delivered_total").increment(1);

        // Send fails only when no subscriber exists, which is fine for a
        // fire-and-forget surface.
        let _ = self.sender.send(notification.clone());
        Some(notification)
    }

    /// Currently active (not yet dismissed) notifications, oldest first.
    pub async fn active(&self) -> Vec<Notification> {
        self.active.read().await.iter().cloned().collect()
    }

    /// Removes a notification by id. Returns whether it was present.
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut active = self.active.write().await;
        let before = active.len();
        active.retain(|n| n.id != id);
        active.len() != before
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }

    async fn push_active(&self, notification: Notification) {
        let mut active = self.active.write().await;
        while active.len() >= self.config.queue_capacity.max(1) {
            if let Some(evicted) = active.pop_front() {
                debug!(id = %evicted.id, "evicted oldest active notification");
            }
        }
        active.push_back(notification);
    }

    fn schedule_auto_dismiss(&self, id: String, after: Duration) {
        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            active.write().await.retain(|n| n.id != id);
        });
    }
}

/// Time-and-random notification id, unique enough for a UI surface.
fn notification_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce: u32 = rand::thread_rng().gen();
    format!("{millis}-{nonce:08x}")
}

fn base_notification(
    title: String,
    message: String,
    kind: NotificationKind,
    duration: Duration,
) -> Notification {
    Notification {
        id: notification_id(),
        title,
        message,
        kind,
        timestamp: chrono::Utc::now(),
        duration,
        persistent: false,
        actions: Vec::new(),
        metadata: HashMap::new(),
    }
}

/// Formats one change event into its notification. Filtering has already
/// happened by the time this runs.
fn format_notification(event: &ChangeEvent) -> Notification {
    match event {
        ChangeEvent::NewAlert(alert) => {
            let mut n = match alert.severity {
                Severity::Critical => {
                    let mut n = base_notification(
                        "Critical Security Alert".to_string(),
                        format!("{} ({})", alert.title, alert.source),
                        NotificationKind::Alert,
                        Duration::ZERO,
                    );
                    n.persistent = true;
                    n.actions = vec![
                        NotificationAction {
                            label: "View Alert".to_string(),
                            effect: format!("view:{}", alert.id),
                        },
                        NotificationAction {
                            label: "Acknowledge".to_string(),
                            effect: format!("ack:{}", alert.id),
                        },
                    ];
                    n
                }
                Severity::High => {
                    let mut n = base_notification(
                        "High Severity Alert".to_string(),
                        format!("{} ({})", alert.title, alert.source),
                        NotificationKind::Warning,
                        Duration::from_secs(10),
                    );
                    n.actions = vec![NotificationAction {
                        label: "View Alert".to_string(),
                        effect: format!("view:{}", alert.id),
                    }];
                    n
                }
                Severity::Medium => base_notification(
                    "New Alert".to_string(),
                    format!("{} ({})", alert.title, alert.source),
                    NotificationKind::Info,
                    Duration::from_secs(6),
                ),
                Severity::Low => base_notification(
                    "New Alert".to_string(),
                    format!("{} ({})", alert.title, alert.source),
                    NotificationKind::Info,
                    Duration::from_secs(4),
                ),
            };
            n.metadata.insert(
                "alert_id".to_string(),
                serde_json::Value::String(alert.id.to_string()),
            );
            n.metadata.insert(
                "severity".to_string(),
                serde_json::Value::String(alert.severity.to_string()),
            );
            n
        }

        ChangeEvent::AlertStatusChanged { alert, previous } => {
            let (title, kind, duration) = if alert.status == AlertStatus::Resolved {
                (
                    "Alert Resolved".to_string(),
                    NotificationKind::Success,
                    Duration::from_secs(6),
                )
            } else {
                (
                    "Alert Status Updated".to_string(),
                    NotificationKind::Info,
                    Duration::from_secs(6),
                )
            };
            let mut n = base_notification(
                title,
                format!("{}: {} -> {}", alert.title, previous, alert.status),
                kind,
                duration,
            );
            n.metadata.insert(
                "alert_id".to_string(),
                serde_json::Value::String(alert.id.to_string()),
            );
            n
        }

        ChangeEvent::IntegrationStatusChanged {
            integration,
            previous_status,
            ..
        } => {
            let (title, kind, duration) = match integration.status {
                IntegrationStatus::Disconnected => (
                    "Integration Offline".to_string(),
                    NotificationKind::Error,
                    Duration::from_secs(10),
                ),
                IntegrationStatus::Degraded => (
                    "Integration Degraded".to_string(),
                    NotificationKind::Warning,
                    Duration::from_secs(8),
                ),
                IntegrationStatus::Connected => (
                    "Integration Restored".to_string(),
                    NotificationKind::Success,
                    Duration::from_secs(5),
                ),
            };
            base_notification(
                title,
                format!(
                    "{}: {} -> {}",
                    integration.name, previous_status, integration.status
                ),
                kind,
                duration,
            )
        }

        ChangeEvent::TeamStatusChanged { member, previous } => {
            let verb = match member.status {
                PresenceStatus::Online => "is now online",
                PresenceStatus::Away => "stepped away",
                PresenceStatus::Offline => "went offline",
            };
            base_notification(
                "Team Update".to_string(),
                format!("{} {} (was {})", member.name, verb, previous),
                NotificationKind::Info,
                Duration::from_secs(4),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use socsim_core::model::{
        Alert, Integration, IntegrationHealth, IntegrationStatus, TeamMember,
    };
    use uuid::Uuid;

    fn alert(severity: Severity) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            title: "Suspicious PowerShell execution".into(),
            severity,
            status: AlertStatus::New,
            source: "CrowdStrike EDR".into(),
            timestamp: Utc::now(),
            description: String::new(),
            ai_analysis: String::new(),
            risk_score: 8.5,
            artifacts: vec![],
            recommended_actions: vec![],
        }
    }

    fn dispatcher(threshold: Severity, per_minute: u32, capacity: usize) -> Arc<NotificationDispatcher> {
        Arc::new(NotificationDispatcher::new(DispatcherConfig {
            severity_threshold: threshold,
            max_per_minute: per_minute,
            queue_capacity: capacity,
        }))
    }

    #[test]
    fn test_metric_registration_is_repeatable() {
        // Descriptions go to whatever recorder is installed (none here);
        // registering twice must not panic.
        register_dispatch_metrics();
        register_dispatch_metrics();
    }

    #[tokio::test]
    async fn test_below_threshold_alerts_suppressed() {
        let d = dispatcher(Severity::High, 60, 50);

        let delivered = d.dispatch(&ChangeEvent::NewAlert(alert(Severity::Low))).await;
        assert!(delivered.is_none());

        let delivered = d.dispatch(&ChangeEvent::NewAlert(alert(Severity::High))).await;
        assert!(delivered.is_some());

        let stats = d.stats();
        assert_eq!(stats.suppressed, 1);
        assert_eq!(stats.delivered, 1);
    }

    #[tokio::test]
    async fn test_threshold_does_not_apply_to_integration_events() {
        let d = dispatcher(Severity::Critical, 60, 50);
        let mut integration = Integration::connected("Okta IdP");
        integration.status = IntegrationStatus::Disconnected;
        integration.health = IntegrationHealth::Error;

        let delivered = d
            .dispatch(&ChangeEvent::IntegrationStatusChanged {
                integration,
                previous_status: IntegrationStatus::Connected,
                previous_health: IntegrationHealth::Healthy,
            })
            .await;

        let notification = delivered.unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.duration, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_rate_limiter_caps_one_minute_burst() {
        let d = dispatcher(Severity::Low, 5, 50);

        let mut delivered = 0;
        for _ in 0..10 {
            if d.dispatch(&ChangeEvent::NewAlert(alert(Severity::Critical)))
                .await
                .is_some()
            {
                delivered += 1;
            }
        }

        assert_eq!(delivered, 5);
        let stats = d.stats();
        assert_eq!(stats.delivered, 5);
        assert_eq!(stats.rate_limited, 5);
    }

    #[tokio::test]
    async fn test_critical_alert_is_persistent_with_actions() {
        let d = dispatcher(Severity::Low, 60, 50);
        let n = d
            .dispatch(&ChangeEvent::NewAlert(alert(Severity::Critical)))
            .await
            .unwrap();

        assert_eq!(n.kind, NotificationKind::Alert);
        assert!(n.persistent);
        assert_eq!(n.duration, Duration::ZERO);
        let labels: Vec<_> = n.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["View Alert", "Acknowledge"]);
    }

    #[tokio::test]
    async fn test_resolved_status_formats_as_success() {
        let d = dispatcher(Severity::Low, 60, 50);
        let mut resolved = alert(Severity::Medium);
        resolved.status = AlertStatus::Resolved;

        let n = d
            .dispatch(&ChangeEvent::AlertStatusChanged {
                alert: resolved,
                previous: AlertStatus::UnderInvestigation,
            })
            .await
            .unwrap();

        assert_eq!(n.kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_queue_evicts_oldest_at_capacity() {
        let d = dispatcher(Severity::Low, 60, 2);

        // Persistent criticals never auto-dismiss, so the queue holds them.
        let first = d
            .dispatch(&ChangeEvent::NewAlert(alert(Severity::Critical)))
            .await
            .unwrap();
        d.dispatch(&ChangeEvent::NewAlert(alert(Severity::Critical)))
            .await
            .unwrap();
        let third = d
            .dispatch(&ChangeEvent::NewAlert(alert(Severity::Critical)))
            .await
            .unwrap();

        let active = d.active().await;
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|n| n.id != first.id));
        assert_eq!(active.last().unwrap().id, third.id);
    }

    #[tokio::test]
    async fn test_dismiss_removes_by_id() {
        let d = dispatcher(Severity::Low, 60, 50);
        let n = d
            .dispatch(&ChangeEvent::NewAlert(alert(Severity::Critical)))
            .await
            .unwrap();

        assert!(d.dismiss(&n.id).await);
        assert!(!d.dismiss(&n.id).await);
        assert!(d.active().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_after_duration() {
        let d = dispatcher(Severity::Low, 60, 50);
        let n = d
            .dispatch(&ChangeEvent::NewAlert(alert(Severity::High)))
            .await
            .unwrap();
        assert_eq!(d.active().await.len(), 1);

        tokio::time::advance(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert!(d.active().await.is_empty(), "notification {} not dismissed", n.id);
    }

    #[tokio::test]
    async fn test_subscribers_receive_deliveries() {
        let d = dispatcher(Severity::Low, 60, 50);
        let mut rx = d.subscribe();

        let sent = d
            .dispatch(&ChangeEvent::NewAlert(alert(Severity::Medium)))
            .await
            .unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, sent.id);
    }

    #[tokio::test]
    async fn test_team_event_is_informational() {
        let d = dispatcher(Severity::Critical, 60, 50);
        let n = d
            .dispatch(&ChangeEvent::TeamStatusChanged {
                member: TeamMember {
                    name: "Riley".into(),
                    role: "Threat Hunter".into(),
                    status: PresenceStatus::Away,
                    active_alerts: 2,
                },
                previous: PresenceStatus::Online,
            })
            .await
            .unwrap();

        assert_eq!(n.kind, NotificationKind::Info);
        assert!(n.message.contains("stepped away"));
    }
}
