//! Data models for the simulated security-operations environment.
//!
//! This module defines the record types that flow through the simulation:
//! alerts, integration health, team presence, dashboard metrics, and the
//! notifications delivered to the UI surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Severity levels for alerts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity
    Low,
    /// Medium severity
    Medium,
    /// High severity - requires attention
    High,
    /// Critical - immediate response required
    Critical,
}

impl Severity {
    /// Numeric rank used by the notification threshold filter
    /// (Low=1, Medium=2, High=3, Critical=4).
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// All severities in threshold-walk order (highest first).
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// Status of an alert in its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Newly created, not yet acknowledged
    New,
    /// Confirmed active threat
    ActiveThreat,
    /// Assigned and under investigation
    UnderInvestigation,
    /// Automatically contained by response tooling
    AutoContained,
    /// Resolved
    Resolved,
    /// Being looked at informally (legacy display status)
    Investigating,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::New => write!(f, "New"),
            AlertStatus::ActiveThreat => write!(f, "Active Threat"),
            AlertStatus::UnderInvestigation => write!(f, "Under Investigation"),
            AlertStatus::AutoContained => write!(f, "Auto-Contained"),
            AlertStatus::Resolved => write!(f, "Resolved"),
            AlertStatus::Investigating => write!(f, "Investigating"),
        }
    }
}

/// A synthetic security alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier for this alert.
    pub id: Uuid,
    /// Alert title/summary.
    pub title: String,
    /// Severity level.
    pub severity: Severity,
    /// Current lifecycle status.
    pub status: AlertStatus,
    /// Source system that generated the alert.
    pub source: String,
    /// Timestamp when the alert was generated.
    pub timestamp: DateTime<Utc>,
    /// Alert description.
    pub description: String,
    /// AI analysis text, appended to by the escalation monitor.
    pub ai_analysis: String,
    /// Risk score, always within [0, 10].
    pub risk_score: f64,
    /// Observed artifacts (hashes, IPs, hostnames).
    pub artifacts: Vec<String>,
    /// Recommended response actions.
    pub recommended_actions: Vec<String>,
}

impl Alert {
    /// Sets the risk score, clamping to the valid [0, 10] range.
    pub fn set_risk_score(&mut self, score: f64) {
        self.risk_score = if score.is_finite() {
            score.clamp(0.0, 10.0)
        } else {
            0.0
        };
    }

    /// Age of the alert relative to `now`, in milliseconds.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.timestamp).num_milliseconds()
    }
}

/// Connection status of an external integration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    /// Integration is connected and operational.
    Connected,
    /// Integration is partially degraded.
    Degraded,
    /// Integration is disconnected.
    Disconnected,
}

impl std::fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationStatus::Connected => write!(f, "Connected"),
            IntegrationStatus::Degraded => write!(f, "Degraded"),
            IntegrationStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Health indicator of an external integration.
///
/// Stored independently of [`IntegrationStatus`]; the health state machine
/// is the only writer of both fields and always writes correlated pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationHealth {
    /// Fully healthy.
    Healthy,
    /// Degraded but functioning.
    Warning,
    /// Failing.
    Error,
}

impl std::fmt::Display for IntegrationHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationHealth::Healthy => write!(f, "Healthy"),
            IntegrationHealth::Warning => write!(f, "Warning"),
            IntegrationHealth::Error => write!(f, "Error"),
        }
    }
}

/// An external integration tracked by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    /// Unique integration name (key).
    pub name: String,
    /// Connection status.
    pub status: IntegrationStatus,
    /// Health indicator.
    pub health: IntegrationHealth,
    /// Human-readable relative time of the last sync.
    pub last_sync: String,
}

impl Integration {
    /// Creates a connected, healthy integration.
    pub fn connected(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: IntegrationStatus::Connected,
            health: IntegrationHealth::Healthy,
            last_sync: "just now".to_string(),
        }
    }
}

/// Presence status of a team member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresenceStatus::Online => write!(f, "Online"),
            PresenceStatus::Away => write!(f, "Away"),
            PresenceStatus::Offline => write!(f, "Offline"),
        }
    }
}

/// A SOC team member shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Unique member name (key).
    pub name: String,
    /// Role within the team.
    pub role: String,
    /// Presence status.
    pub status: PresenceStatus,
    /// Number of alerts currently assigned.
    pub active_alerts: u32,
}

/// Signed-percent trend strings derived from consecutive metric snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricTrends {
    /// Trend of mean time to respond, e.g. "+12%".
    pub mttr: String,
    /// Trend of detection accuracy.
    pub accuracy: String,
    /// Trend of the false-positive rate.
    pub false_positives: String,
}

impl Default for MetricTrends {
    /// Flat trends, used when there is no preceding snapshot to compare
    /// against.
    fn default() -> Self {
        Self {
            mttr: "0%".to_string(),
            accuracy: "0%".to_string(),
            false_positives: "0%".to_string(),
        }
    }
}

/// Aggregate dashboard metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// Total alerts observed.
    pub total_alerts: u64,
    /// Investigations currently open.
    pub active_investigations: u64,
    /// Incidents resolved to date.
    pub resolved_incidents: u64,
    /// Mean time to respond, in minutes. Plausible range [3, 60].
    pub mttr_minutes: f64,
    /// Detection accuracy percentage. Plausible range [85, 99.9].
    pub accuracy_pct: f64,
    /// False-positive rate percentage. Plausible range [0.1, 20].
    pub false_positive_rate_pct: f64,
    /// Trend strings vs the preceding snapshot.
    pub trends: MetricTrends,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            total_alerts: 0,
            active_investigations: 0,
            resolved_incidents: 0,
            mttr_minutes: 12.0,
            accuracy_pct: 96.5,
            false_positive_rate_pct: 4.0,
            trends: MetricTrends::default(),
        }
    }
}

impl DashboardMetrics {
    /// Formats the MTTR for display, e.g. "12.4m".
    pub fn mttr_display(&self) -> String {
        format!("{:.1}m", self.mttr_minutes)
    }

    /// Formats the accuracy for display, e.g. "96.5%".
    pub fn accuracy_display(&self) -> String {
        format!("{:.1}%", self.accuracy_pct)
    }

    /// Formats the false-positive rate for display, e.g. "4.0%".
    pub fn false_positives_display(&self) -> String {
        format!("{:.1}%", self.false_positive_rate_pct)
    }
}

/// Visual category of a delivered notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    /// Security alert - rendered prominently and persistent by default.
    Alert,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Info => write!(f, "info"),
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Warning => write!(f, "warning"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Alert => write!(f, "alert"),
        }
    }
}

/// An actionable button attached to a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationAction {
    /// Button label.
    pub label: String,
    /// Opaque effect identifier interpreted by the UI.
    pub effect: String,
}

/// A user-facing notification produced by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Stable identifier, time+random derived, used for removal/update.
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Visual category.
    pub kind: NotificationKind,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Auto-dismiss delay. Zero means no auto-dismiss.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Persistent notifications are never auto-dismissed.
    pub persistent: bool,
    /// Actionable buttons.
    pub actions: Vec<NotificationAction>,
    /// Opaque key/value bag for the UI.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Serializes `Duration` as integer milliseconds, matching the wire shape
/// the UI consumes.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// A synthetic record of an integration sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// Name of the integration that synced.
    pub integration: String,
    /// Human-readable summary.
    pub message: String,
    /// When the sync happened.
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a threat hunt run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HuntOutcome {
    /// Hunt completed, nothing found.
    Clean,
    /// Hunt surfaced findings that need review.
    FindingsPending,
    /// Hunt confirmed the hypothesis.
    HypothesisConfirmed,
}

impl std::fmt::Display for HuntOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HuntOutcome::Clean => write!(f, "Clean"),
            HuntOutcome::FindingsPending => write!(f, "Findings Pending"),
            HuntOutcome::HypothesisConfirmed => write!(f, "Hypothesis Confirmed"),
        }
    }
}

/// A synthetic threat-hunt result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntResult {
    /// Unique identifier.
    pub id: Uuid,
    /// Name of the hunt.
    pub hunt_name: String,
    /// Hypothesis the hunt tested.
    pub hypothesis: String,
    /// Severity of the most significant finding.
    pub severity: Severity,
    /// Number of findings.
    pub findings: u32,
    /// Outcome of the run.
    pub status: HuntOutcome,
    /// When the hunt completed.
    pub timestamp: DateTime<Utc>,
}
