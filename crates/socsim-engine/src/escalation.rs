//! Age-based escalation of unhandled high-severity alerts.

use chrono::{DateTime, Utc};
use socsim_core::model::{Alert, AlertStatus, Severity};
use std::time::Duration;

/// Sweeps alerts whose age exceeds the configured threshold.
///
/// Only `New` alerts at High or Critical severity qualify, so a sweep is
/// idempotent: escalated alerts leave the `New` status and no longer match.
#[derive(Debug, Clone, Copy)]
pub struct EscalationMonitor {
    threshold: Duration,
}

impl EscalationMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Returns escalated copies of every qualifying alert. Callers write
    /// the copies back as status/analysis patches.
    pub fn sweep(&self, alerts: &[Alert], now: DateTime<Utc>) -> Vec<Alert> {
        escalate(alerts, now, self.threshold)
    }
}

/// Selects `New` alerts at High/Critical severity older than `threshold`
/// and returns them with the escalated status and an audit note appended
/// to the analysis text. Critical escalates to ActiveThreat, High to
/// UnderInvestigation.
pub fn escalate(alerts: &[Alert], now: DateTime<Utc>, threshold: Duration) -> Vec<Alert> {
    let threshold_ms = threshold.as_millis() as i64;

    alerts
        .iter()
        .filter(|alert| {
            alert.status == AlertStatus::New
                && matches!(alert.severity, Severity::High | Severity::Critical)
                && (now - alert.timestamp).num_milliseconds() > threshold_ms
        })
        .map(|alert| {
            let mut escalated = alert.clone();
            escalated.status = match alert.severity {
                Severity::Critical => AlertStatus::ActiveThreat,
                _ => AlertStatus::UnderInvestigation,
            };
            let age_minutes = (now - alert.timestamp).num_minutes();
            let note = format!(
                "[escalation] Unhandled for {age_minutes} minutes; auto-escalated to {}.",
                escalated.status
            );
            if escalated.ai_analysis.is_empty() {
                escalated.ai_analysis = note;
            } else {
                escalated.ai_analysis.push('\n');
                escalated.ai_analysis.push_str(&note);
            }
            escalated
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    fn aged_alert(severity: Severity, status: AlertStatus, age_minutes: i64) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            title: "Outbound C2 beacon detected".into(),
            severity,
            status,
            source: "Network IDS".into(),
            timestamp: Utc::now() - ChronoDuration::minutes(age_minutes),
            description: String::new(),
            ai_analysis: String::new(),
            risk_score: 9.0,
            artifacts: vec![],
            recommended_actions: vec![],
        }
    }

    #[test]
    fn test_stale_critical_becomes_active_threat() {
        let alerts = vec![aged_alert(Severity::Critical, AlertStatus::New, 6)];
        let escalated = escalate(&alerts, Utc::now(), Duration::from_secs(300));

        assert_eq!(escalated.len(), 1);
        assert_eq!(escalated[0].status, AlertStatus::ActiveThreat);
        assert!(escalated[0].ai_analysis.contains("auto-escalated"));
    }

    #[test]
    fn test_stale_high_goes_under_investigation() {
        let alerts = vec![aged_alert(Severity::High, AlertStatus::New, 10)];
        let escalated = escalate(&alerts, Utc::now(), Duration::from_secs(300));

        assert_eq!(escalated.len(), 1);
        assert_eq!(escalated[0].status, AlertStatus::UnderInvestigation);
    }

    #[test]
    fn test_low_and_medium_never_escalate() {
        let alerts = vec![
            aged_alert(Severity::Low, AlertStatus::New, 60),
            aged_alert(Severity::Medium, AlertStatus::New, 60),
        ];
        assert!(escalate(&alerts, Utc::now(), Duration::from_secs(300)).is_empty());
    }

    #[test]
    fn test_fresh_and_non_new_alerts_skipped() {
        let alerts = vec![
            aged_alert(Severity::Critical, AlertStatus::New, 2),
            aged_alert(Severity::Critical, AlertStatus::UnderInvestigation, 30),
            aged_alert(Severity::High, AlertStatus::Resolved, 30),
        ];
        assert!(escalate(&alerts, Utc::now(), Duration::from_secs(300)).is_empty());
    }

    #[test]
    fn test_second_sweep_is_noop() {
        let monitor = EscalationMonitor::new(Duration::from_secs(300));
        let mut alerts = vec![aged_alert(Severity::Critical, AlertStatus::New, 6)];

        let first = monitor.sweep(&alerts, Utc::now());
        assert_eq!(first.len(), 1);
        alerts = first;

        assert!(monitor.sweep(&alerts, Utc::now()).is_empty());
    }

    #[test]
    fn test_audit_note_appends_to_existing_analysis() {
        let mut alert = aged_alert(Severity::High, AlertStatus::New, 8);
        alert.ai_analysis = "Initial triage pending.".into();
        let escalated = escalate(&[alert], Utc::now(), Duration::from_secs(300));

        assert!(escalated[0].ai_analysis.starts_with("Initial triage pending.\n"));
        assert!(escalated[0].ai_analysis.contains("[escalation]"));
    }
}
