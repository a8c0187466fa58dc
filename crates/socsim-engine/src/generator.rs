//! Synthetic record generators.
//!
//! Alerts are synthesized with a weighted severity draw, a per-severity
//! risk-score band, and a fresh (never resolved) status. Hunt results and
//! sync events follow the same create-only pattern.

use chrono::Utc;
use rand::Rng;
use socsim_core::config::SeverityWeights;
use socsim_core::model::{
    Alert, AlertStatus, HuntOutcome, HuntResult, Severity, SyncEvent,
};
use uuid::Uuid;

/// Statuses a freshly generated alert may carry. A newly minted alert is
/// never pre-resolved.
const FRESH_STATUSES: [AlertStatus; 4] = [
    AlertStatus::New,
    AlertStatus::UnderInvestigation,
    AlertStatus::ActiveThreat,
    AlertStatus::AutoContained,
];

/// (title, source, description) templates for synthetic alerts.
const ALERT_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "Suspicious PowerShell execution",
        "CrowdStrike EDR",
        "Encoded PowerShell command spawned from an Office process.",
    ),
    (
        "Credential stuffing attempt",
        "Okta IdP",
        "Burst of failed logins across multiple accounts from a single ASN.",
    ),
    (
        "Outbound C2 beacon detected",
        "Network IDS",
        "Periodic TLS connections to a newly registered domain.",
    ),
    (
        "Phishing email reported",
        "M365 Email Security",
        "User-reported message with a credential-harvesting link.",
    ),
    (
        "Impossible travel sign-in",
        "Azure AD",
        "Successful sign-ins from two countries within 40 minutes.",
    ),
    (
        "Ransomware note dropped",
        "CrowdStrike EDR",
        "Known ransom-note filename written to a file server share.",
    ),
    (
        "Privilege escalation via service",
        "Splunk SIEM",
        "Service account added to a privileged group outside change window.",
    ),
    (
        "Data exfiltration spike",
        "Network IDS",
        "Unusual upload volume to an unsanctioned cloud-storage provider.",
    ),
];

const ARTIFACT_POOL: &[&str] = &[
    "185.220.101.47",
    "manual-invoice.docm",
    "powershell.exe -enc JABz...",
    "cdn-metrics-sync.net",
    "SHA256:9f2c6a1d4be7...",
    "svc-backup@corp.local",
    "HKCU\\Software\\Run\\updater",
    "10.14.22.7:4443",
];

const ACTION_POOL: &[&str] = &[
    "Isolate the affected host",
    "Reset credentials for impacted accounts",
    "Block the destination domain at the proxy",
    "Quarantine the reported message",
    "Open an investigation and assign an analyst",
    "Collect a memory capture for forensics",
];

/// (name, hypothesis) templates for synthetic threat hunts.
const HUNT_TEMPLATES: &[(&str, &str)] = &[
    (
        "Living-off-the-land binaries",
        "Adversaries are abusing signed system binaries for execution",
    ),
    (
        "Dormant admin accounts",
        "Stale privileged accounts are being reactivated for lateral movement",
    ),
    (
        "DNS tunneling sweep",
        "Long-label DNS queries are carrying exfiltrated data",
    ),
    (
        "OAuth consent abuse",
        "Malicious apps hold standing consent grants in the tenant",
    ),
];

/// Walks the cumulative weight distribution in the fixed order
/// Critical, High, Medium, Low and returns the first severity whose
/// cumulative weight reaches `u`. Falls back to Medium if floating-point
/// loss leaves `u` past the total mass.
pub(crate) fn severity_for(u: f64, weights: &SeverityWeights) -> Severity {
    let mut cumulative = 0.0;
    for severity in Severity::ALL {
        cumulative += weights.weight(severity);
        if cumulative >= u {
            return severity;
        }
    }
    Severity::Medium
}

/// Risk-score band for a severity, inclusive on both ends.
pub(crate) fn risk_band(severity: Severity) -> (f64, f64) {
    match severity {
        Severity::Critical => (8.0, 10.0),
        Severity::High => (6.0, 8.0),
        Severity::Medium => (3.0, 6.0),
        Severity::Low => (1.0, 3.0),
    }
}

/// Generates one synthetic alert.
pub fn generate_alert<R: Rng>(rng: &mut R, weights: &SeverityWeights) -> Alert {
    let severity = severity_for(rng.gen_range(0.0..1.0), weights);
    let (low, high) = risk_band(severity);
    let status = FRESH_STATUSES[rng.gen_range(0..FRESH_STATUSES.len())];
    let (title, source, description) = ALERT_TEMPLATES[rng.gen_range(0..ALERT_TEMPLATES.len())];

    let artifact_count = rng.gen_range(1..=3);
    let mut artifacts = Vec::with_capacity(artifact_count);
    for _ in 0..artifact_count {
        let artifact = ARTIFACT_POOL[rng.gen_range(0..ARTIFACT_POOL.len())].to_string();
        if !artifacts.contains(&artifact) {
            artifacts.push(artifact);
        }
    }

    let action_count = rng.gen_range(1..=2);
    let mut recommended_actions = Vec::with_capacity(action_count);
    for _ in 0..action_count {
        let action = ACTION_POOL[rng.gen_range(0..ACTION_POOL.len())].to_string();
        if !recommended_actions.contains(&action) {
            recommended_actions.push(action);
        }
    }

    let mut alert = Alert {
        id: Uuid::new_v4(),
        title: title.to_string(),
        severity,
        status,
        source: source.to_string(),
        timestamp: Utc::now(),
        description: description.to_string(),
        ai_analysis: format!(
            "Automated triage: pattern matches {} activity with {} confidence.",
            title.to_lowercase(),
            match severity {
                Severity::Critical | Severity::High => "high",
                Severity::Medium => "moderate",
                Severity::Low => "low",
            }
        ),
        risk_score: 0.0,
        artifacts,
        recommended_actions,
    };
    alert.set_risk_score(rng.gen_range(low..=high));
    alert
}

/// Number of alerts to emit this tick, between 1 and `max` inclusive.
pub fn alert_count_for_tick<R: Rng>(rng: &mut R, max: u32) -> u32 {
    rng.gen_range(1..=max.max(1))
}

/// Generates a synthetic threat-hunt result.
pub fn generate_hunt_result<R: Rng>(rng: &mut R, weights: &SeverityWeights) -> HuntResult {
    let (hunt_name, hypothesis) = HUNT_TEMPLATES[rng.gen_range(0..HUNT_TEMPLATES.len())];
    let findings = rng.gen_range(0..=12);
    let status = if findings == 0 {
        HuntOutcome::Clean
    } else if rng.gen_bool(0.25) {
        HuntOutcome::HypothesisConfirmed
    } else {
        HuntOutcome::FindingsPending
    };

    HuntResult {
        id: Uuid::new_v4(),
        hunt_name: hunt_name.to_string(),
        hypothesis: hypothesis.to_string(),
        severity: severity_for(rng.gen_range(0.0..1.0), weights),
        findings,
        status,
        timestamp: Utc::now(),
    }
}

/// Generates a synthetic sync event for the named integration.
pub fn generate_sync_event<R: Rng>(rng: &mut R, integration: &str) -> SyncEvent {
    let records = rng.gen_range(40..=2400);
    SyncEvent {
        id: Uuid::new_v4(),
        integration: integration.to_string(),
        message: format!("Completed incremental sync ({records} records)"),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use socsim_core::model::AlertStatus;

    #[test]
    fn test_severity_walk_order_and_edges() {
        let weights = SeverityWeights {
            critical: 0.25,
            high: 0.25,
            medium: 0.25,
            low: 0.25,
        };
        assert_eq!(severity_for(0.0, &weights), Severity::Critical);
        assert_eq!(severity_for(0.25, &weights), Severity::Critical);
        assert_eq!(severity_for(0.26, &weights), Severity::High);
        assert_eq!(severity_for(0.6, &weights), Severity::Medium);
        assert_eq!(severity_for(0.9, &weights), Severity::Low);
        assert_eq!(severity_for(1.0, &weights), Severity::Low);
    }

    #[test]
    fn test_severity_walk_falls_back_to_medium() {
        // Under-massed table: no cumulative weight ever reaches u.
        let weights = SeverityWeights {
            critical: 0.2,
            high: 0.2,
            medium: 0.2,
            low: 0.2,
        };
        assert_eq!(severity_for(0.95, &weights), Severity::Medium);
    }

    #[test]
    fn test_generated_alerts_honor_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = SeverityWeights::default();
        for _ in 0..1000 {
            let alert = generate_alert(&mut rng, &weights);
            assert!((0.0..=10.0).contains(&alert.risk_score));
            let (low, high) = risk_band(alert.severity);
            assert!(
                alert.risk_score >= low && alert.risk_score <= high,
                "risk {} outside band for {}",
                alert.risk_score,
                alert.severity
            );
            assert_ne!(alert.status, AlertStatus::Resolved);
            assert_ne!(alert.status, AlertStatus::Investigating);
            assert!(!alert.artifacts.is_empty());
            assert!(!alert.recommended_actions.is_empty());
        }
    }

    #[test]
    fn test_severity_distribution_tracks_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let weights = SeverityWeights::default();
        let samples = 10_000;

        let mut counts = [0usize; 4];
        for _ in 0..samples {
            let severity = severity_for(rng.gen_range(0.0..1.0), &weights);
            counts[(severity.rank() - 1) as usize] += 1;
        }

        for severity in Severity::ALL {
            let observed = counts[(severity.rank() - 1) as usize] as f64 / samples as f64;
            let expected = weights.weight(severity);
            assert!(
                (observed - expected).abs() < 0.03,
                "{severity}: observed {observed:.3}, expected {expected:.3}"
            );
        }
    }

    #[test]
    fn test_alert_count_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let n = alert_count_for_tick(&mut rng, 3);
            assert!((1..=3).contains(&n));
        }
        // A zero max still emits one alert per tick.
        assert_eq!(alert_count_for_tick(&mut rng, 0), 1);
    }

    #[test]
    fn test_hunt_result_outcome_matches_findings() {
        let mut rng = StdRng::seed_from_u64(11);
        let weights = SeverityWeights::default();
        for _ in 0..500 {
            let result = generate_hunt_result(&mut rng, &weights);
            if result.findings == 0 {
                assert_eq!(result.status, HuntOutcome::Clean);
            } else {
                assert_ne!(result.status, HuntOutcome::Clean);
            }
        }
    }

    #[test]
    fn test_sync_event_names_integration() {
        let mut rng = StdRng::seed_from_u64(5);
        let event = generate_sync_event(&mut rng, "Splunk SIEM");
        assert_eq!(event.integration, "Splunk SIEM");
        assert!(event.message.contains("records"));
    }
}
