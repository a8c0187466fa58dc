//! Change detection over store snapshots.
//!
//! The detector holds the previous snapshot and diffs it against the
//! current one, surfacing semantic events (new alerts, status transitions)
//! for the notification dispatcher. The first diff establishes a baseline
//! and yields no events, so externally seeded data is never announced as
//! "new".

use crate::model::{
    Alert, AlertStatus, Integration, IntegrationHealth, IntegrationStatus, PresenceStatus,
    Severity, TeamMember,
};
use crate::store::StoreSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic state transitions surfaced by the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// An alert appeared that was not in the previous snapshot.
    NewAlert(Alert),

    /// An existing alert changed status.
    AlertStatusChanged {
        alert: Alert,
        previous: AlertStatus,
    },

    /// An integration changed connection status or health.
    IntegrationStatusChanged {
        integration: Integration,
        previous_status: IntegrationStatus,
        previous_health: IntegrationHealth,
    },

    /// A team member changed presence.
    TeamStatusChanged {
        member: TeamMember,
        previous: PresenceStatus,
    },
}

impl ChangeEvent {
    /// Severity of the underlying alert, for events that carry one. The
    /// dispatcher's threshold filter only applies to alert events.
    pub fn alert_severity(&self) -> Option<Severity> {
        match self {
            ChangeEvent::NewAlert(alert) => Some(alert.severity),
            ChangeEvent::AlertStatusChanged { alert, .. } => Some(alert.severity),
            _ => None,
        }
    }

    /// Event type as a string for logging and metrics labels.
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeEvent::NewAlert(_) => "new_alert",
            ChangeEvent::AlertStatusChanged { .. } => "alert_status_changed",
            ChangeEvent::IntegrationStatusChanged { .. } => "integration_status_changed",
            ChangeEvent::TeamStatusChanged { .. } => "team_status_changed",
        }
    }
}

/// Snapshot differ. One instance per engine; not shared across engines.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: Option<StoreSnapshot>,
}

impl ChangeDetector {
    /// Creates a detector with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `current` against the retained snapshot and adopts `current`
    /// as the new baseline.
    pub fn diff(&mut self, current: StoreSnapshot) -> Vec<ChangeEvent> {
        let Some(previous) = self.previous.replace(current.clone()) else {
            return Vec::new();
        };

        let mut events = Vec::new();

        let prev_alerts: HashMap<_, _> = previous.alerts.iter().map(|a| (a.id, a)).collect();
        for alert in &current.alerts {
            match prev_alerts.get(&alert.id) {
                None => events.push(ChangeEvent::NewAlert(alert.clone())),
                Some(prev) if prev.status != alert.status => {
                    events.push(ChangeEvent::AlertStatusChanged {
                        alert: alert.clone(),
                        previous: prev.status,
                    });
                }
                Some(_) => {}
            }
        }

        let prev_integrations: HashMap<_, _> = previous
            .integrations
            .iter()
            .map(|i| (i.name.as_str(), i))
            .collect();
        for integration in &current.integrations {
            if let Some(prev) = prev_integrations.get(integration.name.as_str()) {
                if prev.status != integration.status || prev.health != integration.health {
                    events.push(ChangeEvent::IntegrationStatusChanged {
                        integration: integration.clone(),
                        previous_status: prev.status,
                        previous_health: prev.health,
                    });
                }
            }
        }

        let prev_team: HashMap<_, _> = previous
            .team
            .iter()
            .map(|m| (m.name.as_str(), m))
            .collect();
        for member in &current.team {
            if let Some(prev) = prev_team.get(member.name.as_str()) {
                if prev.status != member.status {
                    events.push(ChangeEvent::TeamStatusChanged {
                        member: member.clone(),
                        previous: prev.status,
                    });
                }
            }
        }

        events
    }

    /// Whether a baseline snapshot has been established.
    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }
}
