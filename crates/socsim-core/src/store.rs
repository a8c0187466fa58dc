//! In-memory state store for the simulated environment.
//!
//! The store exclusively owns the canonical collections. Producers never
//! mutate collections directly; every mutation goes through
//! [`StateStore::apply`] as a discriminated [`StoreUpdate`], applied in a
//! single write-lock critical section. Readers take immutable
//! [`StoreSnapshot`]s used for change detection.

use crate::model::{
    Alert, AlertStatus, DashboardMetrics, HuntResult, Integration, IntegrationHealth,
    IntegrationStatus, PresenceStatus, SyncEvent, TeamMember,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Partial update for an alert. `Some` fields replace, `None` fields keep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertPatch {
    pub status: Option<AlertStatus>,
    pub ai_analysis: Option<String>,
    pub risk_score: Option<f64>,
    pub recommended_actions: Option<Vec<String>>,
}

/// Partial update for an integration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationPatch {
    pub status: Option<IntegrationStatus>,
    pub health: Option<IntegrationHealth>,
    pub last_sync: Option<String>,
}

/// Partial update for a team member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMemberPatch {
    pub status: Option<PresenceStatus>,
    pub active_alerts: Option<u32>,
}

/// The state-mutation channel: every write the core performs is one of
/// these operations, applied atomically against the current snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum StoreUpdate {
    SetAlerts { alerts: Vec<Alert> },
    AddAlert { alert: Alert },
    UpdateAlert { id: Uuid, patch: AlertPatch },
    SetIntegrations { integrations: Vec<Integration> },
    UpdateIntegration { name: String, patch: IntegrationPatch },
    SetMetrics { metrics: DashboardMetrics },
    SetTeam { members: Vec<TeamMember> },
    UpdateTeamMember { name: String, patch: TeamMemberPatch },
    AddSyncEvent { event: SyncEvent },
    AddHuntResult { result: HuntResult },
    SetLoading { key: String, loading: bool },
    SetError { key: String, message: Option<String> },
}

/// Immutable copy of the collections the change detector diffs.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub alerts: Vec<Alert>,
    pub integrations: Vec<Integration>,
    pub team: Vec<TeamMember>,
    pub metrics: DashboardMetrics,
}

#[derive(Debug, Default)]
struct StoreInner {
    alerts: Vec<Alert>,
    integrations: Vec<Integration>,
    team: Vec<TeamMember>,
    metrics: DashboardMetrics,
    sync_events: Vec<SyncEvent>,
    hunt_results: Vec<HuntResult>,
    loading: HashMap<String, bool>,
    errors: HashMap<String, String>,
}

/// Constructor-injected state container. Multiple independent stores (and
/// therefore engines) can coexist in one process.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: RwLock<StoreInner>,
}

impl StateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single update operation atomically.
    ///
    /// Updates targeting an unknown alert id or integration/member name are
    /// logged and ignored; the write channel is fire-and-forget.
    pub async fn apply(&self, update: StoreUpdate) {
        let mut inner = self.inner.write().await;
        match update {
            StoreUpdate::SetAlerts { alerts } => {
                inner.alerts = alerts;
            }
            StoreUpdate::AddAlert { alert } => {
                debug!(alert_id = %alert.id, severity = %alert.severity, "alert added");
                inner.alerts.push(alert);
            }
            StoreUpdate::UpdateAlert { id, patch } => {
                match inner.alerts.iter_mut().find(|a| a.id == id) {
                    Some(alert) => {
                        if let Some(status) = patch.status {
                            alert.status = status;
                        }
                        if let Some(analysis) = patch.ai_analysis {
                            alert.ai_analysis = analysis;
                        }
                        if let Some(score) = patch.risk_score {
                            alert.set_risk_score(score);
                        }
                        if let Some(actions) = patch.recommended_actions {
                            alert.recommended_actions = actions;
                        }
                    }
                    None => warn!(alert_id = %id, "update targeted unknown alert"),
                }
            }
            StoreUpdate::SetIntegrations { integrations } => {
                inner.integrations = integrations;
            }
            StoreUpdate::UpdateIntegration { name, patch } => {
                match inner.integrations.iter_mut().find(|i| i.name == name) {
                    Some(integration) => {
                        if let Some(status) = patch.status {
                            integration.status = status;
                        }
                        if let Some(health) = patch.health {
                            integration.health = health;
                        }
                        if let Some(last_sync) = patch.last_sync {
                            integration.last_sync = last_sync;
                        }
                    }
                    None => warn!(integration = %name, "update targeted unknown integration"),
                }
            }
            StoreUpdate::SetMetrics { metrics } => {
                inner.metrics = metrics;
            }
            StoreUpdate::SetTeam { members } => {
                inner.team = members;
            }
            StoreUpdate::UpdateTeamMember { name, patch } => {
                match inner.team.iter_mut().find(|m| m.name == name) {
                    Some(member) => {
                        if let Some(status) = patch.status {
                            member.status = status;
                        }
                        if let Some(active_alerts) = patch.active_alerts {
                            member.active_alerts = active_alerts;
                        }
                    }
                    None => warn!(member = %name, "update targeted unknown team member"),
                }
            }
            StoreUpdate::AddSyncEvent { event } => {
                inner.sync_events.push(event);
            }
            StoreUpdate::AddHuntResult { result } => {
                inner.hunt_results.push(result);
            }
            StoreUpdate::SetLoading { key, loading } => {
                inner.loading.insert(key, loading);
            }
            StoreUpdate::SetError { key, message } => match message {
                Some(message) => {
                    inner.errors.insert(key, message);
                }
                None => {
                    inner.errors.remove(&key);
                }
            },
        }
    }

    /// Takes an immutable snapshot of the diffable collections.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().await;
        StoreSnapshot {
            alerts: inner.alerts.clone(),
            integrations: inner.integrations.clone(),
            team: inner.team.clone(),
            metrics: inner.metrics.clone(),
        }
    }

    /// Current number of alerts.
    pub async fn alert_count(&self) -> usize {
        self.inner.read().await.alerts.len()
    }

    /// Clones the recorded sync events.
    pub async fn sync_events(&self) -> Vec<SyncEvent> {
        self.inner.read().await.sync_events.clone()
    }

    /// Clones the recorded hunt results.
    pub async fn hunt_results(&self) -> Vec<HuntResult> {
        self.inner.read().await.hunt_results.clone()
    }

    /// Loading flag for a UI region, defaulting to `false`.
    pub async fn is_loading(&self, key: &str) -> bool {
        self.inner
            .read()
            .await
            .loading
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    /// Error message for a UI region, if one is set.
    pub async fn error(&self, key: &str) -> Option<String> {
        self.inner.read().await.errors.get(key).cloned()
    }
}
