//! The simulation engine facade.
//!
//! Wires the producers to the store, the change detector, and the
//! notification dispatcher, and owns the scheduler that drives them.
//! Multiple engines over independent stores can coexist in one process.

use crate::dispatcher::{DispatcherConfig, NotificationDispatcher};
use crate::drift::MetricsDrift;
use crate::escalation::EscalationMonitor;
use crate::generator;
use crate::health::{last_sync_label, HealthStateMachine};
use crate::scheduler::Scheduler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use socsim_core::config::{ConfigError, SimulationConfig};
use socsim_core::detector::ChangeDetector;
use socsim_core::model::{Integration, IntegrationStatus, PresenceStatus};
use socsim_core::store::{
    AlertPatch, IntegrationPatch, StateStore, StoreUpdate, TeamMemberPatch,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Failures surfaced by producer ticks. The scheduler logs these and
/// keeps the schedule running.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A producer needed records that have not been seeded yet.
    #[error("no {collection} records available")]
    EmptyCollection { collection: &'static str },
}

/// Shared tail of every producer tick: snapshot, diff, dispatch.
#[derive(Clone)]
struct Pipeline {
    store: Arc<StateStore>,
    detector: Arc<Mutex<ChangeDetector>>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl Pipeline {
    async fn detect_and_dispatch(&self) {
        let snapshot = self.store.snapshot().await;
        let events = self.detector.lock().await.diff(snapshot);
        for event in &events {
            self.dispatcher.dispatch(event).await;
        }
    }
}

/// Coordinates the periodic producers over one store.
pub struct SimulationEngine {
    store: Arc<StateStore>,
    config: SimulationConfig,
    dispatcher: Arc<NotificationDispatcher>,
    detector: Arc<Mutex<ChangeDetector>>,
    scheduler: Scheduler,
}

impl SimulationEngine {
    /// Validates `config` and builds an engine over `store`. Configuration
    /// problems are the only errors that surface here.
    pub fn new(store: Arc<StateStore>, config: SimulationConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let dispatcher = Arc::new(NotificationDispatcher::new(DispatcherConfig {
            severity_threshold: config.alert_severity_threshold,
            max_per_minute: config.max_notifications_per_minute,
            queue_capacity: config.max_active_notifications,
        }));

        Ok(Self {
            store,
            config,
            dispatcher,
            detector: Arc::new(Mutex::new(ChangeDetector::new())),
            scheduler: Scheduler::new(),
        })
    }

    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    pub fn dispatcher(&self) -> Arc<NotificationDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Names of the currently scheduled producer tasks.
    pub fn active_tasks(&self) -> Vec<&'static str> {
        self.scheduler.task_names()
    }

    /// Starts every enabled producer. Calling `start()` on a running
    /// engine replaces the existing timers, so each producer has exactly
    /// one. Seed data present before the first start is adopted as the
    /// detection baseline and never announced as new.
    #[instrument(skip(self))]
    pub async fn start(&mut self) {
        if self.scheduler.is_running() {
            debug!("engine already running; restarting producers");
            self.scheduler.stop().await;
        }

        let pipeline = Pipeline {
            store: Arc::clone(&self.store),
            detector: Arc::clone(&self.detector),
            dispatcher: Arc::clone(&self.dispatcher),
        };

        // Prime the baseline so seeded collections do not surface as
        // change events on the first tick.
        {
            let snapshot = self.store.snapshot().await;
            pipeline.detector.lock().await.diff(snapshot);
        }

        let c = &self.config;

        if c.alerts.enabled {
            let p = pipeline.clone();
            let weights = c.severity_weights;
            let max = c.max_alerts_per_interval;
            self.scheduler.schedule("alerts", c.alerts.interval, move || {
                let p = p.clone();
                async move {
                    let mut rng = StdRng::from_entropy();
                    let count = generator::alert_count_for_tick(&mut rng, max);
                    for _ in 0..count {
                        let alert = generator::generate_alert(&mut rng, &weights);
                        p.store.apply(StoreUpdate::AddAlert { alert }).await;
                    }
                    p.detect_and_dispatch().await;
                    Ok::<(), EngineError>(())
                }
            });
        }

        if c.sync.enabled {
            let p = pipeline.clone();
            self.scheduler.schedule("sync", c.sync.interval, move || {
                let p = p.clone();
                async move {
                    let snapshot = p.store.snapshot().await;
                    // Only connected integrations sync; a degraded or
                    // disconnected one keeps its stale last_sync label.
                    let connected: Vec<&Integration> = snapshot
                        .integrations
                        .iter()
                        .filter(|i| i.status == IntegrationStatus::Connected)
                        .collect();
                    if connected.is_empty() {
                        return Err(EngineError::EmptyCollection {
                            collection: "connected integration",
                        });
                    }
                    let mut rng = StdRng::from_entropy();
                    let target = connected[rng.gen_range(0..connected.len())];
                    let event = generator::generate_sync_event(&mut rng, &target.name);
                    let name = target.name.clone();
                    p.store.apply(StoreUpdate::AddSyncEvent { event }).await;
                    p.store
                        .apply(StoreUpdate::UpdateIntegration {
                            name,
                            patch: IntegrationPatch {
                                last_sync: Some("just now".to_string()),
                                ..Default::default()
                            },
                        })
                        .await;
                    p.detect_and_dispatch().await;
                    Ok(())
                }
            });
        }

        if c.metrics.enabled {
            let p = pipeline.clone();
            let drift = MetricsDrift::new(c.variation_intensity);
            self.scheduler.schedule("metrics", c.metrics.interval, move || {
                let p = p.clone();
                async move {
                    let mut rng = StdRng::from_entropy();
                    let current = p.store.snapshot().await.metrics;
                    let metrics = drift.tick(&mut rng, &current);
                    p.store.apply(StoreUpdate::SetMetrics { metrics }).await;
                    p.detect_and_dispatch().await;
                    Ok::<(), EngineError>(())
                }
            });
        }

        if c.team.enabled {
            let p = pipeline.clone();
            self.scheduler.schedule("team", c.team.interval, move || {
                let p = p.clone();
                async move {
                    let snapshot = p.store.snapshot().await;
                    if snapshot.team.is_empty() {
                        return Err(EngineError::EmptyCollection { collection: "team" });
                    }
                    let mut rng = StdRng::from_entropy();
                    let member = &snapshot.team[rng.gen_range(0..snapshot.team.len())];
                    let patch = team_patch(&mut rng, member.status, member.active_alerts);
                    p.store
                        .apply(StoreUpdate::UpdateTeamMember {
                            name: member.name.clone(),
                            patch,
                        })
                        .await;
                    p.detect_and_dispatch().await;
                    Ok(())
                }
            });
        }

        if c.hunts.enabled {
            let p = pipeline.clone();
            let weights = c.severity_weights;
            self.scheduler.schedule("hunts", c.hunts.interval, move || {
                let p = p.clone();
                async move {
                    let mut rng = StdRng::from_entropy();
                    let result = generator::generate_hunt_result(&mut rng, &weights);
                    p.store.apply(StoreUpdate::AddHuntResult { result }).await;
                    p.detect_and_dispatch().await;
                    Ok::<(), EngineError>(())
                }
            });
        }

        if c.health.enabled {
            let p = pipeline.clone();
            let machine = HealthStateMachine::new(c.outage_chance, c.recovery_chance);
            self.scheduler.schedule("health", c.health.interval, move || {
                let p = p.clone();
                async move {
                    let snapshot = p.store.snapshot().await;
                    if snapshot.integrations.is_empty() {
                        return Err(EngineError::EmptyCollection {
                            collection: "integrations",
                        });
                    }
                    let mut rng = StdRng::from_entropy();
                    for integration in &snapshot.integrations {
                        if let Some(t) = machine.tick(&mut rng, integration) {
                            p.store
                                .apply(StoreUpdate::UpdateIntegration {
                                    name: integration.name.clone(),
                                    patch: IntegrationPatch {
                                        status: Some(t.status),
                                        health: Some(t.health),
                                        last_sync: Some(last_sync_label(&mut rng, t.status)),
                                    },
                                })
                                .await;
                        }
                    }
                    p.detect_and_dispatch().await;
                    Ok(())
                }
            });
        }

        {
            let p = pipeline.clone();
            let monitor = EscalationMonitor::new(self.config.escalation_threshold);
            let interval = self.config.effective_escalation_interval();
            self.scheduler.schedule("escalation", interval, move || {
                let p = p.clone();
                async move {
                    let snapshot = p.store.snapshot().await;
                    let escalated = monitor.sweep(&snapshot.alerts, chrono::Utc::now());
                    for alert in escalated {
                        p.store
                            .apply(StoreUpdate::UpdateAlert {
                                id: alert.id,
                                patch: AlertPatch {
                                    status: Some(alert.status),
                                    ai_analysis: Some(alert.ai_analysis),
                                    ..Default::default()
                                },
                            })
                            .await;
                    }
                    p.detect_and_dispatch().await;
                    Ok::<(), EngineError>(())
                }
            });
        }

        info!(tasks = ?self.scheduler.task_names(), "simulation engine started");
    }

    /// Stops every producer and waits for in-flight ticks to finish, so
    /// no producer writes after this returns. Idempotent; a stopped
    /// engine can be started again.
    pub async fn stop(&mut self) {
        if self.scheduler.is_running() {
            info!("simulation engine stopping");
        }
        self.scheduler.stop().await;
    }
}

/// One team change per tick: usually a presence flip, otherwise a
/// workload jitter.
fn team_patch<R: Rng>(
    rng: &mut R,
    current: PresenceStatus,
    active_alerts: u32,
) -> TeamMemberPatch {
    if rng.gen_bool(0.7) {
        let others: Vec<PresenceStatus> = [
            PresenceStatus::Online,
            PresenceStatus::Away,
            PresenceStatus::Offline,
        ]
        .into_iter()
        .filter(|s| *s != current)
        .collect();
        TeamMemberPatch {
            status: Some(others[rng.gen_range(0..others.len())]),
            active_alerts: None,
        }
    } else {
        let next = if rng.gen_bool(0.5) {
            active_alerts.saturating_add(1)
        } else {
            active_alerts.saturating_sub(1)
        };
        TeamMemberPatch {
            status: None,
            active_alerts: Some(next),
        }
    }
}
