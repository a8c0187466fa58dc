//! # socsim-engine
//!
//! Periodic producers, integration-health drift, age-based escalation,
//! metrics drift, and the rate-limited notification pipeline for the
//! socsim live-SOC simulation.
//!
//! The [`engine::SimulationEngine`] facade owns the scheduler and wires
//! producers through the `socsim-core` store, change detector, and the
//! [`dispatcher::NotificationDispatcher`].

pub mod dispatcher;
pub mod drift;
pub mod engine;
pub mod escalation;
pub mod generator;
pub mod health;
pub mod scheduler;

pub use dispatcher::{
    register_dispatch_metrics, DispatchStats, DispatcherConfig, NotificationDispatcher,
};
pub use drift::MetricsDrift;
pub use engine::{EngineError, SimulationEngine};
pub use escalation::{escalate, EscalationMonitor};
pub use health::{HealthStateMachine, HealthTransition};
pub use scheduler::Scheduler;
