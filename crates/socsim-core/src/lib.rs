//! # socsim-core
//!
//! Core data models, configuration, state store, and change detection for
//! the socsim live-SOC simulation engine.
//!
//! This crate is pure: no timers, no randomness, no delivery. The
//! `socsim-engine` crate supplies the periodic producers and the
//! notification pipeline on top of these types.

pub mod config;
pub mod detector;
pub mod model;
pub mod store;

pub use config::{
    ConfigError, ProducerConfig, SeverityWeights, SimulationConfig, VariationIntensity,
};
pub use detector::{ChangeDetector, ChangeEvent};
pub use model::{
    Alert, AlertStatus, DashboardMetrics, HuntOutcome, HuntResult, Integration,
    IntegrationHealth, IntegrationStatus, MetricTrends, Notification, NotificationAction,
    NotificationKind, PresenceStatus, Severity, SyncEvent, TeamMember,
};
pub use store::{
    AlertPatch, IntegrationPatch, StateStore, StoreSnapshot, StoreUpdate, TeamMemberPatch,
};
