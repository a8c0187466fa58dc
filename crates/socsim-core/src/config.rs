//! Simulation configuration.
//!
//! All tunables for the simulation engine live here. Configuration errors
//! are the only errors surfaced synchronously to the caller of
//! `SimulationEngine::start`; everything else is contained per tick.

use crate::model::Severity;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors produced by configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("severity weights must be non-negative, got {field} = {value}")]
    NegativeWeight { field: &'static str, value: f64 },

    #[error("severity weights must have positive total mass, got {0}")]
    ZeroWeightMass(f64),

    #[error("severity weights must be finite numbers")]
    NonFiniteWeight,

    #[error("{name} interval must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("{name} must be within [0, 1], got {value}")]
    ChanceOutOfRange { name: &'static str, value: f64 },

    #[error("max_alerts_per_interval must be at least 1")]
    ZeroMaxAlerts,

    #[error("max_notifications_per_minute must be at least 1")]
    ZeroNotificationBudget,

    #[error("max_active_notifications must be at least 1")]
    ZeroNotificationCapacity,

    #[error("escalation threshold must be greater than zero")]
    ZeroEscalationThreshold,
}

/// Weight table for the severity draw. Must sum to 1.0; tables with a
/// different positive mass are renormalized, tables with zero or negative
/// mass are rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeverityWeights {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 0.10,
            high: 0.25,
            medium: 0.40,
            low: 0.25,
        }
    }
}

impl SeverityWeights {
    /// Total probability mass of the table.
    pub fn mass(&self) -> f64 {
        self.critical + self.high + self.medium + self.low
    }

    /// Validates the table and returns a renormalized copy summing to 1.0.
    pub fn normalized(&self) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("critical", self.critical),
            ("high", self.high),
            ("medium", self.medium),
            ("low", self.low),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight);
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { field, value });
            }
        }

        let mass = self.mass();
        if mass <= 0.0 {
            return Err(ConfigError::ZeroWeightMass(mass));
        }

        Ok(Self {
            critical: self.critical / mass,
            high: self.high / mass,
            medium: self.medium / mass,
            low: self.low / mass,
        })
    }

    /// Weight for a specific severity.
    pub fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// How aggressively the metrics drift engine moves each tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariationIntensity {
    Low,
    #[default]
    Medium,
    High,
}

/// Enable flag and interval for a single periodic producer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Whether the producer is scheduled at all.
    pub enabled: bool,
    /// Tick interval.
    pub interval: Duration,
}

impl ProducerConfig {
    /// An enabled producer with the given interval.
    pub fn every(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval,
        }
    }

    /// A disabled producer.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(60),
        }
    }
}

/// Complete configuration surface for the simulation engine, supplied once
/// at `start()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Alert generator schedule.
    pub alerts: ProducerConfig,
    /// Integration sync-event schedule.
    pub sync: ProducerConfig,
    /// Metrics drift schedule.
    pub metrics: ProducerConfig,
    /// Team presence drift schedule.
    pub team: ProducerConfig,
    /// Threat-hunt result schedule.
    pub hunts: ProducerConfig,
    /// Integration health-check schedule.
    pub health: ProducerConfig,

    /// Upper bound on alerts emitted per generator tick (inclusive).
    pub max_alerts_per_interval: u32,
    /// Severity weight table for generated alerts.
    pub severity_weights: SeverityWeights,
    /// Minimum severity for alert notifications.
    pub alert_severity_threshold: Severity,
    /// Sliding 60-second notification budget.
    pub max_notifications_per_minute: u32,
    /// Bounded capacity of the active notification queue.
    pub max_active_notifications: usize,

    /// Age past which an unacknowledged High/Critical alert escalates.
    pub escalation_threshold: Duration,
    /// Escalation monitor interval. `None` defaults to half the threshold
    /// so the escalation window is never missed.
    pub escalation_interval: Option<Duration>,

    /// Per-tick probability of an integration outage event.
    pub outage_chance: f64,
    /// Per-tick probability of an integration recovery event.
    pub recovery_chance: f64,

    /// Drift aggressiveness.
    pub variation_intensity: VariationIntensity,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alerts: ProducerConfig::every(Duration::from_secs(8)),
            sync: ProducerConfig::every(Duration::from_secs(15)),
            metrics: ProducerConfig::every(Duration::from_secs(10)),
            team: ProducerConfig::every(Duration::from_secs(20)),
            hunts: ProducerConfig::every(Duration::from_secs(60)),
            health: ProducerConfig::every(Duration::from_secs(12)),
            max_alerts_per_interval: 3,
            severity_weights: SeverityWeights::default(),
            alert_severity_threshold: Severity::Medium,
            max_notifications_per_minute: 8,
            max_active_notifications: 50,
            escalation_threshold: Duration::from_secs(5 * 60),
            escalation_interval: None,
            outage_chance: 0.15,
            recovery_chance: 0.30,
            variation_intensity: VariationIntensity::Medium,
        }
    }
}

impl SimulationConfig {
    /// Validates the configuration and returns a copy with the severity
    /// weights renormalized to sum to 1.0.
    ///
    /// This is the single synchronous error surface: a config that passes
    /// here can never produce NaN-driven behavior at tick time.
    pub fn validated(&self) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        config.severity_weights = self.severity_weights.normalized()?;

        for (name, producer) in [
            ("alerts", &self.alerts),
            ("sync", &self.sync),
            ("metrics", &self.metrics),
            ("team", &self.team),
            ("hunts", &self.hunts),
            ("health", &self.health),
        ] {
            if producer.enabled && producer.interval.is_zero() {
                return Err(ConfigError::ZeroInterval { name });
            }
        }

        for (name, value) in [
            ("outage_chance", self.outage_chance),
            ("recovery_chance", self.recovery_chance),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ChanceOutOfRange { name, value });
            }
        }

        if self.max_alerts_per_interval == 0 {
            return Err(ConfigError::ZeroMaxAlerts);
        }
        if self.max_notifications_per_minute == 0 {
            return Err(ConfigError::ZeroNotificationBudget);
        }
        if self.max_active_notifications == 0 {
            return Err(ConfigError::ZeroNotificationCapacity);
        }
        if self.escalation_threshold.is_zero() {
            return Err(ConfigError::ZeroEscalationThreshold);
        }
        if let Some(interval) = self.escalation_interval {
            if interval.is_zero() {
                return Err(ConfigError::ZeroInterval { name: "escalation" });
            }
        }

        Ok(config)
    }

    /// Effective escalation monitor interval: the configured value, or half
    /// the escalation threshold.
    pub fn effective_escalation_interval(&self) -> Duration {
        self.escalation_interval
            .unwrap_or_else(|| self.escalation_threshold / 2)
    }
}
