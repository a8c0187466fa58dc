//! Bounded random-walk drift over dashboard metrics.

use rand::Rng;
use socsim_core::config::VariationIntensity;
use socsim_core::model::{DashboardMetrics, MetricTrends};

const MTTR_RANGE: (f64, f64) = (3.0, 60.0);
const ACCURACY_RANGE: (f64, f64) = (85.0, 99.9);
const FALSE_POSITIVE_RANGE: (f64, f64) = (0.1, 20.0);

/// Per-tick delta magnitudes for one intensity level.
#[derive(Debug, Clone, Copy)]
struct DriftProfile {
    mttr: f64,
    accuracy: f64,
    false_positives: f64,
    counter_step: u64,
}

fn profile_for(intensity: VariationIntensity) -> DriftProfile {
    match intensity {
        VariationIntensity::Low => DriftProfile {
            mttr: 0.3,
            accuracy: 0.15,
            false_positives: 0.2,
            counter_step: 1,
        },
        VariationIntensity::Medium => DriftProfile {
            mttr: 0.8,
            accuracy: 0.4,
            false_positives: 0.5,
            counter_step: 2,
        },
        VariationIntensity::High => DriftProfile {
            mttr: 1.5,
            accuracy: 0.8,
            false_positives: 1.0,
            counter_step: 4,
        },
    }
}

/// Drift engine. Stateless between ticks apart from the intensity; the
/// previous metrics snapshot is the caller's.
#[derive(Debug, Clone, Copy)]
pub struct MetricsDrift {
    intensity: VariationIntensity,
}

impl MetricsDrift {
    pub fn new(intensity: VariationIntensity) -> Self {
        Self { intensity }
    }

    /// Produces the next metrics snapshot from `current`, with trend
    /// strings expressing the signed percent change against it.
    pub fn tick<R: Rng>(&self, rng: &mut R, current: &DashboardMetrics) -> DashboardMetrics {
        let profile = profile_for(self.intensity);

        let mttr = walk(
            rng,
            sanitize(current.mttr_minutes, 12.0),
            profile.mttr,
            MTTR_RANGE,
        );
        let accuracy = walk(
            rng,
            sanitize(current.accuracy_pct, 96.5),
            profile.accuracy,
            ACCURACY_RANGE,
        );
        let false_positives = walk(
            rng,
            sanitize(current.false_positive_rate_pct, 4.0),
            profile.false_positives,
            FALSE_POSITIVE_RANGE,
        );

        DashboardMetrics {
            total_alerts: current
                .total_alerts
                .saturating_add(rng.gen_range(0..=profile.counter_step)),
            active_investigations: step_counter(
                rng,
                current.active_investigations,
                profile.counter_step,
            ),
            resolved_incidents: current
                .resolved_incidents
                .saturating_add(rng.gen_range(0..=profile.counter_step)),
            mttr_minutes: mttr,
            accuracy_pct: accuracy,
            false_positive_rate_pct: false_positives,
            trends: MetricTrends {
                mttr: trend(current.mttr_minutes, mttr),
                accuracy: trend(current.accuracy_pct, accuracy),
                false_positives: trend(current.false_positive_rate_pct, false_positives),
            },
        }
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn walk<R: Rng>(rng: &mut R, current: f64, magnitude: f64, (low, high): (f64, f64)) -> f64 {
    (current + rng.gen_range(-magnitude..=magnitude)).clamp(low, high)
}

/// Counters wander in both directions but saturate at zero.
fn step_counter<R: Rng>(rng: &mut R, current: u64, step: u64) -> u64 {
    let delta = rng.gen_range(-(step as i64)..=step as i64);
    if delta >= 0 {
        current.saturating_add(delta as u64)
    } else {
        current.saturating_sub(delta.unsigned_abs())
    }
}

/// Signed percent change, e.g. "+2.3%". Flat or zero-base comparisons
/// render as "0%".
fn trend(previous: f64, next: f64) -> String {
    if !previous.is_finite() || previous == 0.0 {
        return "0%".to_string();
    }
    let pct = (next - previous) / previous * 100.0;
    if pct.abs() < 0.05 {
        "0%".to_string()
    } else {
        format!("{pct:+.1}%")
    }
}
