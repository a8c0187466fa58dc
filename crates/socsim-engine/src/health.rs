//! Integration-health state machine.
//!
//! Each tick evaluates one uniform draw per integration against the
//! cumulative transition thresholds for its current status. The branches
//! within a status are mutually exclusive, so exactly one transition (or
//! none) can fire per integration per tick.

use rand::Rng;
use socsim_core::model::{Integration, IntegrationHealth, IntegrationStatus};

/// A single transition decided by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthTransition {
    pub status: IntegrationStatus,
    pub health: IntegrationHealth,
}

/// Probabilistic integration-health drift.
///
/// Reachable (status, health) pairs: (Connected, Healthy),
/// (Degraded, Warning), (Disconnected, Error), plus whatever pair an
/// integration was seeded with before its first transition.
#[derive(Debug, Clone, Copy)]
pub struct HealthStateMachine {
    outage_chance: f64,
    recovery_chance: f64,
}

impl HealthStateMachine {
    pub fn new(outage_chance: f64, recovery_chance: f64) -> Self {
        Self {
            outage_chance,
            recovery_chance,
        }
    }

    /// Decides the transition for one integration this tick, if any.
    pub fn tick<R: Rng>(&self, rng: &mut R, integration: &Integration) -> Option<HealthTransition> {
        let u: f64 = rng.gen_range(0.0..1.0);
        self.transition_for(integration.status, u)
    }

    /// Pure transition decision for a single uniform draw `u`.
    ///
    /// Cumulative thresholds in fixed order per status row. A Connected
    /// integration degrades minorly for u < outage*0.5, fully drops for
    /// u < outage*0.5 + outage, and otherwise holds.
    pub(crate) fn transition_for(
        &self,
        status: IntegrationStatus,
        u: f64,
    ) -> Option<HealthTransition> {
        match status {
            IntegrationStatus::Connected => {
                let minor = self.outage_chance * 0.5;
                if u < minor {
                    Some(HealthTransition {
                        status: IntegrationStatus::Degraded,
                        health: IntegrationHealth::Warning,
                    })
                } else if u < minor + self.outage_chance {
                    Some(HealthTransition {
                        status: IntegrationStatus::Disconnected,
                        health: IntegrationHealth::Error,
                    })
                } else {
                    None
                }
            }
            IntegrationStatus::Degraded => {
                let recover = self.recovery_chance * 0.7;
                if u < recover {
                    Some(HealthTransition {
                        status: IntegrationStatus::Connected,
                        health: IntegrationHealth::Healthy,
                    })
                } else if u < recover + self.outage_chance * 2.0 {
                    Some(HealthTransition {
                        status: IntegrationStatus::Disconnected,
                        health: IntegrationHealth::Error,
                    })
                } else {
                    None
                }
            }
            IntegrationStatus::Disconnected => {
                if u < self.recovery_chance * 0.5 {
                    Some(HealthTransition {
                        status: IntegrationStatus::Degraded,
                        health: IntegrationHealth::Warning,
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// Regenerates a human-readable last-sync label consistent with the
/// integration's (possibly just-updated) status.
pub fn last_sync_label<R: Rng>(rng: &mut R, status: IntegrationStatus) -> String {
    match status {
        IntegrationStatus::Connected => {
            let seconds = rng.gen_range(0..=120);
            if seconds < 10 {
                "just now".to_string()
            } else if seconds < 60 {
                format!("{seconds} seconds ago")
            } else {
                format!("{} minute{} ago", seconds / 60, if seconds / 60 == 1 { "" } else { "s" })
            }
        }
        IntegrationStatus::Degraded => {
            let minutes = rng.gen_range(2..=9);
            format!("{minutes} minutes ago")
        }
        IntegrationStatus::Disconnected => {
            let minutes = rng.gen_range(15..=180);
            if minutes < 60 {
                format!("{minutes} minutes ago")
            } else {
                let hours = minutes / 60;
                format!("{hours} hour{} ago", if hours == 1 { "" } else { "s" })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DEGRADED_WARNING: HealthTransition = HealthTransition {
        status: IntegrationStatus::Degraded,
        health: IntegrationHealth::Warning,
    };
    const DISCONNECTED_ERROR: HealthTransition = HealthTransition {
        status: IntegrationStatus::Disconnected,
        health: IntegrationHealth::Error,
    };
    const CONNECTED_HEALTHY: HealthTransition = HealthTransition {
        status: IntegrationStatus::Connected,
        health: IntegrationHealth::Healthy,
    };

    #[test]
    fn test_connected_branches_are_exclusive() {
        // outage 0.2: minor for u < 0.1, full for u < 0.3, hold otherwise.
        let machine = HealthStateMachine::new(0.2, 0.3);
        assert_eq!(
            machine.transition_for(IntegrationStatus::Connected, 0.05),
            Some(DEGRADED_WARNING)
        );
        assert_eq!(
            machine.transition_for(IntegrationStatus::Connected, 0.15),
            Some(DISCONNECTED_ERROR)
        );
        assert_eq!(machine.transition_for(IntegrationStatus::Connected, 0.35), None);
    }

    #[test]
    fn test_degraded_branches() {
        // recovery 0.3: recover for u < 0.21; outage 0.2: worsen for u < 0.61.
        let machine = HealthStateMachine::new(0.2, 0.3);
        assert_eq!(
            machine.transition_for(IntegrationStatus::Degraded, 0.1),
            Some(CONNECTED_HEALTHY)
        );
        assert_eq!(
            machine.transition_for(IntegrationStatus::Degraded, 0.5),
            Some(DISCONNECTED_ERROR)
        );
        assert_eq!(machine.transition_for(IntegrationStatus::Degraded, 0.7), None);
    }

    #[test]
    fn test_disconnected_only_partially_recovers() {
        let machine = HealthStateMachine::new(0.2, 0.3);
        assert_eq!(
            machine.transition_for(IntegrationStatus::Disconnected, 0.1),
            Some(DEGRADED_WARNING)
        );
        assert_eq!(
            machine.transition_for(IntegrationStatus::Disconnected, 0.2),
            None
        );
    }

    #[test]
    fn test_only_table_pairs_reachable() {
        let machine = HealthStateMachine::new(0.4, 0.6);
        let mut rng = StdRng::seed_from_u64(99);
        let mut integration = Integration::connected("Splunk SIEM");

        for _ in 0..5000 {
            if let Some(t) = machine.tick(&mut rng, &integration) {
                integration.status = t.status;
                integration.health = t.health;
            }
            let pair_ok = matches!(
                (integration.status, integration.health),
                (IntegrationStatus::Connected, IntegrationHealth::Healthy)
                    | (IntegrationStatus::Degraded, IntegrationHealth::Warning)
                    | (IntegrationStatus::Disconnected, IntegrationHealth::Error)
            );
            assert!(
                pair_ok,
                "unreachable pair: {:?}/{:?}",
                integration.status, integration.health
            );
        }
    }

    #[test]
    fn test_zero_chances_freeze_state() {
        let machine = HealthStateMachine::new(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let integration = Integration::connected("Okta IdP");
        for _ in 0..100 {
            assert_eq!(machine.tick(&mut rng, &integration), None);
        }
    }

    #[test]
    fn test_last_sync_labels_match_status_band() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..100 {
            let connected = last_sync_label(&mut rng, IntegrationStatus::Connected);
            assert!(
                connected == "just now"
                    || connected.contains("seconds ago")
                    || connected.contains("minute"),
                "unexpected label: {connected}"
            );

            let degraded = last_sync_label(&mut rng, IntegrationStatus::Degraded);
            assert!(degraded.contains("minutes ago"));

            let disconnected = last_sync_label(&mut rng, IntegrationStatus::Disconnected);
            assert!(
                disconnected.contains("minutes ago") || disconnected.contains("hour"),
                "unexpected label: {disconnected}"
            );
        }
    }
}
