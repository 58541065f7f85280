//! Safety monitor: periodic collision-risk scan and warning throttling.
//!
//! Responsibilities:
//! - Evaluate every tracked target against the own ship
//! - Cache the resulting `RelativePosition` on each target
//! - Raise warnings for dangerous vessels, lost dangerous targets,
//!   distress beacons and a missing own position
//! - Suppress repeats of the same warning within the repeat timeout
//!
//! Scheduling is left to the caller: `run_safety_check()` is one scan.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use log::warn;
use serde::Serialize;
use uom::si::length::nautical_mile;

use crate::collision::{relative_position_to, SafetyState, TrackEstimationParameters};
use crate::messages::NavigationStatus;
use crate::mmsi::{format_mmsi, MmsiType};
use crate::registry::TargetRegistry;
use crate::target::AisTarget;
use crate::types::Mmsi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AisWarningType {
    DangerousVessel,
    /// A target that was dangerous has gone silent.
    TargetLost,
    SartActive,
    MobActive,
    EpirbActive,
    /// The own ship has no usable position.
    NoGnss,
}

/// One warning raised by a safety check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AisWarning {
    pub mmsi: Mmsi,
    pub warning_type: AisWarningType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// TCPA as `mm:ss`, negative once passed.
pub fn format_tcpa(tcpa: TimeDelta) -> String {
    let sign = if tcpa < TimeDelta::zero() { "-" } else { "" };
    let secs = tcpa.num_seconds().abs();
    format!("{sign}{:02}:{:02}", secs / 60, secs % 60)
}

fn beacon_warning(target: &AisTarget) -> Option<(AisWarningType, &'static str)> {
    match target.mmsi_type() {
        MmsiType::Sart => return Some((AisWarningType::SartActive, "AIS SART")),
        MmsiType::Mob => return Some((AisWarningType::MobActive, "AIS MOB")),
        MmsiType::Epirb => return Some((AisWarningType::EpirbActive, "AIS EPIRB")),
        _ => {}
    }
    let status = target.ship_data().map(|s| s.navigation_status);
    (status == Some(NavigationStatus::AisSartActive)).then_some((AisWarningType::SartActive, "AIS SART"))
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct SafetyMonitor {
    params: TrackEstimationParameters,
    enabled: bool,
    last_warnings: HashMap<(Mmsi, AisWarningType), DateTime<Utc>>,

    // Counters
    pub checks_run: u64,
    pub warnings_emitted: u64,
}

impl SafetyMonitor {
    pub fn new(params: TrackEstimationParameters) -> Self {
        SafetyMonitor {
            params,
            enabled: true,
            last_warnings: HashMap::new(),
            checks_run: 0,
            warnings_emitted: 0,
        }
    }

    pub fn parameters(&self) -> &TrackEstimationParameters {
        &self.params
    }

    pub fn set_parameters(&mut self, params: TrackEstimationParameters) {
        self.params = params;
    }

    /// Whether automatic checks should run. Manual checks always run.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Forget all throttling state so every active condition warns again.
    pub fn clear_warnings(&mut self) {
        self.last_warnings.clear();
    }

    /// True if this (target, reason) has not warned within the repeat timeout.
    fn should_warn(&mut self, mmsi: Mmsi, warning_type: AisWarningType, now: DateTime<Utc>) -> bool {
        let key = (mmsi, warning_type);
        if let Some(last) = self.last_warnings.get(&key) {
            if now - *last < self.params.warning_repeat_timeout {
                return false;
            }
        }
        self.last_warnings.insert(key, now);
        true
    }

    fn raise(
        &mut self,
        warnings: &mut Vec<AisWarning>,
        mmsi: Mmsi,
        warning_type: AisWarningType,
        message: String,
        now: DateTime<Utc>,
    ) {
        if !self.should_warn(mmsi, warning_type, now) {
            return;
        }
        warn!("{message}");
        self.warnings_emitted += 1;
        warnings.push(AisWarning {
            mmsi,
            warning_type,
            message,
            timestamp: now,
        });
    }

    /// One scan over all targets at `now`.
    pub fn run_safety_check(&mut self, registry: &mut TargetRegistry, now: DateTime<Utc>) -> Vec<AisWarning> {
        self.checks_run += 1;
        let repeat = self.params.warning_repeat_timeout;
        self.last_warnings.retain(|_, last| now - *last < repeat);
        let mut warnings = Vec::new();
        let own_mmsi = registry.own_mmsi();

        let own = registry
            .own_ship()
            .filter(|o| o.has_position() && !o.is_stale(now, self.params.maximum_position_age))
            .cloned();
        if own.is_none() && self.params.warn_if_gnss_missing {
            self.raise(
                &mut warnings,
                own_mmsi,
                AisWarningType::NoGnss,
                "NO GNSS POSITION: own ship position is missing or outdated".into(),
                now,
            );
        }

        let mut mmsis: Vec<Mmsi> = registry.targets().map(|t| t.mmsi).collect();
        mmsis.sort_unstable();

        for mmsi in mmsis {
            let Some(target) = registry.get(mmsi) else {
                continue;
            };

            if let Some((warning_type, label)) = beacon_warning(target) {
                if target.has_position() {
                    let mut message = format!(
                        "{label} TARGET ACTIVATED: MMSI {} IN POSITION {}!",
                        format_mmsi(mmsi),
                        target.position
                    );
                    if let Some(own) = &own {
                        message.push_str(&format!(
                            " DISTANCE {:.2} NM",
                            own.distance_to(target).get::<nautical_mile>()
                        ));
                    }
                    self.raise(&mut warnings, mmsi, warning_type, message, now);
                }
            }

            let Some(own) = &own else {
                continue;
            };
            let previous = target.relative_position.as_ref().map(|r| r.safety_state);
            let rel = match relative_position_to(own, target, now, &self.params) {
                Ok(Some(rel)) => rel,
                Ok(None) => continue,
                Err(e) => {
                    warn!("safety check for {} failed: {e}", format_mmsi(mmsi));
                    continue;
                }
            };
            let name = target.name_or_mmsi();

            match rel.safety_state {
                SafetyState::Dangerous => {
                    let message = match (
                        rel.closest_point_of_approach,
                        rel.time_to_closest_point_of_approach(now),
                    ) {
                        (Some(cpa), Some(tcpa)) => format!(
                            "DANGEROUS VESSEL {name}: CPA {:.2} NM, TCPA {}",
                            cpa.get::<nautical_mile>(),
                            format_tcpa(tcpa)
                        ),
                        _ => format!(
                            "DANGEROUS VESSEL {name}: DISTANCE {:.2} NM",
                            rel.distance.get::<nautical_mile>()
                        ),
                    };
                    self.raise(&mut warnings, mmsi, AisWarningType::DangerousVessel, message, now);
                }
                SafetyState::Lost if previous == Some(SafetyState::Dangerous) => {
                    let message = format!("TARGET LOST: {name}, last seen {}", target.last_seen.format("%H:%M:%S"));
                    self.raise(&mut warnings, mmsi, AisWarningType::TargetLost, message, now);
                }
                _ => {}
            }

            if let Some(t) = registry.get_mut(mmsi) {
                t.relative_position = Some(rel);
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
