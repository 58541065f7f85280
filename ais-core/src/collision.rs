//! Collision risk: position extrapolation, CPA/TCPA and safety state.
//!
//! Pure computation over `AisTarget` values. Keeping the registry current
//! and deciding when to warn is the job of `registry` and `safety`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uom::si::angle::degree;
use uom::si::angular_velocity::degree_per_second;
use uom::si::f64::{Angle, Length};
use uom::si::length::{meter, nautical_mile};
use uom::si::velocity::{knot, meter_per_second};

use crate::geodesy::{self, GeographicPosition};
use crate::target::AisTarget;
use crate::types::{normalize_degrees, normalize_signed_degrees, AisError, Mmsi, Result};

/// Relative speeds below this are treated as "no relative motion".
const MIN_RELATIVE_SPEED_KTS: f64 = 0.01;

/// A target whose CPA is at most this many seconds in the past still counts as dangerous.
const PASSED_CPA_GRACE_S: i64 = 60;

/// Upper bound on turning sub-steps. Longer spans use proportionally longer steps.
const MAX_TURN_STEPS: usize = 3600;

/// Reports stamped further than this ahead of the evaluation time are not trusted.
const MAX_CLOCK_SKEW_S: i64 = 60;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tuning for extrapolation and the safety evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEstimationParameters {
    /// Step used when extrapolating turning ships.
    pub normal_step_size: TimeDelta,
    /// How far back a CPA may lie before the target counts as far away.
    pub start_time_offset: TimeDelta,
    /// How far ahead a CPA may lie before the target counts as far away.
    pub end_time_offset: TimeDelta,
    /// CPAs further ahead than this never raise a warning.
    pub warning_time: TimeDelta,
    /// Silence after which a target is lost.
    pub target_lost_timeout: TimeDelta,
    /// Own-ship positions older than this count as missing.
    pub maximum_position_age: TimeDelta,
    pub warning_distance: Length,
    /// Minimum time between repeated warnings for the same target and reason.
    pub warning_repeat_timeout: TimeDelta,
    /// Period of the automatic safety check. Zero disables it.
    pub ais_safety_check_interval: TimeDelta,
    pub warn_if_gnss_missing: bool,
}

impl Default for TrackEstimationParameters {
    fn default() -> Self {
        TrackEstimationParameters {
            normal_step_size: TimeDelta::seconds(10),
            start_time_offset: TimeDelta::minutes(20),
            end_time_offset: TimeDelta::minutes(20),
            warning_time: TimeDelta::minutes(10),
            target_lost_timeout: TimeDelta::minutes(10),
            maximum_position_age: TimeDelta::seconds(20),
            warning_distance: Length::new::<nautical_mile>(1.0),
            warning_repeat_timeout: TimeDelta::minutes(10),
            ais_safety_check_interval: TimeDelta::seconds(5),
            warn_if_gnss_missing: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Relative position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SafetyState {
    /// No valid position to evaluate.
    Unknown,
    Safe,
    /// The closest approach lies outside the evaluation window.
    FarAway,
    Dangerous,
    /// Not heard from within the lost timeout.
    Lost,
}

impl std::fmt::Display for SafetyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SafetyState::Unknown => "Unknown",
            SafetyState::Safe => "Safe",
            SafetyState::FarAway => "Far away",
            SafetyState::Dangerous => "Dangerous",
            SafetyState::Lost => "Lost",
        };
        f.write_str(s)
    }
}

/// Geometry and collision risk of one target as seen from another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativePosition {
    pub from: Mmsi,
    pub to: Mmsi,
    pub distance: Length,
    /// True bearing from `from` to `to`, [0, 360).
    pub bearing: Angle,
    /// Bearing relative to the own true heading, (-180, 180].
    pub relative_bearing: Option<Angle>,
    pub closest_point_of_approach: Option<Length>,
    pub time_of_closest_point_of_approach: Option<DateTime<Utc>>,
    pub safety_state: SafetyState,
    pub computed_at: DateTime<Utc>,
}

impl RelativePosition {
    /// Negative once the closest point has been passed.
    pub fn time_to_closest_point_of_approach(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.time_of_closest_point_of_approach.map(|t| t - now)
    }
}

// ---------------------------------------------------------------------------
// Extrapolation
// ---------------------------------------------------------------------------

fn seconds(d: TimeDelta) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

fn check_step(step: TimeDelta) -> Result<()> {
    if step <= TimeDelta::milliseconds(1) {
        return Err(AisError::InvalidParameter(format!(
            "step size must be greater than 1 ms, got {} ms",
            step.num_milliseconds()
        )));
    }
    Ok(())
}

/// Moves `meters` along the geodesic leaving `position` on `course`, backwards
/// when negative. Returns the end point and the geodesic's azimuth there, so
/// moving back by the same distance retraces the same line.
fn travel(position: &GeographicPosition, course: f64, meters: f64) -> (GeographicPosition, f64) {
    let dest = geodesy::direct(position, Angle::new::<degree>(course), Length::new::<meter>(meters));
    if meters == 0.0 || dest == *position || !dest.is_finite() {
        return (dest, course);
    }
    let azimuth = if meters > 0.0 {
        geodesy::inverse(position, &dest).final_bearing
    } else {
        geodesy::inverse(&dest, position).initial_bearing
    };
    (dest, azimuth.get::<degree>())
}

/// Where `target` is `elapsed` after (or before, if negative) its last report.
///
/// Ships turning faster than 1°/min are moved in sub-steps of `step`: turn
/// then move going forward, move back then un-turn going backward, with the
/// backward sub-steps in mirrored order. Everything else moves in one
/// geodesic step. The estimate's course is the azimuth on arrival, so a
/// backward estimate from a forward one lands on the starting point.
pub fn estimate_position(target: &AisTarget, elapsed: TimeDelta, step: TimeDelta) -> Result<AisTarget> {
    check_step(step)?;

    let mut estimate = target.clone();
    estimate.is_estimate = true;
    estimate.last_seen = target.last_seen + elapsed;

    let speed = match target.speed_over_ground() {
        Some(s) if target.has_position() && elapsed != TimeDelta::zero() => s.get::<meter_per_second>(),
        _ => return Ok(estimate),
    };
    let mut course = target.course_over_ground().map_or(0.0, |c| c.get::<degree>());
    let total = seconds(elapsed);
    let turn_rate = target
        .rate_of_turn()
        .map(|r| r.get::<degree_per_second>())
        .filter(|r| r.abs() * 60.0 > 1.0);

    let mut position = target.position;
    match turn_rate {
        None => {
            (position, course) = travel(&position, course, speed * total);
        }
        Some(rate) => {
            let span = total.abs();
            let step_s = seconds(step).max(span / MAX_TURN_STEPS as f64);
            let full = (span / step_s).floor();
            let partial = Some(span - full * step_s).filter(|p| *p > 1e-9);
            let chunks = std::iter::repeat(step_s).take(full as usize);
            if total > 0.0 {
                for dt in chunks.chain(partial) {
                    course = normalize_degrees(course + rate * dt);
                    (position, course) = travel(&position, course, speed * dt);
                }
            } else {
                for dt in partial.into_iter().chain(chunks) {
                    (position, course) = travel(&position, course, -speed * dt);
                    course = normalize_degrees(course - rate * dt);
                }
            }
        }
    }

    Ok(estimate
        .with_position(position)
        .with_course(Angle::new::<degree>(normalize_degrees(course))))
}

/// Where `target` is at `time`.
pub fn estimate_position_at(target: &AisTarget, time: DateTime<Utc>, step: TimeDelta) -> Result<AisTarget> {
    estimate_position(target, time - target.last_seen, step)
}

/// Extrapolated track from `start` to `end`, one entry per `step`.
pub fn estimated_track(
    target: &AisTarget,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeDelta,
) -> Result<Vec<AisTarget>> {
    check_step(step)?;
    if start >= end {
        return Err(AisError::InvalidParameter(
            "track start must be before its end".into(),
        ));
    }

    let mut current = estimate_position_at(target, start, step)?;
    let mut track = vec![current.clone()];
    let mut time = start;
    while time < end {
        time += step;
        current = estimate_position(&current, step, step)?;
        track.push(current.clone());
    }
    Ok(track)
}

// ---------------------------------------------------------------------------
// CPA / TCPA
// ---------------------------------------------------------------------------

/// East/north velocity in m/s.
fn velocity_vector(target: &AisTarget) -> (f64, f64) {
    let speed = target
        .speed_over_ground()
        .map_or(0.0, |s| s.get::<meter_per_second>());
    let course = target
        .course_over_ground()
        .map_or(0.0, |c| c.get::<degree>())
        .to_radians();
    (speed * course.sin(), speed * course.cos())
}

/// Distance, bearing, CPA/TCPA and safety state of `other` relative to `own` at `now`.
///
/// Returns `Ok(None)` when either target lacks a valid position. Errors only
/// for an invalid extrapolation step.
pub fn relative_position_to(
    own: &AisTarget,
    other: &AisTarget,
    now: DateTime<Utc>,
    params: &TrackEstimationParameters,
) -> Result<Option<RelativePosition>> {
    if !own.has_position() || !other.has_position() {
        return Ok(None);
    }

    let own_now = estimate_position_at(own, now, params.normal_step_size)?;
    let lost = other.last_seen + params.target_lost_timeout < now
        || other.last_seen - now > TimeDelta::seconds(MAX_CLOCK_SKEW_S);
    let moving = other.is_moving_target() && !lost;
    let other_now = if moving {
        estimate_position_at(other, now, params.normal_step_size)?
    } else {
        other.clone()
    };

    let leg = geodesy::inverse(&own_now.position, &other_now.position);
    let relative_bearing = own_now.true_heading().map(|h| {
        Angle::new::<degree>(normalize_signed_degrees(
            leg.initial_bearing.get::<degree>() - h.get::<degree>(),
        ))
    });

    let mut rel = RelativePosition {
        from: own.mmsi,
        to: other.mmsi,
        distance: leg.distance,
        bearing: leg.initial_bearing,
        relative_bearing,
        closest_point_of_approach: None,
        time_of_closest_point_of_approach: None,
        safety_state: SafetyState::Safe,
        computed_at: now,
    };
    let close = leg.distance < params.warning_distance;

    if lost {
        rel.safety_state = SafetyState::Lost;
        return Ok(Some(rel));
    }
    if !moving {
        if close {
            rel.safety_state = SafetyState::Dangerous;
        }
        return Ok(Some(rel));
    }

    // Local tangent plane centred on the own ship: x east, y north.
    let d = leg.distance.get::<meter>();
    let b = leg.initial_bearing.get::<degree>().to_radians();
    let (rx, ry) = (d * b.sin(), d * b.cos());
    let (own_vx, own_vy) = velocity_vector(&own_now);
    let (other_vx, other_vy) = velocity_vector(&other_now);
    let (vx, vy) = (other_vx - own_vx, other_vy - own_vy);
    let v2 = vx * vx + vy * vy;

    let min_speed = uom::si::f64::Velocity::new::<knot>(MIN_RELATIVE_SPEED_KTS).get::<meter_per_second>();
    if v2.sqrt() < min_speed {
        if close {
            rel.safety_state = SafetyState::Dangerous;
        }
        return Ok(Some(rel));
    }

    let tcpa_s = -(rx * vx + ry * vy) / v2;
    let (cx, cy) = (rx + vx * tcpa_s, ry + vy * tcpa_s);
    let cpa = Length::new::<meter>((cx * cx + cy * cy).sqrt());
    let tcpa = TimeDelta::milliseconds((tcpa_s * 1000.0).round() as i64);

    if tcpa < -params.start_time_offset || tcpa > params.end_time_offset {
        rel.safety_state = SafetyState::FarAway;
        return Ok(Some(rel));
    }

    rel.closest_point_of_approach = Some(cpa);
    rel.time_of_closest_point_of_approach = Some(now + tcpa);
    if cpa < params.warning_distance && tcpa > -TimeDelta::seconds(PASSED_CPA_GRACE_S) && tcpa < params.warning_time {
        rel.safety_state = SafetyState::Dangerous;
    }
    Ok(Some(rel))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
