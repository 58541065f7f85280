//! WGS84 geodesy for positions, routes and tracking.
//!
//! Responsibilities:
//! - Inverse problem: distance plus initial and final bearing between two positions
//! - Direct problem: destination from a start, a bearing and a distance
//! - Cross-track error, route interpolation and velocity made good
//!
//! The ellipsoidal math is delegated to `geo::Geodesic` (Karney's algorithm on WGS84).

use std::fmt;

use geo::{Bearing, Destination, Distance, Geodesic, Point};
use serde::Serialize;
use uom::si::angle::degree;
use uom::si::f64::{Angle, Length, Velocity};
use uom::si::length::meter;

use crate::types::{normalize_degrees, normalize_signed_degrees};

/// Equality tolerance for latitude/longitude (degrees) and height (meters).
const POSITION_EPSILON: f64 = 1e-8;

/// Most intervals a route is split into. Finer steps are widened to fit.
pub const MAX_ROUTE_STEPS: usize = 100_000;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point on the WGS84 ellipsoid. `(0, 0, 0)` means "no fix".
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GeographicPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub ellipsoidal_height: f64,
}

impl GeographicPosition {
    pub const NO_FIX: GeographicPosition = GeographicPosition {
        latitude: 0.0,
        longitude: 0.0,
        ellipsoidal_height: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64, ellipsoidal_height: f64) -> Self {
        GeographicPosition {
            latitude,
            longitude,
            ellipsoidal_height,
        }
    }

    /// Position without height, as reported by AIS.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        GeographicPosition::new(latitude, longitude, 0.0)
    }

    /// True for a finite, in-range position that is not the "no fix" sentinel.
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
            && *self != GeographicPosition::NO_FIX
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.ellipsoidal_height.is_finite()
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    fn with_point(self, p: Point<f64>) -> Self {
        GeographicPosition::new(p.y(), p.x(), self.ellipsoidal_height)
    }
}

impl PartialEq for GeographicPosition {
    fn eq(&self, other: &Self) -> bool {
        (self.latitude - other.latitude).abs() < POSITION_EPSILON
            && (self.longitude - other.longitude).abs() < POSITION_EPSILON
            && (self.ellipsoidal_height - other.ellipsoidal_height).abs() < POSITION_EPSILON
    }
}

/// Degrees and decimal minutes with hemisphere letter.
fn format_dm(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let thousandths = (value.abs() * 60_000.0).round() as u64;
    let degrees = thousandths / 60_000;
    let minutes = (thousandths % 60_000) as f64 / 1000.0;
    format!("{degrees}° {minutes:06.3}'{hemisphere}")
}

impl fmt::Display for GeographicPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            format_dm(self.latitude, 'N', 'S'),
            format_dm(self.longitude, 'E', 'W')
        )
    }
}

// ---------------------------------------------------------------------------
// Inverse / direct
// ---------------------------------------------------------------------------

/// Result of the inverse geodesic problem.
#[derive(Debug, Clone, Copy)]
pub struct GeodesicSolution {
    pub distance: Length,
    /// Bearing at the start, [0, 360).
    pub initial_bearing: Angle,
    /// Bearing on arrival at the end, [0, 360).
    pub final_bearing: Angle,
}

impl GeodesicSolution {
    fn zero() -> Self {
        GeodesicSolution {
            distance: Length::new::<meter>(0.0),
            initial_bearing: Angle::new::<degree>(0.0),
            final_bearing: Angle::new::<degree>(0.0),
        }
    }
}

/// Distance and bearings from `from` to `to`.
pub fn inverse(from: &GeographicPosition, to: &GeographicPosition) -> GeodesicSolution {
    if !from.is_finite() || !to.is_finite() || from == to {
        return GeodesicSolution::zero();
    }
    let (a, b) = (from.to_point(), to.to_point());
    let distance = Geodesic.distance(a, b);
    let initial = Geodesic.bearing(a, b);
    let final_bearing = Geodesic.bearing(b, a) + 180.0;
    GeodesicSolution {
        distance: Length::new::<meter>(distance),
        initial_bearing: Angle::new::<degree>(normalize_degrees(initial)),
        final_bearing: Angle::new::<degree>(normalize_degrees(final_bearing)),
    }
}

/// Distance between two positions.
pub fn distance(from: &GeographicPosition, to: &GeographicPosition) -> Length {
    inverse(from, to).distance
}

/// Position reached from `start` along `bearing` after `distance`.
/// Negative distances travel along the reciprocal bearing.
pub fn direct(start: &GeographicPosition, bearing: Angle, distance: Length) -> GeographicPosition {
    let bearing_deg = bearing.get::<degree>();
    let meters = distance.get::<meter>();
    if !start.is_finite() || !bearing_deg.is_finite() || !meters.is_finite() {
        return GeographicPosition::NO_FIX;
    }
    if meters == 0.0 {
        return *start;
    }
    let dest = Geodesic.destination(start.to_point(), bearing_deg, meters);
    start.with_point(dest)
}

// ---------------------------------------------------------------------------
// Derived operations
// ---------------------------------------------------------------------------

/// Signed difference `a - b`, normalized to (-180°, 180°].
pub fn angle_difference(a: Angle, b: Angle) -> Angle {
    let diff = a.get::<degree>() - b.get::<degree>();
    Angle::new::<degree>(normalize_signed_degrees(diff))
}

/// Cross-track error of `current` relative to the leg `origin -> destination`,
/// and the distance still to go along the leg.
///
/// The cross-track error is positive when `current` is right of the leg.
pub fn cross_track_error(
    origin: &GeographicPosition,
    destination: &GeographicPosition,
    current: &GeographicPosition,
) -> (Length, Length) {
    let leg = inverse(origin, destination);
    let to_go = inverse(current, destination);
    let diff = angle_difference(leg.final_bearing, to_go.initial_bearing);
    let (sin, cos) = diff.get::<uom::si::angle::radian>().sin_cos();
    let meters = to_go.distance.get::<meter>();
    (
        Length::new::<meter>(sin * meters),
        Length::new::<meter>(cos * meters),
    )
}

/// Speed component towards `destination` (velocity made good).
/// Negative when moving away.
pub fn velocity_towards(
    destination: &GeographicPosition,
    current: &GeographicPosition,
    speed: Velocity,
    track: Angle,
) -> Velocity {
    let to_target = inverse(current, destination);
    let delta = angle_difference(to_target.initial_bearing, track);
    speed * delta.get::<uom::si::angle::radian>().cos()
}

/// Points along the geodesic from `start` to `end`, every `step`, starting
/// with `start`. The end point is only included when it falls on a step.
pub fn route(start: &GeographicPosition, end: &GeographicPosition, step: Length) -> Vec<GeographicPosition> {
    let leg = inverse(start, end);
    route_from(start, leg.initial_bearing, leg.distance, step)
}

/// Points along the geodesic leaving `start` on `bearing`, every `step`, up to
/// `distance`. Never more than `MAX_ROUTE_STEPS + 1` points.
pub fn route_from(
    start: &GeographicPosition,
    bearing: Angle,
    distance: Length,
    step: Length,
) -> Vec<GeographicPosition> {
    let total = distance.get::<meter>();
    let step_m = step.get::<meter>();
    if !total.is_finite() || !step_m.is_finite() || step_m <= 0.0 || total <= 0.0 {
        return vec![*start];
    }
    let (steps, step_m) = if total / step_m > MAX_ROUTE_STEPS as f64 {
        (MAX_ROUTE_STEPS, total / MAX_ROUTE_STEPS as f64)
    } else {
        ((total / step_m).floor() as usize, step_m)
    };
    (0..=steps)
        .map(|i| {
            let mut p = direct(start, bearing, Length::new::<meter>(i as f64 * step_m));
            p.ellipsoidal_height = 0.0;
            p
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use uom::si::length::nautical_mile;
    use uom::si::velocity::meter_per_second;

    fn pos(lat: f64, lon: f64) -> GeographicPosition {
        GeographicPosition::from_lat_lon(lat, lon)
    }

    #[test]
    fn test_position_equality() {
        assert_eq!(pos(47.0, 9.0), pos(47.0 + 1e-9, 9.0));
        assert_ne!(pos(47.0, 9.0), pos(47.0 + 1e-7, 9.0));
        assert!(!GeographicPosition::NO_FIX.is_valid());
        assert!(pos(47.0, 9.0).is_valid());
        assert!(!pos(f64::NAN, 9.0).is_valid());
        assert!(!pos(91.0, 9.0).is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(pos(53.7, 9.44).to_string(), "53° 42.000'N 9° 26.400'E");
        assert_eq!(pos(-33.5, -70.25).to_string(), "33° 30.000'S 70° 15.000'W");
        // Rounds up into the next degree instead of printing 60 minutes.
        assert_eq!(pos(9.9999999, 0.0).to_string(), "10° 00.000'N 0° 00.000'E");
    }

    #[test]
    fn test_inverse() {
        let sol = inverse(&pos(47.0, 9.0), &pos(48.0, 10.0));
        assert_abs_diff_eq!(sol.distance.get::<meter>(), 134302.038, epsilon = 0.05);
        assert_abs_diff_eq!(sol.initial_bearing.get::<degree>(), 33.7566, epsilon = 1e-3);
        assert_abs_diff_eq!(sol.final_bearing.get::<degree>(), 34.4939, epsilon = 1e-3);
    }

    #[test]
    fn test_inverse_symmetry() {
        let a = pos(47.0, 9.0);
        let b = pos(48.0, 10.0);
        let ab = inverse(&a, &b);
        let ba = inverse(&b, &a);
        assert_abs_diff_eq!(ab.distance.get::<meter>(), ba.distance.get::<meter>(), epsilon = 1e-3);
        let expected = normalize_degrees(ab.final_bearing.get::<degree>() + 180.0);
        assert_abs_diff_eq!(ba.initial_bearing.get::<degree>(), expected, epsilon = 1e-6);
        assert_abs_diff_eq!(ba.initial_bearing.get::<degree>(), 214.4939, epsilon = 1e-3);
    }

    #[test]
    fn test_inverse_degenerate() {
        let a = pos(47.0, 9.0);
        assert_eq!(inverse(&a, &a).distance.get::<meter>(), 0.0);
        let bad = inverse(&pos(f64::NAN, 9.0), &a);
        assert_eq!(bad.distance.get::<meter>(), 0.0);
        assert_eq!(bad.initial_bearing.get::<degree>(), 0.0);
        let inf = inverse(&a, &pos(47.0, f64::INFINITY));
        assert_eq!(inf.distance.get::<meter>(), 0.0);
    }

    #[test]
    fn test_short_distance() {
        let d = distance(&pos(47.60, 9.48), &pos(47.58, 9.50));
        assert_abs_diff_eq!(d.get::<nautical_mile>(), 1.4496, epsilon = 1e-3);
    }

    #[test]
    fn test_direct_consistent_with_inverse() {
        let a = pos(47.0, 9.0);
        let b = pos(48.0, 10.0);
        let sol = inverse(&a, &b);
        let reached = direct(&a, sol.initial_bearing, sol.distance);
        assert_abs_diff_eq!(reached.latitude, b.latitude, epsilon = 1e-7);
        assert_abs_diff_eq!(reached.longitude, b.longitude, epsilon = 1e-7);
    }

    #[test]
    fn test_direct_negative_distance() {
        let a = pos(47.0, 9.0);
        let forward = direct(&a, Angle::new::<degree>(45.0), Length::new::<meter>(-1000.0));
        let reciprocal = direct(&a, Angle::new::<degree>(225.0), Length::new::<meter>(1000.0));
        assert_abs_diff_eq!(forward.latitude, reciprocal.latitude, epsilon = 1e-8);
        assert_abs_diff_eq!(forward.longitude, reciprocal.longitude, epsilon = 1e-8);
    }

    #[test]
    fn test_direct_keeps_height() {
        let a = GeographicPosition::new(47.0, 9.0, 412.0);
        let b = direct(&a, Angle::new::<degree>(0.0), Length::new::<meter>(100.0));
        assert_eq!(b.ellipsoidal_height, 412.0);
        assert!(b.latitude > 47.0);
    }

    #[test]
    fn test_angle_difference() {
        let d = |a: f64, b: f64| angle_difference(Angle::new::<degree>(a), Angle::new::<degree>(b)).get::<degree>();
        assert_abs_diff_eq!(d(10.0, 350.0), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d(350.0, 10.0), -20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d(0.0, 180.0), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d(180.0, 0.0), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cross_track_on_track() {
        let (xte, to_go) = cross_track_error(&pos(0.0, 0.0), &pos(1.0, 0.0), &pos(0.0, 0.0));
        assert_abs_diff_eq!(to_go.get::<nautical_mile>(), 59.70539, epsilon = 1e-2);
        assert_abs_diff_eq!(xte.get::<meter>(), 0.0, epsilon = 1e-6);

        let (xte, to_go) = cross_track_error(&pos(1.0, 0.0), &pos(2.0, 0.0), &pos(1.75, 0.0));
        assert_abs_diff_eq!(to_go.get::<nautical_mile>(), 14.92649, epsilon = 1e-4);
        assert_abs_diff_eq!(xte.get::<meter>(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cross_track_sides() {
        let (xte, to_go) =
            cross_track_error(&pos(1.0, 0.0), &pos(2.0, 0.0), &pos(1.75, 1.0 / 60.0));
        assert_abs_diff_eq!(to_go.get::<nautical_mile>(), 14.92649, epsilon = 1e-3);
        assert_abs_diff_eq!(xte.get::<nautical_mile>(), 1.0, epsilon = 1e-2);

        let (xte, _) = cross_track_error(&pos(1.0, 0.0), &pos(2.0, 0.0), &pos(1.75, -1.0 / 60.0));
        assert_abs_diff_eq!(xte.get::<nautical_mile>(), -1.0, epsilon = 1e-2);
    }

    #[test]
    fn test_velocity_towards() {
        let speed = Velocity::new::<meter_per_second>(10.0);
        let end = pos(2.0, 0.0);
        let current = pos(1.0, 0.0);
        let vmg = |track: f64| {
            velocity_towards(&end, &current, speed, Angle::new::<degree>(track)).get::<meter_per_second>()
        };
        assert_abs_diff_eq!(vmg(0.0), 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vmg(180.0), -10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vmg(270.0), 0.0, epsilon = 1e-5);

        let current = pos(1.75, 0.25);
        let vmg = velocity_towards(&end, &current, speed, Angle::new::<degree>(280.0));
        assert_abs_diff_eq!(vmg.get::<meter_per_second>(), 8.21, epsilon = 1e-2);
    }

    #[test]
    fn test_route_between_points() {
        let start = pos(0.0, 1.0);
        let end = pos(0.0, 2.0);
        let leg = inverse(&start, &end);
        assert_abs_diff_eq!(leg.distance.get::<meter>(), 111319.49, epsilon = 0.01);
        assert_abs_diff_eq!(leg.initial_bearing.get::<degree>(), 90.0, epsilon = 1e-9);

        let points = route(&start, &end, Length::new::<meter>(1000.0));
        assert_eq!(points.len(), 113);
        let mut previous = 0.0;
        for p in &points {
            assert!(p.longitude > previous, "longitude {} not increasing", p.longitude);
            previous = p.longitude;
            assert_abs_diff_eq!(p.latitude, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_route_along_bearing() {
        let points = route_from(
            &pos(1.0, 0.0),
            Angle::new::<degree>(180.0),
            Length::new::<meter>(1000.0),
            Length::new::<meter>(100.0),
        );
        assert_eq!(points.len(), 11);
        let mut previous = 1.1;
        for p in &points {
            assert!(p.latitude < previous);
            previous = p.latitude;
            assert_abs_diff_eq!(p.longitude, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_route_tiny_step_is_capped() {
        let start = pos(0.0, 0.0);
        let end = pos(0.0, 90.0);
        let points = route(&start, &end, Length::new::<meter>(0.001));
        assert_eq!(points.len(), MAX_ROUTE_STEPS + 1);
        let last = points[MAX_ROUTE_STEPS];
        assert!(distance(&last, &end).get::<meter>() < 1.0);
    }

    #[test]
    fn test_route_bad_step() {
        let start = pos(1.0, 0.0);
        let points = route(&start, &pos(2.0, 0.0), Length::new::<meter>(0.0));
        assert_eq!(points, vec![start]);
    }
}
