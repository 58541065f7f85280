//! Tracked AIS targets.
//!
//! Every station seen on the air becomes one `AisTarget`, keyed by MMSI.
//! Fields shared by all stations live on the target; kind-specific data
//! (ship voyage data, aid-to-navigation flags, SAR aircraft altitude) lives
//! in the `TargetKind` variant.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uom::si::f64::{Angle, AngularVelocity, Length, Velocity};

use crate::collision::RelativePosition;
use crate::geodesy::{self, GeographicPosition};
use crate::messages::{Dimensions, Eta, NavigationStatus, ShipType};
use crate::mmsi::{self, MmsiType};
use crate::types::Mmsi;

/// Transceiver class, derived from the message types a station sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TransceiverClass {
    #[default]
    Unknown,
    A,
    B,
}

// ---------------------------------------------------------------------------
// Kind-specific data
// ---------------------------------------------------------------------------

/// Motion and voyage data of a ship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipData {
    /// Zero when the ship does not report speed.
    pub speed_over_ground: Velocity,
    /// Zero when the ship does not report course.
    pub course_over_ground: Angle,
    pub rate_of_turn: Option<AngularVelocity>,
    pub true_heading: Option<Angle>,
    pub navigation_status: NavigationStatus,
    pub ship_type: ShipType,
    pub dimension: Dimensions,
    pub destination: Option<String>,
    pub eta: Eta,
    pub draught: Option<Length>,
    pub imo: Option<u32>,
}

impl Default for ShipData {
    fn default() -> Self {
        ShipData {
            speed_over_ground: Velocity::default(),
            course_over_ground: Angle::default(),
            rate_of_turn: None,
            true_heading: None,
            navigation_status: NavigationStatus::NotDefined,
            ship_type: ShipType::default(),
            dimension: Dimensions::default(),
            destination: None,
            eta: Eta::default(),
            draught: None,
            imo: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AidToNavigationData {
    pub aid_type: u8,
    pub virtual_aid: bool,
    pub off_position: bool,
    pub dimension: Dimensions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SarAircraftData {
    pub speed_over_ground: Velocity,
    pub course_over_ground: Angle,
    pub altitude: Option<Length>,
}

/// What kind of station a target is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum TargetKind {
    Ship(ShipData),
    BaseStation,
    AidToNavigation(AidToNavigationData),
    SarAircraft(SarAircraftData),
}

impl TargetKind {
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::Ship(_) => "Ship",
            TargetKind::BaseStation => "Base station",
            TargetKind::AidToNavigation(_) => "AtoN",
            TargetKind::SarAircraft(_) => "SAR aircraft",
        }
    }

    /// Fixed stations are only judged by distance.
    pub fn is_stationary(&self) -> bool {
        matches!(self, TargetKind::BaseStation | TargetKind::AidToNavigation(_))
    }

    /// Same variant, ignoring the data inside.
    pub fn same_kind(&self, other: &TargetKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// State for a single tracked station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AisTarget {
    pub mmsi: Mmsi,
    pub kind: TargetKind,
    pub last_seen: DateTime<Utc>,
    /// `GeographicPosition::NO_FIX` until a valid position is reported.
    pub position: GeographicPosition,
    pub transceiver_class: TransceiverClass,
    pub name: Option<String>,
    pub call_sign: Option<String>,
    /// Result of the most recent safety evaluation against the own ship.
    pub relative_position: Option<RelativePosition>,
    /// True for extrapolated copies, never for tracked state.
    pub is_estimate: bool,
    pub message_count: u64,
}

impl AisTarget {
    pub fn new(mmsi: Mmsi, kind: TargetKind, now: DateTime<Utc>) -> Self {
        AisTarget {
            mmsi,
            kind,
            last_seen: now,
            position: GeographicPosition::NO_FIX,
            transceiver_class: TransceiverClass::Unknown,
            name: None,
            call_sign: None,
            relative_position: None,
            is_estimate: false,
            message_count: 0,
        }
    }

    pub fn ship(mmsi: Mmsi, now: DateTime<Utc>) -> Self {
        AisTarget::new(mmsi, TargetKind::Ship(ShipData::default()), now)
    }

    pub fn has_position(&self) -> bool {
        self.position.is_valid()
    }

    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.last_seen
    }

    pub fn is_stale(&self, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
        self.age(now) > max_age
    }

    pub fn mmsi_type(&self) -> MmsiType {
        mmsi::mmsi_type(self.mmsi)
    }

    pub fn country(&self) -> Option<&'static str> {
        mmsi::lookup_country(self.mmsi)
    }

    /// Name if known, otherwise the formatted MMSI.
    pub fn name_or_mmsi(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => mmsi::format_mmsi(self.mmsi),
        }
    }

    /// Ships and SAR aircraft move; fixed stations do not.
    pub fn is_moving_target(&self) -> bool {
        matches!(self.kind, TargetKind::Ship(_) | TargetKind::SarAircraft(_))
    }

    pub fn ship_data(&self) -> Option<&ShipData> {
        match &self.kind {
            TargetKind::Ship(s) => Some(s),
            _ => None,
        }
    }

    pub fn ship_data_mut(&mut self) -> Option<&mut ShipData> {
        match &mut self.kind {
            TargetKind::Ship(s) => Some(s),
            _ => None,
        }
    }

    pub fn speed_over_ground(&self) -> Option<Velocity> {
        match &self.kind {
            TargetKind::Ship(s) => Some(s.speed_over_ground),
            TargetKind::SarAircraft(s) => Some(s.speed_over_ground),
            _ => None,
        }
    }

    pub fn course_over_ground(&self) -> Option<Angle> {
        match &self.kind {
            TargetKind::Ship(s) => Some(s.course_over_ground),
            TargetKind::SarAircraft(s) => Some(s.course_over_ground),
            _ => None,
        }
    }

    pub fn rate_of_turn(&self) -> Option<AngularVelocity> {
        self.ship_data().and_then(|s| s.rate_of_turn)
    }

    pub fn true_heading(&self) -> Option<Angle> {
        self.ship_data().and_then(|s| s.true_heading)
    }

    /// Geodesic distance between the last reported positions.
    pub fn distance_to(&self, other: &AisTarget) -> Length {
        geodesy::distance(&self.position, &other.position)
    }

    // -- Builders ----------------------------------------------------------

    pub fn with_position(mut self, position: GeographicPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_last_seen(mut self, last_seen: DateTime<Utc>) -> Self {
        self.last_seen = last_seen;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// No effect on fixed stations.
    pub fn with_speed(mut self, speed: Velocity) -> Self {
        match &mut self.kind {
            TargetKind::Ship(s) => s.speed_over_ground = speed,
            TargetKind::SarAircraft(s) => s.speed_over_ground = speed,
            _ => {}
        }
        self
    }

    /// No effect on fixed stations.
    pub fn with_course(mut self, course: Angle) -> Self {
        match &mut self.kind {
            TargetKind::Ship(s) => s.course_over_ground = course,
            TargetKind::SarAircraft(s) => s.course_over_ground = course,
            _ => {}
        }
        self
    }

    pub fn with_rate_of_turn(mut self, rate_of_turn: Option<AngularVelocity>) -> Self {
        if let Some(s) = self.ship_data_mut() {
            s.rate_of_turn = rate_of_turn;
        }
        self
    }

    pub fn with_heading(mut self, heading: Option<Angle>) -> Self {
        if let Some(s) = self.ship_data_mut() {
            s.true_heading = heading;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
