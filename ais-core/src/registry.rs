//! Per-MMSI target store fed by decoded messages.
//!
//! Pure logic, no I/O. `update()` applies one decoded message and returns
//! `TrackEvent`s; the caller decides what to do with them (print, log,
//! forward to subscribers).
//!
//! Targets are never dropped by message traffic. Callers that want an
//! eviction policy call `prune_stale()` themselves.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use serde::Serialize;
use uom::si::angle::degree;
use uom::si::angular_velocity::degree_per_second;
use uom::si::f64::{Angle, AngularVelocity, Length, Velocity};
use uom::si::length::meter;
use uom::si::velocity::knot;

use crate::geodesy::GeographicPosition;
use crate::messages::*;
use crate::mmsi::{self, MmsiType};
use crate::target::*;
use crate::types::{AisError, Mmsi, Result, MAX_MMSI};

// ---------------------------------------------------------------------------
// Track events (output)
// ---------------------------------------------------------------------------

/// Events emitted by the registry for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum TrackEvent {
    /// First message from this MMSI.
    NewTarget {
        mmsi: Mmsi,
        kind: &'static str,
        country: Option<&'static str>,
        timestamp: DateTime<Utc>,
    },
    /// A valid position was reported.
    PositionUpdate {
        mmsi: Mmsi,
        lat: f64,
        lon: f64,
        speed_kts: Option<f64>,
        course_deg: Option<f64>,
        timestamp: DateTime<Utc>,
    },
    /// Name, call sign or voyage data changed.
    StaticUpdate {
        mmsi: Mmsi,
        name: Option<String>,
        call_sign: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Safety-related text (types 12 and 14).
    TextMessage {
        source: Mmsi,
        destination: Option<Mmsi>,
        text: String,
        timestamp: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn position_of(lat: Option<f64>, lon: Option<f64>) -> GeographicPosition {
    match (lat, lon) {
        (Some(lat), Some(lon)) => GeographicPosition::from_lat_lon(lat, lon),
        _ => GeographicPosition::NO_FIX,
    }
}

fn knots(v: Option<f64>) -> Velocity {
    Velocity::new::<knot>(v.unwrap_or(0.0))
}

fn degrees(v: Option<f64>) -> Angle {
    Angle::new::<degree>(v.unwrap_or(0.0))
}

fn heading(v: Option<u16>) -> Option<Angle> {
    v.map(|h| Angle::new::<degree>(h as f64))
}

/// Kind a message proves its sender to be, if any.
fn kind_for_message(msg: &AisMessage) -> Option<TargetKind> {
    match msg {
        AisMessage::PositionReportClassA(_)
        | AisMessage::StaticAndVoyageData(_)
        | AisMessage::StandardClassBPosition(_)
        | AisMessage::ExtendedClassBPosition(_)
        | AisMessage::StaticDataReport(_)
        | AisMessage::LongRangeBroadcast(_) => Some(TargetKind::Ship(ShipData::default())),
        AisMessage::BaseStationReport(m) if m.message_type == 4 => Some(TargetKind::BaseStation),
        AisMessage::AidToNavigation(_) => {
            Some(TargetKind::AidToNavigation(AidToNavigationData::default()))
        }
        AisMessage::SarAircraftPosition(_) => Some(TargetKind::SarAircraft(SarAircraftData::default())),
        _ => None,
    }
}

/// Best guess from the MMSI alone.
fn kind_for_mmsi(mmsi: Mmsi) -> TargetKind {
    match mmsi::mmsi_type(mmsi) {
        MmsiType::BaseStation => TargetKind::BaseStation,
        MmsiType::AidToNavigation => TargetKind::AidToNavigation(AidToNavigationData::default()),
        MmsiType::SarAircraft => TargetKind::SarAircraft(SarAircraftData::default()),
        _ => TargetKind::Ship(ShipData::default()),
    }
}

fn transceiver_class(message_type: u8) -> Option<TransceiverClass> {
    match message_type {
        1 | 2 | 3 | 5 => Some(TransceiverClass::A),
        18 | 19 | 24 => Some(TransceiverClass::B),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All targets heard so far, plus the own ship.
pub struct TargetRegistry {
    own_mmsi: Mmsi,
    targets: HashMap<Mmsi, AisTarget>,

    // Counters
    pub total_messages: u64,
    pub position_updates: u64,
    pub static_updates: u64,
}

impl TargetRegistry {
    /// The own MMSI must be non-zero and at most nine digits.
    pub fn new(own_mmsi: Mmsi) -> Result<Self> {
        if own_mmsi == 0 || own_mmsi > MAX_MMSI {
            return Err(AisError::InvalidMmsi(own_mmsi));
        }
        Ok(TargetRegistry {
            own_mmsi,
            targets: HashMap::new(),
            total_messages: 0,
            position_updates: 0,
            static_updates: 0,
        })
    }

    pub fn own_mmsi(&self) -> Mmsi {
        self.own_mmsi
    }

    pub fn get(&self, mmsi: Mmsi) -> Option<&AisTarget> {
        self.targets.get(&mmsi)
    }

    pub fn get_mut(&mut self, mmsi: Mmsi) -> Option<&mut AisTarget> {
        self.targets.get_mut(&mmsi)
    }

    pub fn own_ship(&self) -> Option<&AisTarget> {
        self.targets.get(&self.own_mmsi)
    }

    /// Every target except the own ship.
    pub fn targets(&self) -> impl Iterator<Item = &AisTarget> {
        let own = self.own_mmsi;
        self.targets.values().filter(move |t| t.mmsi != own)
    }

    /// Number of tracked targets, own ship included.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Apply one decoded message received at `now`.
    pub fn update(&mut self, msg: &AisMessage, now: DateTime<Utc>) -> Vec<TrackEvent> {
        self.total_messages += 1;
        let mut events = Vec::new();
        let mmsi = msg.mmsi();
        let message_kind = kind_for_message(msg);

        // Get or create target state
        if !self.targets.contains_key(&mmsi) {
            let kind = message_kind.clone().unwrap_or_else(|| kind_for_mmsi(mmsi));
            let target = AisTarget::new(mmsi, kind, now);
            debug!("new target {} ({})", mmsi::format_mmsi(mmsi), target.kind.name());
            events.push(TrackEvent::NewTarget {
                mmsi,
                kind: target.kind.name(),
                country: target.country(),
                timestamp: now,
            });
            self.targets.insert(mmsi, target);
        }
        let Some(target) = self.targets.get_mut(&mmsi) else {
            return events;
        };

        target.last_seen = now;
        target.message_count += 1;
        target.is_estimate = false;
        if let Some(kind) = message_kind {
            if !target.kind.same_kind(&kind) {
                debug!(
                    "target {} changes from {} to {}",
                    mmsi::format_mmsi(mmsi),
                    target.kind.name(),
                    kind.name()
                );
                target.kind = kind;
            }
        }
        if let Some(class) = transceiver_class(msg.message_type()) {
            target.transceiver_class = class;
        }

        let mut position_changed = false;
        let mut static_changed = false;

        // Process message type
        match msg {
            AisMessage::PositionReportClassA(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
                if let Some(s) = target.ship_data_mut() {
                    s.speed_over_ground = knots(m.speed_kts);
                    s.course_over_ground = degrees(m.course_deg);
                    s.rate_of_turn = m
                        .rate_of_turn
                        .map(|r| AngularVelocity::new::<degree_per_second>(r / 60.0));
                    s.true_heading = heading(m.heading_deg);
                    s.navigation_status = m.status;
                }
            }
            AisMessage::StandardClassBPosition(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
                if let Some(s) = target.ship_data_mut() {
                    s.speed_over_ground = knots(m.speed_kts);
                    s.course_over_ground = degrees(m.course_deg);
                    s.rate_of_turn = None;
                    s.true_heading = heading(m.heading_deg);
                }
            }
            AisMessage::ExtendedClassBPosition(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
                target.name = non_empty(&m.name);
                static_changed = true;
                if let Some(s) = target.ship_data_mut() {
                    s.speed_over_ground = knots(m.speed_kts);
                    s.course_over_ground = degrees(m.course_deg);
                    s.rate_of_turn = None;
                    s.true_heading = heading(m.heading_deg);
                    s.ship_type = m.ship_type;
                    s.dimension = m.dimension;
                }
            }
            AisMessage::LongRangeBroadcast(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
                if let Some(s) = target.ship_data_mut() {
                    s.speed_over_ground = knots(m.speed_kts);
                    s.course_over_ground = degrees(m.course_deg);
                    s.navigation_status = m.status;
                }
            }
            AisMessage::SarAircraftPosition(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
                if let TargetKind::SarAircraft(s) = &mut target.kind {
                    s.speed_over_ground = knots(m.speed_kts);
                    s.course_over_ground = degrees(m.course_deg);
                    s.altitude = m.altitude_m.map(|a| Length::new::<meter>(a as f64));
                }
            }
            AisMessage::BaseStationReport(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
            }
            AisMessage::AidToNavigation(m) => {
                target.position = position_of(m.lat, m.lon);
                position_changed = true;
                target.name = non_empty(&m.name);
                static_changed = true;
                if let TargetKind::AidToNavigation(a) = &mut target.kind {
                    a.aid_type = m.aid_type;
                    a.virtual_aid = m.virtual_aid;
                    a.off_position = m.off_position;
                    a.dimension = m.dimension;
                }
            }
            AisMessage::StaticAndVoyageData(m) => {
                target.name = non_empty(&m.name);
                target.call_sign = non_empty(&m.call_sign);
                static_changed = true;
                if let Some(s) = target.ship_data_mut() {
                    s.imo = m.imo;
                    s.ship_type = m.ship_type;
                    s.dimension = m.dimension;
                    s.eta = m.eta;
                    s.draught = m.draught_m.map(|d| Length::new::<meter>(d));
                    s.destination = non_empty(&m.destination);
                }
            }
            AisMessage::StaticDataReport(m) => {
                static_changed = true;
                match &m.part {
                    StaticDataPart::A { name } => target.name = non_empty(name),
                    StaticDataPart::B {
                        ship_type,
                        call_sign,
                        dimension,
                        ..
                    } => {
                        target.call_sign = non_empty(call_sign);
                        if let Some(s) = target.ship_data_mut() {
                            s.ship_type = *ship_type;
                            if let Some(d) = dimension {
                                s.dimension = *d;
                            }
                        }
                    }
                }
            }
            AisMessage::AddressedSafety(m) => events.push(TrackEvent::TextMessage {
                source: mmsi,
                destination: Some(m.dest_mmsi),
                text: m.text.clone(),
                timestamp: now,
            }),
            AisMessage::SafetyBroadcast(m) => events.push(TrackEvent::TextMessage {
                source: mmsi,
                destination: None,
                text: m.text.clone(),
                timestamp: now,
            }),
            _ => {}
        }

        if position_changed && target.has_position() {
            self.position_updates += 1;
            events.push(TrackEvent::PositionUpdate {
                mmsi,
                lat: target.position.latitude,
                lon: target.position.longitude,
                speed_kts: target.speed_over_ground().map(|v| v.get::<knot>()),
                course_deg: target.course_over_ground().map(|c| c.get::<degree>()),
                timestamp: now,
            });
        }
        if static_changed {
            self.static_updates += 1;
            events.push(TrackEvent::StaticUpdate {
                mmsi,
                name: target.name.clone(),
                call_sign: target.call_sign.clone(),
                timestamp: now,
            });
        }

        events
    }

    /// Feed the own ship from a navigation source instead of AIS.
    pub fn update_own_ship(
        &mut self,
        position: GeographicPosition,
        speed: Option<Velocity>,
        course: Option<Angle>,
        heading: Option<Angle>,
        now: DateTime<Utc>,
    ) {
        let own_mmsi = self.own_mmsi;
        let mut own = self
            .targets
            .remove(&own_mmsi)
            .unwrap_or_else(|| AisTarget::ship(own_mmsi, now));
        if own.ship_data().is_none() {
            own.kind = TargetKind::Ship(ShipData::default());
        }
        let own = own
            .with_position(position)
            .with_speed(speed.unwrap_or_default())
            .with_course(course.unwrap_or_default())
            .with_heading(heading)
            .with_last_seen(now);
        self.targets.insert(own_mmsi, own);
    }

    /// Targets heard within `max_age`, most recent first. Excludes the own ship.
    pub fn get_active(&self, now: DateTime<Utc>, max_age: TimeDelta) -> Vec<&AisTarget> {
        let mut active: Vec<_> = self
            .targets()
            .filter(|t| !t.is_stale(now, max_age))
            .collect();
        active.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        active
    }

    /// Remove targets silent for longer than `max_age`. The own ship is kept.
    /// Returns count removed.
    pub fn prune_stale(&mut self, now: DateTime<Utc>, max_age: TimeDelta) -> usize {
        let own = self.own_mmsi;
        let before = self.targets.len();
        self.targets
            .retain(|&mmsi, t| mmsi == own || !t.is_stale(now, max_age));
        before - self.targets.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::AisCodec;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    const OWN: Mmsi = 269110660;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 1, 10, 10, 0).unwrap()
    }

    fn decode(lines: &[&str]) -> Vec<AisMessage> {
        let mut codec = AisCodec::new();
        lines.iter().filter_map(|l| codec.decode_line(l)).collect()
    }

    fn class_b_part(mmsi: Mmsi, part: StaticDataPart) -> AisMessage {
        AisMessage::StaticDataReport(StaticDataReport {
            repeat: 0,
            mmsi,
            part,
        })
    }

    fn part_a(mmsi: Mmsi) -> AisMessage {
        class_b_part(
            mmsi,
            StaticDataPart::A {
                name: "SEA BREEZE".into(),
            },
        )
    }

    fn part_b(mmsi: Mmsi) -> AisMessage {
        class_b_part(
            mmsi,
            StaticDataPart::B {
                ship_type: ShipType(36),
                vendor_id: "SRT".into(),
                model: 1,
                serial: 12345,
                call_sign: "HB1234".into(),
                dimension: Some(Dimensions {
                    to_bow: 8,
                    to_stern: 4,
                    to_port: 2,
                    to_starboard: 2,
                }),
                mothership_mmsi: None,
            },
        )
    }

    #[test]
    fn test_invalid_own_mmsi() {
        assert!(matches!(TargetRegistry::new(0), Err(AisError::InvalidMmsi(0))));
        assert!(TargetRegistry::new(1_000_000_000).is_err());
        assert!(TargetRegistry::new(OWN).is_ok());
    }

    #[test]
    fn test_position_report_creates_target() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        let msgs = decode(&["!AIVDM,1,1,,B,13GmFd002pwrel@LpMu8L6qn8Vp0,0*56"]);
        let events = reg.update(&msgs[0], t0());

        assert!(matches!(
            events[0],
            TrackEvent::NewTarget {
                mmsi: 226318000,
                country: Some("France"),
                ..
            }
        ));
        assert!(matches!(events[1], TrackEvent::PositionUpdate { mmsi: 226318000, .. }));

        let t = reg.get(226318000).unwrap();
        assert_eq!(t.transceiver_class, TransceiverClass::A);
        assert!(t.has_position());
        assert_abs_diff_eq!(t.position.latitude, 50.4755, epsilon = 1e-4);
        assert_abs_diff_eq!(t.speed_over_ground().unwrap().get::<knot>(), 18.4, epsilon = 1e-9);
        assert_abs_diff_eq!(t.true_heading().unwrap().get::<degree>(), 220.0, epsilon = 1e-9);
        assert_eq!(t.message_count, 1);
        assert_eq!(reg.position_updates, 1);
    }

    #[test]
    fn test_unavailable_values() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        let msgs = decode(&["!AIVDM,1,1,,B,15Mw1U?P00qNGTP@v`0@9wwn26sd,0*0E"]);
        assert_eq!(msgs.len(), 1);
        reg.update(&msgs[0], t0());
        let t = reg.get(366985620).unwrap();
        assert_eq!(t.true_heading(), None);
        assert_eq!(t.rate_of_turn(), None);
    }

    #[test]
    fn test_static_voyage_data() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        let msgs = decode(&[
            "!AIVDM,2,1,3,B,55NBjP01mtGIL@CW;SM<D60P5Ld000000000000P0`<3557l0<50@kk@,0*66",
            "!AIVDM,2,2,3,B,K5h@00000000000,2*72",
        ]);
        assert_eq!(msgs.len(), 1);
        let events = reg.update(&msgs[0], t0());
        assert!(events
            .iter()
            .any(|e| matches!(e, TrackEvent::StaticUpdate { name: Some(n), .. } if n == "SEA HAWK")));

        let t = reg.get(367309440).unwrap();
        assert_eq!(t.name.as_deref(), Some("SEA HAWK"));
        assert_eq!(t.ship_data().unwrap().imo, Some(7729526));
        assert!(!t.has_position());
        assert_eq!(reg.static_updates, 1);
    }

    #[test]
    fn test_class_b_parts_merge_any_order() {
        for order in [[true, false], [false, true]] {
            let mut reg = TargetRegistry::new(OWN).unwrap();
            for a_first in order {
                let msg = if a_first { part_a(269000001) } else { part_b(269000001) };
                reg.update(&msg, t0());
            }
            let t = reg.get(269000001).unwrap();
            assert_eq!(t.name.as_deref(), Some("SEA BREEZE"));
            assert_eq!(t.call_sign.as_deref(), Some("HB1234"));
            assert_eq!(t.ship_data().unwrap().ship_type, ShipType(36));
            assert_eq!(t.ship_data().unwrap().dimension.length_m(), 12);
            assert_eq!(t.transceiver_class, TransceiverClass::B);
        }
    }

    #[test]
    fn test_class_b_missing_half() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        reg.update(&part_a(269000001), t0());
        let t = reg.get(269000001).unwrap();
        assert_eq!(t.name.as_deref(), Some("SEA BREEZE"));
        assert_eq!(t.call_sign, None);
    }

    #[test]
    fn test_kind_replaced() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        reg.update(&part_a(269000001), t0());
        let aton = AisMessage::AidToNavigation(AidToNavigationReport {
            repeat: 0,
            mmsi: 269000001,
            aid_type: 1,
            name: "BUOY".into(),
            position_accuracy: false,
            lon: Some(9.5),
            lat: Some(47.5),
            dimension: Dimensions::default(),
            epfd: EpfdType::Gps,
            timestamp_second: None,
            off_position: false,
            regional: 0,
            raim: false,
            virtual_aid: true,
            assigned: false,
        });
        reg.update(&aton, t0() + TimeDelta::seconds(1));
        let t = reg.get(269000001).unwrap();
        assert!(matches!(
            t.kind,
            TargetKind::AidToNavigation(AidToNavigationData {
                virtual_aid: true,
                ..
            })
        ));
        assert_eq!(t.name.as_deref(), Some("BUOY"));
        assert_eq!(t.message_count, 2);
    }

    #[test]
    fn test_kind_from_mmsi() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        let msg = AisMessage::BinaryBroadcast(BinaryBroadcast {
            repeat: 0,
            mmsi: 2579999,
            dac: 1,
            fid: 31,
            data: crate::payload::Payload::new(),
        });
        reg.update(&msg, t0());
        assert_eq!(reg.get(2579999).unwrap().kind, TargetKind::BaseStation);
    }

    #[test]
    fn test_text_message_event() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        let msg = AisMessage::AddressedSafety(AddressedSafety {
            repeat: 0,
            mmsi: 226318000,
            sequence_number: 1,
            dest_mmsi: OWN,
            retransmit: false,
            text: "KEEP CLEAR".into(),
        });
        let events = reg.update(&msg, t0());
        assert!(events.contains(&TrackEvent::TextMessage {
            source: 226318000,
            destination: Some(OWN),
            text: "KEEP CLEAR".into(),
            timestamp: t0(),
        }));
    }

    #[test]
    fn test_own_ship() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        assert!(reg.own_ship().is_none());
        reg.update_own_ship(
            GeographicPosition::from_lat_lon(47.05, 9.05),
            Some(Velocity::new::<knot>(5.0)),
            Some(Angle::new::<degree>(10.0)),
            None,
            t0(),
        );
        let own = reg.own_ship().unwrap();
        assert!(own.has_position());
        assert_abs_diff_eq!(own.speed_over_ground().unwrap().get::<knot>(), 5.0, epsilon = 1e-9);
        assert_eq!(reg.targets().count(), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_get_active_and_prune() {
        let mut reg = TargetRegistry::new(OWN).unwrap();
        reg.update_own_ship(GeographicPosition::from_lat_lon(47.0, 9.0), None, None, None, t0());
        reg.update(&part_a(269000001), t0());
        reg.update(&part_a(269000002), t0() + TimeDelta::seconds(50));
        reg.update(&part_a(269000003), t0() + TimeDelta::seconds(100));

        let now = t0() + TimeDelta::seconds(120);
        let active = reg.get_active(now, TimeDelta::seconds(90));
        let mmsis: Vec<Mmsi> = active.iter().map(|t| t.mmsi).collect();
        assert_eq!(mmsis, vec![269000003, 269000002]);

        assert_eq!(reg.prune_stale(now, TimeDelta::seconds(90)), 1);
        assert!(reg.get(269000001).is_none());
        // Own ship is kept even though it is older.
        assert!(reg.own_ship().is_some());
        assert_eq!(reg.len(), 3);
    }
}
