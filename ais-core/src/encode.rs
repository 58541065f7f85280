//! Encode typed AIS messages back into bit payloads.
//!
//! Mirrors the field tables in `decode`: `None` becomes the on-air
//! "not available" value and spare bits are written as zero.

use crate::decode::{
    ALTITUDE_NA, COURSE_NA, HEADING_NA, LAT_NA, LAT_NA_COARSE, LON_NA, LON_NA_COARSE, ROT_NA,
    ROT_SCALE, SECOND_NA, SPEED_NA,
};
use crate::messages::*;
use crate::payload::Payload;
use crate::types::Mmsi;

// ---------------------------------------------------------------------------
// Field scaling
// ---------------------------------------------------------------------------

fn scaled(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

fn lon_fine(lon: Option<f64>) -> i64 {
    lon.filter(|v| v.is_finite() && v.abs() <= 180.0)
        .map(|v| scaled(v, 600_000.0))
        .unwrap_or(LON_NA as i64)
}

fn lat_fine(lat: Option<f64>) -> i64 {
    lat.filter(|v| v.is_finite() && v.abs() <= 90.0)
        .map(|v| scaled(v, 600_000.0))
        .unwrap_or(LAT_NA as i64)
}

fn lon_coarse(lon: Option<f64>) -> i64 {
    lon.filter(|v| v.is_finite() && v.abs() <= 180.0)
        .map(|v| scaled(v, 600.0))
        .unwrap_or(LON_NA_COARSE as i64)
}

fn lat_coarse(lat: Option<f64>) -> i64 {
    lat.filter(|v| v.is_finite() && v.abs() <= 90.0)
        .map(|v| scaled(v, 600.0))
        .unwrap_or(LAT_NA_COARSE as i64)
}

fn speed_tenths(speed: Option<f64>) -> u64 {
    speed
        .filter(|v| v.is_finite())
        .map(|v| scaled(v, 10.0).clamp(0, SPEED_NA as i64 - 1) as u64)
        .unwrap_or(SPEED_NA as u64)
}

fn course_tenths(course: Option<f64>) -> u64 {
    course
        .filter(|v| v.is_finite())
        .map(|v| scaled(v, 10.0).rem_euclid(COURSE_NA as i64) as u64)
        .unwrap_or(COURSE_NA as u64)
}

fn heading(value: Option<u16>) -> u64 {
    value
        .filter(|h| *h < 360)
        .map(|h| h as u64)
        .unwrap_or(HEADING_NA as u64)
}

fn second(value: Option<u8>) -> u64 {
    value
        .filter(|s| (*s as u32) < SECOND_NA)
        .map(|s| s as u64)
        .unwrap_or(SECOND_NA as u64)
}

/// Raw rate-of-turn indicator for a turn rate in degrees per minute.
pub fn rate_of_turn_raw(rot: Option<f64>) -> i64 {
    match rot.filter(|v| v.is_finite()) {
        None => ROT_NA as i64,
        Some(r) => {
            let raw = (ROT_SCALE * r.abs().sqrt()).round().min(126.0) as i64;
            if r < 0.0 {
                -raw
            } else {
                raw
            }
        }
    }
}

fn push_header(p: &mut Payload, message_type: u8, repeat: u8, mmsi: Mmsi) {
    p.push_uint(message_type as u64, 6);
    p.push_uint(repeat as u64, 2);
    p.push_uint(mmsi as u64, 30);
}

fn push_dimensions(p: &mut Payload, d: &Dimensions) {
    p.push_uint(d.to_bow as u64, 9);
    p.push_uint(d.to_stern as u64, 9);
    p.push_uint(d.to_port as u64, 6);
    p.push_uint(d.to_starboard as u64, 6);
}

fn push_eta(p: &mut Payload, eta: &Eta) {
    p.push_uint(eta.month.unwrap_or(0) as u64, 4);
    p.push_uint(eta.day.unwrap_or(0) as u64, 5);
    p.push_uint(eta.hour.unwrap_or(24) as u64, 5);
    p.push_uint(eta.minute.unwrap_or(60) as u64, 6);
}

fn push_region(p: &mut Payload, ne_lon: f64, ne_lat: f64, sw_lon: f64, sw_lat: f64) {
    p.push_int(scaled(ne_lon, 600.0), 18);
    p.push_int(scaled(ne_lat, 600.0), 17);
    p.push_int(scaled(sw_lon, 600.0), 18);
    p.push_int(scaled(sw_lat, 600.0), 17);
}

fn push_binary_header(p: &mut Payload, dest_mmsi: Option<Mmsi>, app_id: Option<u16>) {
    p.push_bool(dest_mmsi.is_some());
    p.push_bool(app_id.is_some());
    if let Some(dest) = dest_mmsi {
        p.push_uint(dest as u64, 30);
    }
    if let Some(id) = app_id {
        p.push_uint(id as u64, 16);
    }
}

// ---------------------------------------------------------------------------
// Top-level encode
// ---------------------------------------------------------------------------

/// Serialize a message to its bit payload.
pub fn encode(msg: &AisMessage) -> Payload {
    let mut p = Payload::new();
    push_header(&mut p, msg.message_type(), msg.repeat_indicator(), msg.mmsi());

    match msg {
        AisMessage::PositionReportClassA(m) => {
            p.push_uint(m.status.as_u8() as u64, 4);
            p.push_int(rate_of_turn_raw(m.rate_of_turn), 8);
            p.push_uint(speed_tenths(m.speed_kts), 10);
            p.push_bool(m.position_accuracy);
            p.push_int(lon_fine(m.lon), 28);
            p.push_int(lat_fine(m.lat), 27);
            p.push_uint(course_tenths(m.course_deg), 12);
            p.push_uint(heading(m.heading_deg), 9);
            p.push_uint(second(m.timestamp_second), 6);
            p.push_uint(m.maneuver.as_u8() as u64, 2);
            p.push_uint(0, 3);
            p.push_bool(m.raim);
            p.push_uint(m.radio_status as u64, 19);
        }
        AisMessage::BaseStationReport(m) => {
            p.push_uint(m.year.unwrap_or(0) as u64, 14);
            p.push_uint(m.month.unwrap_or(0) as u64, 4);
            p.push_uint(m.day.unwrap_or(0) as u64, 5);
            p.push_uint(m.hour.unwrap_or(24) as u64, 5);
            p.push_uint(m.minute.unwrap_or(60) as u64, 6);
            p.push_uint(second(m.second), 6);
            p.push_bool(m.position_accuracy);
            p.push_int(lon_fine(m.lon), 28);
            p.push_int(lat_fine(m.lat), 27);
            p.push_uint(m.epfd.as_u8() as u64, 4);
            p.push_uint(0, 10);
            p.push_bool(m.raim);
            p.push_uint(m.radio_status as u64, 19);
        }
        AisMessage::StaticAndVoyageData(m) => {
            p.push_uint(m.ais_version as u64, 2);
            p.push_uint(m.imo.unwrap_or(0) as u64, 30);
            p.push_text(&m.call_sign, 7);
            p.push_text(&m.name, 20);
            p.push_uint(m.ship_type.0 as u64, 8);
            push_dimensions(&mut p, &m.dimension);
            p.push_uint(m.epfd.as_u8() as u64, 4);
            push_eta(&mut p, &m.eta);
            let draught = m
                .draught_m
                .map(|d| scaled(d, 10.0).clamp(0, 255) as u64)
                .unwrap_or(0);
            p.push_uint(draught, 8);
            p.push_text(&m.destination, 20);
            p.push_bool(!m.data_terminal_ready);
            p.push_uint(0, 1);
        }
        AisMessage::AddressedBinary(m) => {
            p.push_uint(m.sequence_number as u64, 2);
            p.push_uint(m.dest_mmsi as u64, 30);
            p.push_bool(m.retransmit);
            p.push_uint(0, 1);
            p.push_uint(m.dac as u64, 10);
            p.push_uint(m.fid as u64, 6);
            p.push_payload(&m.data);
        }
        AisMessage::Acknowledge(m) => {
            p.push_uint(0, 2);
            for (mmsi, seq) in m.acks.iter().take(4) {
                p.push_uint(*mmsi as u64, 30);
                p.push_uint(*seq as u64, 2);
            }
        }
        AisMessage::BinaryBroadcast(m) => {
            p.push_uint(0, 2);
            p.push_uint(m.dac as u64, 10);
            p.push_uint(m.fid as u64, 6);
            p.push_payload(&m.data);
        }
        AisMessage::SarAircraftPosition(m) => {
            p.push_uint(m.altitude_m.map(|a| a as u64).unwrap_or(ALTITUDE_NA as u64), 12);
            let speed = m
                .speed_kts
                .map(|s| s.round().clamp(0.0, SPEED_NA as f64 - 1.0) as u64)
                .unwrap_or(SPEED_NA as u64);
            p.push_uint(speed, 10);
            p.push_bool(m.position_accuracy);
            p.push_int(lon_fine(m.lon), 28);
            p.push_int(lat_fine(m.lat), 27);
            p.push_uint(course_tenths(m.course_deg), 12);
            p.push_uint(second(m.timestamp_second), 6);
            p.push_uint(m.regional as u64, 8);
            p.push_bool(!m.data_terminal_ready);
            p.push_uint(0, 3);
            p.push_bool(m.assigned);
            p.push_bool(m.raim);
            p.push_uint(m.radio_status as u64, 20);
        }
        AisMessage::UtcInquiry(m) => {
            p.push_uint(0, 2);
            p.push_uint(m.dest_mmsi as u64, 30);
            p.push_uint(0, 2);
        }
        AisMessage::AddressedSafety(m) => {
            p.push_uint(m.sequence_number as u64, 2);
            p.push_uint(m.dest_mmsi as u64, 30);
            p.push_bool(m.retransmit);
            p.push_uint(0, 1);
            p.push_text(&m.text, m.text.chars().count().min(156));
        }
        AisMessage::SafetyBroadcast(m) => {
            p.push_uint(0, 2);
            p.push_text(&m.text, m.text.chars().count().min(161));
        }
        AisMessage::Interrogation(m) => {
            p.push_uint(0, 2);
            p.push_uint(m.station1 as u64, 30);
            p.push_uint(m.request1.message_type as u64, 6);
            p.push_uint(m.request1.slot_offset as u64, 12);
            if m.request2.is_some() || m.station2.is_some() {
                let req = m.request2.unwrap_or(InterrogationRequest {
                    message_type: 0,
                    slot_offset: 0,
                });
                p.push_uint(0, 2);
                p.push_uint(req.message_type as u64, 6);
                p.push_uint(req.slot_offset as u64, 12);
            }
            if let Some((station, req)) = m.station2 {
                p.push_uint(0, 2);
                p.push_uint(station as u64, 30);
                p.push_uint(req.message_type as u64, 6);
                p.push_uint(req.slot_offset as u64, 12);
                p.push_uint(0, 2);
            }
        }
        AisMessage::AssignedMode(m) => {
            p.push_uint(0, 2);
            for a in m.assignments.iter().take(2) {
                p.push_uint(a.mmsi as u64, 30);
                p.push_uint(a.offset as u64, 12);
                p.push_uint(a.increment as u64, 10);
            }
            if m.assignments.len() < 2 {
                p.push_uint(0, 4);
            }
        }
        AisMessage::DgnssBroadcast(m) => {
            p.push_uint(0, 2);
            p.push_int(lon_coarse(m.lon), 18);
            p.push_int(lat_coarse(m.lat), 17);
            p.push_uint(0, 5);
            p.push_payload(&m.data);
        }
        AisMessage::StandardClassBPosition(m) => {
            p.push_uint(0, 8);
            p.push_uint(speed_tenths(m.speed_kts), 10);
            p.push_bool(m.position_accuracy);
            p.push_int(lon_fine(m.lon), 28);
            p.push_int(lat_fine(m.lat), 27);
            p.push_uint(course_tenths(m.course_deg), 12);
            p.push_uint(heading(m.heading_deg), 9);
            p.push_uint(second(m.timestamp_second), 6);
            p.push_uint(0, 2);
            p.push_bool(m.cs_unit);
            p.push_bool(m.display);
            p.push_bool(m.dsc);
            p.push_bool(m.band);
            p.push_bool(m.message22);
            p.push_bool(m.assigned);
            p.push_bool(m.raim);
            p.push_uint(m.radio_status as u64, 20);
        }
        AisMessage::ExtendedClassBPosition(m) => {
            p.push_uint(0, 8);
            p.push_uint(speed_tenths(m.speed_kts), 10);
            p.push_bool(m.position_accuracy);
            p.push_int(lon_fine(m.lon), 28);
            p.push_int(lat_fine(m.lat), 27);
            p.push_uint(course_tenths(m.course_deg), 12);
            p.push_uint(heading(m.heading_deg), 9);
            p.push_uint(second(m.timestamp_second), 6);
            p.push_uint(0, 4);
            p.push_text(&m.name, 20);
            p.push_uint(m.ship_type.0 as u64, 8);
            push_dimensions(&mut p, &m.dimension);
            p.push_uint(m.epfd.as_u8() as u64, 4);
            p.push_bool(m.raim);
            p.push_bool(!m.data_terminal_ready);
            p.push_bool(m.assigned);
            p.push_uint(0, 4);
        }
        AisMessage::DataLinkManagement(m) => {
            p.push_uint(0, 2);
            for r in m.reservations.iter().take(4) {
                p.push_uint(r.offset as u64, 12);
                p.push_uint(r.number as u64, 4);
                p.push_uint(r.timeout as u64, 3);
                p.push_uint(r.increment as u64, 11);
            }
        }
        AisMessage::AidToNavigation(m) => {
            p.push_uint(m.aid_type as u64, 5);
            let name: Vec<char> = m.name.chars().collect();
            let head: String = name.iter().take(20).collect();
            let tail: String = name.iter().skip(20).take(14).collect();
            p.push_text(&head, 20);
            p.push_bool(m.position_accuracy);
            p.push_int(lon_fine(m.lon), 28);
            p.push_int(lat_fine(m.lat), 27);
            push_dimensions(&mut p, &m.dimension);
            p.push_uint(m.epfd.as_u8() as u64, 4);
            p.push_uint(second(m.timestamp_second), 6);
            p.push_bool(m.off_position);
            p.push_uint(m.regional as u64, 8);
            p.push_bool(m.raim);
            p.push_bool(m.virtual_aid);
            p.push_bool(m.assigned);
            p.push_uint(0, 1);
            p.push_text(&tail, tail.chars().count());
        }
        AisMessage::ChannelManagement(m) => {
            p.push_uint(0, 2);
            p.push_uint(m.channel_a as u64, 12);
            p.push_uint(m.channel_b as u64, 12);
            p.push_uint(m.tx_rx_mode as u64, 4);
            p.push_bool(m.low_power);
            match m.area {
                ChannelArea::Region {
                    ne_lon,
                    ne_lat,
                    sw_lon,
                    sw_lat,
                } => {
                    push_region(&mut p, ne_lon, ne_lat, sw_lon, sw_lat);
                    p.push_bool(false);
                }
                ChannelArea::Addressed {
                    dest_mmsi1,
                    dest_mmsi2,
                } => {
                    p.push_uint(dest_mmsi1 as u64, 30);
                    p.push_uint(0, 5);
                    p.push_uint(dest_mmsi2 as u64, 30);
                    p.push_uint(0, 5);
                    p.push_bool(true);
                }
            }
            p.push_bool(m.band_a);
            p.push_bool(m.band_b);
            p.push_uint(m.zone_size as u64, 3);
            p.push_uint(0, 23);
        }
        AisMessage::GroupAssignment(m) => {
            p.push_uint(0, 2);
            push_region(&mut p, m.ne_lon, m.ne_lat, m.sw_lon, m.sw_lat);
            p.push_uint(m.station_type as u64, 4);
            p.push_uint(m.ship_type.0 as u64, 8);
            p.push_uint(0, 22);
            p.push_uint(m.tx_rx_mode as u64, 2);
            p.push_uint(m.report_interval as u64, 4);
            p.push_uint(m.quiet_minutes as u64, 4);
            p.push_uint(0, 6);
        }
        AisMessage::StaticDataReport(m) => match &m.part {
            StaticDataPart::A { name } => {
                p.push_uint(0, 2);
                p.push_text(name, 20);
            }
            StaticDataPart::B {
                ship_type,
                vendor_id,
                model,
                serial,
                call_sign,
                dimension,
                mothership_mmsi,
            } => {
                p.push_uint(1, 2);
                p.push_uint(ship_type.0 as u64, 8);
                p.push_text(vendor_id, 3);
                p.push_uint(*model as u64, 4);
                p.push_uint(*serial as u64, 20);
                p.push_text(call_sign, 7);
                match (mothership_mmsi, dimension) {
                    (Some(parent), _) => p.push_uint(*parent as u64, 30),
                    (None, Some(d)) => push_dimensions(&mut p, d),
                    (None, None) => p.push_uint(0, 30),
                }
                p.push_uint(0, 6);
            }
        },
        AisMessage::SingleSlotBinary(m) => {
            push_binary_header(&mut p, m.dest_mmsi, m.app_id);
            p.push_payload(&m.data);
        }
        AisMessage::MultiSlotBinary(m) => {
            push_binary_header(&mut p, m.dest_mmsi, m.app_id);
            p.push_payload(&m.data);
            p.push_uint(m.radio_status as u64, 20);
        }
        AisMessage::LongRangeBroadcast(m) => {
            p.push_bool(m.position_accuracy);
            p.push_bool(m.raim);
            p.push_uint(m.status.as_u8() as u64, 4);
            p.push_int(lon_coarse(m.lon), 18);
            p.push_int(lat_coarse(m.lat), 17);
            let speed = m
                .speed_kts
                .map(|s| s.round().clamp(0.0, 62.0) as u64)
                .unwrap_or(63);
            p.push_uint(speed, 6);
            let course = m
                .course_deg
                .map(|c| (c.round() as i64).rem_euclid(360) as u64)
                .unwrap_or(511);
            p.push_uint(course, 9);
            p.push_bool(!m.gnss_position);
            p.push_uint(0, 1);
        }
    }

    p
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use approx::assert_abs_diff_eq;

    fn roundtrip(msg: &AisMessage) -> AisMessage {
        decode(&encode(msg)).expect("decodes")
    }

    fn decoded(text: &str, fill: u8) -> AisMessage {
        decode(&Payload::from_armored(text, fill).expect("armor")).expect("decodes")
    }

    #[test]
    fn test_class_a_reproduces_payload() {
        let text = "15Mq4J0P01EREODRv4@74gv00HRq";
        let msg = decoded(text, 0);
        let (armored, fill) = encode(&msg).to_armored();
        assert_eq!(armored, text);
        assert_eq!(fill, 0);
    }

    #[test]
    fn test_class_a_roundtrip_fields() {
        for text in [
            "13GmFd002pwrel@LpMu8L6qn8Vp0",
            "15B4FT5000JRP>PE6E68Nbkl0PS5",
            "15Mw1U?P00qNGTP@v`0@9wwn26sd",
        ] {
            let msg = decoded(text, 0);
            assert_eq!(roundtrip(&msg), msg, "roundtrip of {text}");
        }
    }

    #[test]
    fn test_static_voyage_roundtrip() {
        let text = "55NBjP01mtGIL@CW;SM<D60P5Ld000000000000P0`<3557l0<50@kk@K5h@00000000000";
        let msg = decoded(text, 2);
        let p = encode(&msg);
        assert_eq!(p.len(), 424);
        assert_eq!(decode(&p), Some(msg));
    }

    #[test]
    fn test_rate_of_turn_quantisation() {
        let raw = rate_of_turn_raw(Some(8.75));
        assert_eq!(raw, 14);
        assert_abs_diff_eq!(crate::decode::rate_of_turn(raw as i32).unwrap(), 8.75, epsilon = 0.01);

        let raw = rate_of_turn_raw(Some(-25.71));
        assert_eq!(raw, -24);
        assert_abs_diff_eq!(crate::decode::rate_of_turn(raw as i32).unwrap(), -25.71, epsilon = 0.01);

        assert_eq!(rate_of_turn_raw(None), -128);
        assert_eq!(rate_of_turn_raw(Some(10_000.0)), 126);
    }

    #[test]
    fn test_sentinels_written() {
        let msg = AisMessage::PositionReportClassA(PositionReportClassA {
            message_type: 1,
            repeat: 0,
            mmsi: 211000000,
            status: NavigationStatus::NotDefined,
            rate_of_turn: None,
            speed_kts: None,
            position_accuracy: false,
            lon: None,
            lat: None,
            course_deg: None,
            heading_deg: None,
            timestamp_second: None,
            maneuver: ManeuverIndicator::NotAvailable,
            raim: false,
            radio_status: 0,
        });
        let p = encode(&msg);
        assert_eq!(p.len(), 168);
        let mut r = p.reader();
        r.skip(42).unwrap();
        assert_eq!(r.i(8), Some(-128));
        assert_eq!(r.u(10), Some(1023));
        r.skip(1).unwrap();
        assert_eq!(r.i(28), Some(0x6791AC0));
        assert_eq!(r.i(27), Some(0x3412140));
        assert_eq!(r.u(12), Some(3600));
        assert_eq!(r.u(9), Some(511));
        assert_eq!(r.u(6), Some(60));
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_class_b_roundtrip() {
        let msg = AisMessage::StandardClassBPosition(StandardClassBPosition {
            repeat: 0,
            mmsi: 338087471,
            speed_kts: Some(0.1),
            position_accuracy: false,
            lon: Some(-74.0721),
            lat: Some(40.6845),
            course_deg: Some(79.6),
            heading_deg: None,
            timestamp_second: Some(49),
            cs_unit: true,
            display: false,
            dsc: true,
            band: true,
            message22: true,
            assigned: false,
            raim: false,
            radio_status: 0xC0006,
        });
        let p = encode(&msg);
        assert_eq!(p.len(), 168);
        match decode(&p) {
            Some(AisMessage::StandardClassBPosition(m)) => {
                assert_eq!(m.mmsi, 338087471);
                assert_eq!(m.speed_kts, Some(0.1));
                assert_abs_diff_eq!(m.lon.unwrap(), -74.0721, epsilon = 1e-6);
                assert_abs_diff_eq!(m.lat.unwrap(), 40.6845, epsilon = 1e-6);
                assert_eq!(m.course_deg, Some(79.6));
                assert!(m.cs_unit && m.dsc && m.band && m.message22);
                assert_eq!(m.radio_status, 0xC0006);
            }
            other => panic!("expected class B, got {other:?}"),
        }
    }

    #[test]
    fn test_extended_class_b_roundtrip() {
        let msg = AisMessage::ExtendedClassBPosition(ExtendedClassBPosition {
            repeat: 0,
            mmsi: 367059850,
            speed_kts: Some(8.7),
            position_accuracy: false,
            lon: Some(-88.810392),
            lat: Some(29.543695),
            course_deg: Some(335.9),
            heading_deg: Some(300),
            timestamp_second: Some(46),
            name: "CAPT.J.RIMES".into(),
            ship_type: ShipType(70),
            dimension: Dimensions {
                to_bow: 5,
                to_stern: 21,
                to_port: 4,
                to_starboard: 4,
            },
            epfd: EpfdType::Gps,
            raim: false,
            data_terminal_ready: true,
            assigned: false,
        });
        let p = encode(&msg);
        assert_eq!(p.len(), 312);
        match decode(&p) {
            Some(AisMessage::ExtendedClassBPosition(m)) => {
                assert_eq!(m.name, "CAPT.J.RIMES");
                assert_eq!(m.ship_type, ShipType(70));
                assert_eq!(m.dimension.length_m(), 26);
                assert_eq!(m.heading_deg, Some(300));
            }
            other => panic!("expected type 19, got {other:?}"),
        }
    }

    #[test]
    fn test_base_station_roundtrip() {
        let msg = AisMessage::BaseStationReport(BaseStationReport {
            message_type: 4,
            repeat: 0,
            mmsi: 2579999,
            year: Some(2024),
            month: Some(5),
            day: Some(17),
            hour: Some(12),
            minute: Some(30),
            second: Some(0),
            position_accuracy: true,
            lon: Some(5.3),
            lat: Some(60.4),
            epfd: EpfdType::Surveyed,
            raim: false,
            radio_status: 0,
        });
        assert_eq!(encode(&msg).len(), 168);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_static_data_parts_roundtrip() {
        let part_a = AisMessage::StaticDataReport(StaticDataReport {
            repeat: 0,
            mmsi: 271041815,
            part: StaticDataPart::A {
                name: "PROGUY".into(),
            },
        });
        assert_eq!(encode(&part_a).len(), 160);
        assert_eq!(roundtrip(&part_a), part_a);

        let part_b = AisMessage::StaticDataReport(StaticDataReport {
            repeat: 0,
            mmsi: 271041815,
            part: StaticDataPart::B {
                ship_type: ShipType(60),
                vendor_id: "1D0".into(),
                model: 0,
                serial: 0,
                call_sign: "TC6163".into(),
                dimension: Some(Dimensions {
                    to_bow: 0,
                    to_stern: 15,
                    to_port: 0,
                    to_starboard: 5,
                }),
                mothership_mmsi: None,
            },
        });
        assert_eq!(encode(&part_b).len(), 168);
        assert_eq!(roundtrip(&part_b), part_b);

        let auxiliary = AisMessage::StaticDataReport(StaticDataReport {
            repeat: 0,
            mmsi: 982_710_001,
            part: StaticDataPart::B {
                ship_type: ShipType(37),
                vendor_id: "ABC".into(),
                model: 1,
                serial: 42,
                call_sign: "X".into(),
                dimension: None,
                mothership_mmsi: Some(271041815),
            },
        });
        assert_eq!(roundtrip(&auxiliary), auxiliary);
    }

    #[test]
    fn test_aid_to_navigation_name_extension() {
        let msg = AisMessage::AidToNavigation(AidToNavigationReport {
            repeat: 0,
            mmsi: 993672072,
            aid_type: 20,
            name: "NORTH CARDINAL BUOY NR 7 EXT".into(),
            position_accuracy: true,
            lon: Some(9.4),
            lat: Some(53.7),
            dimension: Dimensions::default(),
            epfd: EpfdType::Surveyed,
            timestamp_second: Some(10),
            off_position: false,
            regional: 0,
            raim: false,
            virtual_aid: true,
            assigned: false,
        });
        let p = encode(&msg);
        assert_eq!(p.len(), 272 + 8 * 6);
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_long_range_roundtrip() {
        let msg = AisMessage::LongRangeBroadcast(LongRangeBroadcast {
            repeat: 0,
            mmsi: 206914217,
            position_accuracy: false,
            raim: false,
            status: NavigationStatus::UnderWaySailing,
            lon: Some(137.0),
            lat: Some(4.75),
            speed_kts: Some(57.0),
            course_deg: Some(167.0),
            gnss_position: true,
        });
        assert_eq!(encode(&msg).len(), 96);
        assert_eq!(roundtrip(&msg), msg);

        let unknown = AisMessage::LongRangeBroadcast(LongRangeBroadcast {
            lon: None,
            lat: None,
            speed_kts: None,
            course_deg: None,
            ..match msg {
                AisMessage::LongRangeBroadcast(m) => m,
                _ => unreachable!(),
            }
        });
        assert_eq!(roundtrip(&unknown), unknown);
    }

    #[test]
    fn test_safety_text_roundtrip() {
        let msg = AisMessage::SafetyBroadcast(SafetyBroadcast {
            repeat: 0,
            mmsi: 970001001,
            text: "SART ACTIVE".into(),
        });
        assert_eq!(roundtrip(&msg), msg);

        let addressed = AisMessage::AddressedSafety(AddressedSafety {
            repeat: 0,
            mmsi: 271002099,
            sequence_number: 0,
            dest_mmsi: 271002111,
            retransmit: true,
            text: "MSG FROM 271002099".into(),
        });
        assert_eq!(roundtrip(&addressed), addressed);
    }

    #[test]
    fn test_binary_messages_roundtrip() {
        let mut data = Payload::new();
        data.push_uint(0x2A5, 11);

        let broadcast = AisMessage::BinaryBroadcast(BinaryBroadcast {
            repeat: 0,
            mmsi: 366999712,
            dac: 366,
            fid: 56,
            data: data.clone(),
        });
        assert_eq!(roundtrip(&broadcast), broadcast);

        let addressed = AisMessage::AddressedBinary(AddressedBinary {
            repeat: 1,
            mmsi: 150834090,
            sequence_number: 3,
            dest_mmsi: 313240222,
            retransmit: false,
            dac: 669,
            fid: 11,
            data: data.clone(),
        });
        assert_eq!(roundtrip(&addressed), addressed);

        let single = AisMessage::SingleSlotBinary(SingleSlotBinary {
            repeat: 0,
            mmsi: 440006460,
            dest_mmsi: Some(134218384),
            app_id: Some(0x1234),
            data: data.clone(),
        });
        assert_eq!(roundtrip(&single), single);

        let multi = AisMessage::MultiSlotBinary(MultiSlotBinary {
            repeat: 0,
            mmsi: 440006460,
            dest_mmsi: None,
            app_id: None,
            data,
            radio_status: 0x4000F,
        });
        assert_eq!(roundtrip(&multi), multi);
    }

    #[test]
    fn test_link_management_roundtrip() {
        let msgs = vec![
            AisMessage::Acknowledge(Acknowledge {
                message_type: 7,
                repeat: 0,
                mmsi: 2655619,
                acks: vec![(265538450, 0), (265506710, 1)],
            }),
            AisMessage::UtcInquiry(UtcInquiry {
                repeat: 0,
                mmsi: 366814480,
                dest_mmsi: 366832740,
            }),
            AisMessage::Interrogation(Interrogation {
                repeat: 0,
                mmsi: 3669720,
                station1: 367014320,
                request1: InterrogationRequest {
                    message_type: 3,
                    slot_offset: 0,
                },
                request2: Some(InterrogationRequest {
                    message_type: 5,
                    slot_offset: 0,
                }),
                station2: None,
            }),
            AisMessage::AssignedMode(AssignedMode {
                repeat: 0,
                mmsi: 2053501,
                assignments: vec![ModeAssignment {
                    mmsi: 224251000,
                    offset: 200,
                    increment: 0,
                }],
            }),
            AisMessage::DataLinkManagement(DataLinkManagement {
                repeat: 0,
                mmsi: 2243302,
                reservations: vec![SlotReservation {
                    offset: 200,
                    number: 5,
                    timeout: 7,
                    increment: 225,
                }],
            }),
            AisMessage::ChannelManagement(ChannelManagement {
                repeat: 0,
                mmsi: 2268120,
                channel_a: 2087,
                channel_b: 2088,
                tx_rx_mode: 0,
                low_power: false,
                area: ChannelArea::Region {
                    ne_lon: 2.5,
                    ne_lat: 51.0,
                    sw_lon: 1.5,
                    sw_lat: 50.0,
                },
                band_a: false,
                band_b: false,
                zone_size: 4,
            }),
            AisMessage::ChannelManagement(ChannelManagement {
                repeat: 0,
                mmsi: 2268120,
                channel_a: 2087,
                channel_b: 2088,
                tx_rx_mode: 1,
                low_power: true,
                area: ChannelArea::Addressed {
                    dest_mmsi1: 227006760,
                    dest_mmsi2: 227006761,
                },
                band_a: true,
                band_b: false,
                zone_size: 2,
            }),
            AisMessage::GroupAssignment(GroupAssignment {
                repeat: 0,
                mmsi: 2268120,
                ne_lon: 2.5,
                ne_lat: 51.0,
                sw_lon: 1.5,
                sw_lat: 50.0,
                station_type: 6,
                ship_type: ShipType(0),
                tx_rx_mode: 0,
                report_interval: 9,
                quiet_minutes: 0,
            }),
        ];
        for msg in msgs {
            assert_eq!(roundtrip(&msg), msg, "roundtrip of type {}", msg.message_type());
        }
    }

    #[test]
    fn test_sar_and_dgnss_roundtrip() {
        let sar = AisMessage::SarAircraftPosition(SarAircraftPosition {
            repeat: 0,
            mmsi: 111232511,
            altitude_m: Some(303),
            speed_kts: Some(42.0),
            position_accuracy: false,
            lon: Some(-6.27884),
            lat: Some(58.144),
            course_deg: Some(154.5),
            timestamp_second: Some(15),
            regional: 0,
            data_terminal_ready: true,
            assigned: false,
            raim: true,
            radio_status: 0x3C000,
        });
        assert_eq!(encode(&sar).len(), 168);
        assert_eq!(roundtrip(&sar), sar);

        let mut data = Payload::new();
        data.push_uint(0xABCDE, 20);
        let dgnss = AisMessage::DgnssBroadcast(DgnssBroadcast {
            repeat: 0,
            mmsi: 2734450,
            lon: Some(29.13),
            lat: Some(59.985),
            data,
        });
        assert_eq!(roundtrip(&dgnss), dgnss);
    }
}
