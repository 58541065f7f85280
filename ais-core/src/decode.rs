//! Decode AIS bit payloads into typed messages.
//!
//! Handles all message types 1-27:
//! - 1-3:   Class A position report
//! - 4, 11: Base station report / UTC response
//! - 5:     Static and voyage data
//! - 6, 8:  Addressed / broadcast binary
//! - 7, 13: Binary / safety acknowledge
//! - 9:     SAR aircraft position
//! - 10:    UTC inquiry
//! - 12, 14: Addressed / broadcast safety text
//! - 15-17: Interrogation, assigned mode, DGNSS
//! - 18, 19: Class B position reports
//! - 20-23: Link management commands
//! - 24:    Class B static data (part A / part B)
//! - 25, 26: Single / multi slot binary
//! - 27:    Long range broadcast
//!
//! Fields are read strictly left to right. Running out of bits for any
//! declared field yields `None`; trailing spare bits are optional.

use log::debug;

use crate::messages::*;
use crate::payload::{BitReader, Payload};
use crate::types::Mmsi;

// ---------------------------------------------------------------------------
// Sentinels and scaling
// ---------------------------------------------------------------------------

/// Longitude "not available" (181 degrees) in 1/10000 minute.
pub(crate) const LON_NA: i32 = 181 * 600_000;
/// Latitude "not available" (91 degrees) in 1/10000 minute.
pub(crate) const LAT_NA: i32 = 91 * 600_000;
/// Longitude "not available" in 1/10 minute (types 17, 22, 23, 27).
pub(crate) const LON_NA_COARSE: i32 = 181 * 600;
/// Latitude "not available" in 1/10 minute.
pub(crate) const LAT_NA_COARSE: i32 = 91 * 600;

pub(crate) const SPEED_NA: u32 = 1023;
pub(crate) const COURSE_NA: u32 = 3600;
pub(crate) const HEADING_NA: u32 = 511;
pub(crate) const SECOND_NA: u32 = 60;
pub(crate) const ROT_NA: i32 = -128;
pub(crate) const ALTITUDE_NA: u32 = 4095;

/// Rate-of-turn indicator scale: raw = ROT_SCALE * sqrt(deg/min).
pub(crate) const ROT_SCALE: f64 = 4.733;

fn lon_fine(raw: i32) -> Option<f64> {
    if raw == LON_NA || raw.abs() > 180 * 600_000 {
        return None;
    }
    Some(raw as f64 / 600_000.0)
}

fn lat_fine(raw: i32) -> Option<f64> {
    if raw == LAT_NA || raw.abs() > 90 * 600_000 {
        return None;
    }
    Some(raw as f64 / 600_000.0)
}

fn lon_coarse(raw: i32) -> Option<f64> {
    if raw == LON_NA_COARSE || raw.abs() > 180 * 600 {
        return None;
    }
    Some(raw as f64 / 600.0)
}

fn lat_coarse(raw: i32) -> Option<f64> {
    if raw == LAT_NA_COARSE || raw.abs() > 90 * 600 {
        return None;
    }
    Some(raw as f64 / 600.0)
}

fn speed_tenths(raw: u32) -> Option<f64> {
    (raw != SPEED_NA).then(|| raw as f64 / 10.0)
}

fn course_tenths(raw: u32) -> Option<f64> {
    (raw < COURSE_NA).then(|| raw as f64 / 10.0)
}

fn heading(raw: u32) -> Option<u16> {
    (raw < 360).then_some(raw as u16)
}

fn second(raw: u32) -> Option<u8> {
    (raw < SECOND_NA).then_some(raw as u8)
}

/// Rate of turn in degrees per minute. -128 is "not available"; +-127 means
/// "turning faster than 5 deg/30 s, no turn indicator" and carries no value.
pub fn rate_of_turn(raw: i32) -> Option<f64> {
    if raw == ROT_NA || raw.abs() == 127 {
        return None;
    }
    let rot = (raw as f64 / ROT_SCALE).powi(2);
    Some(if raw < 0 { -rot } else { rot })
}

fn dimensions(r: &mut BitReader) -> Option<Dimensions> {
    Some(Dimensions {
        to_bow: r.u(9)? as u16,
        to_stern: r.u(9)? as u16,
        to_port: r.u(6)? as u8,
        to_starboard: r.u(6)? as u8,
    })
}

fn eta(r: &mut BitReader) -> Option<Eta> {
    let month = r.u(4)? as u8;
    let day = r.u(5)? as u8;
    let hour = r.u(5)? as u8;
    let minute = r.u(6)? as u8;
    Some(Eta {
        month: (1..=12).contains(&month).then_some(month),
        day: (day != 0).then_some(day),
        hour: (hour < 24).then_some(hour),
        minute: (minute < 60).then_some(minute),
    })
}

/// MMSI range 98MIDxxxx: craft associated with a parent ship.
pub fn is_auxiliary_mmsi(mmsi: Mmsi) -> bool {
    mmsi / 10_000_000 == 98
}

// ---------------------------------------------------------------------------
// Top-level decode
// ---------------------------------------------------------------------------

/// Decode a complete payload. Returns `None` for unknown message types or
/// payloads too short for their layout.
pub fn decode(payload: &Payload) -> Option<AisMessage> {
    let mut r = payload.reader();
    let msg_type = r.u(6)? as u8;
    let repeat = r.u(2)? as u8;
    let mmsi = r.u(30)?;

    let msg = match msg_type {
        1..=3 => AisMessage::PositionReportClassA(decode_position_a(msg_type, repeat, mmsi, &mut r)?),
        4 | 11 => AisMessage::BaseStationReport(decode_base_station(msg_type, repeat, mmsi, &mut r)?),
        5 => AisMessage::StaticAndVoyageData(decode_static_voyage(repeat, mmsi, &mut r)?),
        6 => AisMessage::AddressedBinary(AddressedBinary {
            repeat,
            mmsi,
            sequence_number: r.u(2)? as u8,
            dest_mmsi: r.u(30)?,
            retransmit: r.flag()?,
            dac: {
                r.skip(1)?;
                r.u(10)? as u16
            },
            fid: r.u(6)? as u8,
            data: r.rest(),
        }),
        7 | 13 => AisMessage::Acknowledge(decode_acknowledge(msg_type, repeat, mmsi, &mut r)?),
        8 => {
            r.skip(2)?;
            AisMessage::BinaryBroadcast(BinaryBroadcast {
                repeat,
                mmsi,
                dac: r.u(10)? as u16,
                fid: r.u(6)? as u8,
                data: r.rest(),
            })
        }
        9 => AisMessage::SarAircraftPosition(decode_sar_aircraft(repeat, mmsi, &mut r)?),
        10 => {
            r.skip(2)?;
            AisMessage::UtcInquiry(UtcInquiry {
                repeat,
                mmsi,
                dest_mmsi: r.u(30)?,
            })
        }
        12 => {
            let sequence_number = r.u(2)? as u8;
            let dest_mmsi = r.u(30)?;
            let retransmit = r.flag()?;
            r.skip(1)?;
            AisMessage::AddressedSafety(AddressedSafety {
                repeat,
                mmsi,
                sequence_number,
                dest_mmsi,
                retransmit,
                text: r.text_rest(),
            })
        }
        14 => {
            r.skip(2)?;
            AisMessage::SafetyBroadcast(SafetyBroadcast {
                repeat,
                mmsi,
                text: r.text_rest(),
            })
        }
        15 => AisMessage::Interrogation(decode_interrogation(repeat, mmsi, &mut r)?),
        16 => AisMessage::AssignedMode(decode_assigned_mode(repeat, mmsi, &mut r)?),
        17 => {
            r.skip(2)?;
            let lon = lon_coarse(r.i(18)?);
            let lat = lat_coarse(r.i(17)?);
            r.skip(5)?;
            AisMessage::DgnssBroadcast(DgnssBroadcast {
                repeat,
                mmsi,
                lon,
                lat,
                data: r.rest(),
            })
        }
        18 => AisMessage::StandardClassBPosition(decode_class_b(repeat, mmsi, &mut r)?),
        19 => AisMessage::ExtendedClassBPosition(decode_class_b_extended(repeat, mmsi, &mut r)?),
        20 => AisMessage::DataLinkManagement(decode_data_link(repeat, mmsi, &mut r)?),
        21 => AisMessage::AidToNavigation(decode_aid_to_navigation(repeat, mmsi, &mut r)?),
        22 => AisMessage::ChannelManagement(decode_channel_management(repeat, mmsi, payload, &mut r)?),
        23 => AisMessage::GroupAssignment(decode_group_assignment(repeat, mmsi, &mut r)?),
        24 => AisMessage::StaticDataReport(decode_static_data(repeat, mmsi, &mut r)?),
        25 => {
            let (dest_mmsi, app_id) = decode_binary_header(&mut r)?;
            AisMessage::SingleSlotBinary(SingleSlotBinary {
                repeat,
                mmsi,
                dest_mmsi,
                app_id,
                data: r.rest(),
            })
        }
        26 => {
            let (dest_mmsi, app_id) = decode_binary_header(&mut r)?;
            let data_len = r.remaining().checked_sub(20)?;
            AisMessage::MultiSlotBinary(MultiSlotBinary {
                repeat,
                mmsi,
                dest_mmsi,
                app_id,
                data: r.take(data_len)?,
                radio_status: r.u(20)?,
            })
        }
        27 => AisMessage::LongRangeBroadcast(decode_long_range(repeat, mmsi, &mut r)?),
        _ => {
            debug!("unsupported AIS message type {msg_type} from {mmsi}");
            return None;
        }
    };

    Some(msg)
}

// ---------------------------------------------------------------------------
// Per-layout decoders
// ---------------------------------------------------------------------------

fn decode_position_a(
    message_type: u8,
    repeat: u8,
    mmsi: Mmsi,
    r: &mut BitReader,
) -> Option<PositionReportClassA> {
    let status = NavigationStatus::from_u8(r.u(4)? as u8);
    let rate_of_turn = rate_of_turn(r.i(8)?);
    let speed_kts = speed_tenths(r.u(10)?);
    let position_accuracy = r.flag()?;
    let lon = lon_fine(r.i(28)?);
    let lat = lat_fine(r.i(27)?);
    let course_deg = course_tenths(r.u(12)?);
    let heading_deg = heading(r.u(9)?);
    let timestamp_second = second(r.u(6)?);
    let maneuver = ManeuverIndicator::from_u8(r.u(2)? as u8);
    r.skip(3)?;
    let raim = r.flag()?;
    let radio_status = r.u(19)?;

    Some(PositionReportClassA {
        message_type,
        repeat,
        mmsi,
        status,
        rate_of_turn,
        speed_kts,
        position_accuracy,
        lon,
        lat,
        course_deg,
        heading_deg,
        timestamp_second,
        maneuver,
        raim,
        radio_status,
    })
}

fn decode_base_station(
    message_type: u8,
    repeat: u8,
    mmsi: Mmsi,
    r: &mut BitReader,
) -> Option<BaseStationReport> {
    let year = r.u(14)? as u16;
    let month = r.u(4)? as u8;
    let day = r.u(5)? as u8;
    let hour = r.u(5)? as u8;
    let minute = r.u(6)? as u8;
    let sec = r.u(6)?;
    let position_accuracy = r.flag()?;
    let lon = lon_fine(r.i(28)?);
    let lat = lat_fine(r.i(27)?);
    let epfd = EpfdType::from_u8(r.u(4)? as u8);
    r.skip(10)?;
    let raim = r.flag()?;
    let radio_status = r.u(19)?;

    Some(BaseStationReport {
        message_type,
        repeat,
        mmsi,
        year: (year != 0).then_some(year),
        month: (1..=12).contains(&month).then_some(month),
        day: (day != 0).then_some(day),
        hour: (hour < 24).then_some(hour),
        minute: (minute < 60).then_some(minute),
        second: second(sec),
        position_accuracy,
        lon,
        lat,
        epfd,
        raim,
        radio_status,
    })
}

fn decode_static_voyage(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<StaticAndVoyageData> {
    let ais_version = r.u(2)? as u8;
    let imo = r.u(30)?;
    let call_sign = r.text(7)?;
    let name = r.text(20)?;
    let ship_type = ShipType(r.u(8)? as u8);
    let dimension = dimensions(r)?;
    let epfd = EpfdType::from_u8(r.u(4)? as u8);
    let eta = eta(r)?;
    let draught = r.u(8)?;
    let destination = r.text(20)?;
    let dte = r.flag()?;

    Some(StaticAndVoyageData {
        repeat,
        mmsi,
        ais_version,
        imo: (imo != 0).then_some(imo),
        call_sign,
        name,
        ship_type,
        dimension,
        epfd,
        eta,
        draught_m: (draught != 0).then(|| draught as f64 / 10.0),
        destination,
        data_terminal_ready: !dte,
    })
}

fn decode_acknowledge(
    message_type: u8,
    repeat: u8,
    mmsi: Mmsi,
    r: &mut BitReader,
) -> Option<Acknowledge> {
    r.skip(2)?;
    let mut acks = Vec::new();
    while r.remaining() >= 32 && acks.len() < 4 {
        acks.push((r.u(30)?, r.u(2)? as u8));
    }
    if acks.is_empty() {
        return None;
    }
    Some(Acknowledge {
        message_type,
        repeat,
        mmsi,
        acks,
    })
}

fn decode_sar_aircraft(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<SarAircraftPosition> {
    let altitude = r.u(12)?;
    let speed = r.u(10)?;
    let position_accuracy = r.flag()?;
    let lon = lon_fine(r.i(28)?);
    let lat = lat_fine(r.i(27)?);
    let course_deg = course_tenths(r.u(12)?);
    let timestamp_second = second(r.u(6)?);
    let regional = r.u(8)? as u8;
    let dte = r.flag()?;
    r.skip(3)?;
    let assigned = r.flag()?;
    let raim = r.flag()?;
    let radio_status = r.u(20)?;

    Some(SarAircraftPosition {
        repeat,
        mmsi,
        altitude_m: (altitude != ALTITUDE_NA).then_some(altitude as u16),
        speed_kts: (speed != SPEED_NA).then_some(speed as f64),
        position_accuracy,
        lon,
        lat,
        course_deg,
        timestamp_second,
        regional,
        data_terminal_ready: !dte,
        assigned,
        raim,
        radio_status,
    })
}

fn decode_interrogation(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<Interrogation> {
    r.skip(2)?;
    let station1 = r.u(30)?;
    let request1 = InterrogationRequest {
        message_type: r.u(6)? as u8,
        slot_offset: r.u(12)? as u16,
    };

    let mut request2 = None;
    if r.remaining() >= 20 {
        r.skip(2)?;
        let req = InterrogationRequest {
            message_type: r.u(6)? as u8,
            slot_offset: r.u(12)? as u16,
        };
        if req.message_type != 0 || req.slot_offset != 0 {
            request2 = Some(req);
        }
    }

    let mut station2 = None;
    if r.remaining() >= 50 {
        r.skip(2)?;
        let station = r.u(30)?;
        let req = InterrogationRequest {
            message_type: r.u(6)? as u8,
            slot_offset: r.u(12)? as u16,
        };
        station2 = Some((station, req));
    }

    Some(Interrogation {
        repeat,
        mmsi,
        station1,
        request1,
        request2,
        station2,
    })
}

fn decode_assigned_mode(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<AssignedMode> {
    r.skip(2)?;
    let mut assignments = Vec::with_capacity(2);
    loop {
        assignments.push(ModeAssignment {
            mmsi: r.u(30)?,
            offset: r.u(12)? as u16,
            increment: r.u(10)? as u16,
        });
        if assignments.len() == 2 || r.remaining() < 52 {
            break;
        }
    }
    Some(AssignedMode {
        repeat,
        mmsi,
        assignments,
    })
}

fn decode_class_b(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<StandardClassBPosition> {
    r.skip(8)?;
    let speed_kts = speed_tenths(r.u(10)?);
    let position_accuracy = r.flag()?;
    let lon = lon_fine(r.i(28)?);
    let lat = lat_fine(r.i(27)?);
    let course_deg = course_tenths(r.u(12)?);
    let heading_deg = heading(r.u(9)?);
    let timestamp_second = second(r.u(6)?);
    r.skip(2)?;

    Some(StandardClassBPosition {
        repeat,
        mmsi,
        speed_kts,
        position_accuracy,
        lon,
        lat,
        course_deg,
        heading_deg,
        timestamp_second,
        cs_unit: r.flag()?,
        display: r.flag()?,
        dsc: r.flag()?,
        band: r.flag()?,
        message22: r.flag()?,
        assigned: r.flag()?,
        raim: r.flag()?,
        radio_status: r.u(20)?,
    })
}

fn decode_class_b_extended(
    repeat: u8,
    mmsi: Mmsi,
    r: &mut BitReader,
) -> Option<ExtendedClassBPosition> {
    r.skip(8)?;
    let speed_kts = speed_tenths(r.u(10)?);
    let position_accuracy = r.flag()?;
    let lon = lon_fine(r.i(28)?);
    let lat = lat_fine(r.i(27)?);
    let course_deg = course_tenths(r.u(12)?);
    let heading_deg = heading(r.u(9)?);
    let timestamp_second = second(r.u(6)?);
    r.skip(4)?;
    let name = r.text(20)?;
    let ship_type = ShipType(r.u(8)? as u8);
    let dimension = dimensions(r)?;
    let epfd = EpfdType::from_u8(r.u(4)? as u8);
    let raim = r.flag()?;
    let dte = r.flag()?;
    let assigned = r.flag()?;

    Some(ExtendedClassBPosition {
        repeat,
        mmsi,
        speed_kts,
        position_accuracy,
        lon,
        lat,
        course_deg,
        heading_deg,
        timestamp_second,
        name,
        ship_type,
        dimension,
        epfd,
        raim,
        data_terminal_ready: !dte,
        assigned,
    })
}

fn decode_data_link(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<DataLinkManagement> {
    r.skip(2)?;
    let mut reservations = Vec::new();
    while r.remaining() >= 30 && reservations.len() < 4 {
        reservations.push(SlotReservation {
            offset: r.u(12)? as u16,
            number: r.u(4)? as u8,
            timeout: r.u(3)? as u8,
            increment: r.u(11)? as u16,
        });
    }
    if reservations.is_empty() {
        return None;
    }
    Some(DataLinkManagement {
        repeat,
        mmsi,
        reservations,
    })
}

fn decode_aid_to_navigation(
    repeat: u8,
    mmsi: Mmsi,
    r: &mut BitReader,
) -> Option<AidToNavigationReport> {
    let aid_type = r.u(5)? as u8;
    let name = r.text_untrimmed(20)?;
    let position_accuracy = r.flag()?;
    let lon = lon_fine(r.i(28)?);
    let lat = lat_fine(r.i(27)?);
    let dimension = dimensions(r)?;
    let epfd = EpfdType::from_u8(r.u(4)? as u8);
    let timestamp_second = second(r.u(6)?);
    let off_position = r.flag()?;
    let regional = r.u(8)? as u8;
    let raim = r.flag()?;
    let virtual_aid = r.flag()?;
    let assigned = r.flag()?;
    r.skip(1)?;
    let extension = r.text_rest();

    Some(AidToNavigationReport {
        repeat,
        mmsi,
        aid_type,
        name: format!("{name}{extension}").trim_end().to_string(),
        position_accuracy,
        lon,
        lat,
        dimension,
        epfd,
        timestamp_second,
        off_position,
        regional,
        raim,
        virtual_aid,
        assigned,
    })
}

fn decode_channel_management(
    repeat: u8,
    mmsi: Mmsi,
    payload: &Payload,
    r: &mut BitReader,
) -> Option<ChannelManagement> {
    r.skip(2)?;
    let channel_a = r.u(12)? as u16;
    let channel_b = r.u(12)? as u16;
    let tx_rx_mode = r.u(4)? as u8;
    let low_power = r.flag()?;

    let area = if payload.bit(139)? {
        let dest_mmsi1 = r.u(30)?;
        r.skip(5)?;
        let dest_mmsi2 = r.u(30)?;
        r.skip(5)?;
        ChannelArea::Addressed {
            dest_mmsi1,
            dest_mmsi2,
        }
    } else {
        ChannelArea::Region {
            ne_lon: r.i(18)? as f64 / 600.0,
            ne_lat: r.i(17)? as f64 / 600.0,
            sw_lon: r.i(18)? as f64 / 600.0,
            sw_lat: r.i(17)? as f64 / 600.0,
        }
    };
    r.skip(1)?;

    Some(ChannelManagement {
        repeat,
        mmsi,
        channel_a,
        channel_b,
        tx_rx_mode,
        low_power,
        area,
        band_a: r.flag()?,
        band_b: r.flag()?,
        zone_size: r.u(3)? as u8,
    })
}

fn decode_group_assignment(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<GroupAssignment> {
    r.skip(2)?;
    let ne_lon = r.i(18)? as f64 / 600.0;
    let ne_lat = r.i(17)? as f64 / 600.0;
    let sw_lon = r.i(18)? as f64 / 600.0;
    let sw_lat = r.i(17)? as f64 / 600.0;
    let station_type = r.u(4)? as u8;
    let ship_type = ShipType(r.u(8)? as u8);
    r.skip(22)?;

    Some(GroupAssignment {
        repeat,
        mmsi,
        ne_lon,
        ne_lat,
        sw_lon,
        sw_lat,
        station_type,
        ship_type,
        tx_rx_mode: r.u(2)? as u8,
        report_interval: r.u(4)? as u8,
        quiet_minutes: r.u(4)? as u8,
    })
}

fn decode_static_data(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<StaticDataReport> {
    let part = match r.u(2)? {
        0 => StaticDataPart::A { name: r.text(20)? },
        1 => {
            let ship_type = ShipType(r.u(8)? as u8);
            let vendor_id = r.text(3)?;
            let model = r.u(4)? as u8;
            let serial = r.u(20)?;
            let call_sign = r.text(7)?;
            let (dimension, mothership_mmsi) = if is_auxiliary_mmsi(mmsi) {
                (None, Some(r.u(30)?))
            } else {
                (Some(dimensions(r)?), None)
            };
            StaticDataPart::B {
                ship_type,
                vendor_id,
                model,
                serial,
                call_sign,
                dimension,
                mothership_mmsi,
            }
        }
        _ => return None,
    };
    Some(StaticDataReport { repeat, mmsi, part })
}

/// Addressed/structured flags plus optional destination and application id
/// shared by types 25 and 26.
fn decode_binary_header(r: &mut BitReader) -> Option<(Option<Mmsi>, Option<u16>)> {
    let addressed = r.flag()?;
    let structured = r.flag()?;
    let dest_mmsi = if addressed { Some(r.u(30)?) } else { None };
    let app_id = if structured {
        Some(r.u(16)? as u16)
    } else {
        None
    };
    Some((dest_mmsi, app_id))
}

fn decode_long_range(repeat: u8, mmsi: Mmsi, r: &mut BitReader) -> Option<LongRangeBroadcast> {
    let position_accuracy = r.flag()?;
    let raim = r.flag()?;
    let status = NavigationStatus::from_u8(r.u(4)? as u8);
    let lon = lon_coarse(r.i(18)?);
    let lat = lat_coarse(r.i(17)?);
    let speed = r.u(6)?;
    let course = r.u(9)?;
    let gnss = r.flag()?;

    Some(LongRangeBroadcast {
        repeat,
        mmsi,
        position_accuracy,
        raim,
        status,
        lon,
        lat,
        speed_kts: (speed != 63).then_some(speed as f64),
        course_deg: (course < 360).then_some(course as f64),
        gnss_position: !gnss,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
