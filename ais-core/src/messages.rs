//! Decoded AIS message types.
//!
//! One struct per bit layout, collected in the closed `AisMessage` enum.
//! "Not available" sentinels are mapped to `None` when decoding and written
//! back when encoding, so callers never see raw sentinel values.

use serde::Serialize;

use crate::payload::Payload;
use crate::types::Mmsi;

// ---------------------------------------------------------------------------
// Enumerated fields
// ---------------------------------------------------------------------------

/// Navigation status (4 bits, types 1-3 and 27).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NavigationStatus {
    UnderWayUsingEngine,
    AtAnchor,
    NotUnderCommand,
    RestrictedManeuverability,
    ConstrainedByDraught,
    Moored,
    Aground,
    EngagedInFishing,
    UnderWaySailing,
    ReservedHsc,
    ReservedWig,
    TowingAstern,
    PushingAheadOrTowingAlongside,
    Reserved13,
    AisSartActive,
    NotDefined,
}

const NAV_STATUS_TABLE: [NavigationStatus; 16] = [
    NavigationStatus::UnderWayUsingEngine,
    NavigationStatus::AtAnchor,
    NavigationStatus::NotUnderCommand,
    NavigationStatus::RestrictedManeuverability,
    NavigationStatus::ConstrainedByDraught,
    NavigationStatus::Moored,
    NavigationStatus::Aground,
    NavigationStatus::EngagedInFishing,
    NavigationStatus::UnderWaySailing,
    NavigationStatus::ReservedHsc,
    NavigationStatus::ReservedWig,
    NavigationStatus::TowingAstern,
    NavigationStatus::PushingAheadOrTowingAlongside,
    NavigationStatus::Reserved13,
    NavigationStatus::AisSartActive,
    NavigationStatus::NotDefined,
];

impl NavigationStatus {
    pub fn from_u8(code: u8) -> Self {
        NAV_STATUS_TABLE[(code & 0x0F) as usize]
    }

    pub fn as_u8(self) -> u8 {
        NAV_STATUS_TABLE
            .iter()
            .position(|s| *s == self)
            .unwrap_or(15) as u8
    }
}

impl std::fmt::Display for NavigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NavigationStatus::UnderWayUsingEngine => "Under way using engine",
            NavigationStatus::AtAnchor => "At anchor",
            NavigationStatus::NotUnderCommand => "Not under command",
            NavigationStatus::RestrictedManeuverability => "Restricted maneuverability",
            NavigationStatus::ConstrainedByDraught => "Constrained by her draught",
            NavigationStatus::Moored => "Moored",
            NavigationStatus::Aground => "Aground",
            NavigationStatus::EngagedInFishing => "Engaged in fishing",
            NavigationStatus::UnderWaySailing => "Under way sailing",
            NavigationStatus::ReservedHsc => "Reserved (HSC)",
            NavigationStatus::ReservedWig => "Reserved (WIG)",
            NavigationStatus::TowingAstern => "Power-driven vessel towing astern",
            NavigationStatus::PushingAheadOrTowingAlongside => {
                "Power-driven vessel pushing ahead or towing alongside"
            }
            NavigationStatus::Reserved13 => "Reserved",
            NavigationStatus::AisSartActive => "AIS-SART active",
            NavigationStatus::NotDefined => "Not defined",
        };
        write!(f, "{s}")
    }
}

/// Ship and cargo type (8 bits). Kept as the raw code so every value
/// survives a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ShipType(pub u8);

impl ShipType {
    /// Human-readable category.
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Not available",
            1..=19 => "Reserved",
            20..=29 => "Wing in ground",
            30 => "Fishing",
            31 | 32 => "Towing",
            33 => "Dredging or underwater ops",
            34 => "Diving ops",
            35 => "Military ops",
            36 => "Sailing",
            37 => "Pleasure craft",
            38 | 39 => "Reserved",
            40..=49 => "High speed craft",
            50 => "Pilot vessel",
            51 => "Search and rescue vessel",
            52 => "Tug",
            53 => "Port tender",
            54 => "Anti-pollution equipment",
            55 => "Law enforcement",
            56 | 57 => "Spare, local vessel",
            58 => "Medical transport",
            59 => "Noncombatant ship",
            60..=69 => "Passenger",
            70..=79 => "Cargo",
            80..=89 => "Tanker",
            90..=99 => "Other type",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for ShipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Electronic position fixing device type (4 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EpfdType {
    Undefined,
    Gps,
    Glonass,
    CombinedGpsGlonass,
    LoranC,
    Chayka,
    IntegratedNavigation,
    Surveyed,
    Galileo,
    InternalGnss,
    Reserved(u8),
}

impl EpfdType {
    pub fn from_u8(code: u8) -> Self {
        match code & 0x0F {
            0 => EpfdType::Undefined,
            1 => EpfdType::Gps,
            2 => EpfdType::Glonass,
            3 => EpfdType::CombinedGpsGlonass,
            4 => EpfdType::LoranC,
            5 => EpfdType::Chayka,
            6 => EpfdType::IntegratedNavigation,
            7 => EpfdType::Surveyed,
            8 => EpfdType::Galileo,
            15 => EpfdType::InternalGnss,
            other => EpfdType::Reserved(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            EpfdType::Undefined => 0,
            EpfdType::Gps => 1,
            EpfdType::Glonass => 2,
            EpfdType::CombinedGpsGlonass => 3,
            EpfdType::LoranC => 4,
            EpfdType::Chayka => 5,
            EpfdType::IntegratedNavigation => 6,
            EpfdType::Surveyed => 7,
            EpfdType::Galileo => 8,
            EpfdType::InternalGnss => 15,
            EpfdType::Reserved(c) => c & 0x0F,
        }
    }
}

/// Special maneuver indicator (2 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ManeuverIndicator {
    NotAvailable,
    NoSpecialManeuver,
    SpecialManeuver,
    Reserved,
}

impl ManeuverIndicator {
    pub fn from_u8(code: u8) -> Self {
        match code & 0x03 {
            0 => ManeuverIndicator::NotAvailable,
            1 => ManeuverIndicator::NoSpecialManeuver,
            2 => ManeuverIndicator::SpecialManeuver,
            _ => ManeuverIndicator::Reserved,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ManeuverIndicator::NotAvailable => 0,
            ManeuverIndicator::NoSpecialManeuver => 1,
            ManeuverIndicator::SpecialManeuver => 2,
            ManeuverIndicator::Reserved => 3,
        }
    }
}

/// Aid-to-navigation type names (type 21, 5 bits).
pub const AID_TYPES: [&str; 32] = [
    "Default",
    "Reference point",
    "RACON",
    "Fixed structure off shore",
    "Spare",
    "Light, without sectors",
    "Light, with sectors",
    "Leading light front",
    "Leading light rear",
    "Beacon, cardinal N",
    "Beacon, cardinal E",
    "Beacon, cardinal S",
    "Beacon, cardinal W",
    "Beacon, port hand",
    "Beacon, starboard hand",
    "Beacon, preferred channel port hand",
    "Beacon, preferred channel starboard hand",
    "Beacon, isolated danger",
    "Beacon, safe water",
    "Beacon, special mark",
    "Cardinal mark N",
    "Cardinal mark E",
    "Cardinal mark S",
    "Cardinal mark W",
    "Port hand mark",
    "Starboard hand mark",
    "Preferred channel port hand",
    "Preferred channel starboard hand",
    "Isolated danger",
    "Safe water",
    "Special mark",
    "Light vessel / LANBY / rigs",
];

pub fn aid_type_name(code: u8) -> &'static str {
    AID_TYPES[(code & 0x1F) as usize]
}

// ---------------------------------------------------------------------------
// Shared field groups
// ---------------------------------------------------------------------------

/// Reference point for reported position (distances from the GNSS antenna).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Dimensions {
    pub to_bow: u16,
    pub to_stern: u16,
    pub to_port: u8,
    pub to_starboard: u8,
}

impl Dimensions {
    pub fn length_m(&self) -> u16 {
        self.to_bow + self.to_stern
    }

    pub fn beam_m(&self) -> u16 {
        self.to_port as u16 + self.to_starboard as u16
    }

    pub fn is_known(&self) -> bool {
        self.length_m() > 0 || self.beam_m() > 0
    }
}

/// Estimated time of arrival (UTC, no year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Eta {
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
}

impl std::fmt::Display for Eta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let two = |v: Option<u8>| v.map(|v| format!("{v:02}")).unwrap_or("--".into());
        write!(
            f,
            "{}-{} {}:{}",
            two(self.month),
            two(self.day),
            two(self.hour),
            two(self.minute)
        )
    }
}

// ---------------------------------------------------------------------------
// Message structs
// ---------------------------------------------------------------------------

/// Types 1, 2, 3: Class A position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReportClassA {
    pub message_type: u8,
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub status: NavigationStatus,
    /// Degrees per minute, positive to starboard.
    pub rate_of_turn: Option<f64>,
    pub speed_kts: Option<f64>,
    pub position_accuracy: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub course_deg: Option<f64>,
    pub heading_deg: Option<u16>,
    pub timestamp_second: Option<u8>,
    pub maneuver: ManeuverIndicator,
    pub raim: bool,
    pub radio_status: u32,
}

/// Types 4 and 11: base station report / UTC and date response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseStationReport {
    pub message_type: u8,
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub year: Option<u16>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub position_accuracy: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub epfd: EpfdType,
    pub raim: bool,
    pub radio_status: u32,
}

/// Type 5: static and voyage related data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticAndVoyageData {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub ais_version: u8,
    pub imo: Option<u32>,
    pub call_sign: String,
    pub name: String,
    pub ship_type: ShipType,
    pub dimension: Dimensions,
    pub epfd: EpfdType,
    pub eta: Eta,
    pub draught_m: Option<f64>,
    pub destination: String,
    pub data_terminal_ready: bool,
}

/// Type 6: addressed binary message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressedBinary {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub sequence_number: u8,
    pub dest_mmsi: Mmsi,
    pub retransmit: bool,
    pub dac: u16,
    pub fid: u8,
    pub data: Payload,
}

/// Types 7 and 13: binary / safety acknowledge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acknowledge {
    pub message_type: u8,
    pub repeat: u8,
    pub mmsi: Mmsi,
    /// (destination MMSI, sequence number), at most four.
    pub acks: Vec<(Mmsi, u8)>,
}

/// Type 8: binary broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryBroadcast {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub dac: u16,
    pub fid: u8,
    pub data: Payload,
}

/// Type 9: standard SAR aircraft position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SarAircraftPosition {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub altitude_m: Option<u16>,
    pub speed_kts: Option<f64>,
    pub position_accuracy: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub course_deg: Option<f64>,
    pub timestamp_second: Option<u8>,
    pub regional: u8,
    pub data_terminal_ready: bool,
    pub assigned: bool,
    pub raim: bool,
    pub radio_status: u32,
}

/// Type 10: UTC/date inquiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtcInquiry {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub dest_mmsi: Mmsi,
}

/// Type 12: addressed safety-related message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressedSafety {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub sequence_number: u8,
    pub dest_mmsi: Mmsi,
    pub retransmit: bool,
    pub text: String,
}

/// Type 14: safety-related broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyBroadcast {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub text: String,
}

/// One requested reply inside an interrogation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterrogationRequest {
    pub message_type: u8,
    pub slot_offset: u16,
}

/// Type 15: interrogation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interrogation {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub station1: Mmsi,
    pub request1: InterrogationRequest,
    pub request2: Option<InterrogationRequest>,
    pub station2: Option<(Mmsi, InterrogationRequest)>,
}

/// Slot assignment for one station (type 16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeAssignment {
    pub mmsi: Mmsi,
    pub offset: u16,
    pub increment: u16,
}

/// Type 16: assigned mode command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedMode {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub assignments: Vec<ModeAssignment>,
}

/// Type 17: DGNSS broadcast binary message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DgnssBroadcast {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub data: Payload,
}

/// Type 18: standard Class B position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardClassBPosition {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub speed_kts: Option<f64>,
    pub position_accuracy: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub course_deg: Option<f64>,
    pub heading_deg: Option<u16>,
    pub timestamp_second: Option<u8>,
    pub cs_unit: bool,
    pub display: bool,
    pub dsc: bool,
    pub band: bool,
    pub message22: bool,
    pub assigned: bool,
    pub raim: bool,
    pub radio_status: u32,
}

/// Type 19: extended Class B position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedClassBPosition {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub speed_kts: Option<f64>,
    pub position_accuracy: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub course_deg: Option<f64>,
    pub heading_deg: Option<u16>,
    pub timestamp_second: Option<u8>,
    pub name: String,
    pub ship_type: ShipType,
    pub dimension: Dimensions,
    pub epfd: EpfdType,
    pub raim: bool,
    pub data_terminal_ready: bool,
    pub assigned: bool,
}

/// Reserved slot block (type 20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotReservation {
    pub offset: u16,
    pub number: u8,
    pub timeout: u8,
    pub increment: u16,
}

/// Type 20: data link management.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLinkManagement {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub reservations: Vec<SlotReservation>,
}

/// Type 21: aid-to-navigation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AidToNavigationReport {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub aid_type: u8,
    /// Name including the name extension.
    pub name: String,
    pub position_accuracy: bool,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub dimension: Dimensions,
    pub epfd: EpfdType,
    pub timestamp_second: Option<u8>,
    pub off_position: bool,
    pub regional: u8,
    pub raim: bool,
    pub virtual_aid: bool,
    pub assigned: bool,
}

/// Area a channel management command applies to (type 22).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "area")]
pub enum ChannelArea {
    Region {
        ne_lon: f64,
        ne_lat: f64,
        sw_lon: f64,
        sw_lat: f64,
    },
    Addressed {
        dest_mmsi1: Mmsi,
        dest_mmsi2: Mmsi,
    },
}

/// Type 22: channel management.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelManagement {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub channel_a: u16,
    pub channel_b: u16,
    pub tx_rx_mode: u8,
    pub low_power: bool,
    pub area: ChannelArea,
    pub band_a: bool,
    pub band_b: bool,
    pub zone_size: u8,
}

/// Type 23: group assignment command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAssignment {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub ne_lon: f64,
    pub ne_lat: f64,
    pub sw_lon: f64,
    pub sw_lat: f64,
    pub station_type: u8,
    pub ship_type: ShipType,
    pub tx_rx_mode: u8,
    pub report_interval: u8,
    pub quiet_minutes: u8,
}

/// Part A or part B of a type 24 report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "part")]
pub enum StaticDataPart {
    A {
        name: String,
    },
    B {
        ship_type: ShipType,
        vendor_id: String,
        model: u8,
        serial: u32,
        call_sign: String,
        /// Hull dimensions; absent for auxiliary craft.
        dimension: Option<Dimensions>,
        /// Mother ship of an auxiliary craft (MMSI 98xxxxxxx).
        mothership_mmsi: Option<Mmsi>,
    },
}

/// Type 24: static data report (Class B).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticDataReport {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub part: StaticDataPart,
}

/// Type 25: single slot binary message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSlotBinary {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub dest_mmsi: Option<Mmsi>,
    /// Application identifier (DAC << 6 | FID) when structured.
    pub app_id: Option<u16>,
    pub data: Payload,
}

/// Type 26: multiple slot binary message with communication state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiSlotBinary {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub dest_mmsi: Option<Mmsi>,
    pub app_id: Option<u16>,
    pub data: Payload,
    pub radio_status: u32,
}

/// Type 27: long range broadcast position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRangeBroadcast {
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub position_accuracy: bool,
    pub raim: bool,
    pub status: NavigationStatus,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub speed_kts: Option<f64>,
    pub course_deg: Option<f64>,
    /// True when the position comes from the GNSS receiver.
    pub gnss_position: bool,
}

// ---------------------------------------------------------------------------
// Message union
// ---------------------------------------------------------------------------

/// Union type for all decoded AIS messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AisMessage {
    PositionReportClassA(PositionReportClassA),
    BaseStationReport(BaseStationReport),
    StaticAndVoyageData(StaticAndVoyageData),
    AddressedBinary(AddressedBinary),
    Acknowledge(Acknowledge),
    BinaryBroadcast(BinaryBroadcast),
    SarAircraftPosition(SarAircraftPosition),
    UtcInquiry(UtcInquiry),
    AddressedSafety(AddressedSafety),
    SafetyBroadcast(SafetyBroadcast),
    Interrogation(Interrogation),
    AssignedMode(AssignedMode),
    DgnssBroadcast(DgnssBroadcast),
    StandardClassBPosition(StandardClassBPosition),
    ExtendedClassBPosition(ExtendedClassBPosition),
    DataLinkManagement(DataLinkManagement),
    AidToNavigation(AidToNavigationReport),
    ChannelManagement(ChannelManagement),
    GroupAssignment(GroupAssignment),
    StaticDataReport(StaticDataReport),
    SingleSlotBinary(SingleSlotBinary),
    MultiSlotBinary(MultiSlotBinary),
    LongRangeBroadcast(LongRangeBroadcast),
}

impl AisMessage {
    /// Source MMSI of any message type.
    pub fn mmsi(&self) -> Mmsi {
        match self {
            AisMessage::PositionReportClassA(m) => m.mmsi,
            AisMessage::BaseStationReport(m) => m.mmsi,
            AisMessage::StaticAndVoyageData(m) => m.mmsi,
            AisMessage::AddressedBinary(m) => m.mmsi,
            AisMessage::Acknowledge(m) => m.mmsi,
            AisMessage::BinaryBroadcast(m) => m.mmsi,
            AisMessage::SarAircraftPosition(m) => m.mmsi,
            AisMessage::UtcInquiry(m) => m.mmsi,
            AisMessage::AddressedSafety(m) => m.mmsi,
            AisMessage::SafetyBroadcast(m) => m.mmsi,
            AisMessage::Interrogation(m) => m.mmsi,
            AisMessage::AssignedMode(m) => m.mmsi,
            AisMessage::DgnssBroadcast(m) => m.mmsi,
            AisMessage::StandardClassBPosition(m) => m.mmsi,
            AisMessage::ExtendedClassBPosition(m) => m.mmsi,
            AisMessage::DataLinkManagement(m) => m.mmsi,
            AisMessage::AidToNavigation(m) => m.mmsi,
            AisMessage::ChannelManagement(m) => m.mmsi,
            AisMessage::GroupAssignment(m) => m.mmsi,
            AisMessage::StaticDataReport(m) => m.mmsi,
            AisMessage::SingleSlotBinary(m) => m.mmsi,
            AisMessage::MultiSlotBinary(m) => m.mmsi,
            AisMessage::LongRangeBroadcast(m) => m.mmsi,
        }
    }

    /// On-air message type number (1-27).
    pub fn message_type(&self) -> u8 {
        match self {
            AisMessage::PositionReportClassA(m) => m.message_type,
            AisMessage::BaseStationReport(m) => m.message_type,
            AisMessage::StaticAndVoyageData(_) => 5,
            AisMessage::AddressedBinary(_) => 6,
            AisMessage::Acknowledge(m) => m.message_type,
            AisMessage::BinaryBroadcast(_) => 8,
            AisMessage::SarAircraftPosition(_) => 9,
            AisMessage::UtcInquiry(_) => 10,
            AisMessage::AddressedSafety(_) => 12,
            AisMessage::SafetyBroadcast(_) => 14,
            AisMessage::Interrogation(_) => 15,
            AisMessage::AssignedMode(_) => 16,
            AisMessage::DgnssBroadcast(_) => 17,
            AisMessage::StandardClassBPosition(_) => 18,
            AisMessage::ExtendedClassBPosition(_) => 19,
            AisMessage::DataLinkManagement(_) => 20,
            AisMessage::AidToNavigation(_) => 21,
            AisMessage::ChannelManagement(_) => 22,
            AisMessage::GroupAssignment(_) => 23,
            AisMessage::StaticDataReport(_) => 24,
            AisMessage::SingleSlotBinary(_) => 25,
            AisMessage::MultiSlotBinary(_) => 26,
            AisMessage::LongRangeBroadcast(_) => 27,
        }
    }

    /// Repeat indicator (0 = original transmission).
    pub fn repeat_indicator(&self) -> u8 {
        match self {
            AisMessage::PositionReportClassA(m) => m.repeat,
            AisMessage::BaseStationReport(m) => m.repeat,
            AisMessage::StaticAndVoyageData(m) => m.repeat,
            AisMessage::AddressedBinary(m) => m.repeat,
            AisMessage::Acknowledge(m) => m.repeat,
            AisMessage::BinaryBroadcast(m) => m.repeat,
            AisMessage::SarAircraftPosition(m) => m.repeat,
            AisMessage::UtcInquiry(m) => m.repeat,
            AisMessage::AddressedSafety(m) => m.repeat,
            AisMessage::SafetyBroadcast(m) => m.repeat,
            AisMessage::Interrogation(m) => m.repeat,
            AisMessage::AssignedMode(m) => m.repeat,
            AisMessage::DgnssBroadcast(m) => m.repeat,
            AisMessage::StandardClassBPosition(m) => m.repeat,
            AisMessage::ExtendedClassBPosition(m) => m.repeat,
            AisMessage::DataLinkManagement(m) => m.repeat,
            AisMessage::AidToNavigation(m) => m.repeat,
            AisMessage::ChannelManagement(m) => m.repeat,
            AisMessage::GroupAssignment(m) => m.repeat,
            AisMessage::StaticDataReport(m) => m.repeat,
            AisMessage::SingleSlotBinary(m) => m.repeat,
            AisMessage::MultiSlotBinary(m) => m.repeat,
            AisMessage::LongRangeBroadcast(m) => m.repeat,
        }
    }

    /// Reported (lat, lon) for message types that carry a station position.
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        let (lat, lon) = match self {
            AisMessage::PositionReportClassA(m) => (m.lat, m.lon),
            AisMessage::BaseStationReport(m) => (m.lat, m.lon),
            AisMessage::SarAircraftPosition(m) => (m.lat, m.lon),
            AisMessage::StandardClassBPosition(m) => (m.lat, m.lon),
            AisMessage::ExtendedClassBPosition(m) => (m.lat, m.lon),
            AisMessage::AidToNavigation(m) => (m.lat, m.lon),
            AisMessage::LongRangeBroadcast(m) => (m.lat, m.lon),
            _ => return None,
        };
        Some((lat?, lon?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_status_lossless() {
        for code in 0..16u8 {
            assert_eq!(NavigationStatus::from_u8(code).as_u8(), code);
        }
        assert_eq!(NavigationStatus::from_u8(5), NavigationStatus::Moored);
        assert_eq!(NavigationStatus::from_u8(14).to_string(), "AIS-SART active");
    }

    #[test]
    fn test_epfd_lossless() {
        for code in 0..16u8 {
            assert_eq!(EpfdType::from_u8(code).as_u8(), code);
        }
        assert_eq!(EpfdType::from_u8(1), EpfdType::Gps);
    }

    #[test]
    fn test_maneuver_lossless() {
        for code in 0..4u8 {
            assert_eq!(ManeuverIndicator::from_u8(code).as_u8(), code);
        }
    }

    #[test]
    fn test_ship_type_description() {
        assert_eq!(ShipType(53).description(), "Port tender");
        assert_eq!(ShipType(32).description(), "Towing");
        assert_eq!(ShipType(70).to_string(), "Cargo");
        assert_eq!(ShipType(255).description(), "Unknown");
    }

    #[test]
    fn test_aid_type_name() {
        assert_eq!(aid_type_name(1), "Reference point");
        assert_eq!(aid_type_name(31), "Light vessel / LANBY / rigs");
    }

    #[test]
    fn test_dimensions() {
        let d = Dimensions {
            to_bow: 12,
            to_stern: 8,
            to_port: 3,
            to_starboard: 4,
        };
        assert_eq!(d.length_m(), 20);
        assert_eq!(d.beam_m(), 7);
        assert!(d.is_known());
        assert!(!Dimensions::default().is_known());
    }

    #[test]
    fn test_eta_display() {
        let eta = Eta {
            month: Some(8),
            day: Some(4),
            hour: Some(16),
            minute: None,
        };
        assert_eq!(eta.to_string(), "08-04 16:--");
    }
}
