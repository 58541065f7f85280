//! NMEA0183 VDM/VDO sentence parsing and rendering.
//!
//! Grammar: `!ccVDM,<count>,<index>,<seq id>,<channel>,<payload>,<fill>*hh`
//! with an optional NMEA 4.x tag block (`\...\`) in front.

use serde::Serialize;

use crate::types::{AisError, Result};

/// Sentence formatter: VDM carries traffic from other stations, VDO the
/// own vessel's transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentenceKind {
    Vdm,
    Vdo,
}

impl SentenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentenceKind::Vdm => "VDM",
            SentenceKind::Vdo => "VDO",
        }
    }
}

/// One physical AIS sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AisSentence {
    pub talker: String,
    pub kind: SentenceKind,
    pub fragment_count: u8,
    pub fragment_number: u8,
    pub sequential_id: Option<u8>,
    pub channel: Option<char>,
    pub payload: String,
    pub fill_bits: u8,
}

/// XOR of all bytes of the sentence body (between the start delimiter and '*').
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// Strip a leading tag block, e.g. `\s:rORBCOMM,c:1426118330*5A\!AIVDM,...`.
fn strip_tag_block(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix('\\') {
        if let Some(end) = rest.find('\\') {
            return &rest[end + 1..];
        }
    }
    line
}

/// Parse a single sentence line.
pub fn parse_sentence(line: &str, validate_checksum: bool) -> Result<AisSentence> {
    let line = strip_tag_block(line.trim());
    let invalid = || AisError::InvalidSentence(line.to_string());

    let body_and_sum = line
        .strip_prefix('!')
        .or_else(|| line.strip_prefix('$'))
        .ok_or_else(invalid)?;

    let (body, sum) = match body_and_sum.split_once('*') {
        Some((b, s)) => (b, Some(s.trim())),
        None => (body_and_sum, None),
    };

    if validate_checksum {
        let sum = sum.ok_or_else(invalid)?;
        let expected = u8::from_str_radix(sum.get(..2).ok_or_else(invalid)?, 16)
            .map_err(|_| invalid())?;
        let actual = checksum(body);
        if expected != actual {
            return Err(AisError::ChecksumMismatch { expected, actual });
        }
    }

    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() < 7 {
        return Err(invalid());
    }

    let address = fields[0];
    if address.len() != 5 || !address.is_ascii() {
        return Err(invalid());
    }
    let kind = match &address[2..] {
        "VDM" => SentenceKind::Vdm,
        "VDO" => SentenceKind::Vdo,
        other => return Err(AisError::UnsupportedSentence(other.to_string())),
    };

    let fragment_count: u8 = fields[1].parse().map_err(|_| invalid())?;
    let fragment_number: u8 = fields[2].parse().map_err(|_| invalid())?;
    if !(1..=9).contains(&fragment_count) || fragment_number == 0 || fragment_number > fragment_count
    {
        return Err(invalid());
    }

    let sequential_id = if fields[3].is_empty() {
        None
    } else {
        Some(fields[3].parse::<u8>().map_err(|_| invalid())?)
    };

    let fill_bits: u8 = fields[6].trim().parse().map_err(|_| invalid())?;
    if fill_bits > 5 {
        return Err(invalid());
    }

    Ok(AisSentence {
        talker: address[..2].to_string(),
        kind,
        fragment_count,
        fragment_number,
        sequential_id,
        channel: fields[4].chars().next(),
        payload: fields[5].to_string(),
        fill_bits,
    })
}

impl AisSentence {
    /// Render the sentence with a freshly computed checksum.
    pub fn to_line(&self) -> String {
        let body = format!(
            "{}{},{},{},{},{},{},{}",
            self.talker,
            self.kind.as_str(),
            self.fragment_count,
            self.fragment_number,
            self.sequential_id.map(|s| s.to_string()).unwrap_or_default(),
            self.channel.map(|c| c.to_string()).unwrap_or_default(),
            self.payload,
            self.fill_bits,
        );
        format!("!{body}*{:02X}", checksum(&body))
    }

    pub fn is_own_ship(&self) -> bool {
        self.kind == SentenceKind::Vdo
    }

    pub fn is_single(&self) -> bool {
        self.fragment_count == 1
    }
}

impl std::fmt::Display for AisSentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
