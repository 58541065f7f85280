//! Shared error enum, unit helpers and the 6-bit AIS character set.

use thiserror::Error;

/// All errors produced by ais-core.
#[derive(Debug, Error)]
pub enum AisError {
    #[error("invalid sentence: {0}")]
    InvalidSentence(String),
    #[error("unsupported sentence type: {0}")]
    UnsupportedSentence(String),
    #[error("checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
    #[error("invalid MMSI: {0}")]
    InvalidMmsi(u32),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("message needs {0} fragments, at most 9 are allowed")]
    TooManyFragments(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AisError>;

/// Maritime Mobile Service Identity.
pub type Mmsi = u32;

/// Largest valid MMSI (nine decimal digits).
pub const MAX_MMSI: Mmsi = 999_999_999;

// ---------------------------------------------------------------------------
// Six-bit text
// ---------------------------------------------------------------------------

/// AIS character set for text fields (6 bits per character).
pub const SIXBIT_CHARSET: &[u8; 64] =
    b"@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_ !\"#$%&'()*+,-./0123456789:;<=>?";

/// Map a character to its 6-bit text code. Lowercase letters fold to
/// uppercase; anything outside the set becomes '@' (0).
pub fn sixbit_text_code(c: char) -> u8 {
    let c = c.to_ascii_uppercase();
    SIXBIT_CHARSET
        .iter()
        .position(|&b| b as char == c)
        .map(|p| p as u8)
        .unwrap_or(0)
}

/// Character for a 6-bit text code.
pub fn sixbit_text_char(code: u8) -> char {
    SIXBIT_CHARSET[(code & 0x3F) as usize] as char
}

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Normalize an angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let d = deg.rem_euclid(360.0);
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Normalize an angle difference into (-180, 180].
pub fn normalize_signed_degrees(deg: f64) -> f64 {
    let d = normalize_degrees(deg);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixbit_text_roundtrip() {
        for code in 0..64u8 {
            assert_eq!(sixbit_text_code(sixbit_text_char(code)), code);
        }
        assert_eq!(sixbit_text_char(0), '@');
        assert_eq!(sixbit_text_char(32), ' ');
        assert_eq!(sixbit_text_code('a'), sixbit_text_code('A'));
        assert_eq!(sixbit_text_code('~'), 0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-10.0), 350.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(f64::NAN), 0.0);
    }

    #[test]
    fn test_normalize_signed_degrees() {
        assert_eq!(normalize_signed_degrees(180.0), 180.0);
        assert_eq!(normalize_signed_degrees(-180.0), 180.0);
        assert_eq!(normalize_signed_degrees(190.0), -170.0);
        assert_eq!(normalize_signed_degrees(-90.0), -90.0);
        assert_eq!(normalize_signed_degrees(720.0), 0.0);
    }

    #[test]
    fn test_error_display() {
        let e = AisError::ChecksumMismatch {
            expected: 0x56,
            actual: 0x12,
        };
        assert_eq!(e.to_string(), "checksum mismatch: expected 56, got 12");
        assert_eq!(AisError::InvalidMmsi(0).to_string(), "invalid MMSI: 0");
    }
}
