//! Bit-level payload handling: 6-bit ASCII armor and field access.
//!
//! Responsibilities:
//! - Convert armored payload text (plus fill-bit count) to a packed bit vector
//! - Convert a bit vector back to armored text for encoding
//! - Sequential field reads with a cursor (`BitReader`)
//! - Field writes for the encoder (`push_*`)

use serde::{Serialize, Serializer};

use crate::types::{sixbit_text_char, sixbit_text_code};

// ---------------------------------------------------------------------------
// Armor alphabet
// ---------------------------------------------------------------------------

/// Decode one armored payload character into its 6-bit value.
///
/// Valid characters are '0'..='W' (0-39) and '`'..='w' (40-63).
pub fn armor_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'W' => Some(c - 48),
        b'`'..=b'w' => Some(c - 56),
        _ => None,
    }
}

/// Armored character for a 6-bit value.
pub fn armor_char(value: u8) -> char {
    let v = value & 0x3F;
    if v < 40 {
        (v + 48) as char
    } else {
        (v + 56) as char
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Packed bit vector, MSB first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    len: usize,
}

impl Payload {
    pub fn new() -> Self {
        Payload::default()
    }

    /// Decode armored text, removing `fill_bits` pad bits from the end.
    ///
    /// Returns `None` for an empty payload, a character outside the armor
    /// alphabet, or a fill count that does not fit.
    pub fn from_armored(text: &str, fill_bits: u8) -> Option<Payload> {
        if text.is_empty() || fill_bits > 5 {
            return None;
        }
        let mut payload = Payload::new();
        for c in text.bytes() {
            let v = armor_value(c)?;
            payload.push_uint(v as u64, 6);
        }
        let fill = fill_bits as usize;
        if fill >= payload.len {
            return None;
        }
        payload.truncate(payload.len - fill);
        Some(payload)
    }

    /// Encode as armored text. Returns the text and the number of pad bits
    /// appended to reach a multiple of six.
    pub fn to_armored(&self) -> (String, u8) {
        let fill = (6 - self.len % 6) % 6;
        let mut text = String::with_capacity(self.len.div_ceil(6));
        let mut reader = self.reader();
        while reader.remaining() >= 6 {
            if let Some(v) = reader.u(6) {
                text.push(armor_char(v as u8));
            }
        }
        let tail = reader.remaining();
        if tail > 0 {
            if let Some(v) = reader.u(tail) {
                text.push(armor_char((v << fill) as u8));
            }
        }
        (text, fill as u8)
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    pub fn reader(&self) -> BitReader<'_> {
        BitReader {
            payload: self,
            pos: 0,
        }
    }

    fn push_bit(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        self.len = len;
        self.bytes.truncate(len.div_ceil(8));
        if len % 8 != 0 {
            let last = self.bytes.len() - 1;
            self.bytes[last] &= 0xFFu8 << (8 - len % 8);
        }
    }

    /// Append the low `width` bits of `value`.
    pub fn push_uint(&mut self, value: u64, width: usize) {
        for i in (0..width).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
    }

    /// Append a two's-complement signed value of `width` bits.
    pub fn push_int(&mut self, value: i64, width: usize) {
        self.push_uint(value as u64, width);
    }

    pub fn push_bool(&mut self, value: bool) {
        self.push_bit(value);
    }

    /// Append `chars` 6-bit characters, padding with '@' and truncating
    /// longer text.
    pub fn push_text(&mut self, text: &str, chars: usize) {
        let mut written = 0;
        for c in text.chars().take(chars) {
            self.push_uint(sixbit_text_code(c) as u64, 6);
            written += 1;
        }
        for _ in written..chars {
            self.push_uint(0, 6);
        }
    }

    /// Append every bit of another payload.
    pub fn push_payload(&mut self, other: &Payload) {
        for i in 0..other.len {
            self.push_bit(other.bit(i).unwrap_or(false));
        }
    }

    /// Hex rendering of the packed bytes (last byte zero-padded).
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(self.bytes.len() * 2);
        for b in &self.bytes {
            s.push_str(&format!("{b:02X}"));
        }
        s
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Sequential field reader. Every read returns `None` once the payload runs
/// out, so decoders can bail with `?`.
pub struct BitReader<'a> {
    payload: &'a Payload,
    pos: usize,
}

impl BitReader<'_> {
    /// Bits left after the cursor.
    pub fn remaining(&self) -> usize {
        self.payload.len - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unsigned field of up to 32 bits.
    pub fn u(&mut self, width: usize) -> Option<u32> {
        if width > 32 || width > self.remaining() {
            return None;
        }
        let mut v = 0u32;
        for i in 0..width {
            let bit = self.payload.bit(self.pos + i)?;
            v = (v << 1) | bit as u32;
        }
        self.pos += width;
        Some(v)
    }

    /// Two's-complement signed field of up to 32 bits.
    pub fn i(&mut self, width: usize) -> Option<i32> {
        if width == 0 {
            return Some(0);
        }
        let raw = self.u(width)?;
        let shift = 32 - width as u32;
        Some(((raw << shift) as i32) >> shift)
    }

    pub fn flag(&mut self) -> Option<bool> {
        self.u(1).map(|v| v == 1)
    }

    pub fn skip(&mut self, width: usize) -> Option<()> {
        if width > self.remaining() {
            return None;
        }
        self.pos += width;
        Some(())
    }

    /// Text field of `chars` 6-bit characters. Stops at the first '@' and
    /// trims trailing spaces.
    pub fn text(&mut self, chars: usize) -> Option<String> {
        self.text_untrimmed(chars)
            .map(|t| t.trim_end().to_string())
    }

    /// Like `text` but keeps trailing spaces, for fields continued elsewhere.
    pub fn text_untrimmed(&mut self, chars: usize) -> Option<String> {
        let mut raw = String::with_capacity(chars);
        for _ in 0..chars {
            raw.push(sixbit_text_char(self.u(6)? as u8));
        }
        let end = raw.find('@').unwrap_or(raw.len());
        raw.truncate(end);
        Some(raw)
    }

    /// Text made of all remaining whole characters.
    pub fn text_rest(&mut self) -> String {
        let chars = self.remaining() / 6;
        let text = self.text(chars).unwrap_or_default();
        self.pos = self.payload.len;
        text
    }

    /// The next `width` bits as a new payload.
    pub fn take(&mut self, width: usize) -> Option<Payload> {
        if width > self.remaining() {
            return None;
        }
        let mut out = Payload::new();
        for _ in 0..width {
            out.push_bit(self.payload.bit(self.pos)?);
            self.pos += 1;
        }
        Some(out)
    }

    /// Everything after the cursor as a new payload.
    pub fn rest(&mut self) -> Payload {
        self.take(self.remaining()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_alphabet() {
        assert_eq!(armor_value(b'0'), Some(0));
        assert_eq!(armor_value(b'W'), Some(39));
        assert_eq!(armor_value(b'`'), Some(40));
        assert_eq!(armor_value(b'w'), Some(63));
        assert_eq!(armor_value(b'X'), None);
        assert_eq!(armor_value(b'x'), None);
        for v in 0..64u8 {
            assert_eq!(armor_value(armor_char(v) as u8), Some(v));
        }
    }

    #[test]
    fn test_from_armored_type1() {
        let p = Payload::from_armored("13GmFd002pwrel@LpMu8L6qn8Vp0", 0).unwrap();
        assert_eq!(p.len(), 168);
        let mut r = p.reader();
        assert_eq!(r.u(6), Some(1));
        assert_eq!(r.u(2), Some(0));
        assert_eq!(r.u(30), Some(226318000));
    }

    #[test]
    fn test_fill_bits_removed() {
        let p = Payload::from_armored("k`888000000", 2).unwrap();
        assert_eq!(p.len(), 11 * 6 - 2);
    }

    #[test]
    fn test_invalid_payload() {
        assert!(Payload::from_armored("", 0).is_none());
        assert!(Payload::from_armored("13Gm~d", 0).is_none());
        assert!(Payload::from_armored("1", 6).is_none());
        assert!(Payload::from_armored("1", 5).is_some());
    }

    #[test]
    fn test_signed_read() {
        let mut p = Payload::new();
        p.push_int(-692600, 28);
        p.push_int(30285300, 27);
        p.push_int(-128, 8);
        let mut r = p.reader();
        assert_eq!(r.i(28), Some(-692600));
        assert_eq!(r.i(27), Some(30285300));
        assert_eq!(r.i(8), Some(-128));
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.u(1), None);
    }

    #[test]
    fn test_text_field() {
        let mut p = Payload::new();
        p.push_text("SEA HAWK", 20);
        assert_eq!(p.len(), 120);
        let mut r = p.reader();
        assert_eq!(r.text(20).as_deref(), Some("SEA HAWK"));

        let mut p = Payload::new();
        p.push_text("AB  ", 4);
        assert_eq!(p.reader().text(4).as_deref(), Some("AB"));
    }

    #[test]
    fn test_armored_roundtrip() {
        let text = "15Mq4J0P01EREODRv4@74gv00HRq";
        let p = Payload::from_armored(text, 0).unwrap();
        assert_eq!(p.to_armored(), (text.to_string(), 0));

        let mut odd = Payload::new();
        odd.push_uint(0b1011, 4);
        let (armored, fill) = odd.to_armored();
        assert_eq!(fill, 2);
        let back = Payload::from_armored(&armored, fill).unwrap();
        assert_eq!(back, odd);
    }

    #[test]
    fn test_rest_and_skip() {
        let mut p = Payload::new();
        p.push_uint(0xFF, 8);
        p.push_uint(0b101, 3);
        let mut r = p.reader();
        assert_eq!(r.skip(8), Some(()));
        let rest = r.rest();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest.reader().u(3), Some(0b101));
        assert_eq!(rest.to_hex(), "A0");
    }
}
