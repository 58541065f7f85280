//! Sentence-level codec: text lines in, typed messages out, and back.
//!
//! Responsibilities:
//! - Parse and checksum-validate VDM/VDO lines
//! - Feed fragments through the reassembler and decode complete payloads
//! - Split encoded messages into sentences with rolling sequence ids

use log::debug;

use crate::assembler::FragmentAssembler;
use crate::decode::decode;
use crate::encode::encode;
use crate::messages::AisMessage;
use crate::sentence::{parse_sentence, AisSentence, SentenceKind};
use crate::types::{AisError, Result};

/// Maximum armored payload characters per sentence.
pub const MAX_PAYLOAD_CHARS: usize = 60;

/// Maximum fragments for a single message.
pub const MAX_FRAGMENTS: usize = 9;

/// Split a message into one or more sentences.
///
/// `sequential_id` is only used when more than one sentence is needed.
pub fn to_sentences(
    msg: &AisMessage,
    kind: SentenceKind,
    sequential_id: u8,
) -> Result<Vec<AisSentence>> {
    let (armored, fill_bits) = encode(msg).to_armored();
    let chunks: Vec<&str> = armored
        .as_bytes()
        .chunks(MAX_PAYLOAD_CHARS)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect();

    if chunks.len() > MAX_FRAGMENTS {
        return Err(AisError::TooManyFragments(chunks.len()));
    }

    let count = chunks.len() as u8;
    let sequential_id = (count > 1).then_some(sequential_id);
    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let last = i + 1 == chunks.len();
            AisSentence {
                talker: "AI".into(),
                kind,
                fragment_count: count,
                fragment_number: i as u8 + 1,
                sequential_id,
                channel: Some('A'),
                payload: chunk.to_string(),
                fill_bits: if last { fill_bits } else { 0 },
            }
        })
        .collect())
}

/// Stateful decoder/encoder for a stream of sentences.
pub struct AisCodec {
    assembler: FragmentAssembler,
    pub validate_checksum: bool,
    /// Formatter used for generated sentences.
    pub output_kind: SentenceKind,
    next_sequential_id: u8,

    // Counters
    pub total_sentences: u64,
    pub decoded_messages: u64,
    pub dropped_sentences: u64,
}

impl Default for AisCodec {
    fn default() -> Self {
        AisCodec::new()
    }
}

impl AisCodec {
    pub fn new() -> Self {
        AisCodec {
            assembler: FragmentAssembler::new(),
            validate_checksum: true,
            output_kind: SentenceKind::Vdo,
            next_sequential_id: 1,
            total_sentences: 0,
            decoded_messages: 0,
            dropped_sentences: 0,
        }
    }

    pub fn with_output_kind(mut self, kind: SentenceKind) -> Self {
        self.output_kind = kind;
        self
    }

    /// Decode one raw line. Returns a message when the line completes one.
    pub fn decode_line(&mut self, line: &str) -> Option<AisMessage> {
        self.total_sentences += 1;
        match parse_sentence(line, self.validate_checksum) {
            Ok(sentence) => self.decode_parsed(&sentence),
            Err(e) => {
                debug!("dropping sentence: {e}");
                self.dropped_sentences += 1;
                None
            }
        }
    }

    /// Decode an already parsed sentence.
    pub fn decode_sentence(&mut self, sentence: &AisSentence) -> Option<AisMessage> {
        self.total_sentences += 1;
        self.decode_parsed(sentence)
    }

    fn decode_parsed(&mut self, sentence: &AisSentence) -> Option<AisMessage> {
        let payload = self.assembler.push(sentence)?;
        match decode(&payload) {
            Some(msg) => {
                self.decoded_messages += 1;
                Some(msg)
            }
            None => {
                debug!("undecodable payload of {} bits", payload.len());
                self.dropped_sentences += 1;
                None
            }
        }
    }

    /// Encode a message into sentences, advancing the sequence id (1-9)
    /// whenever more than one sentence is produced.
    pub fn to_sentences(&mut self, msg: &AisMessage) -> Result<Vec<AisSentence>> {
        let sentences = to_sentences(msg, self.output_kind, self.next_sequential_id)?;
        if sentences.len() > 1 {
            self.next_sequential_id = self.next_sequential_id % 9 + 1;
        }
        Ok(sentences)
    }

    /// Partial multi-sentence messages currently buffered.
    pub fn pending_fragments(&self) -> usize {
        self.assembler.pending()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
