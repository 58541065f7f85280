//! Multi-sentence fragment reassembly.
//!
//! Fragments are buffered per (channel, sequential message id). A buffer is
//! opened by fragment 1 and must then see fragments 2..=N in order with the
//! same fragment count. Any violation discards the buffer and the offending
//! sentence. Nothing here ever fails loudly: incomplete or broken input
//! simply yields `None`.

use std::collections::HashMap;

use log::debug;

use crate::payload::Payload;
use crate::sentence::AisSentence;

/// Maximum number of partially received messages kept at once.
pub const MAX_PENDING: usize = 32;

type FragmentKey = (Option<char>, Option<u8>);

#[derive(Debug, Clone)]
struct PendingMessage {
    fragment_count: u8,
    last_fragment: u8,
    text: String,
    opened: u64,
}

/// Reassembles fragmented AIS payloads.
#[derive(Debug, Default)]
pub struct FragmentAssembler {
    pending: HashMap<FragmentKey, PendingMessage>,
    opened: u64,

    // Counters
    pub completed: u64,
    pub discarded: u64,
}

impl FragmentAssembler {
    pub fn new() -> Self {
        FragmentAssembler::default()
    }

    /// Feed one sentence. Returns the complete bit payload once the last
    /// fragment of a message has arrived.
    pub fn push(&mut self, sentence: &AisSentence) -> Option<Payload> {
        if sentence.fragment_count <= 1 {
            let payload = Payload::from_armored(&sentence.payload, sentence.fill_bits)?;
            self.completed += 1;
            return Some(payload);
        }

        let key = (sentence.channel, sentence.sequential_id);

        if sentence.fragment_number == 1 {
            if self.pending.remove(&key).is_some() {
                debug!("replacing unfinished message {key:?}");
                self.discarded += 1;
            }
            self.evict_oldest_if_full();
            self.opened += 1;
            self.pending.insert(
                key,
                PendingMessage {
                    fragment_count: sentence.fragment_count,
                    last_fragment: 1,
                    text: sentence.payload.clone(),
                    opened: self.opened,
                },
            );
            return None;
        }

        let Some(mut pending) = self.pending.remove(&key) else {
            self.discard_other_channels(sentence.channel, sentence.sequential_id);
            debug!(
                "dropping fragment {}/{} without a start {key:?}",
                sentence.fragment_number, sentence.fragment_count
            );
            return None;
        };

        if pending.fragment_count != sentence.fragment_count
            || sentence.fragment_number != pending.last_fragment + 1
        {
            debug!(
                "fragment sequence violation {key:?}: got {}/{} after {}/{}",
                sentence.fragment_number,
                sentence.fragment_count,
                pending.last_fragment,
                pending.fragment_count
            );
            self.discarded += 1;
            return None;
        }

        pending.text.push_str(&sentence.payload);
        pending.last_fragment = sentence.fragment_number;

        if pending.last_fragment < pending.fragment_count {
            self.pending.insert(key, pending);
            return None;
        }

        let payload = Payload::from_armored(&pending.text, sentence.fill_bits)?;
        self.completed += 1;
        Some(payload)
    }

    /// Number of partially received messages.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop all partial messages.
    pub fn clear(&mut self) {
        self.discarded += self.pending.len() as u64;
        self.pending.clear();
    }

    /// A continuation fragment arriving on a different channel than its
    /// start invalidates the partial message with that sequence id.
    fn discard_other_channels(&mut self, channel: Option<char>, sequential_id: Option<u8>) {
        let before = self.pending.len();
        self.pending
            .retain(|(c, id), _| !(*id == sequential_id && *c != channel));
        self.discarded += (before - self.pending.len()) as u64;
    }

    fn evict_oldest_if_full(&mut self) {
        if self.pending.len() < MAX_PENDING {
            return;
        }
        let oldest = self
            .pending
            .iter()
            .min_by_key(|(_, p)| p.opened)
            .map(|(k, _)| *k);
        if let Some(k) = oldest {
            self.pending.remove(&k);
            self.discarded += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::parse_sentence;

    const PART1: &str = "!AIVDM,2,1,1,B,53P<GC`000038D5c>01LThi=E10iV2222222220m1P834v2@044kmE20CD53,0*25";
    const PART2: &str = "!AIVDM,2,2,1,B,k`888000000,2*25";

    fn s(line: &str) -> AisSentence {
        parse_sentence(line, false).expect("valid sentence")
    }

    #[test]
    fn test_single_sentence_completes() {
        let mut asm = FragmentAssembler::new();
        let p = asm.push(&s("!AIVDM,1,1,,B,13GmFd002pwrel@LpMu8L6qn8Vp0,0*56"));
        assert_eq!(p.map(|p| p.len()), Some(168));
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_two_part_message() {
        let mut asm = FragmentAssembler::new();
        assert!(asm.push(&s(PART1)).is_none());
        assert_eq!(asm.pending(), 1);
        let payload = asm.push(&s(PART2)).expect("complete");
        assert_eq!(payload.len(), 424);
        assert_eq!(asm.pending(), 0);
        assert_eq!(asm.completed, 1);
    }

    #[test]
    fn test_first_fragment_alone() {
        let mut asm = FragmentAssembler::new();
        assert!(asm.push(&s(PART1)).is_none());
        assert_eq!(asm.completed, 0);
    }

    #[test]
    fn test_second_fragment_alone() {
        let mut asm = FragmentAssembler::new();
        assert!(asm.push(&s(PART2)).is_none());
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_mismatched_sequence_id() {
        let mut asm = FragmentAssembler::new();
        asm.push(&s(PART1));
        let wrong_id = "!AIVDM,2,2,2,B,k`888000000,2*26";
        assert!(asm.push(&s(wrong_id)).is_none());
        // The original buffer is still waiting for its own second part.
        assert!(asm.push(&s(PART2)).is_some());
    }

    #[test]
    fn test_mismatched_count_discards() {
        let mut asm = FragmentAssembler::new();
        asm.push(&s(PART1));
        assert!(asm.push(&s("!AIVDM,3,2,1,B,k`888000000,0*00")).is_none());
        assert_eq!(asm.pending(), 0);
        assert!(asm.push(&s(PART2)).is_none());
        assert_eq!(asm.discarded, 1);
    }

    #[test]
    fn test_out_of_order_index() {
        let mut asm = FragmentAssembler::new();
        asm.push(&s("!AIVDM,3,1,5,A,13Gm,0*00"));
        assert!(asm.push(&s("!AIVDM,3,3,5,A,13Gm,0*00")).is_none());
        assert_eq!(asm.pending(), 0);
    }

    #[test]
    fn test_channel_change_discards() {
        let mut asm = FragmentAssembler::new();
        asm.push(&s(PART1));
        assert!(asm.push(&s("!AIVDM,2,2,1,A,k`888000000,2*26")).is_none());
        assert_eq!(asm.pending(), 0);
        assert!(asm.push(&s(PART2)).is_none());
    }

    #[test]
    fn test_restart_replaces_buffer() {
        let mut asm = FragmentAssembler::new();
        asm.push(&s("!AIVDM,2,1,1,B,0000,0*00"));
        asm.push(&s(PART1));
        let payload = asm.push(&s(PART2)).expect("complete");
        assert_eq!(payload.len(), 424);
        assert_eq!(asm.discarded, 1);
    }

    #[test]
    fn test_interleaved_channels() {
        let mut asm = FragmentAssembler::new();
        asm.push(&s(PART1));
        asm.push(&s("!AIVDM,2,1,3,A,55NBjP01mtGIL@CW;SM<D60P5Ld000000000000P0`<3557l0<50@kk@,0*00"));
        assert_eq!(asm.pending(), 2);
        assert!(asm.push(&s(PART2)).is_some());
        assert!(asm
            .push(&s("!AIVDM,2,2,3,A,K5h@00000000000,2*00"))
            .is_some());
    }

    #[test]
    fn test_pending_bounded() {
        let mut asm = FragmentAssembler::new();
        for i in 0..(MAX_PENDING + 5) {
            let line = format!("!AIVDM,2,1,{i},A,0000,0*00");
            asm.push(&s(&line));
        }
        assert_eq!(asm.pending(), MAX_PENDING);
        assert_eq!(asm.discarded, 5);
    }
}
