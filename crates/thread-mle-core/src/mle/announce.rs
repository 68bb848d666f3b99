//! Announce channel discovery (spec §4.8 "Announce"). Active while
//! orphaned with an incomplete Active dataset: cycles the supported
//! channel mask sending `Announce` messages at `announce_delay`
//! intervals, bounded per SPEC_FULL §2's rate-limit supplement.

use crate::config::MleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnounceTimestamp {
    pub seconds: u64,
    pub ticks: u16,
}

pub struct AnnounceCycle {
    pub channel_mask: u32,
    pub current_channel: u8,
    pub attempts_this_episode: u8,
    pub next_send_ms: u64,
    pub pending_reattach: Option<PendingReattach>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReattach {
    pub channel: u8,
    pub pan_id: u16,
    pub fire_at_ms: u64,
}

impl AnnounceCycle {
    pub fn new(channel_mask: u32, start_channel: u8, now_ms: u64, config: &MleConfig) -> Self {
        Self {
            channel_mask,
            current_channel: start_channel,
            attempts_this_episode: 0,
            next_send_ms: now_ms + config.announce_delay_ms,
            pending_reattach: None,
        }
    }

    fn next_channel(&self, from: u8) -> u8 {
        for offset in 1..=32u8 {
            let candidate = (from + offset) % 32;
            if self.channel_mask & (1 << candidate) != 0 {
                return candidate;
            }
        }
        from
    }

    /// Whether the episode should give up and fall back to the
    /// previous channel (SPEC_FULL §2 rate-limit supplement).
    pub fn exhausted(&self, config: &MleConfig) -> bool {
        self.attempts_this_episode >= config.max_announce_attempts_per_episode
    }

    /// Advance the cycle by one tick. Returns the channel to send the
    /// next `Announce` on, if one is due.
    pub fn tick(&mut self, now_ms: u64, config: &MleConfig) -> Option<u8> {
        if now_ms < self.next_send_ms {
            return None;
        }
        if self.exhausted(config) {
            return None;
        }
        self.attempts_this_episode += 1;
        self.next_send_ms = now_ms + config.announce_delay_ms;
        let channel = self.current_channel;
        self.current_channel = self.next_channel(self.current_channel);
        Some(channel)
    }

    /// An incoming `Announce` with a newer timestamp than ours defers a
    /// reattach on the announced channel/PAN after
    /// `announce_process_timeout_ms`.
    pub fn on_newer_announce(&mut self, channel: u8, pan_id: u16, now_ms: u64, config: &MleConfig) {
        self.pending_reattach = Some(PendingReattach {
            channel,
            pan_id,
            fire_at_ms: now_ms + config.announce_process_timeout_ms,
        });
    }

    pub fn take_due_reattach(&mut self, now_ms: u64) -> Option<PendingReattach> {
        match self.pending_reattach {
            Some(pending) if now_ms >= pending.fire_at_ms => {
                self.pending_reattach = None;
                Some(pending)
            }
            _ => None,
        }
    }
}
