//! Retransmission Tracker (C2, spec §4.2). Two independent timed retry
//! tracks — Child Update Request and Data Request — each with its own
//! attempt count and timer; retry exhaustion on either one is the sole
//! path that promotes a recoverable error into `Detached`.

use crate::config::MleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    WaitingForResponse,
    SendingKeepAlive,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryInfo {
    pub state: RetryState,
    pub next_tx_time_ms: u64,
    pub attempt_count: u8,
}

impl RetryInfo {
    fn bump_attempt(&mut self, max_attempts: u8) {
        self.attempt_count = self.attempt_count.saturating_add(1).min(max_attempts);
    }
}

/// What the owning MLE core should do as a result of a tick, for each
/// track that had something due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetxAction {
    RetransmitChildUpdate,
    RetransmitDataRequest,
    Detach,
}

pub struct RetxTracker {
    pub child_update: RetryInfo,
    pub data_request: RetryInfo,
    config: MleConfig,
}

impl RetxTracker {
    pub fn new(config: MleConfig) -> Self {
        Self {
            child_update: RetryInfo::default(),
            data_request: RetryInfo::default(),
            config,
        }
    }

    fn prime_keep_alive(track: &mut RetryInfo, now_ms: u64, timeout_sec: u32, config: &MleConfig) {
        track.state = RetryState::SendingKeepAlive;
        track.attempt_count = 0;
        let worst_case_retx =
            (config.retx_delay_ms + config.retx_jitter_ms) * u64::from(config.max_attempts);
        let timeout_ms = u64::from(timeout_sec) * 1000;
        track.next_tx_time_ms = now_ms + timeout_ms.saturating_sub(worst_case_retx);
    }

    pub fn on_role_change_to_child(&mut self, now_ms: u64, timeout_sec: u32) {
        Self::prime_keep_alive(&mut self.child_update, now_ms, timeout_sec, &self.config);
        self.data_request = RetryInfo::default();
    }

    pub fn on_child_update_request_tx(&mut self, now_ms: u64, jitter_ms: u64, csl_period_ms: Option<u64>) {
        let track = &mut self.child_update;
        track.bump_attempt(self.config.max_attempts);
        track.state = RetryState::WaitingForResponse;
        let mut delay = self.config.retx_delay_ms + jitter_ms;
        if let Some(csl) = csl_period_ms {
            delay += csl;
        }
        track.next_tx_time_ms = now_ms + delay;
    }

    pub fn on_child_update_response_rx(&mut self, now_ms: u64, timeout_sec: u32) {
        Self::prime_keep_alive(&mut self.child_update, now_ms, timeout_sec, &self.config);
    }

    pub fn on_data_request_tx(&mut self, now_ms: u64, jitter_ms: u64) {
        let track = &mut self.data_request;
        track.bump_attempt(self.config.max_attempts);
        track.state = RetryState::WaitingForResponse;
        track.next_tx_time_ms = now_ms + self.config.retx_delay_ms + jitter_ms;
    }

    pub fn on_data_request_satisfied(&mut self) {
        self.data_request.state = RetryState::Idle;
        self.data_request.attempt_count = 0;
    }

    /// Advance both tracks by one tick. Data Request retries are
    /// suppressed while a Child Update Response is awaited (spec §4.2
    /// design intent): a pending keep-alive response will carry the
    /// data anyway. Keep-alive only arms for `rx_on_when_idle` children;
    /// Data Request is the mirror image and only arms for sleepy
    /// children (spec §4.2 "(sleepy child only)") — the gate lives here
    /// so it can't be forgotten by a caller that arms `data_request` for
    /// a non-sleepy child.
    pub fn tick(&mut self, now_ms: u64, rx_on_when_idle: bool) -> alloc::vec::Vec<RetxAction> {
        use alloc::vec::Vec;
        let mut actions = Vec::new();

        if rx_on_when_idle && now_ms >= self.child_update.next_tx_time_ms
            && self.child_update.state != RetryState::Idle
        {
            if self.child_update.attempt_count >= self.config.max_attempts {
                log::warn!("retx: child update keep-alive exhausted after {} attempts, detaching", self.child_update.attempt_count);
                actions.push(RetxAction::Detach);
                return actions;
            }
            log::trace!("retx: retransmitting child update, attempt {}", self.child_update.attempt_count + 1);
            actions.push(RetxAction::RetransmitChildUpdate);
        }

        let child_update_pending = self.child_update.state == RetryState::WaitingForResponse;
        let sleepy = !rx_on_when_idle;
        if sleepy
            && !child_update_pending
            && now_ms >= self.data_request.next_tx_time_ms
            && self.data_request.state != RetryState::Idle
        {
            if self.data_request.attempt_count >= self.config.max_attempts {
                log::warn!("retx: data request exhausted after {} attempts, detaching", self.data_request.attempt_count);
                actions.push(RetxAction::Detach);
                return actions;
            }
            log::trace!("retx: retransmitting data request, attempt {}", self.data_request.attempt_count + 1);
            actions.push(RetxAction::RetransmitDataRequest);
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausting_attempts_detaches() {
        let mut tracker = RetxTracker::new(MleConfig {
            max_attempts: 2,
            ..MleConfig::default()
        });
        tracker.on_role_change_to_child(0, 240);
        tracker.child_update.state = RetryState::WaitingForResponse;
        tracker.child_update.attempt_count = 2;
        tracker.child_update.next_tx_time_ms = 0;
        let actions = tracker.tick(1, true);
        assert_eq!(actions, alloc::vec![RetxAction::Detach]);
    }

    #[test]
    fn data_request_suppressed_while_child_update_pending() {
        let mut tracker = RetxTracker::new(MleConfig::default());
        tracker.child_update.state = RetryState::WaitingForResponse;
        tracker.child_update.next_tx_time_ms = u64::MAX;
        tracker.data_request.state = RetryState::WaitingForResponse;
        tracker.data_request.next_tx_time_ms = 0;
        // sleepy (rx_on_when_idle = false) so only the child-update-pending
        // gate, not the sleepy gate itself, is under test here.
        let actions = tracker.tick(10, false);
        assert!(actions.is_empty());
    }

    #[test]
    fn keep_alive_is_only_armed_for_rx_on_when_idle_children() {
        let mut tracker = RetxTracker::new(MleConfig::default());
        tracker.on_role_change_to_child(0, 240);
        tracker.child_update.next_tx_time_ms = 0;
        let actions = tracker.tick(1, false);
        assert!(actions.is_empty());
    }

    #[test]
    fn data_request_retries_only_fire_for_sleepy_children() {
        let mut tracker = RetxTracker::new(MleConfig::default());
        tracker.data_request.state = RetryState::WaitingForResponse;
        tracker.data_request.next_tx_time_ms = 0;

        let actions = tracker.tick(1, true);
        assert!(actions.is_empty(), "rx-on-when-idle children must never retry Data Request");

        let actions = tracker.tick(1, false);
        assert_eq!(actions, alloc::vec![RetxAction::RetransmitDataRequest]);
    }
}
