//! CSL Tx Scheduler (C5, spec §4.5). Picks the next transmission window
//! across every synchronized sleepy peer with indirect work queued, and
//! tracks continuity counters across retries.

use crate::config::CslConfig;
use crate::constants::BUS_FRAME_ESTIMATE_BYTES;
use crate::mesh_forwarder::MessageId;
use crate::neighbor::CslInfo;
use crate::types::TxResult;

/// Identifies who a scheduled CSL window belongs to. The FTD variant
/// only ever schedules children; the MTD sub-child variant (C9) also
/// schedules its own parent and parent-candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CslCandidateId {
    Child(usize),
    Parent,
    ParentCandidate,
}

#[derive(Debug, Clone, Copy)]
pub struct CslTarget {
    pub id: CslCandidateId,
    pub csl_info: CslInfo,
    pub queued_indirect_messages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledWindow {
    pub id: CslCandidateId,
    pub delay_us: u64,
    pub absolute_time_us: u64,
}

/// `configured_request_ahead + bus_tx_time_estimate + bus_latency_estimate`,
/// where `bus_tx_time_estimate = ceil(150·8·1e6 / bus_speed_hz)` (spec §4.5;
/// 150 bytes covers a maximal 127-byte 802.15.4 frame plus metadata).
pub fn frame_request_ahead_us(config: &CslConfig) -> u64 {
    let bits = BUS_FRAME_ESTIMATE_BYTES * 8 * 1_000_000;
    let bus_tx_time_estimate = (bits + config.bus_speed_hz - 1) / config.bus_speed_hz;
    config.frame_request_ahead_us + bus_tx_time_estimate + config.bus_latency_us
}

/// Smallest `last_rx_timestamp_us + phase·10sym + k·period·10sym` that is
/// `>= threshold_us`.
pub fn next_tx_window(last_rx_timestamp_us: u64, phase: u16, period: u16, threshold_us: u64) -> u64 {
    let period_us = u64::from(period) * 10;
    let mut window = last_rx_timestamp_us + u64::from(phase) * 10;
    if period_us == 0 || window >= threshold_us {
        return window;
    }
    let remaining = threshold_us - window;
    let steps = remaining.div_ceil(period_us);
    window += steps * period_us;
    window
}

/// Pick the candidate with the minimum `delay_until_next_window`.
pub fn reschedule(targets: &[CslTarget], now_us: u64, ahead_us: u64) -> Option<ScheduledWindow> {
    let threshold = now_us + ahead_us;
    targets
        .iter()
        .filter(|t| t.csl_info.is_synchronized() && t.queued_indirect_messages > 0)
        .map(|t| {
            let window = next_tx_window(
                t.csl_info.last_rx_timestamp_us,
                t.csl_info.phase,
                t.csl_info.period,
                threshold,
            );
            let delay_us = window.saturating_sub(now_us).saturating_sub(ahead_us);
            ScheduledWindow {
                id: t.id,
                delay_us,
                absolute_time_us: window,
            }
        })
        .min_by_key(|w| w.delay_us)
}

pub struct CslTxScheduler {
    pub current_neighbor: Option<CslCandidateId>,
    pub current_message: Option<MessageId>,
    config: CslConfig,
}

impl CslTxScheduler {
    pub fn new(config: CslConfig) -> Self {
        Self {
            current_neighbor: None,
            current_message: None,
            config,
        }
    }

    pub fn frame_request_ahead_us(&self) -> u64 {
        frame_request_ahead_us(&self.config)
    }

    /// `update()` from spec §4.5: called whenever the synchronized set
    /// or queued counts change. Returns `Some` when a fresh reschedule
    /// should be requested of the radio.
    pub fn update(&mut self, targets: &[CslTarget], now_us: u64, switched: bool) -> Option<ScheduledWindow> {
        if self.current_neighbor.is_none() {
            return self.reschedule_now(targets, now_us);
        }
        if switched {
            self.current_neighbor = None;
            self.current_message = None;
            return None;
        }
        None
    }

    pub fn reschedule_now(&mut self, targets: &[CslTarget], now_us: u64) -> Option<ScheduledWindow> {
        let ahead = self.frame_request_ahead_us();
        let window = reschedule(targets, now_us, ahead)?;
        self.current_neighbor = Some(window.id);
        Some(window)
    }

    pub fn clear_current(&mut self) {
        self.current_neighbor = None;
        self.current_message = None;
    }
}

/// Apply a sent-frame callback result to one candidate's attempt
/// counters (spec §4.5): `NoAck` increments `csl_attempts`, reaching
/// `max_csl_triggered_attempts` desynchronizes the neighbor; any
/// non-success result preserves the continuity fields; success resets
/// both attempt counters.
pub fn on_sent_frame_result(
    config: &CslConfig,
    csl_attempts: &mut u8,
    indirect_attempts: &mut u8,
    csl_info: &mut CslInfo,
    result: TxResult,
) {
    if result.is_success() {
        *csl_attempts = 0;
        *indirect_attempts = 0;
        return;
    }
    *csl_attempts = csl_attempts.saturating_add(1);
    if *csl_attempts >= config.max_csl_triggered_attempts {
        csl_info.desynchronize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csl_window_math_matches_scenario_3() {
        let mut csl_info = CslInfo::new();
        csl_info.period = 500;
        csl_info.phase = 0;
        csl_info.last_rx_timestamp_us = 10_000_000;

        let targets = [CslTarget {
            id: CslCandidateId::Child(0),
            csl_info,
            queued_indirect_messages: 1,
        }];

        let window = reschedule(&targets, 10_012_345, 2_000).unwrap();
        assert_eq!(window.absolute_time_us, 10_015_000);
        assert_eq!(window.delay_us, 655);
    }

    #[test]
    fn window_math_invariant_holds_for_arbitrary_inputs() {
        for period in [1u16, 50, 500, 6400] {
            for phase in [0u16, 1, 7, period.saturating_sub(1)] {
                let last_rx = 1_000_000u64;
                let now = 1_003_000u64;
                let ahead = 200u64;
                let window = next_tx_window(last_rx, phase, period, now + ahead);
                assert!(window >= now + ahead);
                let period_us = u64::from(period) * 10;
                let phase_us = u64::from(phase) * 10;
                assert_eq!((window - last_rx) % period_us, phase_us % period_us);
            }
        }
    }

    #[test]
    fn unsynchronized_or_empty_targets_are_skipped() {
        let mut synced_but_empty = CslInfo::new();
        synced_but_empty.period = 100;
        let unsynced = CslInfo::new();
        let targets = [
            CslTarget {
                id: CslCandidateId::Child(0),
                csl_info: synced_but_empty,
                queued_indirect_messages: 0,
            },
            CslTarget {
                id: CslCandidateId::Child(1),
                csl_info: unsynced,
                queued_indirect_messages: 5,
            },
        ];
        assert!(reschedule(&targets, 0, 0).is_none());
    }

    #[test]
    fn desynchronizes_after_max_triggered_attempts() {
        let config = CslConfig {
            max_csl_triggered_attempts: 2,
            ..CslConfig::default()
        };
        let mut csl_attempts = 1;
        let mut indirect_attempts = 0;
        let mut csl_info = CslInfo::new();
        csl_info.period = 500;
        on_sent_frame_result(&config, &mut csl_attempts, &mut indirect_attempts, &mut csl_info, TxResult::NoAck);
        assert_eq!(csl_attempts, 2);
        assert!(!csl_info.is_synchronized());
    }
}
