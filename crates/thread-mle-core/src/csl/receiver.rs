//! CSL Receiver (C6, spec §4.6). Periodic sampled listening: schedules
//! receive windows from a peer's CSL phase/period, sizes the window
//! from reported clock accuracy and uncertainty, and maintains the
//! second independent "wakeup" cycle used by a sub-child parent (C9).

use crate::neighbor::CslInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CslReceiverState {
    CslReceive,
    CslQueued,
    WakeupReceive,
    WakeupQueued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start_us: u64,
    pub end_us: u64,
}

/// `ceil(elapsed_since_last_sync · (local_ppm + peer_ppm) / 1e6) +
/// peer_uncertainty_us + local_uncertainty_us`, floored at
/// `local_uncertainty_us` (spec §4.6).
pub fn semi_window_us(
    elapsed_since_last_sync_us: u64,
    local_ppm: u16,
    peer_ppm: u16,
    peer_uncertainty_us: u32,
    local_uncertainty_us: u32,
) -> u64 {
    let drift_numerator = elapsed_since_last_sync_us * u64::from(local_ppm + peer_ppm);
    let drift_term = drift_numerator.div_ceil(1_000_000);
    let per_peer = drift_term + u64::from(peer_uncertainty_us) + u64::from(local_uncertainty_us);
    per_peer.max(u64::from(local_uncertainty_us))
}

/// `[sample_time − min(period/2, semi_window + min_ahead), sample_time +
/// min(period/2, semi_window + min_after)]`.
pub fn window_bounds(
    sample_time_us: u64,
    period: u16,
    semi_window_us: u64,
    min_ahead_us: u64,
    min_after_us: u64,
) -> WindowBounds {
    let half_period_us = u64::from(period) * 10 / 2;
    let ahead = half_period_us.min(semi_window_us + min_ahead_us);
    let after = half_period_us.min(semi_window_us + min_after_us);
    WindowBounds {
        start_us: sample_time_us.saturating_sub(ahead),
        end_us: sample_time_us + after,
    }
}

/// Record a validated sync point (spec §4.6): a successfully transmitted
/// frame carrying a CSL IE whose ack was received, or a received frame
/// acked with an enhanced-ack security field.
pub fn note_last_sync(csl_info: &mut CslInfo, timestamp_us: u64) {
    csl_info.note_synced(timestamp_us);
}

/// On radios without receive-timing hardware the timer fires twice per
/// window (start and end); with it, once, arming a timed-receive call
/// `receive_time_ahead_us` before the window start.
pub fn csl_timer_fire_times(window: WindowBounds, receive_time_ahead_us: u64, has_timing_hw: bool) -> (u64, Option<u64>) {
    if has_timing_hw {
        (window.start_us.saturating_sub(receive_time_ahead_us), None)
    } else {
        (window.start_us, Some(window.end_us))
    }
}

/// Next wakeup-cycle window start: every `wakeup_period · 256 · 10sym`
/// µs past the last one (spec §4.6 "Wakeup (sub-child parent)").
pub fn wakeup_window_start_us(last_wakeup_us: u64, wakeup_period: u16) -> u64 {
    last_wakeup_us + u64::from(wakeup_period) * 256 * 10
}

/// If the next wakeup window lands before the next CSL window, the
/// receiver enters `WakeupQueued` instead of `CslQueued`.
pub fn choose_next_state(next_wakeup_us: u64, next_csl_us: u64) -> CslReceiverState {
    if next_wakeup_us < next_csl_us {
        CslReceiverState::WakeupQueued
    } else {
        CslReceiverState::CslQueued
    }
}
