//! `RadioPort` — the external collaborator standing in for the IEEE
//! 802.15.4 driver, AES-CCM hardware and time source (spec §1, §6).
//! Everything here is non-blocking: a call either completes immediately
//! or schedules a later callback the core observes on its next tick.

use crate::error::MleResult;
use crate::types::{ExtAddr, Frame};

/// Non-blocking radio/MAC driver surface. All operations return
/// immediately; completion of `send`/`send_at`/`receive_at` is reported
/// back to the core out-of-band (the transport edge is responsible for
/// routing MAC callbacks into the relevant component).
pub trait RadioPort {
    /// Put the radio into receive mode on `channel` until told otherwise.
    fn receive(&mut self, channel: u8) -> MleResult<()>;

    /// Arm a timed receive window `[start_us, start_us + duration_us)`.
    fn receive_at(&mut self, channel: u8, start_us: u64, duration_us: u64) -> MleResult<()>;

    /// Turn the radio off.
    fn sleep(&mut self) -> MleResult<()>;

    /// Send `frame` as soon as possible.
    fn send(&mut self, frame: &Frame) -> MleResult<()>;

    /// Send `frame` at a specific future radio time.
    fn send_at(&mut self, frame: &Frame, start_us: u64) -> MleResult<()>;

    /// Enable CSL sampled listening with the given period (10-symbol units).
    fn enable_csl(&mut self, period: u16) -> MleResult<()>;

    /// Update the CSL sample-time IE the radio advertises to peers.
    fn update_csl_sample_time(&mut self, sample_time_us: u64) -> MleResult<()>;

    fn add_csl_short_entry(&mut self, short_addr: u16) -> MleResult<()>;
    fn clear_csl_short_entry(&mut self, short_addr: u16) -> MleResult<()>;
    fn add_csl_ext_entry(&mut self, ext_addr: ExtAddr) -> MleResult<()>;
    fn clear_csl_ext_entry(&mut self, ext_addr: ExtAddr) -> MleResult<()>;

    /// Microsecond monotonic clock.
    fn get_now(&self) -> u64;

    fn get_bus_speed_hz(&self) -> u64;
    fn get_bus_latency_us(&self) -> u64;
    fn get_csl_accuracy_ppm(&self) -> u16;
    fn get_csl_uncertainty_us(&self) -> u32;
}
