//! In-process [`RadioPort`] double driven off a monotonic clock,
//! standing in for the 802.15.4 driver when `thread-mle-transport` runs
//! a node against the simulated topology rather than real hardware
//! (spec §1 names the radio driver out of scope; this is the test/demo
//! harness collaborator the transport edge needs to drive `CoreContext`
//! at all without one).

use std::time::Instant;

use log::trace;
use thread_mle_core::error::MleResult;
use thread_mle_core::radio::RadioPort;
use thread_mle_core::types::{ExtAddr, Frame};

/// One radio transmission captured by [`SimRadio::send`] /
/// [`SimRadio::send_at`], for a harness to inspect or forward to peers.
#[derive(Debug, Clone)]
pub struct SentFrame {
    pub frame: Frame,
    pub start_us: Option<u64>,
}

/// A non-blocking radio double: every call returns immediately and
/// records its effect; there is no real air interface underneath.
pub struct SimRadio {
    started_at: Instant,
    channel: Option<u8>,
    csl_period: u16,
    bus_speed_hz: u64,
    bus_latency_us: u64,
    csl_accuracy_ppm: u16,
    csl_uncertainty_us: u32,
    pub sent: Vec<SentFrame>,
}

impl SimRadio {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            channel: None,
            csl_period: 0,
            bus_speed_hz: 1_000_000,
            bus_latency_us: 0,
            csl_accuracy_ppm: 10,
            csl_uncertainty_us: 500,
            sent: Vec::new(),
        }
    }

    pub fn with_bus_params(mut self, speed_hz: u64, latency_us: u64) -> Self {
        self.bus_speed_hz = speed_hz;
        self.bus_latency_us = latency_us;
        self
    }

    pub fn drain_sent(&mut self) -> Vec<SentFrame> {
        core::mem::take(&mut self.sent)
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioPort for SimRadio {
    fn receive(&mut self, channel: u8) -> MleResult<()> {
        trace!("sim radio: receive on channel {channel}");
        self.channel = Some(channel);
        Ok(())
    }

    fn receive_at(&mut self, channel: u8, start_us: u64, duration_us: u64) -> MleResult<()> {
        trace!("sim radio: receive_at channel {channel} start {start_us} duration {duration_us}");
        self.channel = Some(channel);
        Ok(())
    }

    fn sleep(&mut self) -> MleResult<()> {
        trace!("sim radio: sleep");
        self.channel = None;
        Ok(())
    }

    fn send(&mut self, frame: &Frame) -> MleResult<()> {
        trace!("sim radio: send {} bytes", frame.len());
        self.sent.push(SentFrame { frame: frame.clone(), start_us: None });
        Ok(())
    }

    fn send_at(&mut self, frame: &Frame, start_us: u64) -> MleResult<()> {
        trace!("sim radio: send_at {} bytes at {start_us}", frame.len());
        self.sent.push(SentFrame { frame: frame.clone(), start_us: Some(start_us) });
        Ok(())
    }

    fn enable_csl(&mut self, period: u16) -> MleResult<()> {
        self.csl_period = period;
        Ok(())
    }

    fn update_csl_sample_time(&mut self, sample_time_us: u64) -> MleResult<()> {
        trace!("sim radio: csl sample time {sample_time_us}");
        Ok(())
    }

    fn add_csl_short_entry(&mut self, short_addr: u16) -> MleResult<()> {
        trace!("sim radio: add csl short entry {short_addr:#06x}");
        Ok(())
    }

    fn clear_csl_short_entry(&mut self, short_addr: u16) -> MleResult<()> {
        trace!("sim radio: clear csl short entry {short_addr:#06x}");
        Ok(())
    }

    fn add_csl_ext_entry(&mut self, ext_addr: ExtAddr) -> MleResult<()> {
        trace!("sim radio: add csl ext entry {ext_addr:?}");
        Ok(())
    }

    fn clear_csl_ext_entry(&mut self, ext_addr: ExtAddr) -> MleResult<()> {
        trace!("sim radio: clear csl ext entry {ext_addr:?}");
        Ok(())
    }

    fn get_now(&self) -> u64 {
        self.started_at.elapsed().as_micros() as u64
    }

    fn get_bus_speed_hz(&self) -> u64 {
        self.bus_speed_hz
    }

    fn get_bus_latency_us(&self) -> u64 {
        self.bus_latency_us
    }

    fn get_csl_accuracy_ppm(&self) -> u16 {
        self.csl_accuracy_ppm
    }

    fn get_csl_uncertainty_us(&self) -> u32 {
        self.csl_uncertainty_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_is_captured_and_drainable() {
        let mut radio = SimRadio::new();
        radio.send(&vec![1, 2, 3]).unwrap();
        radio.send_at(&vec![4], 500).unwrap();
        let sent = radio.drain_sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].start_us, Some(500));
        assert!(radio.sent.is_empty());
    }

    #[test]
    fn get_now_is_monotonic() {
        let radio = SimRadio::new();
        let first = radio.get_now();
        let second = radio.get_now();
        assert!(second >= first);
    }
}
