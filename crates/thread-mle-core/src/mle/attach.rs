//! Attach cycle (C8, spec §4.8 points 1-6).

use alloc::vec::Vec;

use crate::config::MleConfig;
use crate::types::Rloc16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    Idle,
    Start,
    ParentRequest,
    Announce,
    ChildIdRequest,
}

impl Default for AttachState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    AnyPartition,
    SamePartition,
    BetterPartition,
    DowngradeToReed,
    BetterParent,
    SelectedParent,
}

/// One parent-request-response candidate collected during the
/// `ParentRequest` wait (spec §4.8 point 4 — ranking cascade inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentCandidate {
    pub ext_addr: [u8; 8],
    pub rloc16: Rloc16,
    pub link_margin_db: i32,
    pub link_quality_class: u8,
    pub is_router: bool,
    pub parent_priority: i8,
    pub connectivity_lq3_count: u8,
    pub connectivity_lq2_count: u8,
    pub connectivity_lq1_count: u8,
    pub protocol_version: u8,
    pub sed_buffer_size: u16,
    pub sed_datagram_count: u8,
    /// Only meaningful when the local device is itself sleepy (spec
    /// §4.8 point 4h): smaller is better.
    pub parent_csl_power_metric: Option<u32>,
}

/// Three-way-compare cascade, spec §4.8 point 4 (a)..(i). Returns
/// `true` if `candidate` outranks `incumbent`.
pub fn outranks(local_is_sleepy: bool, candidate: &ParentCandidate, incumbent: &ParentCandidate) -> bool {
    use core::cmp::Ordering;

    let mut ordering = candidate.link_quality_class.cmp(&incumbent.link_quality_class);
    if ordering == Ordering::Equal {
        ordering = candidate.is_router.cmp(&incumbent.is_router);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.parent_priority.cmp(&incumbent.parent_priority);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.connectivity_lq3_count.cmp(&incumbent.connectivity_lq3_count);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.protocol_version.cmp(&incumbent.protocol_version);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.sed_buffer_size.cmp(&incumbent.sed_buffer_size);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.sed_datagram_count.cmp(&incumbent.sed_datagram_count);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.connectivity_lq2_count.cmp(&incumbent.connectivity_lq2_count);
    }
    if ordering == Ordering::Equal {
        ordering = candidate.connectivity_lq1_count.cmp(&incumbent.connectivity_lq1_count);
    }
    if ordering == Ordering::Equal && local_is_sleepy {
        // smaller power metric wins, so reverse the natural comparison
        ordering = match (candidate.parent_csl_power_metric, incumbent.parent_csl_power_metric) {
            (Some(c), Some(i)) => i.cmp(&c),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
    }
    if ordering == Ordering::Equal {
        ordering = candidate.link_margin_db.cmp(&incumbent.link_margin_db);
    }
    ordering == Ordering::Greater
}

pub fn best_candidate(local_is_sleepy: bool, candidates: &[ParentCandidate]) -> Option<ParentCandidate> {
    let mut best: Option<ParentCandidate> = None;
    for candidate in candidates {
        best = match best {
            None => Some(*candidate),
            Some(current) if outranks(local_is_sleepy, candidate, &current) => Some(*candidate),
            other => other,
        };
    }
    best
}

/// How many `ParentRequest`s to send at the routers-only scan mask
/// before widening to routers+REEDs (spec §4.8 point 2).
pub fn routers_only_request_count(config: &MleConfig, is_first_cycle: bool, mode: AttachMode) -> u8 {
    if mode == AttachMode::SelectedParent {
        return 1;
    }
    if is_first_cycle {
        config.first_cycle_parent_requests_to_routers
    } else {
        config.next_cycle_parent_requests_to_routers
    }
}

#[derive(Debug, Default)]
pub struct AttachCycle {
    pub state: AttachState,
    pub mode: Option<AttachMode>,
    pub is_first_cycle: bool,
    pub requests_sent: u8,
    pub routers_only: bool,
    pub candidates: Vec<ParentCandidate>,
}

impl AttachCycle {
    pub fn new() -> Self {
        Self {
            is_first_cycle: true,
            routers_only: true,
            ..Self::default()
        }
    }

    /// `Idle → Start`.
    pub fn start(&mut self, mode: AttachMode) {
        self.state = AttachState::Start;
        self.mode = Some(mode);
        self.requests_sent = 0;
        self.routers_only = true;
        self.candidates.clear();
    }

    /// `Start → ParentRequest`.
    pub fn begin_parent_request_phase(&mut self) {
        self.state = AttachState::ParentRequest;
    }

    pub fn on_parent_request_sent(&mut self, config: &MleConfig) {
        self.requests_sent += 1;
        let mode = self.mode.unwrap_or(AttachMode::AnyPartition);
        let routers_only_budget = routers_only_request_count(config, self.is_first_cycle, mode);
        if self.requests_sent >= routers_only_budget {
            self.routers_only = false;
        }
    }

    pub fn request_timeout_ms(&self, config: &MleConfig) -> u64 {
        if self.routers_only {
            config.parent_request_router_timeout_ms
        } else {
            config.parent_request_reed_timeout_ms
        }
    }

    pub fn on_parent_response(&mut self, candidate: ParentCandidate) {
        self.candidates.push(candidate);
    }

    /// `ParentRequest → ChildIdRequest`, or `None` when no candidate
    /// qualifies and the cycle should fall through to reattach.
    pub fn select_parent(&mut self, local_is_sleepy: bool) -> Option<ParentCandidate> {
        let chosen = best_candidate(local_is_sleepy, &self.candidates);
        if chosen.is_some() {
            self.state = AttachState::ChildIdRequest;
        }
        chosen
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
