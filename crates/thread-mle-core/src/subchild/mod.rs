//! Sub-Child Extension (C9, spec §4.9). Lets an MTD with spare RLOC
//! prefix bits act as a second-tier parent: it runs its own MLE mini
//! attach with a sub-child candidate, and forwards Child Id / Child
//! Update request-response pairs up and down the tree.
//!
//! Only meaningful when [`crate::config::SubChildConfig::enabled`] is
//! set (Design Notes §9: "additive feature behind a compile-time
//! toggle" — here a runtime flag rather than `#[cfg]`, since the spec
//! names no build-time gate and a runtime flag is what lets
//! `thread-mle-transport` exercise both configurations without two
//! binaries).

use crate::config::SubChildConfig;
use crate::neighbor::{Child, PeerState};
use crate::types::Rloc16;

/// True iff the high `via_prefix_length` bits of `dst_rloc` equal those
/// of `via_rloc` (spec §4.9 forwarding primitive).
pub fn is_sub_child_of(dst_rloc: Rloc16, via_rloc: Rloc16, via_prefix_length: u8) -> bool {
    if via_prefix_length == 0 {
        return true;
    }
    if via_prefix_length >= 16 {
        return dst_rloc == via_rloc;
    }
    let shift = 16 - via_prefix_length;
    (dst_rloc >> shift) == (via_rloc >> shift)
}

/// Whether this node has remaining RLOC prefix-length bits to host
/// sub-children at all (spec §4.9: "remaining RLOC prefix-length bits
/// (`prefix_length < 9`)").
pub fn is_eligible_sub_child_parent(own_prefix_length: u8, config: &SubChildConfig) -> bool {
    config.enabled && own_prefix_length < config.prefix_length_limit
}

/// First child in state `Valid` whose RLOC is under `dst_rloc`'s prefix
/// at `via_prefix_length` bits — the chosen forwarding next hop (spec
/// §4.9: "the first child in state Valid under which this predicate
/// holds").
pub fn find_next_hop<'a>(
    children: impl Iterator<Item = &'a Child>,
    dst_rloc: Rloc16,
    via_prefix_length: u8,
) -> Option<&'a Child> {
    children
        .filter(|c| c.peer.state == PeerState::Valid)
        .find(|c| is_sub_child_of(dst_rloc, c.peer.rloc16, via_prefix_length))
}

/// Sub-child mini-attach progress, mirroring the parent side of the
/// regular attach cycle (spec §4.9: "ParentRequest → ParentResponse →
/// LinkRequest → LinkAccept → ChildIdRequest → ChildIdResponse").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubChildAttachState {
    Idle,
    ParentResponseSent,
    AwaitingLinkRequest,
    LinkAcceptSent,
    AwaitingChildIdRequest,
    ChildIdResponseSent,
}

impl Default for SubChildAttachState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SubChildAttachState {
    pub fn on_parent_request(&mut self) {
        *self = Self::ParentResponseSent;
    }

    pub fn on_parent_response_sent(&mut self) {
        *self = Self::AwaitingLinkRequest;
    }

    pub fn on_link_request(&mut self) {
        *self = Self::LinkAcceptSent;
    }

    pub fn on_link_accept_sent(&mut self) {
        *self = Self::AwaitingChildIdRequest;
    }

    pub fn on_child_id_request(&mut self) {
        *self = Self::ChildIdResponseSent;
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, Self::ChildIdResponseSent)
    }
}

/// Byte offset the codec leaves ahead of a forwarded `ChildIdRequest`'s
/// TLV region: 1 security-suite byte + the 9-byte security header + 1
/// command byte + the 1-byte type/length pair of the TLV already
/// consumed (`SourceAddress`) before the first TLV this node forwards
/// unchanged. Spec §9 Open Questions flags the magic-12 rewind in the
/// source as unjustified; this crate derives the same number from its
/// own codec layout (`codec::security::SECURITY_HEADER_LEN` + 3) rather
/// than carrying it as a bare literal. See DESIGN.md.
pub const CHILD_ID_REQUEST_FORWARD_REWIND: usize =
    1 + crate::codec::security::SECURITY_HEADER_LEN + 1 + 1;

/// Detach-pending retransmission period (spec §4.9: "`4 ·
/// csl_round_trip_time + 1000 ms`"; the 4x multiple is an unjustified
/// constant per spec §9 Open Questions, kept configurable via
/// [`SubChildConfig`] rather than hard-coded).
pub fn detach_pending_retx_period_ms(config: &SubChildConfig, csl_round_trip_time_us: u64) -> u64 {
    let from_rtt_ms = (config.detach_pending_retx_multiple * csl_round_trip_time_us) / 1_000;
    from_rtt_ms.max(config.detach_pending_retx_floor_ms)
}

/// Tracks one sub-child the parent is in the process of removing (spec
/// §4.9 "Detach-pending"): invalidated only after a matching Child
/// Update Response arrives, or after the configured retransmission
/// period elapses with none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachPending {
    pub child_index: usize,
    pub next_tx_time_ms: u64,
    pub response_received: bool,
}

impl DetachPending {
    pub fn start(
        child_index: usize,
        now_ms: u64,
        config: &SubChildConfig,
        csl_round_trip_time_us: u64,
    ) -> Self {
        Self {
            child_index,
            next_tx_time_ms: now_ms + detach_pending_retx_period_ms(config, csl_round_trip_time_us),
            response_received: false,
        }
    }

    pub fn on_response(&mut self) {
        self.response_received = true;
    }

    /// Whether the child should transition to `Invalid` now.
    pub fn should_invalidate(&self, now_ms: u64) -> bool {
        self.response_received || now_ms >= self.next_tx_time_ms
    }
}
