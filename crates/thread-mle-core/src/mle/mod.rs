//! MLE Core State Machine (C8, spec §4.8). Owns device role, the
//! attach cycle, key-sequence adoption, and graceful detach; drives the
//! neighbor table, retransmission tracker and delayed sender it is
//! handed through the core context.

pub mod announce;
pub mod attach;
pub mod child_update;
pub mod incoming;
pub mod reattach;

use crate::codec::MleCommand;
use crate::config::MleConfig;
use crate::constants::{INVALID_RLOC16, MLE_HOP_LIMIT};
use crate::counters::MleCounters;
use crate::error::{MleError, MleResult};
use crate::neighbor::PeerState;
use crate::types::{KeySequence, Rloc16};

pub use announce::AnnounceCycle;
pub use attach::{AttachCycle, AttachMode, AttachState, ParentCandidate};
pub use child_update::ChildUpdateBuilder;
pub use reattach::{ReattachDecision, ReattachState, ReattachTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Disabled,
    Detached,
    Child,
    Router,
    Leader,
}

impl Default for DeviceRole {
    fn default() -> Self {
        Self::Disabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    Authoritative,
    Peer,
    Unknown,
}

/// Classify an incoming command for the key-sequence adoption policy
/// (spec §4.8).
pub fn classify_command(command: MleCommand) -> MessageClass {
    match command {
        MleCommand::ParentResponse | MleCommand::ChildIdResponse => MessageClass::Authoritative,
        MleCommand::Advertisement
        | MleCommand::DataResponse
        | MleCommand::ChildUpdateRequest
        | MleCommand::ChildUpdateResponse => MessageClass::Peer,
        _ => MessageClass::Unknown,
    }
}

/// Key-sequence adoption policy (spec §4.8, §8 "Key-sequence
/// adoption"): `msg_key_seq > current_key_seq` is updated iff the
/// message is `Authoritative`, or `Peer` from a `Valid` neighbor with
/// `msg_key_seq - current_key_seq == 1`.
pub fn should_adopt_key_sequence(
    class: MessageClass,
    neighbor_state: PeerState,
    current: KeySequence,
    msg_key_seq: KeySequence,
) -> bool {
    if msg_key_seq <= current {
        return false;
    }
    match class {
        MessageClass::Authoritative => true,
        MessageClass::Peer => neighbor_state == PeerState::Valid && msg_key_seq - current == 1,
        MessageClass::Unknown => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAcceptance {
    /// Drop as duplicate. `update_radio_info` covers the one-off case
    /// (spec §4.8: `frame_counter + 1 == neighbor.mle_frame_counter`)
    /// where link radio info (RSS, LQI) is still refreshed.
    Duplicate { update_radio_info: bool },
    AdoptNewKeySequence,
    Accept,
}

/// Frame-counter / key-sequence gate applied to every secured incoming
/// message before its handler runs (spec §4.8, §8 "Frame counter
/// monotonicity").
pub fn check_frame_counter(
    neighbor_key_seq: KeySequence,
    neighbor_mle_frame_counter: u32,
    msg_key_seq: KeySequence,
    msg_frame_counter: u32,
) -> FrameAcceptance {
    if msg_key_seq == neighbor_key_seq {
        if msg_frame_counter + 1 == neighbor_mle_frame_counter {
            return FrameAcceptance::Duplicate { update_radio_info: true };
        }
        if msg_frame_counter < neighbor_mle_frame_counter {
            return FrameAcceptance::Duplicate { update_radio_info: false };
        }
        FrameAcceptance::Accept
    } else if msg_key_seq > neighbor_key_seq {
        FrameAcceptance::AdoptNewKeySequence
    } else {
        FrameAcceptance::Duplicate { update_radio_info: false }
    }
}

/// Validate the MLE datagram hop-limit convention (spec §4.8): every
/// secured message must carry hop-limit 255.
pub fn check_hop_limit(hop_limit: u8) -> MleResult<()> {
    if hop_limit != MLE_HOP_LIMIT {
        log::trace!("mle: dropping datagram with hop limit {hop_limit}");
        return Err(MleError::Drop);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceModeAction {
    KeepCurrentTimeout,
    ResendChildUpdate,
}

/// Graceful detach tracker (spec §4.8 "Graceful detach", §8).
/// `detach_gracefully` sends a Child Update Request with timeout 0 and
/// invokes its callback exactly once, either on a matching response or
/// on timeout.
pub struct GracefulDetach {
    deadline_ms: u64,
    fired: bool,
}

impl GracefulDetach {
    pub fn start(now_ms: u64, config: &MleConfig) -> Self {
        Self {
            deadline_ms: now_ms + config.detach_graceful_timeout_ms,
            fired: false,
        }
    }

    /// Call on every tick and on receipt of the matching Child Update
    /// Response. Returns `true` exactly once: the caller must invoke
    /// its callback and tear MLE down at that point, never again.
    pub fn poll(&mut self, now_ms: u64, response_received: bool) -> bool {
        if self.fired {
            return false;
        }
        if response_received || now_ms >= self.deadline_ms {
            self.fired = true;
            return true;
        }
        false
    }
}

pub struct MleCore {
    pub role: DeviceRole,
    pub config: MleConfig,
    pub counters: MleCounters,
    pub attach: AttachCycle,
    pub reattach: ReattachTracker,
    pub key_sequence: KeySequence,
    pub device_mode: u8,
    pub timeout_sec: u32,
    /// RLOC16 this node was assigned on its last successful attach
    /// (spec §3, §4.8 point 6). `INVALID_RLOC16` until then.
    pub own_rloc16: Rloc16,
    graceful_detach: Option<GracefulDetach>,
}

impl MleCore {
    pub fn new(config: MleConfig) -> Self {
        Self {
            role: DeviceRole::Disabled,
            config,
            counters: MleCounters::new(),
            attach: AttachCycle::new(),
            reattach: ReattachTracker::new(false, false),
            key_sequence: 0,
            device_mode: 0,
            timeout_sec: 240,
            own_rloc16: INVALID_RLOC16,
            graceful_detach: None,
        }
    }

    pub fn get_role(&self) -> DeviceRole {
        self.role
    }

    pub fn enable(&mut self) -> MleResult<()> {
        if self.role != DeviceRole::Disabled {
            return Err(MleError::Already);
        }
        self.role = DeviceRole::Detached;
        log::debug!("mle: enabled, role -> Detached");
        Ok(())
    }

    /// `disable()`: dequeues and frees all delayed-sender records,
    /// clears both retry-track states, and closes the MLE socket (spec
    /// §5). The actual queue/tracker objects live in the core context;
    /// this just validates and flips the role so a subsequent `enable`
    /// starts clean.
    pub fn disable(&mut self) -> MleResult<()> {
        if self.role == DeviceRole::Disabled {
            return Err(MleError::Already);
        }
        self.role = DeviceRole::Disabled;
        self.attach.reset();
        self.reattach.reset();
        self.graceful_detach = None;
        self.own_rloc16 = INVALID_RLOC16;
        log::debug!("mle: disabled");
        Ok(())
    }

    pub fn start(&mut self, mode: AttachMode) -> MleResult<()> {
        if self.role == DeviceRole::Disabled {
            return Err(MleError::InvalidState);
        }
        self.attach.start(mode);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.attach.reset();
    }

    pub fn become_detached(&mut self) {
        log::info!("mle: role {:?} -> Detached", self.role);
        self.role = DeviceRole::Detached;
        self.counters.on_detach();
        self.attach.reset();
        self.own_rloc16 = INVALID_RLOC16;
    }

    /// Record the RLOC16 this node was assigned and move it to `Child`
    /// (spec §4.8 point 6). Populating `NeighborTable::parent` from the
    /// winning [`ParentCandidate`] and arming the keep-alive timer is the
    /// core context's job (it alone can reach the neighbor table and the
    /// retransmission tracker) — see [`crate::context::CoreContext::complete_attach`].
    pub fn become_child(&mut self, rloc16: Rloc16) {
        log::info!("mle: role {:?} -> Child, rloc16 {:#06x}", self.role, rloc16);
        self.role = DeviceRole::Child;
        self.counters.on_attach_success();
        self.own_rloc16 = rloc16;
    }

    pub fn set_device_mode(&mut self, mode: u8) {
        self.device_mode = mode;
    }

    pub fn set_timeout(&mut self, timeout_sec: u32) -> DeviceModeAction {
        self.timeout_sec = timeout_sec;
        if self.role == DeviceRole::Child {
            DeviceModeAction::ResendChildUpdate
        } else {
            DeviceModeAction::KeepCurrentTimeout
        }
    }

    pub fn detach_gracefully(&mut self, now_ms: u64) {
        self.graceful_detach = Some(GracefulDetach::start(now_ms, &self.config));
    }

    /// Poll the in-flight graceful detach, if any. Returns `true`
    /// exactly once when the caller should invoke its callback.
    pub fn poll_graceful_detach(&mut self, now_ms: u64, response_received: bool) -> bool {
        match &mut self.graceful_detach {
            Some(detach) => {
                let fire = detach.poll(now_ms, response_received);
                if fire {
                    self.graceful_detach = None;
                    self.role = DeviceRole::Detached;
                }
                fire
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_then_disable_round_trips_role() {
        let mut core = MleCore::new(MleConfig::default());
        core.enable().unwrap();
        assert_eq!(core.get_role(), DeviceRole::Detached);
        assert_eq!(core.enable().unwrap_err(), MleError::Already);
        core.disable().unwrap();
        assert_eq!(core.get_role(), DeviceRole::Disabled);
    }

    #[test]
    fn authoritative_messages_always_adopt_larger_key_sequence() {
        assert!(should_adopt_key_sequence(
            MessageClass::Authoritative,
            PeerState::Invalid,
            5,
            9
        ));
    }

    #[test]
    fn peer_messages_only_adopt_a_one_step_increase_from_a_valid_neighbor() {
        assert!(should_adopt_key_sequence(MessageClass::Peer, PeerState::Valid, 5, 6));
        assert!(!should_adopt_key_sequence(MessageClass::Peer, PeerState::Valid, 5, 7));
        assert!(!should_adopt_key_sequence(MessageClass::Peer, PeerState::ParentRequest, 5, 6));
    }

    #[test]
    fn unknown_messages_never_adopt() {
        assert!(!should_adopt_key_sequence(MessageClass::Unknown, PeerState::Valid, 5, 50));
    }

    #[test]
    fn duplicate_counter_is_rejected_but_one_off_still_refreshes_radio_info() {
        let outcome = check_frame_counter(3, 10, 3, 9);
        assert_eq!(outcome, FrameAcceptance::Duplicate { update_radio_info: true });
        let outcome = check_frame_counter(3, 10, 3, 5);
        assert_eq!(outcome, FrameAcceptance::Duplicate { update_radio_info: false });
        let outcome = check_frame_counter(3, 10, 3, 10);
        assert_eq!(outcome, FrameAcceptance::Accept);
        let outcome = check_frame_counter(3, 10, 4, 0);
        assert_eq!(outcome, FrameAcceptance::AdoptNewKeySequence);
    }

    #[test]
    fn become_child_records_the_assigned_rloc16() {
        let mut core = MleCore::new(MleConfig::default());
        core.enable().unwrap();
        core.become_child(0x6c01);
        assert_eq!(core.own_rloc16, 0x6c01);
        assert_eq!(core.get_role(), DeviceRole::Child);
    }

    #[test]
    fn non_255_hop_limit_is_dropped() {
        assert!(check_hop_limit(64).is_err());
        assert!(check_hop_limit(255).is_ok());
    }

    #[test]
    fn graceful_detach_fires_callback_exactly_once_on_timeout() {
        let config = MleConfig {
            detach_graceful_timeout_ms: 100,
            ..MleConfig::default()
        };
        let mut detach = GracefulDetach::start(0, &config);
        assert!(!detach.poll(50, false));
        assert!(detach.poll(100, false));
        assert!(!detach.poll(150, false));
    }

    #[test]
    fn graceful_detach_fires_immediately_on_matching_response() {
        let config = MleConfig::default();
        let mut detach = GracefulDetach::start(0, &config);
        assert!(detach.poll(10, true));
        assert!(!detach.poll(20, true));
    }
}
