//! `Child` (spec §3): a `Peer` plus child-specific attach and mobility
//! state, including the indirect-transmission bookkeeping consumed by
//! the indirect sender (C4) and CSL tx scheduler (C5).

use alloc::vec::Vec;

use crate::codec::tlv::TlvType;
use crate::mesh_forwarder::MessageId;
use crate::neighbor::csl_info::CslInfo;
use crate::neighbor::peer::{Peer, PeerState};
use crate::types::Ipv6Addr;

/// Device-mode flags carried in the `Mode` TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceMode(pub u8);

impl DeviceMode {
    pub const RX_ON_WHEN_IDLE: u8 = 1 << 0;
    pub const FULL_THREAD_DEVICE: u8 = 1 << 1;
    pub const FULL_NETWORK_DATA: u8 = 1 << 2;
    pub const SECURE_DATA: u8 = 1 << 3;

    pub fn rx_on_when_idle(self) -> bool {
        self.0 & Self::RX_ON_WHEN_IDLE != 0
    }

    pub fn full_thread_device(self) -> bool {
        self.0 & Self::FULL_THREAD_DEVICE != 0
    }

    pub fn full_network_data(self) -> bool {
        self.0 & Self::FULL_NETWORK_DATA != 0
    }

    pub fn secure_data(self) -> bool {
        self.0 & Self::SECURE_DATA != 0
    }
}

/// A registered IPv6 address plus its duplicate-address-detection status
/// (SPEC_FULL §2 supplement — DAD itself is owned by `NetworkDataStore`,
/// but the table must not advertise an address that hasn't cleared it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredAddress {
    pub addr: Ipv6Addr,
    pub dad_pending: bool,
}

/// Reified union of attach-challenge and requested-TLV-list storage
/// (Design Notes §9: "Union of attach-challenge and requested-TLV list
/// sharing storage in a Child").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAuxState {
    Attaching {
        challenge: [u8; 8],
    },
    Attached {
        requested_tlvs: [Option<TlvType>; 6],
        requested_count: usize,
    },
}

impl Default for ChildAuxState {
    fn default() -> Self {
        Self::Attaching { challenge: [0; 8] }
    }
}

/// Indirect-transmission bookkeeping for a sleepy child (spec §3
/// `IndirectNeighbor`, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndirectState {
    pub current_message: Option<MessageId>,
    pub fragment_offset: u16,
    pub tx_success: bool,
    pub use_short_address: bool,
    pub source_match_pending: bool,
    pub waiting_for_message_update: bool,
    pub indirect_attempts: u8,
    pub csl_attempts: u8,
    pub last_frame_counter: u32,
    pub last_key_id: u32,
    pub last_mac_seq: u8,
}

impl IndirectState {
    pub const MAX_FRAGMENT_OFFSET: u16 = (1 << 14) - 1;
    pub const MAX_QUEUED: u16 = (1 << 14) - 1;

    pub fn is_retransmission(&self) -> bool {
        self.indirect_attempts > 0 || self.csl_attempts > 0
    }

    pub fn reset_attempts(&mut self) {
        self.indirect_attempts = 0;
        self.csl_attempts = 0;
    }

    pub fn note_continuity(&mut self, frame_counter: u32, key_id: u32, mac_seq: u8) {
        self.last_frame_counter = frame_counter;
        self.last_key_id = key_id;
        self.last_mac_seq = mac_seq;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub peer: Peer,
    pub device_mode: DeviceMode,
    pub timeout_sec: u32,
    pub supervision_interval_sec: u16,
    pub registered_addresses: Vec<RegisteredAddress>,
    pub aux: ChildAuxState,
    pub csl_info: CslInfo,
    pub indirect: IndirectState,
    /// Stable index into the owning table's child arena; also the bit
    /// position used by the mesh-forwarder message bitmask.
    pub child_index: usize,
}

impl Child {
    pub fn new(child_index: usize) -> Self {
        Self {
            peer: Peer::new([0; 8]),
            device_mode: DeviceMode::default(),
            timeout_sec: 0,
            supervision_interval_sec: 0,
            registered_addresses: Vec::new(),
            aux: ChildAuxState::default(),
            csl_info: CslInfo::new(),
            indirect: IndirectState::default(),
            child_index,
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.peer.is_in_use()
    }

    pub fn reset(&mut self) {
        let index = self.child_index;
        *self = Self::new(index);
    }

    /// Register `addr`, enforcing the two Child invariants named in
    /// spec §3: never the mesh-local EID, and bounded count.
    pub fn register_address(
        &mut self,
        addr: Ipv6Addr,
        mesh_local_eid: Ipv6Addr,
        max_registered: usize,
    ) -> Result<(), crate::error::MleError> {
        use crate::error::MleError;
        if addr == mesh_local_eid {
            return Err(MleError::InvalidArgs);
        }
        if self.registered_addresses.iter().any(|a| a.addr == addr) {
            return Ok(());
        }
        if self.registered_addresses.len() >= max_registered {
            return Err(MleError::NoBufs);
        }
        self.registered_addresses.push(RegisteredAddress {
            addr,
            dad_pending: true,
        });
        Ok(())
    }

    pub fn clear_dad_pending(&mut self, addr: Ipv6Addr) {
        if let Some(entry) = self.registered_addresses.iter_mut().find(|a| a.addr == addr) {
            entry.dad_pending = false;
        }
    }

    /// Invariant (b) from spec §3: a Child in state Valid has a
    /// non-invalid RLOC16 and a non-zero timeout.
    pub fn valid_state_invariant_holds(&self) -> bool {
        if self.peer.state != PeerState::Valid {
            return true;
        }
        self.peer.rloc16 != crate::constants::INVALID_RLOC16 && self.timeout_sec != 0
    }
}
