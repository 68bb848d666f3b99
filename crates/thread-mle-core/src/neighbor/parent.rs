//! `Parent` (spec §3): a `Peer` plus the attributes relevant to routing
//! up the tree — leader cost, CSL round-trip estimate, and whether this
//! parent is itself a sub-child parent (C9).

use crate::neighbor::csl_info::CslInfo;
use crate::neighbor::peer::Peer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parent {
    pub peer: Peer,
    pub leader_cost: u8,
    pub csl_round_trip_time_us: u64,
    pub is_sub_child: bool,
    pub hop_count: u8,
    pub csl_info: CslInfo,
}

impl Parent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_use(&self) -> bool {
        self.peer.is_in_use()
    }

    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}
