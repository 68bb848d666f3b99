//! Neighbor & Child Table (C1, spec §4.1). Owns every `Child` slot plus
//! the single `Parent` and transient parent-candidate. Events are
//! exposed pull-style (drained by the core context each tick) rather
//! than via a stored callback, matching the Notifier pattern spec §7
//! describes for user-visible signals.

use alloc::vec::Vec;

use crate::config::TableConfig;
use crate::error::{MleError, MleResult};
use crate::neighbor::child::Child;
use crate::neighbor::parent::Parent;
use crate::neighbor::peer::{Peer, PeerState};
use crate::types::{ExtAddr, Rloc16};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborTableEvent {
    ChildAdded,
    ChildRemoved,
    RouterAdded,
    RouterRemoved,
}

pub struct NeighborTable {
    children: Vec<Child>,
    pub parent: Parent,
    pub parent_candidate: Parent,
    events: Vec<(NeighborTableEvent, Peer)>,
}

impl NeighborTable {
    pub fn new(config: TableConfig) -> Self {
        let children = (0..config.max_children).map(Child::new).collect();
        Self {
            children,
            parent: Parent::new(),
            parent_candidate: Parent::new(),
            events: Vec::new(),
        }
    }

    /// Find a free slot (state `Invalid`) and return it reset, or
    /// `NoBufs` when the table is full.
    pub fn new_child(&mut self) -> MleResult<&mut Child> {
        let slot = self.children.iter().position(|c| !c.is_in_use()).ok_or_else(|| {
            log::warn!("neighbor table: full at {} children, rejecting new child", self.children.len());
            MleError::NoBufs
        })?;
        self.children[slot].reset();
        log::debug!("neighbor table: admitted child into slot {slot}");
        Ok(&mut self.children[slot])
    }

    pub fn get_child_at_index(&mut self, index: usize) -> Option<&mut Child> {
        self.children.get_mut(index)
    }

    pub fn find_child_by_ext_address(&mut self, addr: ExtAddr) -> Option<&mut Child> {
        self.children
            .iter_mut()
            .find(|c| c.is_in_use() && c.peer.ext_addr == addr)
    }

    pub fn find_child_by_short_address(&mut self, rloc16: Rloc16) -> Option<&mut Child> {
        self.children
            .iter_mut()
            .find(|c| c.is_in_use() && c.peer.rloc16 == rloc16)
    }

    /// Search children, then parent, then parent-candidate, for the
    /// neighbor matching `addr`. Covers every `Peer`-bearing entity the
    /// table owns, per spec §4.1.
    pub fn find_by_ext_address(&mut self, addr: ExtAddr) -> Option<&mut Peer> {
        if let Some(idx) = self
            .children
            .iter()
            .position(|c| c.is_in_use() && c.peer.ext_addr == addr)
        {
            return Some(&mut self.children[idx].peer);
        }
        if self.parent.is_in_use() && self.parent.peer.ext_addr == addr {
            return Some(&mut self.parent.peer);
        }
        if self.parent_candidate.is_in_use() && self.parent_candidate.peer.ext_addr == addr {
            return Some(&mut self.parent_candidate.peer);
        }
        None
    }

    pub fn find_by_short_address(&mut self, rloc16: Rloc16) -> Option<&mut Peer> {
        if let Some(idx) = self
            .children
            .iter()
            .position(|c| c.is_in_use() && c.peer.rloc16 == rloc16)
        {
            return Some(&mut self.children[idx].peer);
        }
        if self.parent.is_in_use() && self.parent.peer.rloc16 == rloc16 {
            return Some(&mut self.parent.peer);
        }
        if self.parent_candidate.is_in_use() && self.parent_candidate.peer.rloc16 == rloc16 {
            return Some(&mut self.parent_candidate.peer);
        }
        None
    }

    pub fn iterate(&self, state_filter: impl Fn(PeerState) -> bool) -> impl Iterator<Item = &Child> {
        self.children
            .iter()
            .filter(move |c| state_filter(c.peer.state))
    }

    pub fn iterate_mut(
        &mut self,
        state_filter: impl Fn(PeerState) -> bool,
    ) -> impl Iterator<Item = &mut Child> {
        self.children
            .iter_mut()
            .filter(move |c| state_filter(c.peer.state))
    }

    pub fn is_child(&self, peer: &Peer) -> bool {
        self.children
            .iter()
            .any(|c| c.is_in_use() && c.peer.ext_addr == peer.ext_addr)
    }

    pub fn child_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_in_use()).count()
    }

    pub fn remove_child(&mut self, addr: ExtAddr) {
        if let Some(child) = self.find_child_by_ext_address(addr) {
            let peer = child.peer;
            child.reset();
            log::debug!("neighbor table: evicted child {:?}", peer.ext_addr);
            self.events.push((NeighborTableEvent::ChildRemoved, peer));
        }
    }

    pub fn note_child_added(&mut self, peer: Peer) {
        self.events.push((NeighborTableEvent::ChildAdded, peer));
    }

    pub fn note_router_added(&mut self, peer: Peer) {
        self.events.push((NeighborTableEvent::RouterAdded, peer));
    }

    pub fn note_router_removed(&mut self, peer: Peer) {
        self.events.push((NeighborTableEvent::RouterRemoved, peer));
    }

    /// Pull-model drain: the owning core context calls this once per
    /// tick and dispatches to observers.
    pub fn drain_events(&mut self) -> Vec<(NeighborTableEvent, Peer)> {
        core::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_child_returns_no_bufs_once_full() {
        let config = TableConfig {
            max_children: 2,
            ..TableConfig::default()
        };
        let mut table = NeighborTable::new(config);
        table.new_child().unwrap().peer.ext_addr = [1; 8];
        table.new_child().unwrap().peer.ext_addr = [2; 8];
        assert_eq!(table.new_child().unwrap_err(), MleError::NoBufs);
    }

    #[test]
    fn at_most_one_child_per_extended_address() {
        let mut table = NeighborTable::new(TableConfig::default());
        let addr = [7; 8];
        let child = table.new_child().unwrap();
        child.peer.ext_addr = addr;
        child.peer.state = PeerState::Valid;
        assert!(table.find_child_by_ext_address(addr).is_some());
        assert_eq!(
            table
                .iterate(|s| s == PeerState::Valid)
                .filter(|c| c.peer.ext_addr == addr)
                .count(),
            1
        );
    }

    #[test]
    fn removing_a_child_frees_its_slot_and_emits_event() {
        let mut table = NeighborTable::new(TableConfig::default());
        let addr = [9; 8];
        table.new_child().unwrap().peer.ext_addr = addr;
        table.remove_child(addr);
        let events = table.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, NeighborTableEvent::ChildRemoved);
        assert!(table.find_child_by_ext_address(addr).is_none());
    }
}
