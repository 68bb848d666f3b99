//! Core context (Design Notes §9): the one aggregate value that owns
//! every table and timer MLE, the indirect sender, and CSL share,
//! replacing the teacher's `Get<X>()`-style singletons with fields
//! passed down from a single root instead of reached for globally.

use alloc::vec::Vec;

use crate::codec::MleCommand;
use crate::config::NodeConfig;
use crate::csl::{CslCandidateId, CslTarget, CslTxScheduler};
use crate::delayed_sender::{DelayedSchedule, DelayedSender};
use crate::error::{MleError, MleResult};
use crate::indirect::queue;
use crate::mesh_forwarder::MeshForwarder;
use crate::mle::attach::ParentCandidate;
use crate::mle::{self, incoming, FrameAcceptance, MleCore};
use crate::neighbor::parent::Parent;
use crate::neighbor::peer::{Peer, PeerState};
use crate::neighbor::{DeviceMode, NeighborTable};
use crate::retx::{RetxAction, RetxTracker};
use crate::subchild::DetachPending;
use crate::types::{ExtAddr, KeySequence, Rloc16};

/// Owns the child table, the MLE state machine, both timed subsystems
/// (retransmission tracker, delayed sender) and the CSL tx scheduler.
/// `thread-mle-transport` holds exactly one of these per node.
pub struct CoreContext {
    pub config: NodeConfig,
    pub mle: MleCore,
    pub neighbors: NeighborTable,
    pub retx: RetxTracker,
    pub delayed_sender: DelayedSender,
    pub csl_tx: CslTxScheduler,
    /// Sub-children this node (as a sub-child parent, C9) is in the
    /// process of removing. Empty unless `config.sub_child.enabled`.
    pub sub_child_detach_pending: Vec<DetachPending>,
}

impl CoreContext {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            mle: MleCore::new(config.mle),
            neighbors: NeighborTable::new(config.table),
            retx: RetxTracker::new(config.mle),
            delayed_sender: DelayedSender::new(),
            csl_tx: CslTxScheduler::new(config.csl),
            sub_child_detach_pending: Vec::new(),
            config,
        }
    }

    /// One millisecond tick (spec §5). Drives the retransmission
    /// tracker first; `RetxAction::Detach` is applied to the MLE core
    /// immediately so the caller never needs to remember to. The
    /// delayed sender's due records are drained separately via
    /// [`Self::drain_delayed`] so the caller can dispatch on message
    /// type before this context's state changes further.
    pub fn tick(&mut self, now_ms: u64) -> Vec<RetxAction> {
        let rx_on_when_idle = DeviceMode(self.mle.device_mode).rx_on_when_idle();
        let actions = self.retx.tick(now_ms, rx_on_when_idle);
        for action in &actions {
            if *action == RetxAction::Detach {
                self.mle.become_detached();
            }
        }
        actions
    }

    pub fn drain_delayed(&mut self, now_ms: u64) -> Vec<DelayedSchedule> {
        self.delayed_sender.drain_due(now_ms)
    }

    /// Install `peer` as the current parent, drop the transient
    /// candidate, move MLE to `Child` with `own_rloc16`, and arm the
    /// keep-alive timer (spec §4.8 point 6). Shared by
    /// [`Self::complete_attach`] and
    /// [`Self::complete_attach_from_selected_candidate`] — the only two
    /// places a full attach cycle can end.
    fn install_parent(&mut self, peer: Peer, own_rloc16: Rloc16, now_ms: u64) {
        let parent_rloc16 = peer.rloc16;
        self.neighbors.parent = Parent {
            peer,
            ..Parent::new()
        };
        self.neighbors.parent_candidate.invalidate();

        self.mle.become_child(own_rloc16);
        self.retx.on_role_change_to_child(now_ms, self.mle.timeout_sec);
        log::info!(
            "context: attach complete, parent {:#06x}, own rloc16 {:#06x}",
            parent_rloc16,
            own_rloc16
        );
    }

    /// Finish the attach cycle (spec §4.8 point 6, "On ChildIdResponse")
    /// when the caller already has the winning [`ParentCandidate`] in
    /// hand, e.g. `attach.select_parent` returned it directly within the
    /// same tick as the ChildIdResponse.
    pub fn complete_attach(&mut self, candidate: &ParentCandidate, own_rloc16: Rloc16, now_ms: u64) {
        let mut peer = Peer::new(candidate.ext_addr);
        peer.rloc16 = candidate.rloc16;
        peer.state = PeerState::Valid;
        peer.key_sequence = self.mle.key_sequence;
        peer.link_quality_in = candidate.link_quality_class;
        peer.link_quality_out = candidate.link_quality_class;
        peer.touch(now_ms);
        self.install_parent(peer, own_rloc16, now_ms);
    }

    /// Hold `candidate` in the transient parent-candidate slot (spec
    /// §4.8 point 4 -> 5, between `select_parent` and the matching
    /// ChildIdResponse) so [`Self::complete_attach_from_selected_candidate`]
    /// has something to promote once the response arrives.
    pub fn note_selected_parent_candidate(&mut self, candidate: &ParentCandidate, now_ms: u64) {
        let mut peer = Peer::new(candidate.ext_addr);
        peer.rloc16 = candidate.rloc16;
        peer.state = PeerState::ParentResponse;
        peer.key_sequence = self.mle.key_sequence;
        peer.link_quality_in = candidate.link_quality_class;
        peer.link_quality_out = candidate.link_quality_class;
        peer.touch(now_ms);
        self.neighbors.parent_candidate = Parent {
            peer,
            ..Parent::new()
        };
    }

    /// Finish the attach cycle from the parent-candidate slot
    /// [`Self::note_selected_parent_candidate`] populated, on receipt of
    /// the matching ChildIdResponse. `NotFound` if no candidate was ever
    /// recorded — a response arriving outside an attach cycle.
    pub fn complete_attach_from_selected_candidate(&mut self, own_rloc16: Rloc16, now_ms: u64) -> MleResult<()> {
        if !self.neighbors.parent_candidate.is_in_use() {
            return Err(MleError::NotFound);
        }
        let mut peer = self.neighbors.parent_candidate.peer;
        peer.state = PeerState::Valid;
        peer.touch(now_ms);
        self.install_parent(peer, own_rloc16, now_ms);
        Ok(())
    }

    /// `get_parent_info()` (spec §4.8 public operations): the current
    /// parent, or `None` while detached/disabled.
    pub fn get_parent_info(&self) -> Option<&Parent> {
        self.neighbors.parent.is_in_use().then_some(&self.neighbors.parent)
    }

    /// Dispatch an authenticated MLE command (spec §4.8): `tlvs` is
    /// already decrypted and `command` already authenticated by the
    /// AEAD tag over the associated data — decoding the secured
    /// datagram and locating the link key for `source_ext_addr` is the
    /// transport's job, since no key-management collaborator is named
    /// for this core to reach on its own. This is the frame-counter /
    /// key-sequence gate plus the small set of handlers that drive
    /// attach completion and the retransmission tracker.
    pub fn handle_authenticated_message(
        &mut self,
        source_ext_addr: ExtAddr,
        msg_key_seq: KeySequence,
        msg_frame_counter: u32,
        command: MleCommand,
        tlvs: &[u8],
        now_ms: u64,
    ) -> MleResult<()> {
        let class = mle::classify_command(command);

        if let Some(peer) = self.neighbors.find_by_ext_address(source_ext_addr) {
            match mle::check_frame_counter(peer.key_sequence, peer.mle_frame_counter, msg_key_seq, msg_frame_counter) {
                FrameAcceptance::Duplicate { update_radio_info } => {
                    if update_radio_info {
                        peer.touch(now_ms);
                    }
                    log::trace!("context: dropping duplicate frame from {:?}", source_ext_addr);
                    return Ok(());
                }
                FrameAcceptance::AdoptNewKeySequence => {
                    if !mle::should_adopt_key_sequence(class, peer.state, peer.key_sequence, msg_key_seq) {
                        log::warn!("context: rejecting key-sequence jump from {:?}", source_ext_addr);
                        return Err(MleError::Security);
                    }
                    peer.key_sequence = msg_key_seq;
                }
                FrameAcceptance::Accept => {}
            }
            peer.mle_frame_counter = msg_frame_counter;
            peer.touch(now_ms);
        }

        match command {
            MleCommand::ParentResponse => {
                let is_router = self.mle.attach.routers_only;
                let candidate = incoming::parent_candidate_from_tlvs(source_ext_addr, tlvs, is_router)?;
                self.mle.attach.on_parent_response(candidate);
                Ok(())
            }
            MleCommand::ChildIdResponse => {
                let own_rloc16 = incoming::own_rloc16_from_tlvs(tlvs)?;
                self.complete_attach_from_selected_candidate(own_rloc16, now_ms)
            }
            MleCommand::ChildUpdateResponse => {
                self.retx.on_child_update_response_rx(now_ms, self.mle.timeout_sec);
                Ok(())
            }
            MleCommand::DataResponse => {
                self.retx.on_data_request_satisfied();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Assemble the live `targets` slice the CSL tx scheduler (C5)
    /// reschedules against (spec §4.5): every child in any state except
    /// `Invalid`, plus the parent and parent-candidate when this node is
    /// itself a sub-child (C9). Indirect queue depth for the parent/
    /// parent-candidate slots is always 0 — this node has no modeled
    /// outgoing-to-parent indirect queue, only the downstream-to-child
    /// one `MeshForwarder` tracks.
    pub fn collect_csl_targets<F: MeshForwarder>(&self, forwarder: &F) -> alloc::vec::Vec<CslTarget> {
        let mut targets: alloc::vec::Vec<CslTarget> = self
            .neighbors
            .iterate(|state| state != PeerState::Invalid)
            .map(|child| CslTarget {
                id: CslCandidateId::Child(child.child_index),
                csl_info: child.csl_info,
                queued_indirect_messages: queue::queued_count(forwarder, child),
            })
            .collect();

        if self.config.sub_child.enabled {
            if self.neighbors.parent.is_in_use() {
                targets.push(CslTarget {
                    id: CslCandidateId::Parent,
                    csl_info: self.neighbors.parent.csl_info,
                    queued_indirect_messages: 0,
                });
            }
            if self.neighbors.parent_candidate.is_in_use() {
                targets.push(CslTarget {
                    id: CslCandidateId::ParentCandidate,
                    csl_info: self.neighbors.parent_candidate.csl_info,
                    queued_indirect_messages: 0,
                });
            }
        }

        targets
    }

    /// `disable()` fan-out (spec §5): dequeue/free delayed-sender
    /// records, clear both retry tracks, drop CSL scheduling state, and
    /// abandon any in-flight sub-child detach-pending tracking.
    pub fn disable(&mut self) -> MleResult<()> {
        self.mle.disable()?;
        self.delayed_sender.clear();
        self.retx = RetxTracker::new(self.config.mle);
        self.csl_tx.clear_current();
        self.sub_child_detach_pending.clear();
        Ok(())
    }

    /// Advance every in-flight sub-child detach-pending tracker,
    /// returning the child indices now due for invalidation (spec
    /// §4.9 "Detach-pending").
    pub fn poll_sub_child_detach_pending(&mut self, now_ms: u64) -> Vec<usize> {
        let mut due = Vec::new();
        self.sub_child_detach_pending.retain(|pending| {
            if pending.should_invalidate(now_ms) {
                due.push(pending.child_index);
                false
            } else {
                true
            }
        });
        due
    }
}
