//! End-to-end scenarios composing several components through
//! `CoreContext` and the public module APIs (spec §8).

extern crate alloc;

use alloc::collections::BTreeMap;

use thread_mle_core::codec::tlv::TlvType;
use thread_mle_core::config::NodeConfig;
use thread_mle_core::context::CoreContext;
use thread_mle_core::csl::tx_scheduler::reschedule;
use thread_mle_core::csl::{CslCandidateId, CslTarget};
use thread_mle_core::error::MleResult;
use thread_mle_core::indirect;
use thread_mle_core::mesh_forwarder::{MeshForwarder, MessageId};
use thread_mle_core::mle::attach::{best_candidate, AttachMode, ParentCandidate};
use thread_mle_core::mle::DeviceRole;
use thread_mle_core::neighbor::{Child, CslInfo, DeviceMode, PeerState};
use thread_mle_core::subchild;
use thread_mle_core::types::{Frame, TxResult};

/// Duplicate of the private `indirect::tests::FakeForwarder` double:
/// the integration tests live in a separate crate target and cannot
/// reach a `#[cfg(test)]` module of the library crate.
#[derive(Default)]
struct FakeForwarder {
    next_id: u32,
    bitmasks: BTreeMap<u32, Vec<usize>>,
    removed: Vec<u32>,
}

impl MeshForwarder for FakeForwarder {
    fn enqueue(&mut self, _payload: &[u8], child_index: usize) -> MleResult<MessageId> {
        let id = self.next_id;
        self.next_id += 1;
        self.bitmasks.insert(id, vec![child_index]);
        Ok(MessageId(id))
    }

    fn is_bit_set(&self, message: MessageId, child_index: usize) -> bool {
        self.bitmasks
            .get(&message.0)
            .map(|bits| bits.contains(&child_index))
            .unwrap_or(false)
    }

    fn set_bit(&mut self, message: MessageId, child_index: usize) {
        let entry = self.bitmasks.entry(message.0).or_default();
        if !entry.contains(&child_index) {
            entry.push(child_index);
        }
    }

    fn clear_bit(&mut self, message: MessageId, child_index: usize) {
        if let Some(entry) = self.bitmasks.get_mut(&message.0) {
            entry.retain(|&i| i != child_index);
        }
    }

    fn queued_count(&self, child_index: usize) -> usize {
        self.bitmasks
            .values()
            .filter(|bits| bits.contains(&child_index))
            .count()
    }

    fn find_queued(&self, child_index: usize) -> Option<MessageId> {
        self.bitmasks
            .iter()
            .find(|(_, bits)| bits.contains(&child_index))
            .map(|(id, _)| MessageId(*id))
    }

    fn prepare_fragment(
        &self,
        _message: MessageId,
        _fragment_offset: u16,
        _out: &mut Frame,
    ) -> MleResult<Option<u16>> {
        Ok(None)
    }

    fn remove(&mut self, message: MessageId, child_index: usize) {
        self.clear_bit(message, child_index);
        if self.bitmasks.get(&message.0).map(Vec::is_empty).unwrap_or(false) {
            self.removed.push(message.0);
        }
    }
}

fn connectivity_candidate(rloc16: u16) -> ParentCandidate {
    ParentCandidate {
        ext_addr: [1; 8],
        rloc16,
        link_margin_db: 20,
        link_quality_class: 2,
        is_router: true,
        parent_priority: 0,
        connectivity_lq3_count: 1,
        connectivity_lq2_count: 0,
        connectivity_lq1_count: 0,
        protocol_version: 3,
        sed_buffer_size: 0,
        sed_datagram_count: 0,
        parent_csl_power_metric: None,
    }
}

/// Scenario 1, "fresh attach": a freshly enabled device, offered a
/// single router connectivity candidate, selects it and transitions to
/// Child with the assigned RLOC16.
#[test]
fn fresh_attach_selects_the_sole_candidate_and_becomes_child() {
    let mut context = CoreContext::new(NodeConfig::default());
    context.mle.enable().unwrap();
    context.mle.start(AttachMode::AnyPartition).unwrap();
    context.mle.attach.begin_parent_request_phase();
    context.mle.attach.on_parent_response(connectivity_candidate(0x6c01));

    let chosen = context.mle.attach.select_parent(false).expect("one candidate was offered");
    assert_eq!(chosen.rloc16, 0x6c01);

    context.complete_attach(&chosen, 0x6c02, 5);
    assert_eq!(context.mle.get_role(), DeviceRole::Child);
    assert_eq!(context.mle.own_rloc16, 0x6c02);

    let parent = context.get_parent_info().expect("parent is populated after attach");
    assert_eq!(parent.peer.ext_addr, chosen.ext_addr);
    assert_eq!(parent.peer.rloc16, chosen.rloc16);
}

/// Scenario 2, "key-sequence jump": a Peer-class message with a 5-step
/// key-sequence increase from a Valid neighbor does not satisfy the
/// one-step adoption rule, so link re-establishment (not silent
/// adoption) is the expected path.
#[test]
fn large_key_sequence_jump_from_a_valid_peer_does_not_silently_adopt() {
    use thread_mle_core::mle::{should_adopt_key_sequence, MessageClass};

    let current = 10u32;
    let jumped = current + 5;
    assert!(!should_adopt_key_sequence(MessageClass::Peer, PeerState::Valid, current, jumped));

    let authoritative_equivalent = should_adopt_key_sequence(
        MessageClass::Authoritative,
        PeerState::Valid,
        current,
        jumped,
    );
    assert!(authoritative_equivalent);
}

/// Scenario 3, "CSL scheduling": the worked example from spec §8.3.
#[test]
fn csl_scheduling_matches_the_worked_example() {
    let mut csl_info = CslInfo::new();
    csl_info.period = 500;
    csl_info.phase = 0;
    csl_info.last_rx_timestamp_us = 10_000_000;

    let targets = [CslTarget {
        id: CslCandidateId::Child(0),
        csl_info,
        queued_indirect_messages: 1,
    }];

    let window = reschedule(&targets, 10_012_345, 2_000).expect("one synchronized target with work queued");
    assert_eq!(window.absolute_time_us, 10_015_000);
    assert_eq!(window.delay_us, 655);
}

/// Scenario 4, "indirect retry": two messages queued for a sleepy
/// child; three consecutive `NoAck`s on the first exhaust its attempts,
/// after which the second becomes current.
#[test]
fn indirect_retry_exhausts_and_advances_to_the_next_message() {
    use thread_mle_core::csl::tx_scheduler::on_sent_frame_result;
    use thread_mle_core::config::CslConfig;

    let mut forwarder = FakeForwarder::default();
    let mut child = Child::new(5);
    child.peer.state = PeerState::Valid;

    let first = forwarder.enqueue(b"first", 5).unwrap();
    let second = forwarder.enqueue(b"second", 5).unwrap();
    indirect::add_message(&mut forwarder, first, &mut child);
    indirect::add_message(&mut forwarder, second, &mut child);
    assert_eq!(child.indirect.current_message, Some(first));

    let config = CslConfig { max_csl_triggered_attempts: 3, ..CslConfig::default() };
    let mut csl_attempts = 0u8;
    let mut indirect_attempts = 0u8;
    for expected in 1..=3u8 {
        on_sent_frame_result(
            &config,
            &mut csl_attempts,
            &mut indirect_attempts,
            &mut child.csl_info,
            TxResult::NoAck,
        );
        assert_eq!(csl_attempts, expected);
    }
    assert!(csl_attempts >= config.max_csl_triggered_attempts);

    indirect::remove_message(&mut forwarder, first, &mut child);
    let next = indirect::find_queued(&forwarder, &child, |_| true);
    assert_eq!(next, Some(second));
}

/// Scenario 5, "graceful detach round-trip": the callback fires exactly
/// once, whether or not the parent's response arrives before the
/// timeout.
#[test]
fn graceful_detach_round_trip_fires_callback_exactly_once() {
    let mut context = CoreContext::new(NodeConfig::default());
    context.mle.enable().unwrap();
    context.mle.become_child(0x6c01);
    context.mle.detach_gracefully(0);

    let mut callbacks = 0;
    // Response arrives at 120 ms, well inside the default timeout.
    if context.mle.poll_graceful_detach(120, true) {
        callbacks += 1;
    }
    if context.mle.poll_graceful_detach(200, false) {
        callbacks += 1;
    }
    assert_eq!(callbacks, 1);
    assert_eq!(context.mle.get_role(), DeviceRole::Detached);
}

/// Scenario 6, "sub-child forwarding": a three-node chain FTD (0x2800)
/// <- direct MTD (0x2810, prefix_length=4) <- sub-child MTD (0x2811).
/// The direct MTD must recognize 0x2811 as reachable under its own
/// sub-child slot and pick it as the forwarding next hop.
#[test]
fn sub_child_forwarding_locates_the_correct_next_hop() {
    assert!(subchild::is_sub_child_of(0x2811, 0x2811, 8));

    let mut sub_child = Child::new(0);
    sub_child.peer.state = PeerState::Valid;
    sub_child.peer.rloc16 = 0x2811;
    sub_child.device_mode = DeviceMode(0);

    let mut unrelated = Child::new(1);
    unrelated.peer.state = PeerState::Valid;
    unrelated.peer.rloc16 = 0x2820;

    let children = [sub_child, unrelated];
    let hop = subchild::find_next_hop(children.iter(), 0x2811, 4).expect("sub-child slot matches");
    assert_eq!(hop.peer.rloc16, 0x2811);
}

/// Ranking cascade sanity check supporting scenario 1: a REED never
/// outranks a router candidate of equal link quality (spec §4.8.4b).
#[test]
fn connectivity_ranking_prefers_routers_at_equal_link_quality() {
    let router = connectivity_candidate(0x4000);
    let reed = ParentCandidate { is_router: false, ..connectivity_candidate(0x4400) };
    let best = best_candidate(false, &[reed, router]).unwrap();
    assert_eq!(best.rloc16, 0x4000);
}

/// Sub-child address-registration invariant spot-check (SPEC_FULL §2
/// supplement: DAD-pending must clear before the address is trusted).
#[test]
fn registered_address_starts_dad_pending_until_cleared() {
    let mut child = Child::new(0);
    let mesh_local_eid = [0xfdu8; 16];
    let mut addr = [0u8; 16];
    addr[15] = 7;
    child.register_address(addr, mesh_local_eid, 10).unwrap();
    assert!(child.registered_addresses[0].dad_pending);
    child.clear_dad_pending(addr);
    assert!(!child.registered_addresses[0].dad_pending);
}

/// TLV round-trip property (spec §8): a handful of representative TLVs
/// survive an append/read cycle unchanged.
#[test]
fn tlv_round_trip_preserves_representative_tlvs() {
    use thread_mle_core::codec::tlv::{append_tlv, read_all};

    let mut buf = Vec::new();
    append_tlv(&mut buf, TlvType::SourceAddress, &[0x12, 0x34]).unwrap();
    append_tlv(&mut buf, TlvType::Timeout, &[0, 0, 0, 240]).unwrap();
    append_tlv(&mut buf, TlvType::Challenge, &[0xaa; 8]).unwrap();

    let tlvs = read_all(&buf).unwrap();
    assert_eq!(tlvs.len(), 3);
    assert_eq!(tlvs[0].0, TlvType::SourceAddress);
    assert_eq!(tlvs[0].1, vec![0x12, 0x34]);
    assert_eq!(tlvs[2].0, TlvType::Challenge);
    assert_eq!(tlvs[2].1, vec![0xaa; 8]);
}
