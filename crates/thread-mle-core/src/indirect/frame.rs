//! Frame preparation, retransmission continuity, and the replace/purge
//! protocol for indirect transmission (spec §4.4).

use crate::error::MleResult;
use crate::mesh_forwarder::{MeshForwarder, MessageId};
use crate::neighbor::Child;
use crate::types::{Frame, TxResult};

use super::queue;

/// Everything the MAC layer needs to know to transmit (or retransmit)
/// the next indirect frame for a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectFramePlan {
    pub use_short_address: bool,
    pub frame_pending: bool,
    pub is_retransmission: bool,
    pub frame_counter: Option<u32>,
    pub key_id: Option<u32>,
    pub mac_seq: Option<u8>,
    /// No message queued: emit a valid empty ack-requested frame so the
    /// poll response is always delivered (spec §4.4).
    pub empty_ack: bool,
}

/// Build the next outgoing frame for `child`'s data-poll or CSL
/// opportunity.
pub fn plan_frame<F: MeshForwarder>(
    forwarder: &F,
    child: &mut Child,
) -> MleResult<(IndirectFramePlan, Frame)> {
    let frame_pending = queue::queued_count(forwarder, child) > 1;

    let Some(message) = child.indirect.current_message else {
        return Ok((
            IndirectFramePlan {
                use_short_address: child.indirect.use_short_address,
                frame_pending: false,
                is_retransmission: false,
                frame_counter: None,
                key_id: None,
                mac_seq: None,
                empty_ack: true,
            },
            Frame::new(),
        ));
    };

    let mut out = Frame::new();
    let next_offset = forwarder.prepare_fragment(message, child.indirect.fragment_offset, &mut out)?;
    child.indirect.fragment_offset = next_offset.unwrap_or(0);

    let is_retransmission = child.indirect.is_retransmission();
    Ok((
        IndirectFramePlan {
            use_short_address: child.indirect.use_short_address,
            frame_pending,
            is_retransmission,
            frame_counter: is_retransmission.then_some(child.indirect.last_frame_counter),
            key_id: is_retransmission.then_some(child.indirect.last_key_id),
            mac_seq: is_retransmission.then_some(child.indirect.last_mac_seq),
            empty_ack: false,
        },
        out,
    ))
}

/// Record the outcome of an attempted indirect transmission. A success
/// clears the attempt counter (spec §4.4); any other outcome keeps the
/// continuity fields so the next attempt reuses them.
pub fn on_indirect_tx_result(
    child: &mut Child,
    result: TxResult,
    frame_counter: u32,
    key_id: u32,
    mac_seq: u8,
) {
    if result.is_success() {
        child.indirect.indirect_attempts = 0;
    } else {
        child.indirect.indirect_attempts = child.indirect.indirect_attempts.saturating_add(1);
    }
    child.indirect.note_continuity(frame_counter, key_id, mac_seq);
}

/// The peer's current indirect message changed or was removed while a
/// send was in progress: ask the MAC to purge or replace the pending
/// frame.
pub fn request_message_update(child: &mut Child) {
    child.indirect.waiting_for_message_update = true;
}

/// The only path that installs a new `current_message` (spec §4.4
/// "Replace/purge protocol"): invoked once the MAC's `frame_change_done`
/// callback fires.
pub fn frame_change_done(child: &mut Child, new_message: Option<MessageId>) {
    update_indirect_message(child, new_message);
}

fn update_indirect_message(child: &mut Child, new_message: Option<MessageId>) {
    child.indirect.current_message = new_message;
    child.indirect.fragment_offset = 0;
    child.indirect.waiting_for_message_update = false;
    child.indirect.reset_attempts();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retransmission_reuses_prior_continuity_fields() {
        let mut child = Child::new(0);
        child.indirect.current_message = Some(MessageId(1));
        child.indirect.indirect_attempts = 1;
        child.indirect.note_continuity(42, 3, 7);
        assert!(child.indirect.is_retransmission());
        assert_eq!(child.indirect.last_frame_counter, 42);
    }

    #[test]
    fn success_resets_attempt_counter() {
        let mut child = Child::new(0);
        child.indirect.indirect_attempts = 2;
        on_indirect_tx_result(&mut child, TxResult::Success, 1, 1, 1);
        assert_eq!(child.indirect.indirect_attempts, 0);
    }

    #[test]
    fn failure_increments_attempt_counter() {
        let mut child = Child::new(0);
        on_indirect_tx_result(&mut child, TxResult::NoAck, 1, 1, 1);
        on_indirect_tx_result(&mut child, TxResult::NoAck, 1, 1, 1);
        assert_eq!(child.indirect.indirect_attempts, 2);
    }
}
