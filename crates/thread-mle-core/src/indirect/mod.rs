//! Indirect Sender (C4, spec §4.4). Per-sleepy-peer message queue built
//! on top of the host-owned mesh-forwarder arena: this module only ever
//! touches a message's per-child bit, never the message bytes.

pub mod frame;
pub mod queue;

use crate::mesh_forwarder::{MeshForwarder, MessageId};
use crate::neighbor::{Child, DeviceMode};

pub use frame::{plan_frame, IndirectFramePlan};

/// Tag a message for delivery to `child`. If the peer's currently
/// active indirect message is `None`, this becomes the new one.
pub fn add_message<F: MeshForwarder>(forwarder: &mut F, message: MessageId, child: &mut Child) {
    forwarder.set_bit(message, child.child_index);
    if child.indirect.current_message.is_none() && !child.indirect.waiting_for_message_update {
        child.indirect.current_message = Some(message);
        child.indirect.fragment_offset = 0;
    }
}

/// Untag a message for `child`. If it was the active indirect message,
/// a purge is requested immediately (spec §4.4 invariant: "the Child's
/// currently active indirect message is always either `None` or a
/// message whose bitmask still contains the Child's index").
pub fn remove_message<F: MeshForwarder>(forwarder: &mut F, message: MessageId, child: &mut Child) {
    forwarder.clear_bit(message, child.child_index);
    if child.indirect.current_message == Some(message) {
        frame::request_message_update(child);
        child.indirect.current_message = None;
    }
}

/// Untag every message queued for `child`.
pub fn clear_all<F: MeshForwarder>(forwarder: &mut F, child: &mut Child) {
    let mut guard = queue::queued_count(forwarder, child);
    while guard > 0 {
        let Some(message) = forwarder.find_queued(child.child_index) else {
            break;
        };
        remove_message(forwarder, message, child);
        guard -= 1;
    }
}

/// First queued message for `child` that satisfies `predicate`.
pub fn find_queued<F: MeshForwarder>(
    forwarder: &F,
    child: &Child,
    mut predicate: impl FnMut(MessageId) -> bool,
) -> Option<MessageId> {
    forwarder
        .find_queued(child.child_index)
        .filter(|&message| predicate(message))
}

pub fn set_use_short_address(child: &mut Child, use_short_address: bool) {
    child.indirect.use_short_address = use_short_address;
}

/// Drive the sleepy↔rx-on transition rule (spec §4.4): going sleepy→
/// rx-on converts every queued indirect message to direct (bit cleared)
/// and clears the active pointer; the reverse transition leaves already
/// -queued direct messages alone (new enqueues just go indirect again
/// via [`add_message`]).
pub fn on_child_mode_change<F: MeshForwarder>(forwarder: &mut F, child: &mut Child, old_mode: DeviceMode) {
    let was_sleepy = !old_mode.rx_on_when_idle();
    let now_rx_on = child.device_mode.rx_on_when_idle();
    if was_sleepy && now_rx_on {
        clear_all(forwarder, child);
    }
}
