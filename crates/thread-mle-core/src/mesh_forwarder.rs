//! `MeshForwarder` — stands in for 6LoWPAN/IP fragmentation and the
//! direct-tx send queue (spec §1, out of scope here). The indirect
//! sender (C4) and CSL tx scheduler (C5) drive frame preparation through
//! this trait; the arena of in-flight messages and their per-child
//! bitmasks is owned by the host implementation, per the Design Notes
//! "arena of messages with stable indices" guidance.

use crate::error::MleResult;
use crate::types::Frame;

/// Stable handle into the mesh forwarder's message arena. Indices are
/// reused only after a message is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u32);

pub trait MeshForwarder {
    /// Enqueue `payload` for the given child index (bit set in its
    /// arena-owned bitmask); returns the new message's id.
    fn enqueue(&mut self, payload: &[u8], child_index: usize) -> MleResult<MessageId>;

    /// Whether `child_index`'s bit is still set on `message`.
    fn is_bit_set(&self, message: MessageId, child_index: usize) -> bool;

    fn set_bit(&mut self, message: MessageId, child_index: usize);
    fn clear_bit(&mut self, message: MessageId, child_index: usize);

    /// Number of messages with `child_index`'s bit set.
    fn queued_count(&self, child_index: usize) -> usize;

    /// Find the next queued message id for `child_index`, if any.
    fn find_queued(&self, child_index: usize) -> Option<MessageId>;

    /// Build an 802.15.4 data frame (without mesh header) for `message`
    /// starting at `fragment_offset`, writing it into `out`. Returns the
    /// new fragment offset to resume from on the next call, or `None`
    /// when the message's final fragment was written.
    fn prepare_fragment(
        &self,
        message: MessageId,
        fragment_offset: u16,
        out: &mut Frame,
    ) -> MleResult<Option<u16>>;

    /// Remove `child_index`'s bit; frees the message once its bitmask is
    /// empty and no direct-tx flag is set.
    fn remove(&mut self, message: MessageId, child_index: usize);
}
