//! Delayed Sender (C3, spec §4.3). A timed outbound queue of MLE
//! messages, keyed by (message type, destination), with coalescing
//! rules and a single "fire everything due" entry point driven by the
//! millisecond tick.

use alloc::vec::Vec;

use crate::types::Ipv6Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayedMessageType {
    DataRequest,
    ChildUpdateRequestAsChild,
    ParentResponse,
    Advertisement,
    DataResponse,
    LinkAccept,
    LinkRequest,
    DiscoveryResponse,
}

impl DelayedMessageType {
    /// Types that coalesce: a `schedule` call is a no-op if a matching
    /// record is already outstanding.
    fn coalesces(self) -> bool {
        matches!(
            self,
            Self::DataRequest
                | Self::ChildUpdateRequestAsChild
                | Self::Advertisement
                | Self::LinkRequest
        )
    }

    /// Types that instead replace: any existing matching record is
    /// removed first, then the new one is added.
    fn replaces(self) -> bool {
        matches!(self, Self::ParentResponse | Self::DataResponse | Self::LinkAccept)
    }
}

/// Reified variant payload for schedule records that need extra context
/// at dispatch time (Design Notes §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayedPayload {
    None,
    ParentResponseInfo { challenge: [u8; 8] },
    LinkAcceptInfo { challenge: [u8; 8] },
    DiscoveryResponseInfo { pan_id: u16 },
    RouterRloc16(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedSchedule {
    pub send_time_ms: u64,
    pub destination: Ipv6Addr,
    pub message_type: DelayedMessageType,
    pub payload: DelayedPayload,
}

#[derive(Default)]
pub struct DelayedSender {
    records: Vec<DelayedSchedule>,
}

impl DelayedSender {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn has_matching_schedule(&self, message_type: DelayedMessageType, destination: Ipv6Addr) -> bool {
        self.records
            .iter()
            .any(|r| r.message_type == message_type && r.destination == destination)
    }

    pub fn remove_matching(&mut self, message_type: DelayedMessageType, destination: Ipv6Addr) {
        self.records
            .retain(|r| !(r.message_type == message_type && r.destination == destination));
    }

    pub fn schedule(
        &mut self,
        message_type: DelayedMessageType,
        destination: Ipv6Addr,
        now_ms: u64,
        delay_ms: u64,
        payload: DelayedPayload,
    ) {
        if message_type.coalesces() && self.has_matching_schedule(message_type, destination) {
            return;
        }
        if message_type.replaces() {
            self.remove_matching(message_type, destination);
        }
        self.records.push(DelayedSchedule {
            send_time_ms: now_ms + delay_ms,
            destination,
            message_type,
            payload,
        });
    }

    /// Minimum outstanding `send_time`, the next-fire timer value.
    pub fn next_fire_ms(&self) -> Option<u64> {
        self.records.iter().map(|r| r.send_time_ms).min()
    }

    /// Dequeue every record due at or before `now_ms`. Order among
    /// records firing in the same tick is unspecified (spec §5).
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<DelayedSchedule> {
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.records.len());
        for record in self.records.drain(..) {
            if record.send_time_ms <= now_ms {
                due.push(record);
            } else {
                remaining.push(record);
            }
        }
        self.records = remaining;
        due
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEST: Ipv6Addr = [1; 16];

    #[test]
    fn coalescing_types_are_idempotent() {
        let mut sender = DelayedSender::new();
        sender.schedule(DelayedMessageType::DataRequest, DEST, 0, 100, DelayedPayload::None);
        sender.schedule(DelayedMessageType::DataRequest, DEST, 0, 500, DelayedPayload::None);
        assert_eq!(sender.len(), 1);
        assert_eq!(sender.next_fire_ms(), Some(100));
    }

    #[test]
    fn replacing_types_overwrite_existing_record() {
        let mut sender = DelayedSender::new();
        sender.schedule(
            DelayedMessageType::ParentResponse,
            DEST,
            0,
            100,
            DelayedPayload::ParentResponseInfo { challenge: [1; 8] },
        );
        sender.schedule(
            DelayedMessageType::ParentResponse,
            DEST,
            0,
            50,
            DelayedPayload::ParentResponseInfo { challenge: [2; 8] },
        );
        assert_eq!(sender.len(), 1);
        assert_eq!(sender.next_fire_ms(), Some(50));
    }

    #[test]
    fn drain_due_only_removes_expired_records() {
        let mut sender = DelayedSender::new();
        sender.schedule(DelayedMessageType::DataRequest, DEST, 0, 100, DelayedPayload::None);
        sender.schedule(DelayedMessageType::LinkRequest, DEST, 0, 300, DelayedPayload::None);
        let due = sender.drain_due(150);
        assert_eq!(due.len(), 1);
        assert_eq!(sender.len(), 1);
    }
}
