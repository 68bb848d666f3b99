//! Local operational counters, mirroring the teacher's `RouterStats`
//! pattern: a plain stats struct sitting next to the state machine,
//! incremented inline, with no external metrics exporter wired up.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MleCounters {
    pub parent_requests_sent: u32,
    pub child_id_requests_sent: u32,
    pub attach_successes: u32,
    pub attach_failures: u32,
    pub detaches: u32,
    pub security_drops: u32,
    pub duplicate_drops: u32,
    pub parse_drops: u32,
    pub csl_resyncs: u32,
    pub csl_desyncs: u32,
    pub indirect_tx_failures: u32,
    pub indirect_tx_successes: u32,
}

impl MleCounters {
    pub const fn new() -> Self {
        Self {
            parent_requests_sent: 0,
            child_id_requests_sent: 0,
            attach_successes: 0,
            attach_failures: 0,
            detaches: 0,
            security_drops: 0,
            duplicate_drops: 0,
            parse_drops: 0,
            csl_resyncs: 0,
            csl_desyncs: 0,
            indirect_tx_failures: 0,
            indirect_tx_successes: 0,
        }
    }

    pub fn on_parent_request_sent(&mut self) {
        self.parent_requests_sent = self.parent_requests_sent.saturating_add(1);
    }

    pub fn on_child_id_request_sent(&mut self) {
        self.child_id_requests_sent = self.child_id_requests_sent.saturating_add(1);
    }

    pub fn on_attach_success(&mut self) {
        self.attach_successes = self.attach_successes.saturating_add(1);
    }

    pub fn on_attach_failure(&mut self) {
        self.attach_failures = self.attach_failures.saturating_add(1);
    }

    pub fn on_detach(&mut self) {
        self.detaches = self.detaches.saturating_add(1);
    }

    pub fn on_security_drop(&mut self) {
        self.security_drops = self.security_drops.saturating_add(1);
    }

    pub fn on_duplicate_drop(&mut self) {
        self.duplicate_drops = self.duplicate_drops.saturating_add(1);
    }

    pub fn on_parse_drop(&mut self) {
        self.parse_drops = self.parse_drops.saturating_add(1);
    }

    pub fn on_csl_resync(&mut self) {
        self.csl_resyncs = self.csl_resyncs.saturating_add(1);
    }

    pub fn on_csl_desync(&mut self) {
        self.csl_desyncs = self.csl_desyncs.saturating_add(1);
    }

    pub fn on_indirect_tx_result(&mut self, success: bool) {
        if success {
            self.indirect_tx_successes = self.indirect_tx_successes.saturating_add(1);
        } else {
            self.indirect_tx_failures = self.indirect_tx_failures.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_saturate_rather_than_panic() {
        let mut counters = MleCounters {
            detaches: u32::MAX,
            ..MleCounters::new()
        };
        counters.on_detach();
        assert_eq!(counters.detaches, u32::MAX);
    }
}
