//! Node-wide configuration, grouped the way the teacher's
//! `TransportConfig` groups tunables next to their `Default` impl rather
//! than scattering literals through the state machine.

use crate::constants::*;

/// Tunables for the MLE core state machine, retransmission tracker and
/// attach cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MleConfig {
    pub max_attempts: u8,
    pub retx_delay_ms: u64,
    pub retx_jitter_ms: u64,
    pub first_cycle_parent_requests_to_routers: u8,
    pub next_cycle_parent_requests_to_routers: u8,
    pub parent_request_router_timeout_ms: u64,
    pub parent_request_reed_timeout_ms: u64,
    pub child_id_response_timeout_ms: u64,
    pub attach_start_jitter_ms: u64,
    pub announce_delay_ms: u64,
    pub announce_process_timeout_ms: u64,
    pub max_announce_attempts_per_episode: u8,
    pub detach_graceful_timeout_ms: u64,
}

impl Default for MleConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            retx_delay_ms: RETX_DELAY_MS,
            retx_jitter_ms: RETX_JITTER_MS,
            first_cycle_parent_requests_to_routers: FIRST_CYCLE_PARENT_REQUESTS_TO_ROUTERS_COUNT,
            next_cycle_parent_requests_to_routers: NEXT_CYCLE_PARENT_REQUESTS_TO_ROUTERS_COUNT,
            parent_request_router_timeout_ms: PARENT_REQUEST_ROUTER_TIMEOUT_MS,
            parent_request_reed_timeout_ms: PARENT_REQUEST_REED_TIMEOUT_MS,
            child_id_response_timeout_ms: CHILD_ID_RESPONSE_TIMEOUT_MS,
            attach_start_jitter_ms: ATTACH_START_JITTER_MS,
            announce_delay_ms: ANNOUNCE_DELAY_MS,
            announce_process_timeout_ms: ANNOUNCE_PROCESS_TIMEOUT_MS,
            max_announce_attempts_per_episode: MAX_ANNOUNCE_ATTEMPTS_PER_EPISODE,
            detach_graceful_timeout_ms: DETACH_GRACEFUL_TIMEOUT_MS,
        }
    }
}

/// Tunables for the CSL tx scheduler and receiver (C5/C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CslConfig {
    pub max_csl_triggered_attempts: u8,
    pub frame_request_ahead_us: u64,
    pub bus_speed_hz: u64,
    pub bus_latency_us: u64,
}

impl Default for CslConfig {
    fn default() -> Self {
        Self {
            max_csl_triggered_attempts: MAX_CSL_TRIGGERED_ATTEMPTS,
            frame_request_ahead_us: DEFAULT_FRAME_REQUEST_AHEAD_US,
            bus_speed_hz: 1_000_000,
            bus_latency_us: 0,
        }
    }
}

/// Tunables for the neighbor/child table (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    pub max_children: usize,
    pub max_registered_ipv6_addresses: usize,
    pub max_request_tlvs: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_children: MAX_CHILDREN,
            max_registered_ipv6_addresses: MAX_REGISTERED_IPV6_ADDRESSES,
            max_request_tlvs: MAX_REQUEST_TLVS,
        }
    }
}

/// Sub-child extension tunables (C9), only meaningful when the feature
/// is active on an MTD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubChildConfig {
    pub enabled: bool,
    pub attach_timeout_ms: u64,
    pub prefix_length_limit: u8,
    pub detach_pending_retx_multiple: u64,
    pub detach_pending_retx_floor_ms: u64,
}

impl Default for SubChildConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attach_timeout_ms: SUB_CHILD_ATTACH_TIMEOUT_MS,
            prefix_length_limit: SUB_CHILD_PREFIX_LENGTH_LIMIT,
            detach_pending_retx_multiple: DETACH_PENDING_RETX_MULTIPLE,
            detach_pending_retx_floor_ms: DETACH_PENDING_RETX_FLOOR_MS,
        }
    }
}

/// Aggregate node configuration handed to [`crate::context::CoreContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeConfig {
    pub mle: MleConfig,
    pub csl: CslConfig,
    pub table: TableConfig,
    pub sub_child: SubChildConfig,
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sub_child_enabled(mut self, enabled: bool) -> Self {
        self.sub_child.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_named_constants() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.mle.max_attempts, MAX_ATTEMPTS);
        assert_eq!(cfg.csl.max_csl_triggered_attempts, MAX_CSL_TRIGGERED_ATTEMPTS);
        assert_eq!(cfg.table.max_children, MAX_CHILDREN);
        assert!(!cfg.sub_child.enabled);
    }
}
