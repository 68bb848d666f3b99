//! Named tunables. Nothing here is a magic literal inline in the state
//! machine — every timing and sizing constant a node needs is collected
//! here so a host can override it via [`crate::config::MleConfig`].

/// MLE UDP port (802.15.4 Thread).
pub const MLE_PORT: u16 = 19788;

/// Required hop limit on every MLE datagram.
pub const MLE_HOP_LIMIT: u8 = 255;

/// Retransmission Tracker (C2).
pub const MAX_ATTEMPTS: u8 = 4;
pub const MAX_KEEP_ALIVE_ATTEMPTS: u32 = MAX_ATTEMPTS as u32;
pub const RETX_DELAY_MS: u64 = 1_000;
pub const RETX_JITTER_MS: u64 = 2_000;

/// Indirect / CSL Tx Scheduler (C5).
pub const MAX_CSL_TRIGGERED_ATTEMPTS: u8 = 3;
pub const DEFAULT_FRAME_REQUEST_AHEAD_US: u64 = 1_000;
/// 150 bytes covers a maximal 127-byte 802.15.4 frame plus radio metadata.
pub const BUS_FRAME_ESTIMATE_BYTES: u64 = 150;

/// Neighbor & Child Table (C1).
pub const MAX_CHILDREN: usize = 32;
pub const MAX_REGISTERED_IPV6_ADDRESSES: usize = 10;
pub const MAX_REQUEST_TLVS: usize = 6;

/// Attach cycle (C8).
pub const FIRST_CYCLE_PARENT_REQUESTS_TO_ROUTERS_COUNT: u8 = 1;
pub const NEXT_CYCLE_PARENT_REQUESTS_TO_ROUTERS_COUNT: u8 = 2;
pub const PARENT_REQUEST_ROUTER_TIMEOUT_MS: u64 = 150;
pub const PARENT_REQUEST_REED_TIMEOUT_MS: u64 = 400;
pub const CHILD_ID_RESPONSE_TIMEOUT_MS: u64 = 1_250;
pub const ATTACH_START_JITTER_MS: u64 = 250;

/// Announce discovery (C8 supplement).
pub const ANNOUNCE_DELAY_MS: u64 = 250;
pub const ANNOUNCE_PROCESS_TIMEOUT_MS: u64 = 1_000;
pub const MAX_ANNOUNCE_ATTEMPTS_PER_EPISODE: u8 = 2;

/// Graceful detach (C8).
pub const DETACH_GRACEFUL_TIMEOUT_MS: u64 = 1_000;

/// Sub-child extension (C9).
pub const SUB_CHILD_ATTACH_TIMEOUT_MS: u64 = 100;
pub const SUB_CHILD_PREFIX_LENGTH_LIMIT: u8 = 9;
pub const DETACH_PENDING_RETX_MULTIPLE: u64 = 4;
pub const DETACH_PENDING_RETX_FLOOR_MS: u64 = 1_000;

/// Sentinel RLOC16 meaning "not assigned".
pub const INVALID_RLOC16: u16 = 0xfffe;
