//! Thread MLE protocol core: neighbor & child table, retransmission
//! tracker, delayed sender, indirect sender, CSL tx scheduler and
//! receiver, MLE message codec, MLE core state machine, and the
//! sub-child extension (spec components C1-C9).
//!
//! Single-threaded cooperative (spec §5): every public entry point is a
//! plain synchronous method call, no suspension points, no tokio. See
//! `thread-mle-transport` for the async edge that drives this crate
//! against a real UDP socket and tick source.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod codec;
pub mod config;
pub mod constants;
pub mod context;
pub mod counters;
pub mod csl;
pub mod delayed_sender;
pub mod error;
pub mod indirect;
pub mod mesh_forwarder;
pub mod mle;
pub mod neighbor;
pub mod network_data;
pub mod radio;
pub mod retx;
pub mod settings;
pub mod subchild;
pub mod types;

pub use config::NodeConfig;
pub use context::CoreContext;
pub use error::{MleError, MleResult};
pub use mle::{DeviceRole, MleCore};
