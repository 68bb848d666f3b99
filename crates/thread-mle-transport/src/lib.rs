//! Async UDP/tick edge that drives `thread-mle-core` against a real
//! socket and wall clock. This crate holds no MLE protocol logic of its
//! own — it plumbs ticks and datagrams into [`CoreContext`] and exposes
//! a [`sim_radio::SimRadio`] double for running the core without real
//! 802.15.4 hardware.

pub mod runtime;
pub mod sim_radio;
pub mod udp;

pub use runtime::NodeRuntime;
pub use sim_radio::SimRadio;
pub use udp::{Datagram, MleUdpSocket};

pub use thread_mle_core::context::CoreContext;
