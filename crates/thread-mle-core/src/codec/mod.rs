//! MLE Message Codec (C7).

pub mod message;
pub mod security;
pub mod tlv;

pub use message::{MleCommand, SecuredMessage};
pub use security::SecurityHeader;
pub use tlv::{Tlv, TlvType};
