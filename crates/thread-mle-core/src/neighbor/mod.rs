//! Neighbor & Child Table (C1).

pub mod child;
pub mod csl_info;
pub mod parent;
pub mod peer;
pub mod table;

pub use child::{Child, ChildAuxState, DeviceMode, IndirectState, RegisteredAddress};
pub use csl_info::CslInfo;
pub use parent::Parent;
pub use peer::{Peer, PeerState};
pub use table::{NeighborTable, NeighborTableEvent};
