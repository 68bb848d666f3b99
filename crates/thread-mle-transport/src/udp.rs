//! UDP transport for MLE datagrams (spec §1: "MLE runs directly over
//! UDP port 19788"). Grounded on the teacher's `iface::udp` socket
//! wrapper: an `Arc`'d `tokio::net::UdpSocket`, async `send`/`recv`
//! methods, and `log` at the same density.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, trace, warn};
use thread_mle_core::constants::{MLE_HOP_LIMIT, MLE_PORT};
use tokio::net::UdpSocket;

/// A received MLE datagram. `hop_limit` is fixed at [`MLE_HOP_LIMIT`]
/// since a standard UDP socket has no portable way to read the IPv6 hop
/// limit of an inbound packet; real deployments would need `IPV6_HOPLIMIT`
/// ancillary data via a raw socket, which this simulated transport does
/// not attempt.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub hop_limit: u8,
    pub peer: SocketAddr,
}

/// Thin async wrapper around a bound UDP socket. Cloned handles share the
/// same underlying socket (`Arc`), mirroring the teacher's interface
/// abstraction.
#[derive(Clone)]
pub struct MleUdpSocket {
    socket: Arc<UdpSocket>,
}

impl MleUdpSocket {
    pub async fn bind(local_addr: impl Into<SocketAddr>) -> std::io::Result<Self> {
        let local_addr = local_addr.into();
        let socket = UdpSocket::bind(local_addr).await?;
        debug!("mle udp socket bound on {local_addr}");
        Ok(Self { socket: Arc::new(socket) })
    }

    pub async fn bind_default_port(ip: std::net::IpAddr) -> std::io::Result<Self> {
        Self::bind(SocketAddr::new(ip, MLE_PORT)).await
    }

    pub async fn send_to(&self, payload: &[u8], dest: SocketAddr) -> std::io::Result<()> {
        trace!("mle udp: sending {} bytes to {dest}", payload.len());
        let sent = self.socket.send_to(payload, dest).await?;
        if sent != payload.len() {
            warn!("mle udp: short send ({sent} of {} bytes) to {dest}", payload.len());
        }
        Ok(())
    }

    /// Wait for the next datagram. A zero-length read is treated as a
    /// transient condition and retried rather than surfaced as an error.
    pub async fn recv(&self) -> std::io::Result<Datagram> {
        let mut buf = vec![0u8; 1280];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await?;
            if len == 0 {
                trace!("mle udp: ignoring zero-length datagram from {peer}");
                continue;
            }
            trace!("mle udp: received {len} bytes from {peer}");
            return Ok(Datagram {
                payload: buf[..len].to_vec(),
                hop_limit: MLE_HOP_LIMIT,
                peer,
            });
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
