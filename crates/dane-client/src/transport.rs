//! UDP socket setup for talking to the resolver.

use dane_core::{DaneError, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{lookup_host, UdpSocket};
use tracing::debug;

/// Largest DNS message we ever read
pub(crate) const MAX_MESSAGE_SIZE: usize = 65_535;

/// Default DNS port when the resolver is given as a bare address
const DNS_PORT: u16 = 53;

/// Resolve `host:port` (or a bare IP) to a socket address.
pub(crate) async fn resolver_addr(resolver: &str) -> Result<SocketAddr> {
    if let Ok(ip) = resolver.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DNS_PORT));
    }

    lookup_host(resolver)
        .await
        .map_err(|e| DaneError::Transport(format!("cannot resolve {resolver}: {e}")))?
        .next()
        .ok_or_else(|| DaneError::Transport(format!("no address for {resolver}")))
}

/// Open a UDP socket connected to the resolver.
///
/// A connected socket only delivers datagrams from the resolver address,
/// so both the reader and the writer can share it without extra filtering.
pub(crate) async fn connect(resolver: &str) -> Result<UdpSocket> {
    let addr = resolver_addr(resolver).await?;
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local)
        .await
        .map_err(|e| DaneError::Transport(format!("bind {local}: {e}")))?;
    socket
        .connect(addr)
        .await
        .map_err(|e| DaneError::Transport(format!("connect {addr}: {e}")))?;

    debug!(resolver = %addr, local = ?socket.local_addr().ok(), "resolver socket ready");
    Ok(socket)
}
