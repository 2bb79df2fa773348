use std::io;

use ackframe::UdpEndpoint;
use tokio::net::UdpSocket;

/// Bind two UDP endpoints on ephemeral loopback ports, each aimed at the
/// other.
///
/// # Errors
///
/// Returns any error raised while binding the sockets.
pub async fn loopback_pair() -> io::Result<(UdpEndpoint, UdpEndpoint)> {
    let a = UdpSocket::bind("127.0.0.1:0").await?;
    let b = UdpSocket::bind("127.0.0.1:0").await?;
    let (a_addr, b_addr) = (a.local_addr()?, b.local_addr()?);
    Ok((
        UdpEndpoint::from_socket(a, b_addr),
        UdpEndpoint::from_socket(b, a_addr),
    ))
}
