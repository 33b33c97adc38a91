use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, ToSocketAddrs};

/// Binds a non-blocking TCP listener for `host:port` with the given accept backlog.
pub fn create_listener(
    host: &str,
    port: u16,
    backlog: i32,
) -> std::io::Result<(SocketAddr, tokio::net::TcpListener)> {
    let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("'{}' did not resolve to any address", host),
        )
    })?;

    tracing::info!("Attempting to bind server to {}...", addr);

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    // Accept IPv4 clients too when bound to an IPv6 address
    if addr.is_ipv6() {
        if let Err(e) = socket.set_only_v6(false) {
            tracing::warn!(
                "Failed to set dual-stack mode for IPv6 socket: {}. Continuing anyway.",
                e
            );
        }
    }

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    // Make it non-blocking for tokio
    socket.set_nonblocking(true)?;

    let std_listener: std::net::TcpListener = socket.into();
    let tokio_listener = tokio::net::TcpListener::from_std(std_listener)?;
    let local_addr = tokio_listener.local_addr()?;

    Ok((local_addr, tokio_listener))
}
