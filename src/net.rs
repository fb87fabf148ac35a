//! Network helpers for test scaffolding.

use std::io;
use std::net::{Ipv4Addr, TcpListener};

/// Return a TCP port that was free at the time of the call.
///
/// Binds a loopback socket on port 0 so the OS assigns a free ephemeral
/// port, reads the assignment back, and releases the socket.  The port
/// can be reclaimed by another process before the caller binds it, so
/// this is suitable for test harnesses, not production port allocation.
pub fn next_free_tcp_port() -> io::Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}
