/*!
 * Protocol Family Traits
 *
 * Each protocol family implements the subset of socket operations it
 * actually supports. Every method has a default body returning the error
 * callers of that operation expect for an absent capability, so presence
 * is checked at call time and a family never has to stub what it lacks.
 */

use super::super::socket::port::SyncPort;
use super::super::types::{
    AddressFamily, Received, ShutdownHow, SockAddr, SockType, SocketError, SocketResult,
};
use crate::core::types::Protocol;
use std::sync::Arc;

/// Outcome of an endpoint connect call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectProgress {
    /// Handshake finished synchronously
    Complete,
    /// Handshake continues; write-readiness signals completion
    InProgress,
}

/// A connection handed over by a listening endpoint
pub struct Accepted {
    pub endpoint: Box<dyn ProtoSocket>,
    pub peer: SockAddr,
}

/// Constructor side of a protocol family: builds per-socket endpoints
pub trait ProtoFamily: Send + Sync {
    /// The family this table serves
    fn family(&self) -> AddressFamily;

    /// Build the protocol endpoint for a new socket.
    ///
    /// Construction failures surface as `ResourceExhausted` or
    /// `BackendFailure` and abort socket creation.
    fn create(&self, ty: SockType, protocol: Protocol) -> SocketResult<Box<dyn ProtoSocket>>;
}

/// Per-socket protocol operations.
///
/// The socket core drives these after its own validation; endpoints see
/// only well-formed calls. Readiness is reported back through the
/// `SyncPort` handed to `attach`.
pub trait ProtoSocket: Send {
    /// Called once when the socket is registered. Endpoints that signal
    /// readiness keep the port.
    fn attach(&mut self, port: &Arc<SyncPort>) {
        let _ = port;
    }

    fn bind(&mut self, addr: &SockAddr) -> SocketResult<()> {
        let _ = addr;
        Err(SocketError::OperationNotSupported)
    }

    /// Choose a local address for a socket the caller never bound
    fn bind_local(&mut self) -> SocketResult<SockAddr> {
        Err(SocketError::invalid_argument(
            "family cannot choose a local address",
        ))
    }

    fn connect(&mut self, addr: &SockAddr, nonblocking: bool) -> SocketResult<ConnectProgress> {
        let _ = (addr, nonblocking);
        Err(SocketError::unimplemented("connect"))
    }

    fn listen(&mut self, backlog: i32) -> SocketResult<()> {
        let _ = backlog;
        Err(SocketError::unimplemented("listen"))
    }

    fn accept(&mut self) -> SocketResult<Accepted> {
        Err(SocketError::OperationNotSupported)
    }

    fn sendmsg(
        &mut self,
        payload: &[u8],
        dest: Option<&SockAddr>,
        nonblocking: bool,
    ) -> SocketResult<usize> {
        let _ = (payload, dest, nonblocking);
        Err(SocketError::unimplemented("sendmsg"))
    }

    fn recvmsg(&mut self, buf: &mut [u8], nonblocking: bool) -> SocketResult<Received> {
        let _ = (buf, nonblocking);
        Err(SocketError::unimplemented("recvmsg"))
    }

    /// Families without a shutdown handshake rely on the core's flag
    /// bookkeeping alone.
    fn shutdown(&mut self, how: ShutdownHow) -> SocketResult<()> {
        let _ = how;
        Ok(())
    }

    fn getsockname(&self) -> SocketResult<SockAddr> {
        Err(SocketError::unimplemented("getsockname"))
    }

    fn getpeername(&self) -> SocketResult<SockAddr> {
        Err(SocketError::unimplemented("getpeername"))
    }

    /// Protocol-level options (any level other than SOL_SOCKET)
    fn getsockopt(&self, level: i32, name: i32, buf: &mut [u8]) -> SocketResult<usize> {
        let _ = (level, name, buf);
        Err(SocketError::OperationNotSupported)
    }

    fn setsockopt(&mut self, level: i32, name: i32, val: &[u8]) -> SocketResult<()> {
        let _ = (level, name, val);
        Err(SocketError::OperationNotSupported)
    }

    /// Release protocol resources. Failures are logged by the core, never
    /// surfaced to the closing caller.
    fn close(&mut self) -> SocketResult<()> {
        Ok(())
    }
}
