/*!
 * Socket Manager
 *
 * Owns the socket table and drives every public operation: lifecycle,
 * address binding, the connection state machine, blocking coordination
 * and option handling. Protocol families, the registry, and the device
 * table are injected capabilities.
 *
 * Blocking calls never hold the table while suspended: they validate and
 * snapshot under the entry guard, wait on the sync port, then re-resolve
 * the descriptor before delegating to the protocol endpoint.
 */

use super::blocking;
use super::options::SOL_SOCKET;
use super::port::{Interest, SyncPort};
use super::registry::SocketRegistry;
use super::socket::{Socket, SocketStats};
use super::state::{ConnectionState, ShutdownFlags};
use crate::core::sync::{SyncConfig, WaitQueue};
use crate::core::types::{Backlog, Protocol, SockFd};
use crate::net::config::NetConfig;
use crate::net::device::DeviceResolver;
use crate::net::family::{ConnectProgress, FamilyTable, ProtoSocket};
use crate::net::types::{
    AddressFamily, Message, Received, ShutdownHow, SockAddr, SockType, SocketError, SocketResult,
};
use ahash::RandomState;
use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use log::{error, info, warn};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The socket layer's public surface
pub struct SocketManager {
    sockets: Arc<DashMap<SockFd, Socket, RandomState>>,
    next_fd: Arc<AtomicU32>,
    // Lock-free free list; closed descriptors are reused before the
    // counter grows
    free_fds: Arc<SegQueue<SockFd>>,
    wait_queue: Arc<WaitQueue<(SockFd, Interest)>>,
    registry: Arc<dyn SocketRegistry>,
    families: Arc<FamilyTable>,
    devices: Arc<dyn DeviceResolver>,
    config: NetConfig,
}

impl SocketManager {
    pub fn new(
        registry: Arc<dyn SocketRegistry>,
        families: Arc<FamilyTable>,
        devices: Arc<dyn DeviceResolver>,
    ) -> Self {
        Self::with_config(registry, families, devices, NetConfig::default())
    }

    pub fn with_config(
        registry: Arc<dyn SocketRegistry>,
        families: Arc<FamilyTable>,
        devices: Arc<dyn DeviceResolver>,
        config: NetConfig,
    ) -> Self {
        info!(
            "socket manager initialized (fd base {}, connect timeout {} ms)",
            config.fd_base, config.connect_timeout_ms
        );
        Self {
            sockets: Arc::new(DashMap::with_hasher(RandomState::new())),
            next_fd: Arc::new(AtomicU32::new(config.fd_base)),
            free_fds: Arc::new(SegQueue::new()),
            wait_queue: Arc::new(WaitQueue::new(SyncConfig::long_wait())),
            registry,
            families,
            devices,
            config,
        }
    }

    fn allocate_fd(&self) -> SockFd {
        match self.free_fds.pop() {
            Some(fd) => fd,
            None => self.next_fd.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Shared registration path for fresh and adopted (accept) sockets.
    /// A registry failure rolls the socket back: the endpoint is closed
    /// and the descriptor recycled.
    fn register(
        &self,
        family: AddressFamily,
        ty: SockType,
        protocol: Protocol,
        mut endpoint: Box<dyn ProtoSocket>,
    ) -> SocketResult<SockFd> {
        let fd = self.allocate_fd();
        let port = Arc::new(SyncPort::new(fd, Arc::clone(&self.wait_queue)));
        endpoint.attach(&port);

        if let Err(err) = self.registry.insert(fd) {
            if let Err(close_err) = endpoint.close() {
                warn!(
                    "rollback: protocol close failed for unregistered socket {}: {}",
                    fd, close_err
                );
            }
            self.free_fds.push(fd);
            return Err(err);
        }

        self.sockets
            .insert(fd, Socket::new(fd, family, ty, protocol, endpoint, port));
        Ok(fd)
    }

    /// Create a socket for (family, type, protocol). The new socket is
    /// registered and UNCONNECTED when this returns.
    pub fn create(
        &self,
        family: AddressFamily,
        ty: SockType,
        protocol: Protocol,
    ) -> SocketResult<SockFd> {
        let table = self
            .families
            .lookup(family, ty)
            .ok_or(SocketError::AddressFamilyMismatch)?;
        let endpoint = table.create(ty, protocol)?;

        let fd = self.register(family, ty, protocol, endpoint)?;
        info!(
            "created socket {} ({:?}/{:?}, protocol {})",
            fd, family, ty, protocol
        );
        Ok(fd)
    }

    /// Close a socket. Registry and protocol failures are recovered
    /// locally; once the descriptor resolves, close always succeeds.
    pub fn close(&self, fd: SockFd) -> SocketResult<()> {
        let (_, mut sock) = self
            .sockets
            .remove(&fd)
            .ok_or(SocketError::BadHandle(fd))?;

        sock.state = ConnectionState::Disconnecting;

        self.registry.release_address(fd);
        if let Err(err) = self.registry.remove(fd) {
            warn!("close: couldn't remove socket {} from registry: {}", fd, err);
        }

        // Anything parked on the port re-checks and observes BadHandle.
        sock.port.wake(Interest::Read);
        sock.port.wake(Interest::Write);

        if let Err(err) = sock.endpoint.close() {
            warn!("close: protocol close failed for socket {}: {}", fd, err);
        }

        self.free_fds.push(fd);
        info!("closed socket {}", fd);
        Ok(())
    }

    /// Bind a socket to a local address
    pub fn bind(&self, fd: SockFd, addr: SockAddr) -> SocketResult<()> {
        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));

        if sock.state.is_bound() {
            return Err(SocketError::invalid_argument("socket is already bound"));
        }
        if sock.family != addr.family() {
            return Err(SocketError::AddressFamilyMismatch);
        }

        self.registry.reserve_address(fd, &addr)?;

        match sock.endpoint.bind(&addr) {
            Ok(()) => {
                sock.state = ConnectionState::Bound;
                sock.local_addr = Some(addr.clone());
                info!("socket {} bound to {:?}", fd, addr);
                Ok(())
            }
            Err(err) => {
                self.registry.release_address(fd);
                Err(err)
            }
        }
    }

    /// Auto-bind path shared by connect and datagram sendmsg. The
    /// endpoint picks the local address; the registry records it.
    fn bind_local(&self, fd: SockFd, sock: &mut Socket) -> SocketResult<SockAddr> {
        let local = sock.endpoint.bind_local()?;
        self.registry.record_address(fd, &local);
        sock.local_addr = Some(local.clone());
        Ok(local)
    }

    /// Connect to a remote address.
    ///
    /// Non-blocking connects whose protocol reports "in progress" return
    /// AlreadyInProgress immediately and stay CONNECTING. Blocking
    /// connects wait for write-readiness up to the configured connect
    /// timeout; on timeout the half-open attempt is shut down best-effort
    /// and the socket reverts to BOUND.
    pub fn connect(&self, fd: SockFd, addr: SockAddr, nonblocking: bool) -> SocketResult<()> {
        let port = {
            let mut sock = self
                .sockets
                .get_mut(&fd)
                .ok_or(SocketError::BadHandle(fd))?;
            debug_assert!(self.registry.contains(fd));

            if sock.family != addr.family() {
                return Err(SocketError::AddressFamilyMismatch);
            }
            if sock.sock_type.is_connection_oriented() && sock.state.is_connected() {
                return Err(SocketError::AlreadyConnected);
            }
            if sock.state.is_listening() {
                return Err(SocketError::OperationNotSupported);
            }
            if sock.state == ConnectionState::Connecting {
                return Err(SocketError::AlreadyInProgress);
            }

            if !sock.state.is_bound() {
                self.bind_local(fd, &mut sock)?;
            }

            sock.state = ConnectionState::Connecting;

            match sock.endpoint.connect(&addr, nonblocking) {
                Ok(ConnectProgress::Complete) => {
                    sock.state = ConnectionState::Connected;
                    info!("socket {} connected to {:?}", fd, addr);
                    return Ok(());
                }
                Ok(ConnectProgress::InProgress) => {
                    if nonblocking {
                        return Err(SocketError::AlreadyInProgress);
                    }
                    Arc::clone(&sock.port)
                }
                Err(err) => {
                    error!("unable to connect on socket {}: {}", fd, err);
                    sock.state = ConnectionState::Bound;
                    return Err(err);
                }
            }
        };

        // Suspend until the handshake resolves; the table stays unlocked.
        let timeout = blocking::millis_timeout(self.config.connect_timeout_ms);
        let waited = blocking::wait_ready(&port, Interest::Write, timeout);

        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;

        match waited {
            Err(SocketError::TimedOut) => {
                // Shut down the half-open attempt before reporting.
                if let Err(err) = sock.endpoint.shutdown(ShutdownHow::Both) {
                    warn!(
                        "connect timeout cleanup failed on socket {}: {}",
                        fd, err
                    );
                }
                sock.state = ConnectionState::Bound;
                error!("unable to connect on socket {}: timed out", fd);
                Err(SocketError::TimedOut)
            }
            Err(err) => {
                sock.state = ConnectionState::Bound;
                Err(err)
            }
            Ok(()) => {
                if !port.is_ready(Interest::Write) {
                    // Woken without write-readiness: the handshake was reset.
                    sock.state = ConnectionState::Bound;
                    error!("unable to connect on socket {}: connection reset", fd);
                    return Err(SocketError::ConnectionReset);
                }
                sock.state = ConnectionState::Connected;
                info!("socket {} connected to {:?}", fd, addr);
                Ok(())
            }
        }
    }

    /// Move a bound socket into the listening state
    pub fn listen(&self, fd: SockFd, backlog: Backlog) -> SocketResult<()> {
        let backlog = if backlog > 0 {
            backlog
        } else {
            crate::core::limits::DEFAULT_LISTEN_BACKLOG
        };

        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));

        if !sock.state.is_bound() {
            return Err(SocketError::AddressRequired);
        }
        if sock.state.is_connected() {
            return Err(SocketError::invalid_argument("socket is connected"));
        }

        match sock.endpoint.listen(backlog) {
            Ok(()) => {
                sock.state = ConnectionState::Listening;
                sock.opts.acceptconn = 1;
                info!("socket {} listening (backlog {})", fd, backlog);
                Ok(())
            }
            Err(err) => {
                error!("error setting socket {} to listening state: {}", fd, err);
                sock.state = ConnectionState::Bound;
                Err(err)
            }
        }
    }

    /// Accept a pending connection, returning the new socket and the
    /// peer address. The new socket is registered and ESTABLISHED before
    /// it is returned.
    pub fn accept(&self, fd: SockFd, nonblocking: bool) -> SocketResult<(SockFd, SockAddr)> {
        let (port, timeout) = {
            let sock = self.sockets.get(&fd).ok_or(SocketError::BadHandle(fd))?;
            debug_assert!(self.registry.contains(fd));

            if !sock.state.is_listening() {
                error!("accept: socket {} is not in listening state", fd);
                return Err(SocketError::NotListening);
            }
            (
                Arc::clone(&sock.port),
                blocking::timeout_of(sock.opts.rcvtimeo),
            )
        };

        if !nonblocking {
            blocking::wait_ready(&port, Interest::Read, timeout)?;
        }

        // Re-resolve after the wait and take the pending connection. The
        // listener guard is dropped before the new socket registers, so
        // the table insert cannot contend with it.
        let (accepted, family, ty, protocol) = {
            let mut sock = self
                .sockets
                .get_mut(&fd)
                .ok_or(SocketError::BadHandle(fd))?;
            if !sock.state.is_listening() {
                return Err(SocketError::NotListening);
            }
            let accepted = sock.endpoint.accept().map_err(|err| {
                error!("error while accepting a connection on socket {}: {}", fd, err);
                err
            })?;
            (accepted, sock.family, sock.sock_type, sock.protocol)
        };

        let new_fd = self.register(family, ty, protocol, accepted.endpoint)?;
        if let Some(mut new_sock) = self.sockets.get_mut(&new_fd) {
            new_sock.state = ConnectionState::Established;
        }

        info!(
            "socket {} accepted connection: new socket {} from {:?}",
            fd, new_fd, accepted.peer
        );
        Ok((new_fd, accepted.peer))
    }

    /// Send a message. See the module docs for the destination rules per
    /// socket type.
    pub fn sendmsg(&self, fd: SockFd, msg: &Message<'_>, nonblocking: bool) -> SocketResult<usize> {
        let (port, timeout) = {
            let mut sock = self
                .sockets
                .get_mut(&fd)
                .ok_or(SocketError::BadHandle(fd))?;
            debug_assert!(self.registry.contains(fd));

            if sock.sock_type.is_connection_oriented() {
                if !sock.state.is_connected() {
                    return Err(SocketError::NotConnected);
                }
                if msg.addr.is_some() {
                    return Err(SocketError::AlreadyConnected);
                }
            } else {
                if !sock.state.is_bound() {
                    self.bind_local(fd, &mut sock)?;
                    sock.state = ConnectionState::Bound;
                }
                if msg.addr.is_none() && !sock.state.is_connected() {
                    return Err(SocketError::AddressRequired);
                }
            }

            if sock.shutdown.contains(ShutdownFlags::WRITE) {
                return Err(SocketError::BrokenPipe);
            }
            if msg.flags != 0 {
                error!("sendmsg: per-call flags are not supported");
                return Err(SocketError::OperationNotSupported);
            }

            (
                Arc::clone(&sock.port),
                blocking::timeout_of(sock.opts.sndtimeo),
            )
        };

        if !nonblocking {
            blocking::wait_ready(&port, Interest::Write, timeout)?;
        }

        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        sock.endpoint
            .sendmsg(msg.payload, msg.addr.as_ref(), nonblocking)
    }

    /// Receive into `buf`, returning the byte count and source address
    pub fn recvmsg(
        &self,
        fd: SockFd,
        buf: &mut [u8],
        flags: u32,
        nonblocking: bool,
    ) -> SocketResult<Received> {
        let (port, timeout) = {
            let sock = self.sockets.get(&fd).ok_or(SocketError::BadHandle(fd))?;
            debug_assert!(self.registry.contains(fd));

            if sock.sock_type.is_connection_oriented() && !sock.state.is_connected() {
                return Err(SocketError::NotConnected);
            }
            if sock.shutdown.contains(ShutdownFlags::READ) {
                return Err(SocketError::BrokenPipe);
            }
            if flags != 0 {
                error!("recvmsg: per-call flags are not supported");
                return Err(SocketError::OperationNotSupported);
            }

            (
                Arc::clone(&sock.port),
                blocking::timeout_of(sock.opts.rcvtimeo),
            )
        };

        if !nonblocking {
            blocking::wait_ready(&port, Interest::Read, timeout)?;
        }

        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        sock.endpoint.recvmsg(buf, nonblocking)
    }

    /// Shut down one or both halves of a connected socket. The state
    /// stays CONNECTED; only the half-close flags advance.
    pub fn shutdown(&self, fd: SockFd, how: ShutdownHow) -> SocketResult<()> {
        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));

        if !sock.state.is_connected() {
            return Err(SocketError::NotConnected);
        }

        sock.shutdown |= ShutdownFlags::from(how);
        sock.endpoint.shutdown(how)
    }

    /// Local address, as the protocol reports it
    pub fn getsockname(&self, fd: SockFd) -> SocketResult<SockAddr> {
        let sock = self.sockets.get(&fd).ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));
        sock.endpoint.getsockname()
    }

    /// Peer address, as the protocol reports it
    pub fn getpeername(&self, fd: SockFd) -> SocketResult<SockAddr> {
        let sock = self.sockets.get(&fd).ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));
        sock.endpoint.getpeername()
    }

    /// Read a socket option. SOL_SOCKET is served from the option table;
    /// other levels forward to the protocol.
    pub fn getsockopt(
        &self,
        fd: SockFd,
        level: i32,
        name: i32,
        buf: &mut [u8],
    ) -> SocketResult<usize> {
        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));

        if level != SOL_SOCKET {
            return sock.endpoint.getsockopt(level, name, buf);
        }
        sock.opts.get(name, buf)
    }

    /// Write a socket option; see [`SocketOptions::set`] for the rules
    ///
    /// [`SocketOptions::set`]: super::options::SocketOptions::set
    pub fn setsockopt(&self, fd: SockFd, level: i32, name: i32, val: &[u8]) -> SocketResult<()> {
        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        debug_assert!(self.registry.contains(fd));

        if level != SOL_SOCKET {
            return sock.endpoint.setsockopt(level, name, val);
        }
        sock.opts.set(name, val, self.devices.as_ref())
    }

    /// Hand the per-socket sync port to protocol/driver code so it can
    /// deliver readiness
    pub fn sync_port(&self, fd: SockFd) -> SocketResult<Arc<SyncPort>> {
        let sock = self.sockets.get(&fd).ok_or(SocketError::BadHandle(fd))?;
        Ok(Arc::clone(&sock.port))
    }

    /// Latch an asynchronous error for SO_ERROR (protocol/driver side)
    pub fn latch_error(&self, fd: SockFd, code: u32) -> SocketResult<()> {
        let mut sock = self
            .sockets
            .get_mut(&fd)
            .ok_or(SocketError::BadHandle(fd))?;
        sock.opts.error = code;
        Ok(())
    }

    /// Diagnostic snapshot of one socket
    pub fn stats(&self, fd: SockFd) -> SocketResult<SocketStats> {
        let sock = self.sockets.get(&fd).ok_or(SocketError::BadHandle(fd))?;
        Ok(sock.stats())
    }

    /// Number of live sockets
    pub fn socket_count(&self) -> usize {
        self.sockets.len()
    }
}

impl Clone for SocketManager {
    fn clone(&self) -> Self {
        Self {
            sockets: Arc::clone(&self.sockets),
            next_fd: Arc::clone(&self.next_fd),
            free_fds: Arc::clone(&self.free_fds),
            wait_queue: Arc::clone(&self.wait_queue),
            registry: Arc::clone(&self.registry),
            families: Arc::clone(&self.families),
            devices: Arc::clone(&self.devices),
            config: self.config.clone(),
        }
    }
}
