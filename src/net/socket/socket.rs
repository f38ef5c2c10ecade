/*!
 * Socket Entity
 * One communication endpoint: identity, state, options, protocol endpoint
 */

use super::options::SocketOptions;
use super::port::SyncPort;
use super::state::{ConnectionState, ShutdownFlags};
use crate::core::types::{Protocol, SockFd};
use crate::net::family::ProtoSocket;
use crate::net::types::{AddressFamily, SockAddr, SockType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A live socket. Mutated exclusively by the manager's operations.
pub struct Socket {
    pub(crate) fd: SockFd,
    pub(crate) family: AddressFamily,
    pub(crate) sock_type: SockType,
    pub(crate) protocol: Protocol,
    pub(crate) state: ConnectionState,
    pub(crate) shutdown: ShutdownFlags,
    pub(crate) opts: SocketOptions,
    pub(crate) endpoint: Box<dyn ProtoSocket>,
    pub(crate) port: Arc<SyncPort>,
    pub(crate) local_addr: Option<SockAddr>,
}

impl Socket {
    pub(crate) fn new(
        fd: SockFd,
        family: AddressFamily,
        sock_type: SockType,
        protocol: Protocol,
        endpoint: Box<dyn ProtoSocket>,
        port: Arc<SyncPort>,
    ) -> Self {
        Self {
            fd,
            family,
            sock_type,
            protocol,
            state: ConnectionState::Unconnected,
            shutdown: ShutdownFlags::default(),
            opts: SocketOptions::new(family, sock_type, protocol),
            endpoint,
            port,
            local_addr: None,
        }
    }

    /// Diagnostic snapshot
    pub fn stats(&self) -> SocketStats {
        SocketStats {
            fd: self.fd,
            family: self.family,
            sock_type: self.sock_type,
            protocol: self.protocol,
            state: self.state,
            read_shutdown: self.shutdown.contains(ShutdownFlags::READ),
            write_shutdown: self.shutdown.contains(ShutdownFlags::WRITE),
            local_addr: self.local_addr.clone(),
        }
    }
}

/// Socket statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SocketStats {
    pub fd: SockFd,
    pub family: AddressFamily,
    pub sock_type: SockType,
    pub protocol: Protocol,
    pub state: ConnectionState,
    pub read_shutdown: bool,
    pub write_shutdown: bool,
    pub local_addr: Option<SockAddr>,
}
