/*!
 * Socket Registry
 *
 * Tracks the set of live sockets and the set of bound addresses. The
 * core consumes it through a trait so tests can inject fakes; the
 * default implementation is in-memory. Address reservation is a single
 * atomic reserve-if-free — there is no separate "is free" probe for
 * callers to race against.
 */

use crate::core::types::SockFd;
use crate::net::types::{SockAddr, SocketError, SocketResult};
use ahash::RandomState;
use dashmap::{DashMap, DashSet};

/// Registry capability consumed by the socket core
pub trait SocketRegistry: Send + Sync {
    /// Membership test (used by internal invariant checks)
    fn contains(&self, fd: SockFd) -> bool;

    /// Register a socket. Registering the same descriptor twice is a
    /// programming error and fails.
    fn insert(&self, fd: SockFd) -> SocketResult<()>;

    /// Unregister a socket
    fn remove(&self, fd: SockFd) -> SocketResult<()>;

    /// Atomically reserve `addr` for `fd` if no other socket holds it
    fn reserve_address(&self, fd: SockFd, addr: &SockAddr) -> SocketResult<()>;

    /// Record an address the protocol layer chose for `fd` (auto-bind);
    /// never fails — the protocol owns ephemeral-address uniqueness
    fn record_address(&self, fd: SockFd, addr: &SockAddr);

    /// Release whatever address `fd` holds
    fn release_address(&self, fd: SockFd);
}

/// In-memory registry
pub struct MemoryRegistry {
    sockets: DashSet<SockFd, RandomState>,
    addresses: DashMap<SockAddr, SockFd, RandomState>,
    by_fd: DashMap<SockFd, SockAddr, RandomState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            sockets: DashSet::with_hasher(RandomState::new()),
            addresses: DashMap::with_hasher(RandomState::new()),
            by_fd: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Number of registered sockets (diagnostics)
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketRegistry for MemoryRegistry {
    fn contains(&self, fd: SockFd) -> bool {
        self.sockets.contains(&fd)
    }

    fn insert(&self, fd: SockFd) -> SocketResult<()> {
        if self.sockets.insert(fd) {
            Ok(())
        } else {
            Err(SocketError::backend(format!(
                "socket {} is already registered",
                fd
            )))
        }
    }

    fn remove(&self, fd: SockFd) -> SocketResult<()> {
        if self.sockets.remove(&fd).is_some() {
            Ok(())
        } else {
            Err(SocketError::backend(format!(
                "socket {} is not registered",
                fd
            )))
        }
    }

    fn reserve_address(&self, fd: SockFd, addr: &SockAddr) -> SocketResult<()> {
        // The entry guard holds the shard lock, making the free-check and
        // the reservation one step.
        match self.addresses.entry(addr.clone()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                if *entry.get() == fd {
                    Ok(())
                } else {
                    Err(SocketError::AddressInUse)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(fd);
                self.by_fd.insert(fd, addr.clone());
                Ok(())
            }
        }
    }

    fn record_address(&self, fd: SockFd, addr: &SockAddr) {
        self.addresses.insert(addr.clone(), fd);
        self.by_fd.insert(fd, addr.clone());
    }

    fn release_address(&self, fd: SockFd) {
        if let Some((_, addr)) = self.by_fd.remove(&fd) {
            self.addresses.remove_if(&addr, |_, owner| *owner == fd);
        }
    }
}
