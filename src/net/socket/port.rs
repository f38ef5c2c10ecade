/*!
 * Sync Port
 *
 * Per-socket readiness state plus the wait half of blocking calls.
 * Drivers and protocol endpoints set readiness; the blocking coordinator
 * waits on it. The port shares the manager's wait queue, keyed by
 * (descriptor, interest) so the two directions never cross-wake.
 */

use crate::core::sync::{WaitQueue, WaitResult};
use crate::core::types::SockFd;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Readiness direction waited on by blocking calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interest {
    Read,
    Write,
}

impl Interest {
    #[inline]
    fn bit(self) -> u8 {
        match self {
            Interest::Read => 0b01,
            Interest::Write => 0b10,
        }
    }
}

/// One socket's readiness state.
///
/// A wake without the matching readiness bit is meaningful: the connect
/// path uses it to detect a reset handshake, so `wait` does not filter
/// wakes through the bit itself. Callers that need the bit re-check with
/// `is_ready` after waking.
pub struct SyncPort {
    fd: SockFd,
    readiness: AtomicU8,
    queue: Arc<WaitQueue<(SockFd, Interest)>>,
}

impl SyncPort {
    pub(crate) fn new(fd: SockFd, queue: Arc<WaitQueue<(SockFd, Interest)>>) -> Self {
        Self {
            fd,
            readiness: AtomicU8::new(0),
            queue,
        }
    }

    /// Descriptor this port belongs to
    pub fn fd(&self) -> SockFd {
        self.fd
    }

    /// Immediate readiness test
    #[inline]
    pub fn is_ready(&self, interest: Interest) -> bool {
        self.readiness.load(Ordering::Acquire) & interest.bit() != 0
    }

    /// Mark a direction ready and wake its waiters.
    /// Producer side: called on packet arrival / transmit completion.
    pub fn set_ready(&self, interest: Interest) {
        self.readiness.fetch_or(interest.bit(), Ordering::Release);
        self.queue.wake_all((self.fd, interest));
    }

    /// Clear a direction (e.g. receive queue drained)
    pub fn clear_ready(&self, interest: Interest) {
        self.readiness.fetch_and(!interest.bit(), Ordering::Release);
    }

    /// Wake waiters without touching readiness.
    /// Error paths use this so a waiter re-checks and sees "not ready".
    pub fn wake(&self, interest: Interest) {
        self.queue.wake_all((self.fd, interest));
    }

    /// Block until woken or `timeout` elapses. Returns immediately when
    /// the direction is already ready.
    pub fn wait(&self, interest: Interest, timeout: Option<Duration>) -> WaitResult<()> {
        if self.is_ready(interest) {
            return Ok(());
        }
        self.queue.wait((self.fd, interest), timeout)
    }

    /// Approximate waiter count for diagnostics
    pub fn waiter_count(&self, interest: Interest) -> usize {
        self.queue.waiter_count((self.fd, interest))
    }
}
