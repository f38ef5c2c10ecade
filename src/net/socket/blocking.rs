/*!
 * Blocking Coordinator
 *
 * Timeout derivation and readiness waits for connect, accept, send and
 * receive. A timeout of zero milliseconds means "wait indefinitely";
 * the calling thread suspends on the socket's sync port, never the
 * whole system.
 */

use super::options::TimeVal;
use super::port::{Interest, SyncPort};
use crate::core::sync::WaitError;
use crate::net::types::{SocketError, SocketResult};
use std::time::Duration;

/// Timeout of a data-transfer wait, from a per-socket timeout option
pub(crate) fn timeout_of(tv: TimeVal) -> Option<Duration> {
    millis_timeout(tv.to_millis())
}

/// Timeout from a raw millisecond count (connect timeout config)
pub(crate) fn millis_timeout(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

/// Suspend until the port is woken for `interest` or the timeout lapses.
///
/// A successful return means "woken", not "ready": connect re-checks the
/// write bit afterwards to tell completion from a reset.
pub(crate) fn wait_ready(
    port: &SyncPort,
    interest: Interest,
    timeout: Option<Duration>,
) -> SocketResult<()> {
    match port.wait(interest, timeout) {
        Ok(()) => Ok(()),
        Err(WaitError::Timeout) => Err(SocketError::TimedOut),
    }
}
