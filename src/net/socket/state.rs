/*!
 * Connection State
 * Lifecycle states of a socket and the guards over them
 */

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::net::types::ShutdownHow;

/// Connection lifecycle of one socket.
///
/// Transitions happen only inside the socket manager's operations; no
/// other path mutates the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Freshly registered, no local address
    Unconnected,
    /// Holds a local address
    Bound,
    /// Connect issued, handshake pending
    Connecting,
    /// Active connect completed
    Connected,
    /// Accepting connections
    Listening,
    /// Passive connection produced by accept
    Established,
    /// Close in progress; terminal
    Disconnecting,
}

impl ConnectionState {
    /// A local address exists (explicitly bound or auto-bound)
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            ConnectionState::Bound
                | ConnectionState::Connecting
                | ConnectionState::Connected
                | ConnectionState::Listening
                | ConnectionState::Established
        )
    }

    /// Either side of an established connection
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Established
        )
    }

    pub fn is_listening(self) -> bool {
        matches!(self, ConnectionState::Listening)
    }
}

bitflags! {
    /// Half-close bookkeeping. Bits are monotonic until the socket is
    /// closed; shutdown never clears a previously set half.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ShutdownFlags: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
    }
}

impl From<ShutdownHow> for ShutdownFlags {
    fn from(how: ShutdownHow) -> Self {
        match how {
            ShutdownHow::Read => ShutdownFlags::READ,
            ShutdownHow::Write => ShutdownFlags::WRITE,
            ShutdownHow::Both => ShutdownFlags::READ | ShutdownFlags::WRITE,
        }
    }
}
