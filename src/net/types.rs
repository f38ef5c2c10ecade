/*!
 * Network Types
 * Addresses, messages, and the socket error taxonomy
 */

use crate::core::types::SockFd;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddrV4, SocketAddrV6};
use thiserror::Error;

/// Socket operation result
pub type SocketResult<T> = Result<T, SocketError>;

/// Address family of a socket or address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    Unix,
    Inet,
    Inet6,
    Packet,
}

impl AddressFamily {
    /// Numeric code reported through SO_DOMAIN
    pub fn code(self) -> u32 {
        match self {
            AddressFamily::Unix => 1,
            AddressFamily::Inet => 2,
            AddressFamily::Inet6 => 10,
            AddressFamily::Packet => 17,
        }
    }
}

/// Socket type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SockType {
    Stream,
    Datagram,
    Raw,
}

impl SockType {
    /// Numeric code reported through SO_TYPE
    pub fn code(self) -> u32 {
        match self {
            SockType::Stream => 1,
            SockType::Datagram => 2,
            SockType::Raw => 3,
        }
    }

    /// Connection-oriented types require an established peer for transfer
    pub fn is_connection_oriented(self) -> bool {
        matches!(self, SockType::Stream)
    }
}

/// Transport address, tagged by family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SockAddr {
    Unix(String),
    Inet(SocketAddrV4),
    Inet6(SocketAddrV6),
    Packet { ifindex: u32 },
}

impl SockAddr {
    pub fn family(&self) -> AddressFamily {
        match self {
            SockAddr::Unix(_) => AddressFamily::Unix,
            SockAddr::Inet(_) => AddressFamily::Inet,
            SockAddr::Inet6(_) => AddressFamily::Inet6,
            SockAddr::Packet { .. } => AddressFamily::Packet,
        }
    }
}

/// Which half of a connection to shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownHow {
    Read,
    Write,
    Both,
}

/// A send request: optional destination, payload, per-call flags.
///
/// Per-call flags are not implemented by this layer; any non-zero value
/// is rejected before the protocol is consulted.
#[derive(Debug, Clone)]
pub struct Message<'a> {
    pub addr: Option<SockAddr>,
    pub payload: &'a [u8],
    pub flags: u32,
}

impl<'a> Message<'a> {
    /// Message for a connected socket (no destination)
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            addr: None,
            payload,
            flags: 0,
        }
    }

    /// Message with an explicit destination
    pub fn to(addr: SockAddr, payload: &'a [u8]) -> Self {
        Self {
            addr: Some(addr),
            payload,
            flags: 0,
        }
    }
}

/// Outcome of a receive: bytes written into the caller's buffer plus the
/// source address when the protocol reports one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub len: usize,
    pub from: Option<SockAddr>,
}

/// Socket operation errors.
///
/// Downstream code matches on these kinds; they are stable and mirror the
/// classic errno split between "not supported by this family"
/// (`OperationNotSupported`) and "not built into this image"
/// (`Unimplemented`).
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SocketError {
    /// No such socket
    #[error("no such socket: {0}")]
    BadHandle(SockFd),

    /// Malformed call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Address family differs from the socket's
    #[error("address family mismatch")]
    AddressFamilyMismatch,

    /// Another socket already holds the address
    #[error("address already in use")]
    AddressInUse,

    /// Operation needs a bound or destination address
    #[error("destination address required")]
    AddressRequired,

    /// Socket is already connected
    #[error("socket is already connected")]
    AlreadyConnected,

    /// A connection attempt is already in progress
    #[error("operation already in progress")]
    AlreadyInProgress,

    /// Socket is not connected
    #[error("socket is not connected")]
    NotConnected,

    /// Socket is not listening
    #[error("socket is not listening")]
    NotListening,

    /// The protocol family lacks this capability
    #[error("operation not supported by protocol family")]
    OperationNotSupported,

    /// The capability exists but this build omits it
    #[error("not implemented: {0}")]
    Unimplemented(String),

    /// The needed half of the connection is shut down
    #[error("broken pipe")]
    BrokenPipe,

    /// Blocking call exceeded its timeout
    #[error("operation timed out")]
    TimedOut,

    /// Peer reset the connection
    #[error("connection reset")]
    ConnectionReset,

    /// Unknown socket-level option
    #[error("no such option: {0}")]
    NoSuchOption(i32),

    /// Option buffer size does not match the field
    #[error("option size mismatch: got {got}, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },

    /// SO_BINDTODEVICE named an unknown device
    #[error("no such device: {0}")]
    NoSuchDevice(String),

    /// Protocol layer ran out of a resource
    #[error("out of resources: {0}")]
    ResourceExhausted(String),

    /// Opaque protocol-layer failure
    #[error("protocol backend failure: {0}")]
    BackendFailure(String),
}

impl SocketError {
    /// Create an invalid argument error
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unimplemented-capability error
    #[inline]
    pub fn unimplemented(op: impl Into<String>) -> Self {
        Self::Unimplemented(op.into())
    }

    /// Create an opaque backend error
    #[inline]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendFailure(msg.into())
    }
}
