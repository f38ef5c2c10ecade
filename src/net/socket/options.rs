/*!
 * Socket Options
 *
 * Fixed record of socket-level tunables with byte-exact get/set. Gets
 * copy at most the field size and report the copied length; sets require
 * the exact field size. Anything outside this table belongs to the
 * protocol level and is forwarded by the manager.
 */

use crate::net::device::{DeviceResolver, NetDevice};
use crate::net::types::{AddressFamily, SockType, SocketError, SocketResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Socket option level
pub const SOL_SOCKET: i32 = 1;

// Socket-level option names
pub const SO_TYPE: i32 = 3;
pub const SO_ERROR: i32 = 4;
pub const SO_DONTROUTE: i32 = 5;
pub const SO_BROADCAST: i32 = 6;
pub const SO_SNDBUF: i32 = 7;
pub const SO_RCVBUF: i32 = 8;
pub const SO_OOBINLINE: i32 = 10;
pub const SO_LINGER: i32 = 13;
pub const SO_RCVLOWAT: i32 = 18;
pub const SO_SNDLOWAT: i32 = 19;
pub const SO_RCVTIMEO: i32 = 20;
pub const SO_SNDTIMEO: i32 = 21;
pub const SO_BINDTODEVICE: i32 = 25;
pub const SO_ACCEPTCONN: i32 = 30;
pub const SO_PROTOCOL: i32 = 38;
pub const SO_DOMAIN: i32 = 39;

/// Timeout value stored by SO_RCVTIMEO / SO_SNDTIMEO.
/// An all-zero value means "wait indefinitely".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeVal {
    pub sec: u32,
    pub usec: u32,
}

impl TimeVal {
    pub const SIZE: usize = 8;

    pub fn from_millis(ms: u64) -> Self {
        Self {
            sec: (ms / 1000) as u32,
            usec: ((ms % 1000) * 1000) as u32,
        }
    }

    pub fn to_millis(self) -> u64 {
        self.sec as u64 * 1000 + self.usec as u64 / 1000
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&self.sec.to_ne_bytes());
        bytes[4..].copy_from_slice(&self.usec.to_ne_bytes());
        bytes
    }

    pub fn from_bytes(b: &[u8; Self::SIZE]) -> Self {
        Self {
            sec: u32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
            usec: u32::from_ne_bytes([b[4], b[5], b[6], b[7]]),
        }
    }
}

/// SO_LINGER value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Linger {
    pub onoff: u32,
    pub linger: u32,
}

impl Linger {
    pub const SIZE: usize = 8;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&self.onoff.to_ne_bytes());
        bytes[4..].copy_from_slice(&self.linger.to_ne_bytes());
        bytes
    }

    pub fn from_bytes(b: &[u8; Self::SIZE]) -> Self {
        Self {
            onoff: u32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
            linger: u32::from_ne_bytes([b[4], b[5], b[6], b[7]]),
        }
    }
}

/// The fixed socket-level option record
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Set by listen; read-only marker (SO_ACCEPTCONN)
    pub(crate) acceptconn: u32,
    /// Bound device reference (SO_BINDTODEVICE)
    pub(crate) bindtodevice: Option<Arc<NetDevice>>,
    pub(crate) broadcast: u32,
    /// Read-only; fixed at creation (SO_DOMAIN)
    pub(crate) domain: AddressFamily,
    pub(crate) dontroute: u32,
    /// Latched asynchronous error; reading clears it (SO_ERROR)
    pub(crate) error: u32,
    pub(crate) linger: Linger,
    pub(crate) oobinline: u32,
    /// Read-only; fixed at creation (SO_PROTOCOL)
    pub(crate) protocol: u32,
    pub(crate) rcvbuf: u32,
    pub(crate) rcvlowat: u32,
    pub(crate) rcvtimeo: TimeVal,
    pub(crate) sndbuf: u32,
    pub(crate) sndlowat: u32,
    pub(crate) sndtimeo: TimeVal,
    /// Read-only; fixed at creation (SO_TYPE)
    pub(crate) sock_type: SockType,
}

impl SocketOptions {
    pub fn new(domain: AddressFamily, sock_type: SockType, protocol: u32) -> Self {
        use crate::core::limits;
        Self {
            acceptconn: 0,
            bindtodevice: None,
            broadcast: 0,
            domain,
            dontroute: 0,
            error: 0,
            linger: Linger::default(),
            oobinline: 0,
            protocol,
            rcvbuf: limits::DEFAULT_SOCKET_BUFFER,
            rcvlowat: limits::DEFAULT_RCVLOWAT,
            rcvtimeo: TimeVal::default(),
            sndbuf: limits::DEFAULT_SOCKET_BUFFER,
            sndlowat: limits::DEFAULT_SNDLOWAT,
            sndtimeo: TimeVal::default(),
            sock_type,
        }
    }

    /// Read a socket-level option into `buf`.
    ///
    /// Copies at most `min(buf.len(), field size)` bytes and returns the
    /// copied length. Reading SO_ERROR clears the latch.
    pub fn get(&mut self, name: i32, buf: &mut [u8]) -> SocketResult<usize> {
        match name {
            SO_ACCEPTCONN => Ok(copy_partial(&self.acceptconn.to_ne_bytes(), buf)),
            SO_BINDTODEVICE => {
                let copied = match &self.bindtodevice {
                    Some(dev) => copy_partial(dev.name.as_bytes(), buf),
                    None => 0,
                };
                Ok(copied)
            }
            SO_BROADCAST => Ok(copy_partial(&self.broadcast.to_ne_bytes(), buf)),
            SO_DOMAIN => Ok(copy_partial(&self.domain.code().to_ne_bytes(), buf)),
            SO_DONTROUTE => Ok(copy_partial(&self.dontroute.to_ne_bytes(), buf)),
            SO_ERROR => {
                let latched = self.error;
                self.error = 0;
                Ok(copy_partial(&latched.to_ne_bytes(), buf))
            }
            SO_LINGER => Ok(copy_partial(&self.linger.to_bytes(), buf)),
            SO_OOBINLINE => Ok(copy_partial(&self.oobinline.to_ne_bytes(), buf)),
            SO_PROTOCOL => Ok(copy_partial(&self.protocol.to_ne_bytes(), buf)),
            SO_RCVBUF => Ok(copy_partial(&self.rcvbuf.to_ne_bytes(), buf)),
            SO_RCVLOWAT => Ok(copy_partial(&self.rcvlowat.to_ne_bytes(), buf)),
            SO_RCVTIMEO => get_timeval(self.rcvtimeo, buf),
            SO_SNDBUF => Ok(copy_partial(&self.sndbuf.to_ne_bytes(), buf)),
            SO_SNDLOWAT => Ok(copy_partial(&self.sndlowat.to_ne_bytes(), buf)),
            SO_SNDTIMEO => get_timeval(self.sndtimeo, buf),
            SO_TYPE => Ok(copy_partial(&self.sock_type.code().to_ne_bytes(), buf)),
            _ => Err(SocketError::NoSuchOption(name)),
        }
    }

    /// Write a socket-level option.
    ///
    /// The value must match the field size exactly. Read-only fields are
    /// rejected; SO_BINDTODEVICE takes a device name resolved through
    /// `devices`.
    pub fn set(
        &mut self,
        name: i32,
        val: &[u8],
        devices: &dyn DeviceResolver,
    ) -> SocketResult<()> {
        match name {
            SO_ACCEPTCONN | SO_DOMAIN | SO_ERROR | SO_PROTOCOL | SO_TYPE => Err(
                SocketError::invalid_argument("socket option is read-only"),
            ),
            SO_BINDTODEVICE => {
                let name = device_name(val)?;
                match devices.by_name(name) {
                    Some(dev) => {
                        self.bindtodevice = Some(dev);
                        Ok(())
                    }
                    None => Err(SocketError::NoSuchDevice(name.to_string())),
                }
            }
            SO_BROADCAST => set_u32(&mut self.broadcast, val),
            SO_DONTROUTE => set_u32(&mut self.dontroute, val),
            SO_LINGER => {
                self.linger = Linger::from_bytes(exact(val)?);
                Ok(())
            }
            SO_OOBINLINE => set_u32(&mut self.oobinline, val),
            SO_RCVBUF => set_u32(&mut self.rcvbuf, val),
            SO_RCVLOWAT => set_u32(&mut self.rcvlowat, val),
            SO_RCVTIMEO => {
                self.rcvtimeo = TimeVal::from_bytes(exact(val)?);
                Ok(())
            }
            SO_SNDBUF => set_u32(&mut self.sndbuf, val),
            SO_SNDLOWAT => set_u32(&mut self.sndlowat, val),
            SO_SNDTIMEO => {
                self.sndtimeo = TimeVal::from_bytes(exact(val)?);
                Ok(())
            }
            _ => Err(SocketError::NoSuchOption(name)),
        }
    }
}

/// Copy `min(buf.len(), src.len())` bytes, returning the copied length
fn copy_partial(src: &[u8], buf: &mut [u8]) -> usize {
    let n = src.len().min(buf.len());
    buf[..n].copy_from_slice(&src[..n]);
    n
}

/// Timeout reads reject buffers larger than the field
fn get_timeval(tv: TimeVal, buf: &mut [u8]) -> SocketResult<usize> {
    if buf.len() > TimeVal::SIZE {
        return Err(SocketError::SizeMismatch {
            got: buf.len(),
            expected: TimeVal::SIZE,
        });
    }
    Ok(copy_partial(&tv.to_bytes(), buf))
}

fn set_u32(field: &mut u32, val: &[u8]) -> SocketResult<()> {
    let bytes: [u8; 4] = val.try_into().map_err(|_| SocketError::SizeMismatch {
        got: val.len(),
        expected: 4,
    })?;
    *field = u32::from_ne_bytes(bytes);
    Ok(())
}

fn exact<const N: usize>(val: &[u8]) -> SocketResult<&[u8; N]> {
    val.try_into().map_err(|_| SocketError::SizeMismatch {
        got: val.len(),
        expected: N,
    })
}

/// Device names arrive as raw bytes, possibly NUL-terminated
fn device_name(val: &[u8]) -> SocketResult<&str> {
    let bytes = match val.iter().position(|b| *b == 0) {
        Some(end) => &val[..end],
        None => val,
    };
    let name = std::str::from_utf8(bytes)
        .map_err(|_| SocketError::invalid_argument("device name is not valid UTF-8"))?;
    if name.is_empty() {
        return Err(SocketError::invalid_argument("empty device name"));
    }
    Ok(name)
}
