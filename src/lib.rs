/*!
 * Socket Kernel Library
 * Kernel-mode socket layer with pluggable protocol families
 */

pub mod core;
pub mod net;

// Re-exports
pub use crate::core::sync::{SyncConfig, WaitError, WaitQueue};
pub use crate::core::types::SockFd;
pub use net::config::NetConfig;
pub use net::device::{DeviceResolver, DeviceTable, NetDevice};
pub use net::family::{Accepted, ConnectProgress, FamilyTable, ProtoFamily, ProtoSocket};
pub use net::socket::{
    ConnectionState, Interest, Linger, MemoryRegistry, ShutdownFlags, SocketManager,
    SocketOptions, SocketRegistry, SocketStats, SyncPort, TimeVal,
};
pub use net::types::{
    AddressFamily, Message, Received, ShutdownHow, SockAddr, SockType, SocketError, SocketResult,
};
