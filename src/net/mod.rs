/*!
 * Network Module
 * Kernel socket layer: addresses, protocol families, devices, sockets
 */

pub mod config;
pub mod device;
pub mod family;
pub mod socket;
pub mod types;

// Re-export public API
pub use config::NetConfig;
pub use socket::SocketManager;
pub use types::{SocketError, SocketResult};
