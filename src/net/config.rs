/*!
 * Network Configuration
 * Runtime configuration for the socket layer
 */

use crate::core::limits;

/// Socket layer configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Milliseconds a blocking connect waits once the protocol reports
    /// "in progress"; zero waits indefinitely
    pub connect_timeout_ms: u64,
    /// First descriptor handed out by the socket table
    pub fd_base: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: limits::DEFAULT_CONNECT_TIMEOUT_MS,
            fd_base: limits::SOCKET_FD_BASE,
        }
    }
}

impl NetConfig {
    /// Override the connect timeout (milliseconds, zero = infinite)
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }
}
