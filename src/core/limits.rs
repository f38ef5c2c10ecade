/*!
 * System Limits and Constants
 *
 * Centralized location for socket-layer limits, thresholds, and defaults.
 */

// =============================================================================
// SOCKET DESCRIPTORS
// =============================================================================

/// First descriptor handed out by the socket table.
/// Keeps socket descriptors visually distinct from file descriptors.
pub const SOCKET_FD_BASE: u32 = 1000;

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Default connect timeout in milliseconds for blocking connects whose
/// protocol reports "in progress". Zero would mean wait forever.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// BUFFERING
// =============================================================================

/// Default value reported through SO_SNDBUF / SO_RCVBUF
pub const DEFAULT_SOCKET_BUFFER: u32 = 16 * 1024;

/// Default receive low-water mark (SO_RCVLOWAT)
pub const DEFAULT_RCVLOWAT: u32 = 1;

/// Default send low-water mark (SO_SNDLOWAT)
pub const DEFAULT_SNDLOWAT: u32 = 1;

// =============================================================================
// LISTENING
// =============================================================================

/// Backlog used when listen() is called with a non-positive value
pub const DEFAULT_LISTEN_BACKLOG: i32 = 1;

// =============================================================================
// SYNCHRONIZATION
// =============================================================================

/// Number of parking slots for keyed wait strategies (power of 2).
/// Distinct keys may share a slot; waiters re-check their condition on wake.
pub const WAIT_PARKING_SLOTS: usize = 64;
