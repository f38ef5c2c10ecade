/*!
 * Core Types
 * Common types used across the socket layer
 */

/// Socket descriptor type
pub type SockFd = u32;

/// Listen backlog type
pub type Backlog = i32;

/// Protocol number within a family (e.g. IPPROTO_* values)
pub type Protocol = u32;
