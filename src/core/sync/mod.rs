/*!
 * Synchronization Module
 * Keyed wait/wake primitives backing blocking socket calls
 */

pub mod condvar;
pub mod config;
pub mod spinwait;
pub mod traits;
pub mod wait;

// Re-export public API
pub use config::{StrategyType, SyncConfig};
pub use traits::{WaitStrategy, WakeResult};
pub use wait::{WaitError, WaitQueue, WaitResult};
