/*!
 * Wait Queue
 *
 * Keyed wait/wake with optional timeout. The strategy is chosen once at
 * construction and dispatched through an enum, so the hot path carries no
 * vtable indirection.
 */

use super::condvar::CondvarWait;
use super::config::{StrategyType, SyncConfig};
use super::spinwait::SpinWait;
use super::traits::{WaitStrategy, WakeResult};
use std::time::Duration;
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("wait timed out")]
    Timeout,
}

enum StrategyImpl<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    Condvar(CondvarWait<K>),
    SpinWait(SpinWait<K>),
}

impl<K> StrategyImpl<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    #[inline(always)]
    fn wait(&self, key: K, timeout: Option<Duration>) -> bool {
        match self {
            Self::Condvar(s) => s.wait(key, timeout),
            Self::SpinWait(s) => s.wait(key, timeout),
        }
    }

    #[inline(always)]
    fn wake_one(&self, key: K) -> WakeResult {
        match self {
            Self::Condvar(s) => s.wake_one(key),
            Self::SpinWait(s) => s.wake_one(key),
        }
    }

    #[inline(always)]
    fn wake_all(&self, key: K) -> WakeResult {
        match self {
            Self::Condvar(s) => s.wake_all(key),
            Self::SpinWait(s) => s.wake_all(key),
        }
    }

    #[inline(always)]
    fn waiter_count(&self, key: K) -> usize {
        match self {
            Self::Condvar(s) => s.waiter_count(key),
            Self::SpinWait(s) => s.waiter_count(key),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Condvar(s) => s.name(),
            Self::SpinWait(s) => s.name(),
        }
    }
}

/// Generic wait queue keyed by `K`.
///
/// Socket blocking calls key waits by `(SockFd, Interest)` so readiness in
/// one direction never wakes waiters for the other. Share across threads
/// by wrapping in `Arc`.
pub struct WaitQueue<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    strategy: StrategyImpl<K>,
}

impl<K> WaitQueue<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    /// Create a new wait queue with the specified configuration
    pub fn new(config: SyncConfig) -> Self {
        let strategy = match config.select_strategy() {
            StrategyType::SpinWait => {
                StrategyImpl::SpinWait(SpinWait::new(config.spin_duration, config.max_spins))
            }
            StrategyType::Condvar | StrategyType::Auto => StrategyImpl::Condvar(CondvarWait::new()),
        };

        Self { strategy }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SyncConfig::default())
    }

    /// Create configured for long waits (socket I/O)
    pub fn long_wait() -> Self {
        Self::new(SyncConfig::long_wait())
    }

    /// Park until a wake arrives for `key`, up to `timeout`.
    ///
    /// `None` waits indefinitely. A wake does not guarantee the awaited
    /// condition holds; callers re-check after returning.
    #[inline]
    pub fn wait(&self, key: K, timeout: Option<Duration>) -> WaitResult<()> {
        if self.strategy.wait(key, timeout) {
            Ok(())
        } else {
            Err(WaitError::Timeout)
        }
    }

    /// Wake one waiter parked on `key`
    #[inline]
    pub fn wake_one(&self, key: K) -> WakeResult {
        self.strategy.wake_one(key)
    }

    /// Wake all waiters parked on `key`
    #[inline]
    pub fn wake_all(&self, key: K) -> WakeResult {
        self.strategy.wake_all(key)
    }

    /// Approximate count of waiters for `key` (diagnostics)
    #[inline]
    pub fn waiter_count(&self, key: K) -> usize {
        self.strategy.waiter_count(key)
    }

    /// Name of the active strategy
    #[inline]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}
