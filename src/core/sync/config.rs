/*!
 * Synchronization Configuration
 * Runtime configuration for wait strategy selection
 */

use std::time::Duration;

/// Strategy type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Condvar-based (cross-platform, reliable)
    Condvar,
    /// Brief spin before parking (low-latency short waits)
    SpinWait,
    /// Auto-select for the expected workload
    Auto,
}

/// Synchronization configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Preferred strategy
    pub strategy: StrategyType,
    /// Spin duration before parking (for SpinWait)
    pub spin_duration: Duration,
    /// Maximum spin iterations before parking
    pub max_spins: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: Duration::from_micros(10),
            max_spins: 100,
        }
    }
}

impl SyncConfig {
    /// Configuration for waits expected to be short (< 1ms)
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::SpinWait,
            spin_duration: Duration::from_micros(50),
            max_spins: 500,
        }
    }

    /// Configuration for long waits (socket I/O, typically >= 1ms)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Condvar,
            spin_duration: Duration::from_micros(1),
            max_spins: 10,
        }
    }

    /// Resolve Auto to a concrete strategy
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto => StrategyType::Condvar,
            other => other,
        }
    }
}
