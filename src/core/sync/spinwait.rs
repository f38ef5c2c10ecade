/*!
 * Spin Wait Strategy
 *
 * Briefly spins before parking on the condvar fallback. Useful when the
 * expected wait is shorter than a park/unpark round trip (loopback
 * readiness, already-signaled ports).
 */

use super::condvar::CondvarWait;
use super::traits::{WaitStrategy, WakeResult};
use std::thread;
use std::time::{Duration, Instant};

/// Adaptive spin followed by a condvar park
pub struct SpinWait<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    fallback: CondvarWait<K>,
    spin_duration: Duration,
    max_spins: u32,
}

impl<K> SpinWait<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    pub fn new(spin_duration: Duration, max_spins: u32) -> Self {
        Self {
            fallback: CondvarWait::new(),
            spin_duration,
            max_spins,
        }
    }

    fn spin(&self, deadline: Option<Instant>) {
        let start = Instant::now();
        let mut spins = 0u32;

        while start.elapsed() < self.spin_duration && spins < self.max_spins {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return;
                }
            }
            if spins < 16 {
                std::hint::spin_loop();
            } else {
                thread::yield_now();
            }
            spins += 1;
        }
    }
}

impl<K> WaitStrategy<K> for SpinWait<K>
where
    K: Eq + std::hash::Hash + Copy + Send + Sync + 'static,
{
    fn wait(&self, key: K, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        let deadline = timeout.map(|t| start + t);

        self.spin(deadline);

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return false;
            }
        }

        let remaining = timeout.map(|t| t.saturating_sub(start.elapsed()));
        self.fallback.wait(key, remaining)
    }

    fn wake_one(&self, key: K) -> WakeResult {
        self.fallback.wake_one(key)
    }

    fn wake_all(&self, key: K) -> WakeResult {
        self.fallback.wake_all(key)
    }

    fn waiter_count(&self, key: K) -> usize {
        self.fallback.waiter_count(key)
    }

    fn name(&self) -> &'static str {
        "spinwait"
    }
}
