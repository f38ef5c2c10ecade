/*!
 * Condvar Wait Strategy
 *
 * Cross-platform strategy built on parking_lot::Condvar over a fixed
 * array of slots. Keys hash to a slot; colliding keys share a condvar,
 * which only costs spurious wakes that callers already tolerate.
 */

use super::traits::{WaitStrategy, WakeResult};
use crate::core::limits::WAIT_PARKING_SLOTS;
use parking_lot::{Condvar, Mutex};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SLOT_MASK: usize = WAIT_PARKING_SLOTS - 1;

/// One parking slot shared by all keys hashing to it
#[repr(C, align(64))]
struct Slot {
    condvar: Condvar,
    mutex: Mutex<()>,
    waiters: AtomicUsize,
}

impl Slot {
    const fn new() -> Self {
        Self {
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
            waiters: AtomicUsize::new(0),
        }
    }
}

/// Condvar-based wait strategy with fixed slot storage.
///
/// Slot addresses are stable for the lifetime of the strategy, which the
/// condvar requires; nothing allocates after construction.
pub struct CondvarWait<K>
where
    K: Eq + Hash + Copy + Send + Sync + 'static,
{
    slots: Box<[Slot; WAIT_PARKING_SLOTS]>,
    _key: std::marker::PhantomData<K>,
}

impl<K> CondvarWait<K>
where
    K: Eq + Hash + Copy + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Box::new([const { Slot::new() }; WAIT_PARKING_SLOTS]),
            _key: std::marker::PhantomData,
        }
    }

    #[inline]
    fn slot(&self, key: K) -> &Slot {
        let mut hasher = ahash::AHasher::default();
        key.hash(&mut hasher);
        &self.slots[(hasher.finish() as usize) & SLOT_MASK]
    }
}

impl<K> Default for CondvarWait<K>
where
    K: Eq + Hash + Copy + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> WaitStrategy<K> for CondvarWait<K>
where
    K: Eq + Hash + Copy + Send + Sync + 'static,
{
    fn wait(&self, key: K, timeout: Option<Duration>) -> bool {
        let slot = self.slot(key);

        slot.waiters.fetch_add(1, Ordering::Relaxed);
        let mut guard = slot.mutex.lock();

        let timed_out = match timeout {
            Some(timeout) => slot.condvar.wait_for(&mut guard, timeout).timed_out(),
            None => {
                slot.condvar.wait(&mut guard);
                false
            }
        };

        drop(guard);
        slot.waiters.fetch_sub(1, Ordering::Relaxed);

        !timed_out
    }

    fn wake_one(&self, key: K) -> WakeResult {
        let slot = self.slot(key);
        if slot.waiters.load(Ordering::Relaxed) == 0 {
            return WakeResult::NoWaiters;
        }
        slot.condvar.notify_one();
        WakeResult::Woken(1)
    }

    fn wake_all(&self, key: K) -> WakeResult {
        let slot = self.slot(key);
        let count = slot.waiters.load(Ordering::Relaxed);
        if count == 0 {
            return WakeResult::NoWaiters;
        }
        slot.condvar.notify_all();
        WakeResult::Woken(count)
    }

    fn waiter_count(&self, key: K) -> usize {
        self.slot(key).waiters.load(Ordering::Relaxed)
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}
