//! Bucket lock acquisition.
//!
//! Every bucket is guarded by a `parking_lot::RwLock`. [`LockMode`] decides
//! how a guard is obtained: `Blocking` parks the thread inside the lock,
//! `BusyWaiting` keeps calling `try_read`/`try_write` with a spin hint in
//! between. Either way the caller gets an RAII guard, so the lock is released
//! on every exit path including unwinding out of a user callback.

use crate::config::LockMode;
use crate::stats::BucketStats;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::hint::spin_loop;

/// Acquire a shared guard on `lock` using `mode`.
#[inline]
pub(crate) fn acquire_read<'a, T>(
    mode: LockMode,
    lock: &'a RwLock<T>,
    stats: &BucketStats,
) -> RwLockReadGuard<'a, T> {
    #[cfg(feature = "lock-timing")]
    let start = std::time::Instant::now();

    let guard = match mode {
        LockMode::Blocking => lock.read(),
        LockMode::BusyWaiting => spin_until(|| lock.try_read(), stats),
    };

    stats.record_lock_acquisition();
    #[cfg(feature = "lock-timing")]
    stats.record_lock_wait(start.elapsed().as_nanos() as u64);
    guard
}

/// Acquire an exclusive guard on `lock` using `mode`.
#[inline]
pub(crate) fn acquire_write<'a, T>(
    mode: LockMode,
    lock: &'a RwLock<T>,
    stats: &BucketStats,
) -> RwLockWriteGuard<'a, T> {
    #[cfg(feature = "lock-timing")]
    let start = std::time::Instant::now();

    let guard = match mode {
        LockMode::Blocking => lock.write(),
        LockMode::BusyWaiting => spin_until(|| lock.try_write(), stats),
    };

    stats.record_lock_acquisition();
    #[cfg(feature = "lock-timing")]
    stats.record_lock_wait(start.elapsed().as_nanos() as u64);
    guard
}

/// Retry `attempt` until it yields a guard. Never parks.
#[inline]
fn spin_until<G, F>(mut attempt: F, stats: &BucketStats) -> G
where
    F: FnMut() -> Option<G>,
{
    let mut retries = 0u64;
    let guard = loop {
        if let Some(guard) = attempt() {
            break guard;
        }
        retries += 1;
        spin_loop();
    };
    if retries > 0 {
        stats.record_spin_retries(retries);
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    const MODES: [LockMode; 2] = [LockMode::Blocking, LockMode::BusyWaiting];

    #[test]
    fn test_read_then_write() {
        for mode in MODES {
            let lock = RwLock::new(1);
            let stats = BucketStats::new();
            {
                let a = acquire_read(mode, &lock, &stats);
                let b = acquire_read(mode, &lock, &stats);
                assert_eq!(*a + *b, 2);
            }
            *acquire_write(mode, &lock, &stats) += 1;
            assert_eq!(*acquire_read(mode, &lock, &stats), 2);
        }
    }

    #[test]
    fn test_writer_excludes_waiting_thread() {
        for mode in MODES {
            let lock = Arc::new(RwLock::new(0u32));
            let released = Arc::new(AtomicBool::new(false));
            let barrier = Arc::new(Barrier::new(2));

            let guard = lock.write();
            let waiter = {
                let lock = Arc::clone(&lock);
                let released = Arc::clone(&released);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let stats = BucketStats::new();
                    barrier.wait();
                    let value = *acquire_read(mode, &*lock, &stats);
                    // The writer must have let go before the read went through.
                    assert!(released.load(Ordering::SeqCst));
                    value
                })
            };

            barrier.wait();
            thread::sleep(Duration::from_millis(20));
            let mut guard = guard;
            *guard = 7;
            released.store(true, Ordering::SeqCst);
            drop(guard);

            assert_eq!(waiter.join().unwrap(), 7);
        }
    }

    #[test]
    fn test_busy_wait_writers_serialize() {
        let lock = Arc::new(RwLock::new(0u64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    let stats = BucketStats::new();
                    for _ in 0..1000 {
                        *acquire_write(LockMode::BusyWaiting, &*lock, &stats) += 1;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.read(), 8000);
    }
}
