//! Counting semaphore for capping concurrent API lookups.
//!
//! Uses `Mutex + Condvar` from std. A permit is handed out as a
//! [`SemaphoreGuard`] and returned when the guard drops, so every exit path
//! of a lookup (success, transport error, decode error, panic) releases it
//! exactly once.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A counting semaphore that limits concurrent access to a shared resource.
pub struct Semaphore {
    available: Mutex<usize>,
    cond: Condvar,
    capacity: usize,
}

/// RAII guard that releases one permit on drop.
#[must_use = "dropping the guard releases the permit immediately"]
pub struct SemaphoreGuard<'a>(&'a Semaphore);

impl Semaphore {
    /// Create a semaphore with `permits` initial permits.
    ///
    /// A zero-permit semaphore would block every caller forever, so
    /// `permits` is clamped to at least one.
    pub fn new(permits: usize) -> Self {
        let capacity = permits.max(1);
        Self {
            available: Mutex::new(capacity),
            cond: Condvar::new(),
            capacity,
        }
    }

    /// Block until a permit is available, then acquire it.
    pub fn acquire(&self) -> SemaphoreGuard<'_> {
        let mut count = self.lock();
        while *count == 0 {
            count = self
                .cond
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
        SemaphoreGuard(self)
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        *self.lock()
    }

    /// Total permits this semaphore was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // The counter stays consistent even if a holder panicked, so a
    // poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("available", &self.available())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Drop for SemaphoreGuard<'_> {
    fn drop(&mut self) {
        let mut count = self.0.lock();
        debug_assert!(*count < self.0.capacity, "permit released twice");
        *count += 1;
        self.0.cond.notify_one();
    }
}
