//! Counting semaphore on `Mutex<usize>` + `Condvar`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::control::CancelToken;

/// How often a cancellable wait re-checks its token.
const CANCEL_POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub(crate) struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    // The counter is a plain integer; a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until a permit is available and takes it.
    pub(crate) fn acquire(&self) {
        let mut permits = self.lock();
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *permits -= 1;
    }

    /// Takes a permit, giving up after `timeout`. Returns true if acquired.
    pub(crate) fn acquire_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut permits = self.lock();
        while *permits == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .available
                .wait_timeout(permits, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            permits = guard;
        }
        *permits -= 1;
        true
    }

    /// Takes a permit unless `cancel` fires first. Returns true if acquired.
    pub(crate) fn acquire_cancellable(&self, cancel: &CancelToken) -> bool {
        let mut permits = self.lock();
        while *permits == 0 {
            if cancel.is_cancelled() {
                return false;
            }
            let (guard, _) = self
                .available
                .wait_timeout(permits, CANCEL_POLL)
                .unwrap_or_else(PoisonError::into_inner);
            permits = guard;
        }
        *permits -= 1;
        true
    }

    /// Returns a permit and wakes one waiter.
    pub(crate) fn release(&self) {
        *self.lock() += 1;
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn acquire_until_exhausted() {
        let s = Semaphore::new(2);
        s.acquire();
        assert!(s.acquire_timeout(Duration::from_millis(10)));
        assert!(!s.acquire_timeout(Duration::from_millis(10)));
        s.release();
        assert!(s.acquire_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn release_wakes_blocked_acquire() {
        let s = Arc::new(Semaphore::new(0));
        let s2 = Arc::clone(&s);
        let h = thread::spawn(move || s2.acquire());
        thread::sleep(Duration::from_millis(20));
        s.release();
        h.join().unwrap();
    }

    #[test]
    fn cancellable_acquire_gives_up() {
        let s = Semaphore::new(0);
        let token = CancelToken::new();
        token.cancel();
        assert!(!s.acquire_cancellable(&token));
    }
}
