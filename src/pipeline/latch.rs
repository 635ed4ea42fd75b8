use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Count-down latch: `wait` blocks until `count_down` has been called
/// `count` times. No polling.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: Mutex<usize>,
    released: Condvar,
}

impl CompletionLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.released.notify_all();
        }
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wait(&self) {
        let remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        let _released = self
            .released
            .wait_while(remaining, |left| *left > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// A guard that counts down when dropped, including during unwinding.
    pub fn guard(self: &Arc<Self>) -> LatchGuard {
        LatchGuard {
            latch: Arc::clone(self),
        }
    }
}

pub struct LatchGuard {
    latch: Arc<CompletionLatch>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
