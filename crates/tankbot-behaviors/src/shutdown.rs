// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Program-wide stop request shared by every behavior loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct ShutdownInner {
    triggered: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Cancellation flag with interruptible sleeps
///
/// Once triggered it stays triggered. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<ShutdownInner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let _guard = self.inner.lock.lock();
        self.inner.triggered.store(true, Ordering::Release);
        self.inner.wake.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, waking early on shutdown
    ///
    /// Returns `true` if shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.inner.lock.lock();
        while !self.is_triggered() {
            if self.inner.wake.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_triggered()
    }
}
