use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};

/// One-shot stop request for the publisher loop.
///
/// Triggering is sticky. `wait` wakes a single waiter, which is all the
/// publisher needs.
pub struct ShutdownToken {
    triggered: AtomicBool,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl ShutdownToken {
    pub const fn new() -> Self {
        Self {
            triggered: AtomicBool::new(false),
            signal: Signal::new(),
        }
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
        self.signal.signal(());
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    pub async fn wait(&self) {
        while !self.is_triggered() {
            self.signal.wait().await;
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}
