use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, watch::Watch};
use embassy_time::{Duration, Timer};

/// Concurrent `await_ready` callers served by the watch itself.
pub(crate) const READINESS_WAITERS: usize = 4;
const READINESS_FALLBACK_POLL_MS: u64 = 100;

/// "Link up with an address" flag, written only by the connectivity manager.
///
/// A caller that already got past [`Readiness::await_ready`] is not recalled
/// when the link later drops; its next transmission simply fails.
pub struct Readiness {
    state: Watch<CriticalSectionRawMutex, bool, READINESS_WAITERS>,
}

impl Readiness {
    pub const fn new() -> Self {
        Self {
            state: Watch::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.try_get().unwrap_or(false)
    }

    /// Suspends until the link is ready. No timeout.
    pub async fn await_ready(&self) {
        match self.state.receiver() {
            Some(mut receiver) => {
                receiver.get_and(|ready| *ready).await;
            }
            None => {
                // every watch slot is held by another waiter
                while !self.is_ready() {
                    Timer::after(Duration::from_millis(READINESS_FALLBACK_POLL_MS)).await;
                }
            }
        }
    }

    pub(crate) fn mark_ready(&self) {
        self.state.sender().send(true);
    }

    pub(crate) fn mark_not_ready(&self) {
        self.state.sender().send(false);
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}
