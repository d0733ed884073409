use core::fmt::Debug;

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver},
};
use embassy_time::{Duration, Instant, Timer};

use super::engine::{LinkApplyResult, LinkEngine};
use super::policy::RetryPolicy;
use super::readiness::Readiness;
use super::state::{LinkCounters, LinkEvent, LinkState};
use crate::config::NetworkCredentials;

/// Bounded queue carrying stack events into the manager.
pub type LinkEventChannel<const N: usize> = Channel<CriticalSectionRawMutex, LinkEvent, N>;

/// The radio/network stack as seen by the connectivity manager.
///
/// `initialize` brings the driver up, registers the station-started,
/// address-assigned and disconnected callbacks, applies the credentials and
/// starts the station. `associate` issues one association attempt; its outcome
/// arrives later as an event.
#[allow(async_fn_in_trait)]
pub trait NetworkControl {
    type Error: Debug;

    async fn initialize(&mut self, credentials: &NetworkCredentials) -> Result<(), Self::Error>;

    async fn associate(&mut self) -> Result<(), Self::Error>;
}

pub struct ConnectivityManager<'r, C> {
    control: C,
    engine: LinkEngine,
    readiness: &'r Readiness,
    retry: RetryPolicy,
    disconnect_streak: u32,
    counters: LinkCounters,
    started_at: Instant,
}

impl<'r, C: NetworkControl> ConnectivityManager<'r, C> {
    pub fn new(control: C, readiness: &'r Readiness, retry: RetryPolicy) -> Self {
        Self {
            control,
            engine: LinkEngine::new(),
            readiness,
            retry: retry.sanitized(),
            disconnect_streak: 0,
            counters: LinkCounters::default(),
            started_at: Instant::now(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.engine.state()
    }

    pub fn counters(&self) -> LinkCounters {
        self.counters
    }

    pub fn readiness(&self) -> &'r Readiness {
        self.readiness
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    /// Fatal on error: nothing retries a failed stack bring-up.
    pub async fn initialize(&mut self, credentials: &NetworkCredentials) -> Result<(), C::Error> {
        log::info!(
            "net: initialize ssid={} min_security={} retry={}",
            credentials.ssid(),
            credentials.min_security().as_str(),
            self.retry.as_str()
        );
        self.control.initialize(credentials).await?;
        self.handle(LinkEvent::Initialize).await;
        Ok(())
    }

    pub async fn handle(&mut self, event: LinkEvent) -> LinkState {
        let result = self.engine.apply(event);
        self.record(event, result);

        match result.readiness {
            Some(true) => self.readiness.mark_ready(),
            Some(false) => self.readiness.mark_not_ready(),
            None => {}
        }

        if result.associate {
            self.associate(event).await;
        }
        result.after
    }

    pub async fn run<const N: usize>(
        &mut self,
        events: Receiver<'_, CriticalSectionRawMutex, LinkEvent, N>,
    ) -> ! {
        loop {
            let event = events.receive().await;
            self.handle(event).await;
        }
    }

    fn record(&mut self, event: LinkEvent, result: LinkApplyResult) {
        match event {
            LinkEvent::AddressAssigned { ipv4 } => {
                self.counters.addresses_assigned = self.counters.addresses_assigned.wrapping_add(1);
                self.disconnect_streak = 0;
                log::info!(
                    "net: address ipv4={}.{}.{}.{}",
                    ipv4[0],
                    ipv4[1],
                    ipv4[2],
                    ipv4[3]
                );
            }
            LinkEvent::Disconnected { reason } => {
                self.counters.disconnections = self.counters.disconnections.wrapping_add(1);
                self.disconnect_streak = self.disconnect_streak.saturating_add(1);
                log::warn!(
                    "net: disconnected reason={} streak={}",
                    reason,
                    self.disconnect_streak
                );
            }
            LinkEvent::Initialize | LinkEvent::StationStarted => {}
        }

        if result.changed() {
            let at_ms = self.started_at.elapsed().as_millis() as u32;
            log::info!(
                "net: transition from={} to={} trigger={} at_ms={}",
                result.before.as_str(),
                result.after.as_str(),
                event.as_str(),
                at_ms
            );
        }
    }

    async fn associate(&mut self, trigger: LinkEvent) {
        // backoff paces reconnects only; a fresh station start associates at once
        let delay_ms = match trigger {
            LinkEvent::Disconnected { .. } if self.disconnect_streak > 0 => {
                self.retry.delay_ms(self.disconnect_streak)
            }
            _ => 0,
        };
        if delay_ms > 0 {
            log::info!(
                "net: associate backoff_ms={} streak={}",
                delay_ms,
                self.disconnect_streak
            );
            Timer::after(Duration::from_millis(delay_ms as u64)).await;
        }

        self.counters.association_attempts = self.counters.association_attempts.wrapping_add(1);
        if let Err(err) = self.control.associate().await {
            // the stack follows up with a disconnected event
            self.counters.association_errors = self.counters.association_errors.wrapping_add(1);
            log::warn!("net: associate err={:?}", err);
        }
    }
}
