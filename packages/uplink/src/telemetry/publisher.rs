use embassy_futures::select::{select, Either};
use embassy_time::{with_timeout, Duration, Timer};

use super::payload::format_payload;
use super::reading::{Reading, SensorSource};
use super::request::{UplinkError, UplinkRequest, UplinkResponse};
use super::transport::{UplinkSession, UplinkTransport};
use crate::config::{NodeConfig, UplinkPolicy, RESPONSE_PREFIX_MAX};
use crate::connectivity::Readiness;
use crate::shutdown::ShutdownToken;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UplinkCounters {
    pub cycles: u32,
    pub successes: u32,
    /// Responses received with a status outside 2xx.
    pub non_success_status: u32,
    pub failures: u32,
    pub timeouts: u32,
    pub handles_opened: u32,
    pub handles_released: u32,
}

/// Periodic sample-and-send loop. One transmission at a time.
pub struct Publisher<'a, S, T> {
    sensor: S,
    transport: T,
    readiness: &'a Readiness,
    config: &'a NodeConfig,
    policy: UplinkPolicy,
    counters: UplinkCounters,
}

impl<'a, S, T> Publisher<'a, S, T>
where
    S: SensorSource,
    T: UplinkTransport,
{
    pub fn new(sensor: S, transport: T, readiness: &'a Readiness, config: &'a NodeConfig) -> Self {
        Self {
            sensor,
            transport,
            readiness,
            config,
            policy: config.uplink,
            counters: UplinkCounters::default(),
        }
    }

    /// Replaces the uplink policy as given, without clamping.
    pub fn with_policy(mut self, policy: UplinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> UplinkPolicy {
        self.policy
    }

    pub fn counters(&self) -> UplinkCounters {
        self.counters
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Waits for the link once, then cycles until `shutdown` fires.
    ///
    /// Readiness is not rechecked between cycles. A transmission already in
    /// flight when shutdown fires runs to completion or timeout.
    pub async fn run(&mut self, shutdown: &ShutdownToken) {
        log::info!("uplink: waiting for link");
        if let Either::Second(()) = select(self.readiness.await_ready(), shutdown.wait()).await {
            log::info!("uplink: stopped before link was ready");
            return;
        }

        log::info!(
            "uplink: start endpoint={} security={} period_ms={} timeout_ms={}",
            self.config.endpoint.as_str(),
            self.config.endpoint.security().as_str(),
            self.policy.period_ms,
            self.policy.timeout_ms
        );

        let period = Duration::from_millis(self.policy.period_ms as u64);
        while !shutdown.is_triggered() {
            let _ = self.cycle().await;
            if let Either::Second(()) = select(Timer::after(period), shutdown.wait()).await {
                break;
            }
        }

        let counters = self.counters;
        log::info!(
            "uplink: stopped cycles={} ok={} non_2xx={} failures={} timeouts={}",
            counters.cycles,
            counters.successes,
            counters.non_success_status,
            counters.failures,
            counters.timeouts
        );
    }

    /// One sample, format, transmit round. Failures are logged and counted, never retried.
    pub async fn cycle(&mut self) -> Result<UplinkResponse, UplinkError> {
        self.counters.cycles = self.counters.cycles.wrapping_add(1);
        let reading = self.sensor.sample();
        let result = self.transmit(reading).await;

        match result {
            Ok(response) if response.is_success() => {
                self.counters.successes = self.counters.successes.wrapping_add(1);
                log::info!("uplink: sent status={}", response.status);
            }
            Ok(response) => {
                self.counters.non_success_status = self.counters.non_success_status.wrapping_add(1);
                log::warn!("uplink: sent status={}", response.status);
            }
            Err(err) => {
                if err == UplinkError::Timeout {
                    self.counters.timeouts = self.counters.timeouts.wrapping_add(1);
                }
                self.counters.failures = self.counters.failures.wrapping_add(1);
                log::warn!("uplink: send failed err={}", err.as_str());
            }
        }
        result
    }

    async fn transmit(&mut self, reading: Reading) -> Result<UplinkResponse, UplinkError> {
        let payload = format_payload(reading, self.config.device_id.as_str())?;
        let timeout = Duration::from_millis(self.policy.timeout_ms as u64);
        let request = UplinkRequest::json_post(
            &self.config.endpoint,
            payload.as_str(),
            self.policy.accept_json,
            timeout,
        );
        log::debug!(
            "uplink: {} {} bytes={}",
            request.method.as_str(),
            request.endpoint.as_str(),
            request.payload.len()
        );

        let mut prefix = [0u8; RESPONSE_PREFIX_MAX];
        let prefix_limit = (self.policy.response_prefix_len as usize).min(RESPONSE_PREFIX_MAX);

        let mut session = self.transport.open(&request)?;
        self.counters.handles_opened = self.counters.handles_opened.wrapping_add(1);

        let exchange = async {
            let status = session.perform(request.payload.as_bytes()).await?;
            let body_len = if prefix_limit == 0 {
                0
            } else {
                match session.read_response(&mut prefix[..prefix_limit]).await {
                    Ok(len) => len.min(prefix_limit),
                    Err(err) => {
                        log::warn!("uplink: body read failed err={}", err.as_str());
                        0
                    }
                }
            };
            Ok::<_, UplinkError>((status, body_len))
        };
        let outcome = with_timeout(timeout, exchange).await;

        drop(session);
        self.counters.handles_released = self.counters.handles_released.wrapping_add(1);

        let (status, body_prefix_len) = outcome.map_err(|_| UplinkError::Timeout)??;
        if body_prefix_len > 0 {
            match core::str::from_utf8(&prefix[..body_prefix_len]) {
                Ok(text) => log::info!("uplink: response body={}", text),
                Err(_) => log::info!("uplink: response body bytes={}", body_prefix_len),
            }
        }
        Ok(UplinkResponse {
            status,
            body_prefix_len,
        })
    }
}
