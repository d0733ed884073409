use embassy_futures::{block_on, join::join};
use embassy_time::{Duration, Instant, Timer};

use super::{
    Publisher, Reading, SensorSource, UplinkError, UplinkRequest, UplinkSession, UplinkTransport,
    ACCEPT_JSON, CONTENT_TYPE_JSON,
};
use crate::config::{
    Endpoint, NetworkCredentials, NodeConfig, SecurityPolicy, TlsTrust, UplinkPolicy,
};
use crate::connectivity::Readiness;
use crate::shutdown::ShutdownToken;

#[derive(Clone, Copy, Debug)]
enum Scripted {
    Status(u16, &'static str),
    Fail(UplinkError),
    RefuseOpen(UplinkError),
    Hang,
}

struct FixedSensor {
    reading: Reading,
    samples: u32,
}

impl FixedSensor {
    fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            reading: Reading {
                temperature,
                humidity,
            },
            samples: 0,
        }
    }
}

impl SensorSource for FixedSensor {
    fn sample(&mut self) -> Reading {
        self.samples += 1;
        self.reading
    }
}

struct ScriptedTransport {
    script: Vec<Scripted>,
    next: usize,
    opened: u32,
    released: u32,
    in_flight: u32,
    max_in_flight: u32,
    perform_delay: Duration,
    started: Vec<Instant>,
    payloads: Vec<String>,
    headers: Vec<Vec<(String, String)>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            script: Vec::new(),
            next: 0,
            opened: 0,
            released: 0,
            in_flight: 0,
            max_in_flight: 0,
            perform_delay: Duration::from_ticks(0),
            started: Vec::new(),
            payloads: Vec::new(),
            headers: Vec::new(),
        }
    }
}

impl ScriptedTransport {
    fn with_script(script: &[Scripted]) -> Self {
        Self {
            script: script.to_vec(),
            ..Self::default()
        }
    }

    fn next_step(&mut self) -> Scripted {
        let step = if self.script.is_empty() {
            Scripted::Status(200, "")
        } else {
            self.script[self.next % self.script.len()]
        };
        self.next += 1;
        step
    }
}

struct ScriptedSession<'t> {
    transport: &'t mut ScriptedTransport,
    step: Scripted,
    body: &'static str,
}

impl UplinkTransport for ScriptedTransport {
    type Session<'t> = ScriptedSession<'t>;

    fn open<'t>(
        &'t mut self,
        request: &UplinkRequest<'t>,
    ) -> Result<Self::Session<'t>, UplinkError> {
        let step = self.next_step();
        if let Scripted::RefuseOpen(err) = step {
            return Err(err);
        }
        self.opened += 1;
        self.in_flight += 1;
        self.max_in_flight = self.max_in_flight.max(self.in_flight);
        self.headers.push(
            request
                .headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        );
        Ok(ScriptedSession {
            transport: self,
            step,
            body: "",
        })
    }
}

impl UplinkSession for ScriptedSession<'_> {
    async fn perform(&mut self, body: &[u8]) -> Result<u16, UplinkError> {
        self.transport.started.push(Instant::now());
        self.transport
            .payloads
            .push(String::from_utf8_lossy(body).into_owned());
        if self.transport.perform_delay > Duration::from_ticks(0) {
            Timer::after(self.transport.perform_delay).await;
        }
        match self.step {
            Scripted::Status(status, body) => {
                self.body = body;
                Ok(status)
            }
            Scripted::Fail(err) | Scripted::RefuseOpen(err) => Err(err),
            Scripted::Hang => {
                Timer::after(Duration::from_secs(3_600)).await;
                Ok(200)
            }
        }
    }

    async fn read_response(&mut self, buf: &mut [u8]) -> Result<usize, UplinkError> {
        let len = self.body.len().min(buf.len());
        buf[..len].copy_from_slice(&self.body.as_bytes()[..len]);
        Ok(len)
    }
}

impl Drop for ScriptedSession<'_> {
    fn drop(&mut self) {
        self.transport.released += 1;
        self.transport.in_flight -= 1;
    }
}

fn node_config() -> NodeConfig {
    let credentials =
        match NetworkCredentials::new("lab-net", "correct horse", SecurityPolicy::Wpa2Personal) {
            Ok(credentials) => credentials,
            Err(err) => panic!("credentials rejected: {}", err.as_str()),
        };
    let endpoint = match Endpoint::parse("http://192.168.1.10:5000/api/data", TlsTrust::Refuse) {
        Ok(endpoint) => endpoint,
        Err(err) => panic!("endpoint rejected: {}", err.as_str()),
    };
    match NodeConfig::new(credentials, endpoint, "esp32-1") {
        Ok(config) => config,
        Err(err) => panic!("config rejected: {}", err.as_str()),
    }
}

fn fast_policy(period_ms: u32, timeout_ms: u32) -> UplinkPolicy {
    UplinkPolicy {
        period_ms,
        timeout_ms,
        ..UplinkPolicy::defaults()
    }
}

fn ready() -> Readiness {
    let readiness = Readiness::new();
    readiness.mark_ready();
    readiness
}

#[test]
fn no_transmission_before_address_assignment() {
    let config = node_config();
    let readiness = Readiness::new();
    let shutdown = ShutdownToken::new();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::default(),
        &readiness,
        &config,
    )
    .with_policy(fast_policy(10, 500));

    block_on(join(publisher.run(&shutdown), async {
        Timer::after(Duration::from_millis(100)).await;
        shutdown.trigger();
    }));

    assert_eq!(publisher.transport().opened, 0);
    assert_eq!(publisher.sensor().samples, 0);
    assert_eq!(publisher.counters().cycles, 0);
}

#[test]
fn first_cycle_sends_exact_payload_and_holds_default_period() {
    let config = node_config();
    let readiness = ready();
    let shutdown = ShutdownToken::new();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::default(),
        &readiness,
        &config,
    );
    assert_eq!(publisher.policy().period_ms, 15_000);

    let started = Instant::now();
    block_on(join(publisher.run(&shutdown), async {
        Timer::after(Duration::from_millis(200)).await;
        shutdown.trigger();
    }));

    let transport = publisher.transport();
    assert_eq!(
        transport.payloads,
        vec!["{\"temperature\":25.0,\"humidity\":50.0,\"deviceId\":\"esp32-1\"}".to_string()]
    );
    // no second send inside the default 15 s period; the spacing between
    // consecutive sends is measured in transmissions_never_overlap_and_keep_period
    assert_eq!(transport.opened, 1);
    assert_eq!(transport.released, 1);
    // shutdown cut the 15 s sleep short
    assert!(Instant::now() - started < Duration::from_secs(5));
}

#[test]
fn payload_matches_reading_and_device_id() {
    let config = node_config();
    let readiness = ready();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.3, 51.7),
        ScriptedTransport::default(),
        &readiness,
        &config,
    );

    let result = block_on(publisher.cycle());
    assert!(result.is_ok());
    assert_eq!(
        publisher.transport().payloads[0],
        "{\"temperature\":25.3,\"humidity\":51.7,\"deviceId\":\"esp32-1\"}"
    );
}

#[test]
fn request_headers_follow_policy() {
    let config = node_config();
    let readiness = ready();
    let mut publisher = Publisher::new(
        FixedSensor::new(21.0, 40.0),
        ScriptedTransport::default(),
        &readiness,
        &config,
    );
    let _ = block_on(publisher.cycle());

    let mut publisher = publisher.with_policy(UplinkPolicy {
        accept_json: false,
        ..UplinkPolicy::defaults()
    });
    let _ = block_on(publisher.cycle());

    let owned = |(name, value): (&str, &str)| (name.to_string(), value.to_string());
    let headers = &publisher.transport().headers;
    assert_eq!(headers[0], vec![owned(CONTENT_TYPE_JSON), owned(ACCEPT_JSON)]);
    assert_eq!(headers[1], vec![owned(CONTENT_TYPE_JSON)]);
}

#[test]
fn every_opened_handle_is_released_across_mixed_outcomes() {
    let config = node_config();
    let readiness = ready();
    let mut script = vec![
        Scripted::Status(200, "{\"ok\":true}"),
        Scripted::Status(500, "boom"),
        Scripted::Fail(UplinkError::ConnectionRefused),
        Scripted::Fail(UplinkError::Dns),
        Scripted::Status(201, ""),
        Scripted::Fail(UplinkError::Tls),
        Scripted::RefuseOpen(UplinkError::InvalidEndpoint),
        Scripted::Status(404, "missing"),
        Scripted::Fail(UplinkError::Network),
    ];
    script.extend(core::iter::repeat(Scripted::Status(200, "")).take(40));
    script.push(Scripted::Hang);
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::with_script(&script),
        &readiness,
        &config,
    )
    .with_policy(fast_policy(1, 2));

    block_on(async {
        for _ in 0..1_000 {
            let _ = publisher.cycle().await;
        }
    });

    let transport = publisher.transport();
    let counters = publisher.counters();
    assert_eq!(counters.cycles, 1_000);
    assert!(transport.opened > 0);
    assert_eq!(transport.opened, transport.released);
    assert_eq!(transport.in_flight, 0);
    assert_eq!(counters.handles_opened, transport.opened);
    assert_eq!(counters.handles_released, transport.released);
    assert_eq!(
        counters.successes + counters.non_success_status + counters.failures,
        counters.cycles
    );
    assert!(counters.timeouts > 0);
}

#[test]
fn transmissions_never_overlap_and_keep_period() {
    let config = node_config();
    let readiness = ready();
    let shutdown = ShutdownToken::new();
    let transport = ScriptedTransport {
        perform_delay: Duration::from_millis(5),
        ..ScriptedTransport::default()
    };
    let mut publisher = Publisher::new(FixedSensor::new(25.0, 50.0), transport, &readiness, &config)
        .with_policy(fast_policy(30, 500));

    block_on(join(publisher.run(&shutdown), async {
        Timer::after(Duration::from_millis(250)).await;
        shutdown.trigger();
    }));

    let transport = publisher.transport();
    assert!(transport.started.len() >= 3);
    assert_eq!(transport.max_in_flight, 1);
    for pair in transport.started.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(30));
    }
}

#[test]
fn hung_transmission_times_out_and_releases_handle() {
    let config = node_config();
    let readiness = ready();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::with_script(&[Scripted::Hang]),
        &readiness,
        &config,
    )
    .with_policy(fast_policy(1_000, 20));

    let started = Instant::now();
    let result = block_on(publisher.cycle());
    let elapsed = Instant::now() - started;

    assert_eq!(result, Err(UplinkError::Timeout));
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_secs(5));
    assert_eq!(publisher.transport().released, 1);
    assert_eq!(publisher.counters().timeouts, 1);
    assert_eq!(publisher.counters().failures, 1);
}

#[test]
fn non_success_status_is_counted_separately() {
    let config = node_config();
    let readiness = ready();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::with_script(&[Scripted::Status(503, "busy")]),
        &readiness,
        &config,
    );

    let result = block_on(publisher.cycle());
    assert_eq!(result.map(|response| response.status), Ok(503));
    let counters = publisher.counters();
    assert_eq!(counters.non_success_status, 1);
    assert_eq!(counters.failures, 0);
    assert_eq!(counters.successes, 0);
}

#[test]
fn response_body_is_truncated_to_prefix() {
    let config = node_config();
    let readiness = ready();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::with_script(&[Scripted::Status(200, "{\"ok\":true,\"reading\":{}}")]),
        &readiness,
        &config,
    )
    .with_policy(UplinkPolicy {
        response_prefix_len: 6,
        ..UplinkPolicy::defaults()
    });

    let result = block_on(publisher.cycle());
    assert_eq!(result.map(|response| response.body_prefix_len), Ok(6));
}

#[test]
fn open_failure_consumes_no_handle() {
    let config = node_config();
    let readiness = ready();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::with_script(&[Scripted::RefuseOpen(UplinkError::InvalidEndpoint)]),
        &readiness,
        &config,
    );

    let result = block_on(publisher.cycle());
    assert_eq!(result, Err(UplinkError::InvalidEndpoint));
    assert_eq!(publisher.counters().handles_opened, 0);
    assert_eq!(publisher.transport().released, 0);
}

#[test]
fn shutdown_while_waiting_for_link_returns() {
    let config = node_config();
    let readiness = Readiness::new();
    let shutdown = ShutdownToken::new();
    shutdown.trigger();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::default(),
        &readiness,
        &config,
    );

    block_on(publisher.run(&shutdown));
    assert_eq!(publisher.counters().cycles, 0);
}

#[test]
fn link_loss_after_start_does_not_pause_cycles() {
    let config = node_config();
    let readiness = ready();
    let shutdown = ShutdownToken::new();
    let mut publisher = Publisher::new(
        FixedSensor::new(25.0, 50.0),
        ScriptedTransport::with_script(&[Scripted::Fail(UplinkError::Network)]),
        &readiness,
        &config,
    )
    .with_policy(fast_policy(20, 100));

    block_on(join(publisher.run(&shutdown), async {
        Timer::after(Duration::from_millis(10)).await;
        readiness.mark_not_ready();
        Timer::after(Duration::from_millis(100)).await;
        shutdown.trigger();
    }));

    assert!(publisher.counters().cycles >= 3);
    assert_eq!(publisher.counters().failures, publisher.counters().cycles);
}
