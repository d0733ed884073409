use embassy_time::Duration;

use crate::config::{Endpoint, TransportSecurity};

pub const CONTENT_TYPE_JSON: (&str, &str) = ("Content-Type", "application/json");
pub const ACCEPT_JSON: (&str, &str) = ("Accept", "application/json");

const HEADERS_JSON: &[(&str, &str)] = &[CONTENT_TYPE_JSON];
const HEADERS_JSON_ACCEPT: &[(&str, &str)] = &[CONTENT_TYPE_JSON, ACCEPT_JSON];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UplinkMethod {
    Post,
}

impl UplinkMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
        }
    }
}

/// Everything one uplink cycle sends. Built fresh each cycle.
#[derive(Clone, Copy, Debug)]
pub struct UplinkRequest<'a> {
    pub method: UplinkMethod,
    pub endpoint: &'a Endpoint,
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a str,
    pub security: TransportSecurity,
    pub timeout: Duration,
}

impl<'a> UplinkRequest<'a> {
    pub fn json_post(
        endpoint: &'a Endpoint,
        payload: &'a str,
        accept_json: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            method: UplinkMethod::Post,
            endpoint,
            headers: if accept_json {
                HEADERS_JSON_ACCEPT
            } else {
                HEADERS_JSON
            },
            payload,
            security: endpoint.security(),
            timeout,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UplinkResponse {
    pub status: u16,
    /// Bytes of body kept for the log, at most the configured prefix length.
    pub body_prefix_len: usize,
}

impl UplinkResponse {
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UplinkError {
    Timeout,
    ConnectionRefused,
    Dns,
    Tls,
    Network,
    InvalidEndpoint,
    PayloadOverflow,
    Other,
}

impl UplinkError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection_refused",
            Self::Dns => "dns",
            Self::Tls => "tls",
            Self::Network => "network",
            Self::InvalidEndpoint => "invalid_endpoint",
            Self::PayloadOverflow => "payload_overflow",
            Self::Other => "other",
        }
    }
}
