//! Connectivity and telemetry core of the sensor node.
//!
//! Hardware stays behind [`NetworkControl`], [`SensorSource`] and
//! [`UplinkTransport`], so everything here runs on the host as well.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod connectivity;
pub mod shutdown;
pub mod telemetry;

pub use config::{
    ConfigError, Endpoint, NetworkCredentials, NodeConfig, SecurityPolicy, TlsTrust,
    TransportSecurity, UplinkPolicy,
};
pub use connectivity::{
    ConnectivityManager, LinkCounters, LinkEvent, LinkEventChannel, LinkState, NetworkControl,
    Readiness, RetryPolicy,
};
pub use shutdown::ShutdownToken;
pub use telemetry::{
    format_payload, Publisher, Reading, SensorSource, UplinkCounters, UplinkError, UplinkRequest,
    UplinkResponse, UplinkSession, UplinkTransport,
};
