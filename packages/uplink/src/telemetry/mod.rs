mod payload;
mod publisher;
mod reading;
mod request;
mod transport;

pub use payload::{format_payload, Payload, PAYLOAD_MAX};
pub use publisher::{Publisher, UplinkCounters};
pub use reading::{Reading, SensorSource};
pub use request::{
    UplinkError, UplinkMethod, UplinkRequest, UplinkResponse, ACCEPT_JSON, CONTENT_TYPE_JSON,
};
pub use transport::{read_prefix, UplinkSession, UplinkTransport};

#[cfg(test)]
mod tests;
