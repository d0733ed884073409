use core::fmt::Write as _;

use heapless::String;

use super::reading::Reading;
use super::request::UplinkError;

pub const PAYLOAD_MAX: usize = 192;

pub type Payload = String<PAYLOAD_MAX>;

/// `{"temperature":T,"humidity":H,"deviceId":"<id>"}` with one decimal place.
pub fn format_payload(reading: Reading, device_id: &str) -> Result<Payload, UplinkError> {
    let mut out = Payload::new();
    out.push_str("{\"temperature\":")
        .map_err(|_| UplinkError::PayloadOverflow)?;
    write_number(&mut out, reading.temperature)?;
    out.push_str(",\"humidity\":")
        .map_err(|_| UplinkError::PayloadOverflow)?;
    write_number(&mut out, reading.humidity)?;
    out.push_str(",\"deviceId\":\"")
        .map_err(|_| UplinkError::PayloadOverflow)?;
    write_escaped(&mut out, device_id)?;
    out.push_str("\"}")
        .map_err(|_| UplinkError::PayloadOverflow)?;
    Ok(out)
}

fn write_number(out: &mut Payload, value: f32) -> Result<(), UplinkError> {
    if value.is_finite() {
        write!(out, "{:.1}", value).map_err(|_| UplinkError::PayloadOverflow)
    } else {
        // JSON has no NaN or infinity
        out.push_str("null").map_err(|_| UplinkError::PayloadOverflow)
    }
}

fn write_escaped(out: &mut Payload, text: &str) -> Result<(), UplinkError> {
    for ch in text.chars() {
        let written = match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32).map_err(|_| ()),
            c => out.push(c),
        };
        written.map_err(|_| UplinkError::PayloadOverflow)?;
    }
    Ok(())
}
