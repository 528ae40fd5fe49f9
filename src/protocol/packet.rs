//! Telemetry payload codec
//!
//! # Payload Format
//!
//! The transport carries the addressing bytes and the frame length, so the
//! application payload is just text:
//! ```text
//! [packet_id: u8]?[name][':'][value]
//! ```
//!
//! - `packet_id`: sender's sequence byte, present only when packet-ID tagging is on
//! - `name`: telemetry key, must not contain the separator
//! - `value`: telemetry value, everything after the first separator
//!
//! There is no length prefix and no versioning. A payload that cannot be
//! decoded is dropped by the receiver.

use crate::config::protocol::{MAX_DATA_LEN, SEPARATOR};
use heapless::{String, Vec};

/// Encoded application payload
pub type Payload = Vec<u8, MAX_DATA_LEN>;

/// Text field of a decoded payload
pub type Field = String<MAX_DATA_LEN>;

/// Errors produced while encoding or decoding a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Shorter than the minimum header
    TooShort,
    /// No separator between name and value
    MissingSeparator,
    /// Name contains the separator and could not be decoded back
    SeparatorInName,
    /// Encoded payload exceeds the radio frame
    PayloadTooLarge,
    /// Name or value is not valid UTF-8
    InvalidText,
}

/// Decoded payload fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub packet_id: Option<u8>,
    pub name: Field,
    pub value: Field,
}

/// Minimum payload length: the separator, plus the sequence byte if tagged
pub fn min_len(packet_ids: bool) -> usize {
    if packet_ids {
        2
    } else {
        1
    }
}

/// Encode a name/value pair, optionally prefixed with a packet ID
pub fn encode(name: &str, value: &str, packet_id: Option<u8>) -> Result<Payload, CodecError> {
    if name.as_bytes().contains(&SEPARATOR) {
        return Err(CodecError::SeparatorInName);
    }

    let mut payload = Payload::new();
    if let Some(id) = packet_id {
        payload.push(id).map_err(|_| CodecError::PayloadTooLarge)?;
    }
    payload
        .extend_from_slice(name.as_bytes())
        .map_err(|_| CodecError::PayloadTooLarge)?;
    payload
        .push(SEPARATOR)
        .map_err(|_| CodecError::PayloadTooLarge)?;
    payload
        .extend_from_slice(value.as_bytes())
        .map_err(|_| CodecError::PayloadTooLarge)?;

    Ok(payload)
}

/// Decode a received payload
///
/// When `packet_ids` is set the first byte is taken as the packet ID before
/// splitting name from value at the first separator.
pub fn decode(data: &[u8], packet_ids: bool) -> Result<Decoded, CodecError> {
    if data.len() < min_len(packet_ids) {
        return Err(CodecError::TooShort);
    }

    let (packet_id, body) = if packet_ids {
        (Some(data[0]), &data[1..])
    } else {
        (None, data)
    };

    let split = body
        .iter()
        .position(|&b| b == SEPARATOR)
        .ok_or(CodecError::MissingSeparator)?;

    Ok(Decoded {
        packet_id,
        name: to_field(&body[..split])?,
        value: to_field(&body[split + 1..])?,
    })
}

fn to_field(bytes: &[u8]) -> Result<Field, CodecError> {
    let text = core::str::from_utf8(bytes).map_err(|_| CodecError::InvalidText)?;
    let mut field = Field::new();
    field
        .push_str(text)
        .map_err(|_| CodecError::PayloadTooLarge)?;
    Ok(field)
}
