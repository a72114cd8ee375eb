//! Per-layer PDU encoders.
//!
//! Each encoder takes the already-encoded inner PDU and prepends its own
//! header, so every flags-and-length field is derived from a real buffer
//! size rather than a precomputed offset.

use super::error::{EncodingError, Layer};
use super::layout;
use crate::protocols::common::flags::flags_and_length;

/// Framing layer fields that vary per packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingFields<'a> {
    pub source_name: &'a [u8; layout::SOURCE_NAME_LEN],
    pub priority: u8,
    pub sync_address: u16,
    pub sequence: u8,
    pub options: u8,
    pub universe: u16,
}

/// Root layer header size (preamble through CID).
const ROOT_HEADER_LEN: usize = layout::FRAMING_FLAGS_LENGTH_RANGE.start;
/// Framing layer header size (flags-and-length through universe).
const FRAMING_HEADER_LEN: usize = layout::DMP_FLAGS_LENGTH_RANGE.start - ROOT_HEADER_LEN;
/// DMP layer header size up to, not including, the start code.
const DMP_HEADER_LEN: usize = layout::START_CODE_OFFSET - layout::DMP_FLAGS_LENGTH_RANGE.start;

/// Encode the DMP layer: header, start code, then the channel values.
pub fn encode_dmp_layer(values: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let length = DMP_HEADER_LEN + 1 + values.len();
    let flags = flags_and_length(Layer::Dmp, length)?;
    // 12-bit length check above keeps the count well inside u16.
    let property_count = (values.len() + 1) as u16;

    let mut pdu = Vec::with_capacity(length);
    pdu.extend_from_slice(&flags.to_be_bytes());
    pdu.push(layout::DMP_VECTOR_SET_PROPERTY);
    pdu.push(layout::DMP_ADDRESS_TYPE);
    pdu.extend_from_slice(&layout::DMP_FIRST_PROPERTY_ADDRESS.to_be_bytes());
    pdu.extend_from_slice(&layout::DMP_ADDRESS_INCREMENT.to_be_bytes());
    pdu.extend_from_slice(&property_count.to_be_bytes());
    pdu.push(layout::START_CODE_DMX);
    pdu.extend_from_slice(values);
    Ok(pdu)
}

/// Encode the framing layer around an encoded DMP PDU.
pub fn encode_framing_layer(
    fields: &FramingFields<'_>,
    dmp: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    if fields.priority > layout::MAX_PRIORITY {
        return Err(EncodingError::InvalidPriority {
            value: fields.priority,
        });
    }
    let length = FRAMING_HEADER_LEN + dmp.len();
    let flags = flags_and_length(Layer::Framing, length)?;

    let mut pdu = Vec::with_capacity(length);
    pdu.extend_from_slice(&flags.to_be_bytes());
    pdu.extend_from_slice(&layout::FRAMING_VECTOR_DMX.to_be_bytes());
    pdu.extend_from_slice(fields.source_name);
    pdu.push(fields.priority);
    pdu.extend_from_slice(&fields.sync_address.to_be_bytes());
    pdu.push(fields.sequence);
    pdu.push(fields.options);
    pdu.extend_from_slice(&fields.universe.to_be_bytes());
    pdu.extend_from_slice(dmp);
    Ok(pdu)
}

/// Encode the root layer around an encoded framing PDU.
///
/// The root length covers everything from its own flags field to the end of
/// the packet, i.e. the whole packet minus preamble, postamble and PID.
pub fn encode_root_layer(
    cid: &[u8; layout::CID_LEN],
    framing: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    let total = ROOT_HEADER_LEN + framing.len();
    let flags = flags_and_length(Layer::Root, total - layout::ROOT_FLAGS_LENGTH_RANGE.start)?;

    let mut packet = Vec::with_capacity(total);
    packet.extend_from_slice(&layout::PREAMBLE_SIZE.to_be_bytes());
    packet.extend_from_slice(&layout::POSTAMBLE_SIZE.to_be_bytes());
    packet.extend_from_slice(layout::ACN_PID);
    packet.extend_from_slice(&flags.to_be_bytes());
    packet.extend_from_slice(&layout::ROOT_VECTOR_DATA.to_be_bytes());
    packet.extend_from_slice(cid);
    packet.extend_from_slice(framing);
    Ok(packet)
}

/// Null-pad or truncate a source name into the fixed 64-byte field.
///
/// Truncation never splits a UTF-8 character.
pub fn encode_source_name(name: &str) -> [u8; layout::SOURCE_NAME_LEN] {
    let mut end = name.len().min(layout::SOURCE_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut field = [0u8; layout::SOURCE_NAME_LEN];
    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    field
}
