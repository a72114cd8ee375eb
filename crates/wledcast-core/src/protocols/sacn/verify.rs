use serde::Serialize;

use super::error::{Layer, VerifyError};
use super::layout;
use super::reader::SacnReader;
use crate::identity::Cid;
use crate::protocols::common::flags::split_flags_and_length;

/// Header fields recovered from an encoded data packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketHeaders {
    pub root_length: usize,
    pub framing_length: usize,
    pub dmp_length: usize,
    pub cid: String,
    pub source_name: String,
    pub priority: u8,
    pub sync_address: u16,
    pub sequence: u8,
    pub options: u8,
    pub universe: u16,
    pub property_value_count: u16,
    pub slot_count: usize,
}

/// Check an encoded data packet: constants at their offsets and every
/// flags-and-length field equal to the bytes that follow it.
///
/// # Examples
/// ```
/// use wledcast_core::{DataPacket, SourceIdentity, encode_data_packet, verify_data_packet};
///
/// let identity = SourceIdentity::new([1; 16], "desk");
/// let slots = [0u8; 512];
/// let packet = encode_data_packet(&DataPacket::new(3, &identity, 9, 100, &slots))?;
/// let headers = verify_data_packet(packet.as_bytes())?;
/// assert_eq!(headers.universe, 3);
/// assert_eq!(headers.root_length, 622);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn verify_data_packet(bytes: &[u8]) -> Result<PacketHeaders, VerifyError> {
    let reader = SacnReader::new(bytes);
    reader.require_len(layout::DMX_DATA_OFFSET)?;

    let preamble = reader.u16_at(layout::PREAMBLE_SIZE_RANGE.start)?;
    let postamble = reader.u16_at(layout::POSTAMBLE_SIZE_RANGE.start)?;
    if preamble != layout::PREAMBLE_SIZE || postamble != layout::POSTAMBLE_SIZE {
        return Err(VerifyError::InvalidPreamble {
            preamble,
            postamble,
        });
    }

    if reader.slice(layout::ACN_PID_RANGE)? != layout::ACN_PID {
        return Err(VerifyError::InvalidAcnPid);
    }

    let root_length =
        read_pdu_length(&reader, Layer::Root, layout::ROOT_FLAGS_LENGTH_RANGE, bytes.len())?;
    let root_vector = reader.u32_at(layout::ROOT_VECTOR_RANGE.start)?;
    if root_vector != layout::ROOT_VECTOR_DATA {
        return Err(VerifyError::InvalidRootVector { value: root_vector });
    }

    let framing_length = read_pdu_length(
        &reader,
        Layer::Framing,
        layout::FRAMING_FLAGS_LENGTH_RANGE,
        bytes.len(),
    )?;
    let framing_vector = reader.u32_at(layout::FRAMING_VECTOR_RANGE.start)?;
    if framing_vector != layout::FRAMING_VECTOR_DMX {
        return Err(VerifyError::InvalidFramingVector {
            value: framing_vector,
        });
    }

    let dmp_length =
        read_pdu_length(&reader, Layer::Dmp, layout::DMP_FLAGS_LENGTH_RANGE, bytes.len())?;
    let dmp_vector = reader.u8_at(layout::DMP_VECTOR_OFFSET)?;
    if dmp_vector != layout::DMP_VECTOR_SET_PROPERTY {
        return Err(VerifyError::InvalidDmpVector { value: dmp_vector });
    }
    let address_type = reader.u8_at(layout::ADDRESS_TYPE_OFFSET)?;
    if address_type != layout::DMP_ADDRESS_TYPE {
        return Err(VerifyError::InvalidAddressType {
            value: address_type,
        });
    }
    let first = reader.u16_at(layout::FIRST_PROPERTY_ADDRESS_RANGE.start)?;
    let increment = reader.u16_at(layout::ADDRESS_INCREMENT_RANGE.start)?;
    if first != layout::DMP_FIRST_PROPERTY_ADDRESS || increment != layout::DMP_ADDRESS_INCREMENT {
        return Err(VerifyError::InvalidAddressing { first, increment });
    }

    let property_value_count =
        reader.u16_at(layout::DMP_PROPERTY_VALUE_COUNT_RANGE.start)?;
    let values = bytes.len() - layout::START_CODE_OFFSET;
    if property_value_count as usize != values {
        return Err(VerifyError::InvalidPropertyValueCount {
            declared: property_value_count as usize,
            actual: values,
        });
    }

    let start_code = reader.u8_at(layout::START_CODE_OFFSET)?;
    if start_code != layout::START_CODE_DMX {
        return Err(VerifyError::InvalidStartCode { value: start_code });
    }

    Ok(PacketHeaders {
        root_length,
        framing_length,
        dmp_length,
        cid: Cid::from_bytes(reader.array(layout::CID_RANGE.start)?).to_string(),
        source_name: String::from_utf8_lossy(reader.slice(layout::SOURCE_NAME_RANGE)?)
            .trim_end_matches('\0')
            .to_string(),
        priority: reader.u8_at(layout::PRIORITY_OFFSET)?,
        sync_address: reader.u16_at(layout::SYNC_ADDRESS_RANGE.start)?,
        sequence: reader.u8_at(layout::SEQUENCE_OFFSET)?,
        options: reader.u8_at(layout::OPTIONS_OFFSET)?,
        universe: reader.u16_at(layout::UNIVERSE_RANGE.start)?,
        property_value_count,
        slot_count: values - 1,
    })
}

/// Read a flags-and-length field and compare it with the bytes from the
/// field's own offset to the end of the packet.
fn read_pdu_length(
    reader: &SacnReader<'_>,
    layer: Layer,
    range: std::ops::Range<usize>,
    total: usize,
) -> Result<usize, VerifyError> {
    let remaining = total - range.start;
    let (flags, declared) = split_flags_and_length(reader.u16_at(range.start)?);
    if flags != layout::PDU_FLAGS {
        return Err(VerifyError::InvalidFlags { layer, flags });
    }
    if declared != remaining {
        return Err(VerifyError::LengthMismatch {
            layer,
            declared,
            actual: remaining,
        });
    }
    Ok(declared)
}
