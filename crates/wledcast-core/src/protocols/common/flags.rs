use crate::protocols::sacn::error::{EncodingError, Layer};
use crate::protocols::sacn::layout::{PDU_FLAGS, PDU_MAX_LENGTH};

/// Pack a PDU length into the 16-bit flags-and-length field.
pub(crate) fn flags_and_length(layer: Layer, length: usize) -> Result<u16, EncodingError> {
    if length > PDU_MAX_LENGTH {
        return Err(EncodingError::LengthOverflow { layer, length });
    }
    Ok(PDU_FLAGS | length as u16)
}

/// Split a flags-and-length field into (flags, length).
pub(crate) fn split_flags_and_length(value: u16) -> (u16, usize) {
    (value & !(PDU_MAX_LENGTH as u16), (value & PDU_MAX_LENGTH as u16) as usize)
}
