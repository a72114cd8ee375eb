use thiserror::Error;

/// PDU whose flags-and-length field is being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Root,
    Framing,
    Dmp,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Layer::Root => "root",
            Layer::Framing => "framing",
            Layer::Dmp => "DMP",
        };
        f.write_str(name)
    }
}

/// Errors returned while assembling an sACN data packet.
///
/// # Examples
/// ```
/// use wledcast_core::EncodingError;
///
/// let err = EncodingError::InvalidFrameLength { length: 511 };
/// assert!(err.to_string().contains("invalid DMX frame length"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid DMX frame length: expected 512 slots, got {length}")]
    InvalidFrameLength { length: usize },
    #[error("{layer} layer length {length} exceeds the 12-bit field (max 4095)")]
    LengthOverflow { layer: Layer, length: usize },
    #[error("invalid priority: {value} (allowed 0..=200)")]
    InvalidPriority { value: u8 },
    #[error("invalid DMX channel: {channel} (allowed 1..=512)")]
    InvalidChannel { channel: usize },
}

/// Errors returned when re-reading an encoded packet.
///
/// Note: verification only covers packets produced by this crate; it is not
/// a general purpose receiver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid preamble/postamble: {preamble:#06x}/{postamble:#06x}")]
    InvalidPreamble { preamble: u16, postamble: u16 },
    #[error("invalid ACN PID")]
    InvalidAcnPid,
    #[error("invalid root vector: {value}")]
    InvalidRootVector { value: u32 },
    #[error("invalid framing vector: {value}")]
    InvalidFramingVector { value: u32 },
    #[error("invalid DMP vector: {value}")]
    InvalidDmpVector { value: u8 },
    #[error("invalid DMP address/data type: {value:#04x}")]
    InvalidAddressType { value: u8 },
    #[error("invalid DMP addressing: first {first}, increment {increment}")]
    InvalidAddressing { first: u16, increment: u16 },
    #[error("invalid start code: {value}")]
    InvalidStartCode { value: u8 },
    #[error("invalid flags {flags:#x} in {layer} layer")]
    InvalidFlags { layer: Layer, flags: u16 },
    #[error("{layer} layer length mismatch: field says {declared}, packet has {actual}")]
    LengthMismatch {
        layer: Layer,
        declared: usize,
        actual: usize,
    },
    #[error("invalid property value count: field says {declared}, packet has {actual}")]
    InvalidPropertyValueCount { declared: usize, actual: usize },
}
