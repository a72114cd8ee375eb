use super::error::EncodingError;
use super::layers::{FramingFields, encode_dmp_layer, encode_framing_layer, encode_root_layer};
use super::layout;
use crate::identity::SourceIdentity;

/// Inputs of a single E1.31 data packet.
#[derive(Debug, Clone, Copy)]
pub struct DataPacket<'a> {
    pub universe: u16,
    pub identity: &'a SourceIdentity,
    pub sequence: u8,
    pub priority: u8,
    pub options: u8,
    pub sync_address: u16,
    pub slots: &'a [u8],
}

impl<'a> DataPacket<'a> {
    /// Live data packet with default options and no synchronization.
    pub fn new(
        universe: u16,
        identity: &'a SourceIdentity,
        sequence: u8,
        priority: u8,
        slots: &'a [u8],
    ) -> Self {
        Self {
            universe,
            identity,
            sequence,
            priority,
            options: 0,
            sync_address: 0,
            slots,
        }
    }
}

/// Immutable, fully assembled packet ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    bytes: Box<[u8]>,
}

impl EncodedPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.into_vec()
    }
}

impl AsRef<[u8]> for EncodedPacket {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Assemble root, framing and DMP layers around a full 512-slot frame.
///
/// Layers are built innermost first; identical inputs always produce
/// identical bytes.
///
/// # Examples
/// ```
/// use wledcast_core::{DataPacket, SourceIdentity, encode_data_packet};
///
/// let identity = SourceIdentity::new([0x12; 16], "desk");
/// let slots = [0u8; 512];
/// let packet = encode_data_packet(&DataPacket::new(1, &identity, 0, 100, &slots))?;
/// assert_eq!(packet.len(), 638);
/// # Ok::<(), wledcast_core::EncodingError>(())
/// ```
pub fn encode_data_packet(packet: &DataPacket<'_>) -> Result<EncodedPacket, EncodingError> {
    if packet.slots.len() != layout::DMX_MAX_SLOTS {
        return Err(EncodingError::InvalidFrameLength {
            length: packet.slots.len(),
        });
    }

    let dmp = encode_dmp_layer(packet.slots)?;
    let framing = encode_framing_layer(
        &FramingFields {
            source_name: packet.identity.name_field(),
            priority: packet.priority,
            sync_address: packet.sync_address,
            sequence: packet.sequence,
            options: packet.options,
            universe: packet.universe,
        },
        &dmp,
    )?;
    let bytes = encode_root_layer(packet.identity.cid().as_bytes(), &framing)?;

    Ok(EncodedPacket {
        bytes: bytes.into_boxed_slice(),
    })
}
