pub const PREAMBLE_SIZE_RANGE: std::ops::Range<usize> = 0..2;
pub const POSTAMBLE_SIZE_RANGE: std::ops::Range<usize> = 2..4;
pub const ACN_PID_RANGE: std::ops::Range<usize> = 4..16;

pub const ROOT_FLAGS_LENGTH_RANGE: std::ops::Range<usize> = 16..18;
pub const ROOT_VECTOR_RANGE: std::ops::Range<usize> = 18..22;
pub const CID_RANGE: std::ops::Range<usize> = 22..38;

pub const FRAMING_FLAGS_LENGTH_RANGE: std::ops::Range<usize> = 38..40;
pub const FRAMING_VECTOR_RANGE: std::ops::Range<usize> = 40..44;
pub const SOURCE_NAME_RANGE: std::ops::Range<usize> = 44..108;
pub const PRIORITY_OFFSET: usize = 108;
pub const SYNC_ADDRESS_RANGE: std::ops::Range<usize> = 109..111;
pub const SEQUENCE_OFFSET: usize = 111;
pub const OPTIONS_OFFSET: usize = 112;
pub const UNIVERSE_RANGE: std::ops::Range<usize> = 113..115;

pub const DMP_FLAGS_LENGTH_RANGE: std::ops::Range<usize> = 115..117;
pub const DMP_VECTOR_OFFSET: usize = 117;
pub const ADDRESS_TYPE_OFFSET: usize = 118;
pub const FIRST_PROPERTY_ADDRESS_RANGE: std::ops::Range<usize> = 119..121;
pub const ADDRESS_INCREMENT_RANGE: std::ops::Range<usize> = 121..123;
pub const DMP_PROPERTY_VALUE_COUNT_RANGE: std::ops::Range<usize> = 123..125;
pub const START_CODE_OFFSET: usize = 125;
pub const DMX_DATA_OFFSET: usize = 126;
pub const DMX_MAX_SLOTS: usize = 512;

/// Full data packet size for a 512-slot universe.
pub const DATA_PACKET_LEN: usize = DMX_DATA_OFFSET + DMX_MAX_SLOTS;

pub const ACN_PID: &[u8; 12] = b"ASC-E1.17\0\0\0";
pub const PREAMBLE_SIZE: u16 = 0x0010;
pub const POSTAMBLE_SIZE: u16 = 0x0000;
pub const ROOT_VECTOR_DATA: u32 = 0x0000_0004;
pub const FRAMING_VECTOR_DMX: u32 = 0x0000_0002;
pub const DMP_VECTOR_SET_PROPERTY: u8 = 0x02;
pub const DMP_ADDRESS_TYPE: u8 = 0xa1;
pub const DMP_FIRST_PROPERTY_ADDRESS: u16 = 0x0000;
pub const DMP_ADDRESS_INCREMENT: u16 = 0x0001;
pub const START_CODE_DMX: u8 = 0x00;

pub const SOURCE_NAME_LEN: usize = 64;
pub const CID_LEN: usize = 16;

pub const OPTION_PREVIEW: u8 = 0x80;
pub const OPTION_STREAM_TERMINATED: u8 = 0x40;

pub const DEFAULT_PRIORITY: u8 = 100;
pub const MAX_PRIORITY: u8 = 200;
pub const DEFAULT_PORT: u16 = 5568;

/// Flags nibble shared by every PDU flags-and-length field.
pub const PDU_FLAGS: u16 = 0x7000;
/// Largest value the 12-bit PDU length can carry.
pub const PDU_MAX_LENGTH: usize = 0x0fff;
