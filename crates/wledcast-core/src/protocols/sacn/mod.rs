//! sACN (E1.31) data packet encoding.
//!
//! `layers` holds one encoder per PDU (root, framing, DMP); `packet` nests
//! them innermost-first into a full data packet so every flags-and-length
//! field is computed from the bytes it actually covers. Wire offsets and
//! protocol constants live in `layout`; `reader` and `verify` re-read our own
//! output to check it.

pub mod error;
pub mod layers;
pub mod layout;
pub mod packet;
pub mod reader;
pub mod verify;

pub use error::{EncodingError, Layer, VerifyError};
pub use packet::{DataPacket, EncodedPacket, encode_data_packet};
pub use verify::{PacketHeaders, verify_data_packet};
