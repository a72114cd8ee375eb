//! UDP delivery of encoded packets.
//!
//! Each send operation binds its own ephemeral socket, emits one datagram per
//! destination and drops the socket on return. Per-destination failures are
//! collected into a `TransportReport`; only setup failures abort the call.

mod destination;
mod error;
mod udp;

pub use destination::{Destination, FALLBACK_BROADCAST};
pub use error::TransportError;
pub use udp::{
    DatagramSocket, DestinationOutcome, SocketOptions, TransportReport, bind_socket, send_packet,
    send_with,
};

#[cfg(test)]
pub(crate) use udp::tests::FakeSocket;
