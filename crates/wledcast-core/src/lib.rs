//! wledcast core library: E1.31 (sACN) packet construction and UDP delivery.
//!
//! A DMX frame flows through the protocol encoders (root, framing and DMP
//! layers, built innermost-first) into an immutable packet, which the
//! transport sends once per destination over a short-lived UDP socket.
//! Encoding is pure and deterministic; all network I/O is isolated in
//! `transport`. `SacnSender` ties the two together and owns the state that
//! must outlive a single packet (identity, sequence numbers, counters).
//!
//! Invariants:
//! - A data packet for a 512-slot frame is exactly 638 bytes.
//! - Every flags-and-length field equals the bytes from that field to the
//!   end of the packet.
//! - One failing destination never prevents sends to the others.
//!
//! # Examples
//! ```no_run
//! use wledcast_core::{DmxFrame, SacnSender, SenderConfig};
//!
//! let config = SenderConfig {
//!     destinations: vec!["192.168.8.118".to_string(), "192.168.8.210".to_string()],
//!     ..Default::default()
//! };
//! let mut sender = SacnSender::new(&config)?;
//! let report = sender.send(1, DmxFrame::preset(255, 5).as_slice())?;
//! println!("sent to {} of {}", report.sent_count(), report.destinations.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

mod config;
mod frame;
mod identity;
mod protocols;
mod sender;
mod transport;

pub use config::{ConfigError, DeliveryMode, SenderConfig};
pub use frame::{CHANNELS_PER_LED, DmxFrame, LEDS_PER_UNIVERSE};
pub use identity::{Cid, CidError, DEFAULT_SOURCE_NAME, SourceIdentity};
pub use protocols::sacn::layout::{DATA_PACKET_LEN, DEFAULT_PORT, DEFAULT_PRIORITY, DMX_MAX_SLOTS};
pub use protocols::sacn::{
    DataPacket, EncodedPacket, EncodingError, Layer, PacketHeaders, VerifyError,
    encode_data_packet, verify_data_packet,
};
pub use sender::{SacnSender, STATS_WINDOW, SendError, SendStats, TERMINATION_PACKETS};
pub use transport::{
    DatagramSocket, Destination, DestinationOutcome, FALLBACK_BROADCAST, SocketOptions,
    TransportError, TransportReport, send_packet, send_with,
};

/// Current send report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Timestamp used when the clock cannot be formatted.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Outcome of one send operation, serializable for the CLI.
///
/// # Examples
/// ```
/// use wledcast_core::{SendReport, TransportReport};
///
/// let report = SendReport::from_transport(1, 0, 638, &TransportReport::default());
/// assert_eq!(report.report_version, wledcast_core::REPORT_VERSION);
/// assert!(report.destinations.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the send.
    pub generated_at: String,
    /// Universe the packet belonged to.
    pub universe: u16,
    /// Sequence number carried by the packet.
    pub sequence: u8,
    /// Encoded packet size in bytes.
    pub packet_bytes: usize,
    /// One entry per destination, in send order.
    pub destinations: Vec<DestinationReport>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "wledcast").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Whether a datagram left the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Per-destination entry of a [`SendReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationReport {
    /// Destination in `host:port` form.
    pub destination: String,
    pub status: DeliveryStatus,
    /// Bytes handed to the OS, when sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_sent: Option<usize>,
    /// Error message, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendReport {
    pub fn from_transport(
        universe: u16,
        sequence: u8,
        packet_bytes: usize,
        transport: &TransportReport,
    ) -> Self {
        let destinations = transport
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(sent) => DestinationReport {
                    destination: outcome.destination.to_string(),
                    status: DeliveryStatus::Sent,
                    bytes_sent: Some(*sent),
                    error: None,
                },
                Err(err) => DestinationReport {
                    destination: outcome.destination.to_string(),
                    status: DeliveryStatus::Failed,
                    bytes_sent: None,
                    error: Some(err.to_string()),
                },
            })
            .collect();

        SendReport {
            report_version: REPORT_VERSION,
            tool: ToolInfo {
                name: "wledcast".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            generated_at: now_rfc3339(),
            universe,
            sequence,
            packet_bytes,
            destinations,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.destinations
            .iter()
            .filter(|d| d.status == DeliveryStatus::Sent)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.destinations.len() - self.sent_count()
    }

    pub fn all_sent(&self) -> bool {
        self.failed_count() == 0
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}
