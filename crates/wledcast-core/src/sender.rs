use std::collections::HashMap;

use log::info;
use thiserror::Error;

use crate::SendReport;
use crate::config::{ConfigError, DeliveryMode, SenderConfig};
use crate::frame::DmxFrame;
use crate::identity::SourceIdentity;
use crate::protocols::sacn::error::EncodingError;
use crate::protocols::sacn::layout::{OPTION_PREVIEW, OPTION_STREAM_TERMINATED};
use crate::protocols::sacn::packet::{DataPacket, EncodedPacket, encode_data_packet};
use crate::transport::{
    DatagramSocket, Destination, SocketOptions, TransportError, TransportReport, bind_socket,
    send_packet, send_with,
};

/// Packets sent in one statistics window before counters are logged.
pub const STATS_WINDOW: u64 = 256;
/// Stream-terminated packets emitted when a universe is released.
pub const TERMINATION_PACKETS: usize = 3;

/// Errors returned by a send operation.
///
/// Encoding errors mean nothing was sent. Transport errors here are setup
/// failures; per-destination failures are in the returned report instead.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Datagram counters for the current statistics window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    pub packets: u64,
    pub ok: u64,
    pub would_block: u64,
    pub errors: u64,
}

impl SendStats {
    fn record(&mut self, report: &TransportReport) {
        self.packets += 1;
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(_) => self.ok += 1,
                Err(err) if err.is_would_block() => self.would_block += 1,
                Err(_) => self.errors += 1,
            }
        }
        if self.packets >= STATS_WINDOW {
            info!(
                "sACN stats (last {} packets): ok={} wouldblock={} err={}",
                self.packets, self.ok, self.would_block, self.errors
            );
            *self = SendStats::default();
        }
    }
}

/// Long-lived sACN source: one identity, per-universe sequence numbers.
///
/// Sequence numbers start at 0 for each universe and advance (wrapping at
/// 256) every time a packet is built, whether or not the send succeeds.
///
/// # Examples
/// ```
/// use wledcast_core::{DmxFrame, SacnSender, SenderConfig};
///
/// let config = SenderConfig {
///     destinations: vec!["203.0.113.5".to_string()],
///     ..Default::default()
/// };
/// let mut sender = SacnSender::new(&config)?;
/// let first = sender.build_packet(1, DmxFrame::preset(255, 5).as_slice())?;
/// let second = sender.build_packet(1, DmxFrame::preset(255, 5).as_slice())?;
/// assert_eq!(first.as_bytes()[111], 0);
/// assert_eq!(second.as_bytes()[111], 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SacnSender {
    identity: SourceIdentity,
    priority: u8,
    preview: bool,
    delivery: DeliveryMode,
    port: u16,
    destinations: Vec<Destination>,
    multicast_ttl: u8,
    sequences: HashMap<u16, u8>,
    stats: SendStats,
}

impl SacnSender {
    pub fn new(config: &SenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let identity = match config.parsed_cid()? {
            Some(cid) => SourceIdentity::with_cid(cid, &config.source_name),
            None => SourceIdentity::generate(&config.source_name),
        };
        let destinations = config.parsed_destinations()?;
        info!(
            "sACN sender '{}' cid={} delivery={:?} destinations={}",
            identity.name(),
            identity.cid(),
            config.delivery,
            destinations.len()
        );
        Ok(Self {
            identity,
            priority: config.priority,
            preview: config.preview,
            delivery: config.delivery,
            port: config.port,
            destinations,
            multicast_ttl: config.multicast_ttl,
            sequences: HashMap::new(),
            stats: SendStats::default(),
        })
    }

    pub fn identity(&self) -> &SourceIdentity {
        &self.identity
    }

    pub fn stats(&self) -> SendStats {
        self.stats
    }

    /// Sequence number the next packet for `universe` will carry.
    pub fn next_sequence(&self, universe: u16) -> u8 {
        self.sequences.get(&universe).copied().unwrap_or(0)
    }

    /// Where packets for `universe` go under the configured delivery mode.
    pub fn destinations_for(&self, universe: u16) -> Vec<Destination> {
        match self.delivery {
            DeliveryMode::Unicast => self.destinations.clone(),
            DeliveryMode::Multicast => vec![Destination::multicast(universe, self.port)],
            DeliveryMode::Broadcast => self
                .destinations
                .first()
                .map(|board| vec![Destination::broadcast_for(&board.host, self.port)])
                .unwrap_or_default(),
        }
    }

    pub fn socket_options(&self) -> SocketOptions {
        SocketOptions {
            broadcast: self.delivery == DeliveryMode::Broadcast,
            multicast_ttl: (self.delivery == DeliveryMode::Multicast).then_some(self.multicast_ttl),
        }
    }

    /// Encode a live data packet and advance the universe's sequence.
    pub fn build_packet(
        &mut self,
        universe: u16,
        slots: &[u8],
    ) -> Result<EncodedPacket, EncodingError> {
        let options = if self.preview { OPTION_PREVIEW } else { 0 };
        self.build_with_options(universe, slots, options)
    }

    fn build_with_options(
        &mut self,
        universe: u16,
        slots: &[u8],
        options: u8,
    ) -> Result<EncodedPacket, EncodingError> {
        let sequence = self.next_sequence(universe);
        let mut packet = DataPacket::new(universe, &self.identity, sequence, self.priority, slots);
        packet.options = options;
        let encoded = encode_data_packet(&packet)?;
        self.sequences.insert(universe, sequence.wrapping_add(1));
        Ok(encoded)
    }

    /// Build and send one packet over a socket scoped to this call.
    pub fn send(&mut self, universe: u16, slots: &[u8]) -> Result<SendReport, SendError> {
        let destinations = self.checked_destinations(universe)?;
        let sequence = self.next_sequence(universe);
        let packet = self.build_packet(universe, slots)?;
        let report = send_packet(packet.as_bytes(), &destinations, &self.socket_options())?;
        Ok(self.finish(universe, sequence, &packet, &report))
    }

    /// Build and send one packet through a caller-provided socket.
    pub fn send_with<S: DatagramSocket + ?Sized>(
        &mut self,
        socket: &S,
        universe: u16,
        slots: &[u8],
    ) -> Result<SendReport, SendError> {
        let destinations = self.checked_destinations(universe)?;
        let sequence = self.next_sequence(universe);
        let packet = self.build_packet(universe, slots)?;
        let report = send_with(socket, packet.as_bytes(), &destinations);
        Ok(self.finish(universe, sequence, &packet, &report))
    }

    /// Release a universe: three stream-terminated packets over one socket.
    pub fn terminate(&mut self, universe: u16) -> Result<Vec<SendReport>, SendError> {
        self.checked_destinations(universe)?;
        let socket = bind_socket(&self.socket_options())?;
        self.terminate_with(&socket, universe)
    }

    pub fn terminate_with<S: DatagramSocket + ?Sized>(
        &mut self,
        socket: &S,
        universe: u16,
    ) -> Result<Vec<SendReport>, SendError> {
        let destinations = self.checked_destinations(universe)?;
        let blank = DmxFrame::blackout();
        let mut options = OPTION_STREAM_TERMINATED;
        if self.preview {
            options |= OPTION_PREVIEW;
        }
        let mut reports = Vec::with_capacity(TERMINATION_PACKETS);
        for _ in 0..TERMINATION_PACKETS {
            let sequence = self.next_sequence(universe);
            let packet = self.build_with_options(universe, blank.as_slice(), options)?;
            let report = send_with(socket, packet.as_bytes(), &destinations);
            reports.push(self.finish(universe, sequence, &packet, &report));
        }
        info!("terminated universe {} stream", universe);
        Ok(reports)
    }

    /// Destinations for `universe`; an empty plan fails before any sequence
    /// number is used.
    fn checked_destinations(&self, universe: u16) -> Result<Vec<Destination>, TransportError> {
        let destinations = self.destinations_for(universe);
        if destinations.is_empty() {
            return Err(TransportError::NoDestinations);
        }
        Ok(destinations)
    }

    fn finish(
        &mut self,
        universe: u16,
        sequence: u8,
        packet: &EncodedPacket,
        report: &TransportReport,
    ) -> SendReport {
        self.stats.record(report);
        SendReport::from_transport(universe, sequence, packet.len(), report)
    }
}

#[cfg(test)]
mod tests {
    use super::{STATS_WINDOW, SacnSender, SendError};
    use crate::DeliveryStatus;
    use crate::config::{DeliveryMode, SenderConfig};
    use crate::frame::DmxFrame;
    use crate::protocols::sacn::error::EncodingError;
    use crate::protocols::sacn::layout;
    use crate::protocols::sacn::verify::verify_data_packet;
    use crate::transport::{Destination, FakeSocket, TransportError};

    fn sender(destinations: &[&str]) -> SacnSender {
        let config = SenderConfig {
            source_name: "test".to_string(),
            cid: Some("12345678123456781234567812345678".to_string()),
            destinations: destinations.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        };
        SacnSender::new(&config).unwrap()
    }

    #[test]
    fn preset_frame_reaches_single_destination() {
        let mut sender = sender(&["203.0.113.5:5568"]);
        let socket = FakeSocket::default();
        let mut frame = DmxFrame::new();
        frame.set(1, 5).unwrap();

        let report = sender.send_with(&socket, 1, frame.as_slice()).unwrap();

        assert_eq!(report.packet_bytes, 638);
        assert_eq!(report.sent_count(), 1);
        assert_eq!(report.destinations[0].destination, "203.0.113.5:5568");
        let sent = socket.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.len(), 638);
        assert_eq!(sent[0].1[126], 5);
    }

    #[test]
    fn invalid_frame_sends_nothing() {
        let mut sender = sender(&["203.0.113.5"]);
        let socket = FakeSocket::default();
        let err = sender.send_with(&socket, 1, &[0u8; 511]).unwrap_err();
        assert!(matches!(
            err,
            SendError::Encoding(EncodingError::InvalidFrameLength { length: 511 })
        ));
        assert!(socket.sent.borrow().is_empty());
        assert_eq!(sender.next_sequence(1), 0);
    }

    #[test]
    fn failing_destination_is_reported_alone() {
        let mut sender = sender(&["203.0.113.1", "203.0.113.2", "203.0.113.3"]);
        let socket = FakeSocket {
            failing: vec![Destination::new("203.0.113.2", 5568).resolve().unwrap()],
            ..Default::default()
        };
        let report = sender
            .send_with(&socket, 1, DmxFrame::blackout().as_slice())
            .unwrap();

        let statuses: Vec<_> = report.destinations.iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![
                DeliveryStatus::Sent,
                DeliveryStatus::Failed,
                DeliveryStatus::Sent
            ]
        );
        assert!(report.destinations[1].error.is_some());
        assert_eq!(socket.sent.borrow().len(), 2);
        assert_eq!(sender.stats().errors, 1);
        assert_eq!(sender.stats().ok, 2);
    }

    #[test]
    fn sequence_is_per_universe_and_wraps() {
        let mut sender = sender(&["203.0.113.5"]);
        let frame = DmxFrame::new();
        for expected in 0..=255u8 {
            let packet = sender.build_packet(1, frame.as_slice()).unwrap();
            assert_eq!(packet.as_bytes()[layout::SEQUENCE_OFFSET], expected);
        }
        let wrapped = sender.build_packet(1, frame.as_slice()).unwrap();
        assert_eq!(wrapped.as_bytes()[layout::SEQUENCE_OFFSET], 0);

        let other = sender.build_packet(2, frame.as_slice()).unwrap();
        assert_eq!(other.as_bytes()[layout::SEQUENCE_OFFSET], 0);
    }

    #[test]
    fn terminate_sends_three_flagged_packets() {
        let mut sender = sender(&["203.0.113.5"]);
        let socket = FakeSocket::default();
        let reports = sender.terminate_with(&socket, 4).unwrap();
        assert_eq!(reports.len(), 3);

        let sent = socket.sent.borrow();
        assert_eq!(sent.len(), 3);
        for (i, (_, bytes)) in sent.iter().enumerate() {
            let headers = verify_data_packet(bytes).unwrap();
            assert_eq!(headers.options, layout::OPTION_STREAM_TERMINATED);
            assert_eq!(headers.universe, 4);
            assert_eq!(headers.sequence, i as u8);
        }
    }

    #[test]
    fn multicast_targets_universe_group() {
        let config = SenderConfig {
            delivery: DeliveryMode::Multicast,
            multicast_ttl: 4,
            ..Default::default()
        };
        let sender = SacnSender::new(&config).unwrap();
        assert_eq!(
            sender.destinations_for(0x0203),
            vec![Destination::new("239.255.2.3", 5568)]
        );
        assert_eq!(sender.socket_options().multicast_ttl, Some(4));
        assert!(!sender.socket_options().broadcast);
    }

    #[test]
    fn broadcast_derives_subnet_from_first_board() {
        let config = SenderConfig {
            delivery: DeliveryMode::Broadcast,
            destinations: vec!["192.168.8.118".to_string(), "192.168.8.210".to_string()],
            ..Default::default()
        };
        let sender = SacnSender::new(&config).unwrap();
        assert_eq!(
            sender.destinations_for(1),
            vec![Destination::new("192.168.8.255", 5568)]
        );
        assert!(sender.socket_options().broadcast);
    }

    #[test]
    fn empty_plan_keeps_sequence_unused() {
        let mut sender = sender(&["203.0.113.5"]);
        sender.destinations.clear();
        let socket = FakeSocket::default();

        let err = sender
            .send_with(&socket, 1, DmxFrame::new().as_slice())
            .unwrap_err();
        assert!(matches!(
            err,
            SendError::Transport(TransportError::NoDestinations)
        ));
        assert!(matches!(
            sender.send(1, DmxFrame::new().as_slice()),
            Err(SendError::Transport(TransportError::NoDestinations))
        ));
        assert!(sender.terminate_with(&socket, 1).is_err());
        assert_eq!(sender.next_sequence(1), 0);
        assert!(socket.sent.borrow().is_empty());
    }

    #[test]
    fn broadcast_without_board_has_no_destinations() {
        let config = SenderConfig {
            delivery: DeliveryMode::Broadcast,
            destinations: vec!["192.168.8.118".to_string()],
            ..Default::default()
        };
        let mut sender = SacnSender::new(&config).unwrap();
        sender.destinations.clear();
        assert!(sender.destinations_for(1).is_empty());
    }

    #[test]
    fn preview_flag_is_encoded() {
        let config = SenderConfig {
            preview: true,
            destinations: vec!["203.0.113.5".to_string()],
            ..Default::default()
        };
        let mut sender = SacnSender::new(&config).unwrap();
        let packet = sender.build_packet(1, DmxFrame::new().as_slice()).unwrap();
        assert_eq!(packet.as_bytes()[layout::OPTIONS_OFFSET], layout::OPTION_PREVIEW);
    }

    #[test]
    fn stats_reset_after_window() {
        let mut sender = sender(&["203.0.113.5"]);
        let socket = FakeSocket::default();
        let frame = DmxFrame::new();
        for _ in 0..STATS_WINDOW - 1 {
            sender.send_with(&socket, 1, frame.as_slice()).unwrap();
        }
        assert_eq!(sender.stats().packets, STATS_WINDOW - 1);
        sender.send_with(&socket, 1, frame.as_slice()).unwrap();
        assert_eq!(sender.stats().packets, 0);
    }
}
