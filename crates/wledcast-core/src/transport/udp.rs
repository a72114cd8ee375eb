use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use log::{debug, warn};

use super::destination::Destination;
use super::error::TransportError;

/// Anything that can emit one datagram to an address.
pub trait DatagramSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

impl DatagramSocket for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }
}

/// Socket settings applied right after binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketOptions {
    pub broadcast: bool,
    pub multicast_ttl: Option<u8>,
}

/// Result of one datagram send.
#[derive(Debug)]
pub struct DestinationOutcome {
    pub destination: Destination,
    pub result: Result<usize, TransportError>,
}

/// Per-destination results, in the order destinations were given.
#[derive(Debug, Default)]
pub struct TransportReport {
    pub outcomes: Vec<DestinationOutcome>,
}

impl TransportReport {
    pub fn sent_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.sent_count()
    }

    pub fn all_sent(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Destination, &TransportError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (&o.destination, err)))
    }
}

/// Bind an ephemeral IPv4 socket and apply `options`.
pub fn bind_socket(options: &SocketOptions) -> Result<UdpSocket, TransportError> {
    let socket =
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(TransportError::Bind)?;
    if options.broadcast {
        socket
            .set_broadcast(true)
            .map_err(TransportError::SocketOption)?;
    }
    if let Some(ttl) = options.multicast_ttl {
        socket
            .set_multicast_ttl_v4(u32::from(ttl))
            .map_err(TransportError::SocketOption)?;
    }
    Ok(socket)
}

/// Send `payload` once to every destination over a socket that lives only
/// for this call.
///
/// Binding failures and an empty destination list fail the call; everything
/// after that is reported per destination.
pub fn send_packet(
    payload: &[u8],
    destinations: &[Destination],
    options: &SocketOptions,
) -> Result<TransportReport, TransportError> {
    if destinations.is_empty() {
        return Err(TransportError::NoDestinations);
    }
    let socket = bind_socket(options)?;
    if let Ok(local) = socket.local_addr() {
        debug!("bound {} for {} destination(s)", local, destinations.len());
    }
    Ok(send_with(&socket, payload, destinations))
}

/// Send `payload` to every destination through `socket`, one datagram each.
pub fn send_with<S: DatagramSocket + ?Sized>(
    socket: &S,
    payload: &[u8],
    destinations: &[Destination],
) -> TransportReport {
    let outcomes = destinations
        .iter()
        .map(|destination| {
            let result = destination.resolve().and_then(|addr| {
                socket
                    .send_to(payload, addr)
                    .map_err(|source| TransportError::Send {
                        destination: destination.to_string(),
                        source,
                    })
            });
            match &result {
                Ok(sent) => debug!("sent {} bytes to {}", sent, destination),
                Err(err) => warn!("{}", err),
            }
            DestinationOutcome {
                destination: destination.clone(),
                result,
            }
        })
        .collect();
    TransportReport { outcomes }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records datagrams and fails for chosen addresses.
    #[derive(Default)]
    pub(crate) struct FakeSocket {
        pub failing: Vec<SocketAddr>,
        pub sent: RefCell<Vec<(SocketAddr, Vec<u8>)>>,
    }

    impl DatagramSocket for FakeSocket {
        fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
            if self.failing.contains(&addr) {
                return Err(io::Error::new(
                    io::ErrorKind::HostUnreachable,
                    "host unreachable",
                ));
            }
            self.sent.borrow_mut().push((addr, buf.to_vec()));
            Ok(buf.len())
        }
    }

    fn destinations(n: usize) -> Vec<Destination> {
        (1..=n)
            .map(|i| Destination::new(format!("203.0.113.{i}"), 5568))
            .collect()
    }

    #[test]
    fn one_failure_does_not_stop_the_rest() {
        let dests = destinations(4);
        let socket = FakeSocket {
            failing: vec![dests[2].resolve().unwrap()],
            ..Default::default()
        };
        let report = send_with(&socket, &[1, 2, 3], &dests);

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.sent_count(), 3);
        let failed: Vec<_> = report.failures().map(|(d, _)| d.clone()).collect();
        assert_eq!(failed, vec![dests[2].clone()]);
        let sent = socket.sent.borrow();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].0, dests[3].resolve().unwrap());
    }

    #[test]
    fn outcomes_keep_destination_order() {
        let dests = destinations(3);
        let socket = FakeSocket::default();
        let report = send_with(&socket, &[0; 8], &dests);
        let order: Vec<_> = report.outcomes.iter().map(|o| o.destination.clone()).collect();
        assert_eq!(order, dests);
        assert!(report.all_sent());
    }

    #[test]
    fn empty_destination_list_is_rejected() {
        let err = send_packet(&[0u8; 4], &[], &SocketOptions::default()).unwrap_err();
        assert!(matches!(err, TransportError::NoDestinations));
    }

    #[test]
    fn loopback_datagram_arrives() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let report = send_packet(
            &[9u8; 16],
            &[Destination::new("127.0.0.1", port)],
            &SocketOptions::default(),
        )
        .unwrap();
        assert!(report.all_sent());

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[9u8; 16]);
    }
}
