use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TransportError;
use crate::protocols::sacn::layout::DEFAULT_PORT;

/// Broadcast address used when no board address can be derived.
pub const FALLBACK_BROADCAST: Ipv4Addr = Ipv4Addr::new(192, 168, 8, 255);

/// A (host, UDP port) pair; the host may be an IP literal or a name.
///
/// # Examples
/// ```
/// use wledcast_core::Destination;
///
/// let dest: Destination = "203.0.113.5".parse().unwrap();
/// assert_eq!(dest.port, 5568);
/// let dest: Destination = "203.0.113.5:6000".parse().unwrap();
/// assert_eq!(dest.to_string(), "203.0.113.5:6000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Standard sACN multicast group for a universe: 239.255.{hi}.{lo}.
    pub fn multicast(universe: u16, port: u16) -> Self {
        let [hi, lo] = universe.to_be_bytes();
        Self::new(Ipv4Addr::new(239, 255, hi, lo).to_string(), port)
    }

    /// Directed broadcast (a.b.c.255) of the /24 a board lives in.
    pub fn broadcast_for(board: &str, port: u16) -> Self {
        let host = board.split(':').next().unwrap_or(board);
        let addr = match host.parse::<Ipv4Addr>() {
            Ok(ip) => {
                let [a, b, c, _] = ip.octets();
                Ipv4Addr::new(a, b, c, 255)
            }
            Err(_) => FALLBACK_BROADCAST,
        };
        Self::new(addr.to_string(), port)
    }

    /// Resolve to an IPv4 socket address; IP literals never hit DNS.
    pub fn resolve(&self) -> Result<SocketAddr, TransportError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                destination: self.to_string(),
                source,
            })?;
        let addrs: Vec<SocketAddr> = addrs.collect();
        addrs
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| TransportError::NoAddress {
                destination: self.to_string(),
            })
    }

    pub fn is_multicast(&self) -> bool {
        matches!(self.host.parse::<IpAddr>(), Ok(ip) if ip.is_multicast())
    }
}

impl FromStr for Destination {
    type Err = TransportError;

    /// Accepts `host`, `host:port` or `[v6]:port`; the port defaults to 5568.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let invalid = || TransportError::InvalidDestination {
            value: s.to_string(),
        };
        if value.is_empty() {
            return Err(invalid());
        }
        if let Ok(addr) = value.parse::<SocketAddr>() {
            return Ok(Self::new(addr.ip().to_string(), addr.port()));
        }
        if value.parse::<IpAddr>().is_ok() {
            return Ok(Self::new(value, DEFAULT_PORT));
        }
        match value.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => {
                let port = port.parse::<u16>().map_err(|_| invalid())?;
                Ok(Self::new(host, port))
            }
            Some(_) => Err(invalid()),
            None => Ok(Self::new(value, DEFAULT_PORT)),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Destination;
    use std::net::SocketAddr;

    #[test]
    fn parse_defaults_port() {
        let dest: Destination = "192.168.8.118".parse().unwrap();
        assert_eq!(dest, Destination::new("192.168.8.118", 5568));
    }

    #[test]
    fn parse_hostname_with_port() {
        let dest: Destination = "wled-kitchen.local:5569".parse().unwrap();
        assert_eq!(dest, Destination::new("wled-kitchen.local", 5569));
    }

    #[test]
    fn parse_rejects_bad_port() {
        assert!("10.0.0.1:notaport".parse::<Destination>().is_err());
        assert!("10.0.0.1:70000".parse::<Destination>().is_err());
        assert!("".parse::<Destination>().is_err());
    }

    #[test]
    fn multicast_group_encodes_universe() {
        let dest = Destination::multicast(0x0102, 5568);
        assert_eq!(dest.host, "239.255.1.2");
        assert!(dest.is_multicast());
    }

    #[test]
    fn broadcast_derived_from_board() {
        assert_eq!(
            Destination::broadcast_for("192.168.8.210", 5568).host,
            "192.168.8.255"
        );
        assert_eq!(
            Destination::broadcast_for("10.1.2.3:80", 5568).host,
            "10.1.2.255"
        );
        assert_eq!(
            Destination::broadcast_for("not-an-ip", 5568).host,
            "192.168.8.255"
        );
    }

    #[test]
    fn ip_literal_resolves_without_lookup() {
        let addr = Destination::new("203.0.113.5", 5568).resolve().unwrap();
        assert_eq!(addr, "203.0.113.5:5568".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn ipv6_display_is_bracketed() {
        let dest: Destination = "[::1]:5568".parse().unwrap();
        assert_eq!(dest.to_string(), "[::1]:5568");
    }
}
