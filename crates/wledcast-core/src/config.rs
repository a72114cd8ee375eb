//! Sender configuration, loaded from JSON and passed explicitly to
//! [`SacnSender::new`](crate::SacnSender::new).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{Cid, CidError, DEFAULT_SOURCE_NAME};
use crate::protocols::sacn::layout::{DEFAULT_PORT, DEFAULT_PRIORITY, MAX_PRIORITY};
use crate::transport::{Destination, TransportError};

/// Errors returned while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid priority: {value} (allowed 0..=200)")]
    InvalidPriority { value: u8 },
    #[error("unicast delivery needs at least one destination")]
    NoDestinations,
    #[error("broadcast delivery needs a board address to derive the subnet from")]
    NoBroadcastBoard,
    #[error(transparent)]
    Cid(#[from] CidError),
    #[error(transparent)]
    Destination(#[from] TransportError),
}

/// How datagrams reach the receivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One datagram per configured destination.
    #[default]
    Unicast,
    /// One datagram to the universe's 239.255.x.y group.
    Multicast,
    /// One datagram to the /24 broadcast address of the first destination.
    Broadcast,
}

/// Everything a [`SacnSender`](crate::SacnSender) needs; every field has a
/// default so partial JSON files are accepted.
///
/// # Examples
/// ```
/// use wledcast_core::{DeliveryMode, SenderConfig};
///
/// let config = SenderConfig::from_json_str(r#"{"destinations": ["192.168.8.118"]}"#)?;
/// assert_eq!(config.universe, 1);
/// assert_eq!(config.delivery, DeliveryMode::Unicast);
/// config.validate()?;
/// # Ok::<(), wledcast_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    pub source_name: String,
    /// CID as 32 hex digits; a random one is generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    pub priority: u8,
    pub preview: bool,
    pub universe: u16,
    pub port: u16,
    pub delivery: DeliveryMode,
    /// `host` or `host:port` entries; a missing port means `port`.
    pub destinations: Vec<String>,
    /// Hop limit for multicast datagrams (IP TTL, 0-255).
    pub multicast_ttl: u8,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            cid: None,
            priority: DEFAULT_PRIORITY,
            preview: false,
            universe: 1,
            port: DEFAULT_PORT,
            delivery: DeliveryMode::Unicast,
            destinations: Vec::new(),
            multicast_ttl: 1,
        }
    }
}

impl SenderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            path: "<inline>".to_string(),
            source,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: display,
            source,
        })
    }

    /// Parsed destinations; entries without a port use `self.port`.
    pub fn parsed_destinations(&self) -> Result<Vec<Destination>, ConfigError> {
        self.destinations
            .iter()
            .map(|entry| -> Result<Destination, ConfigError> {
                let mut dest: Destination = entry.parse()?;
                if !has_explicit_port(entry) {
                    dest.port = self.port;
                }
                Ok(dest)
            })
            .collect()
    }

    pub fn parsed_cid(&self) -> Result<Option<Cid>, ConfigError> {
        Ok(self.cid.as_deref().map(Cid::parse).transpose()?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priority > MAX_PRIORITY {
            return Err(ConfigError::InvalidPriority {
                value: self.priority,
            });
        }
        self.parsed_cid()?;
        let destinations = self.parsed_destinations()?;
        match self.delivery {
            DeliveryMode::Unicast if destinations.is_empty() => Err(ConfigError::NoDestinations),
            DeliveryMode::Broadcast if destinations.is_empty() => {
                Err(ConfigError::NoBroadcastBoard)
            }
            _ => Ok(()),
        }
    }
}

fn has_explicit_port(entry: &str) -> bool {
    let entry = entry.trim();
    if entry.starts_with('[') {
        return entry.contains("]:");
    }
    entry.matches(':').count() == 1
}
