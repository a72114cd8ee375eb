//! Source identity embedded in every packet: CID plus source name.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::protocols::sacn::layers::encode_source_name;
use crate::protocols::sacn::layout::{CID_LEN, SOURCE_NAME_LEN};

/// Default source name advertised by the sender.
pub const DEFAULT_SOURCE_NAME: &str = "wledcast";

/// Errors returned when parsing a CID string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CidError {
    #[error("invalid CID '{value}': expected 32 hex digits (hyphens allowed)")]
    Invalid { value: String },
}

/// 16-byte component identifier.
///
/// The bytes are opaque: no RFC 4122 version or variant is enforced.
///
/// # Examples
/// ```
/// use wledcast_core::Cid;
///
/// let cid: Cid = "12345678-9abc-def0-1234-56789abcdef0".parse()?;
/// assert_eq!(cid.as_bytes()[0], 0x12);
/// assert_eq!(cid.to_string(), "12345678-9abc-def0-1234-56789abcdef0");
/// # Ok::<(), wledcast_core::CidError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid([u8; CID_LEN]);

impl Cid {
    pub const fn from_bytes(bytes: [u8; CID_LEN]) -> Self {
        Self(bytes)
    }

    /// Random CID for a sender that was not given one.
    pub fn generate() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; CID_LEN] {
        &self.0
    }

    pub fn parse(value: &str) -> Result<Self, CidError> {
        let hex: String = value.trim().chars().filter(|c| *c != '-').collect();
        let invalid = || CidError::Invalid {
            value: value.to_string(),
        };
        if hex.len() != CID_LEN * 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut bytes = [0u8; CID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; CID_LEN]> for Cid {
    fn from(bytes: [u8; CID_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cid::parse(s)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0).hyphenated())
    }
}

/// Identity of a sending process, constant for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    cid: Cid,
    name: [u8; SOURCE_NAME_LEN],
}

impl SourceIdentity {
    /// Build an identity; names longer than 64 bytes are truncated.
    pub fn new(cid: [u8; CID_LEN], name: &str) -> Self {
        Self::with_cid(Cid::from_bytes(cid), name)
    }

    pub fn with_cid(cid: Cid, name: &str) -> Self {
        Self {
            cid,
            name: encode_source_name(name),
        }
    }

    /// Identity with a freshly generated CID.
    pub fn generate(name: &str) -> Self {
        Self::with_cid(Cid::generate(), name)
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    /// Encoded, null-padded name field.
    pub fn name_field(&self) -> &[u8; SOURCE_NAME_LEN] {
        &self.name
    }

    /// Name as text, without padding.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .trim_end_matches('\0')
            .to_string()
    }
}
