use thiserror::Error;

/// Errors raised while moving encoded packets onto the network.
///
/// `Resolve`, `NoAddress` and `Send` are recorded per destination and never
/// abort the remaining sends; the others fail the whole operation.
///
/// # Examples
/// ```
/// use wledcast_core::TransportError;
///
/// let err = TransportError::NoDestinations;
/// assert!(err.to_string().contains("no destinations"));
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no destinations configured")]
    NoDestinations,
    #[error("invalid destination '{value}': expected host or host:port")]
    InvalidDestination { value: String },
    #[error("failed to bind UDP socket: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to configure UDP socket: {0}")]
    SocketOption(#[source] std::io::Error),
    #[error("failed to resolve {destination}: {source}")]
    Resolve {
        destination: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable address for {destination}")]
    NoAddress { destination: String },
    #[error("send to {destination} failed: {source}")]
    Send {
        destination: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// True when the OS refused the datagram only because the socket buffer
    /// was full.
    pub fn is_would_block(&self) -> bool {
        matches!(
            self,
            TransportError::Send { source, .. } if source.kind() == std::io::ErrorKind::WouldBlock
        )
    }
}
