use std::net::SocketAddr;

/// Errors that can occur on a device control connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host name did not resolve to any usable address.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Failed to connect to the device.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to bind a listening socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before the expected bytes arrived.
    #[error("connection closed by peer")]
    Closed,
}

impl TransportError {
    /// Returns true if this error came from an expired read or write timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
