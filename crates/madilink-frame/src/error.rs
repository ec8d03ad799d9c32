/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The body does not fit in the 16-bit length field.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// The received checksum does not complete the frame's byte sum to zero.
    #[error("checksum mismatch (expected {expected:#010X}, got {actual:#010X})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Returns true if a read or write timeout expired.
    pub fn is_timeout(&self) -> bool {
        match self {
            FrameError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
