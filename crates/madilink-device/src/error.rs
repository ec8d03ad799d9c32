use std::time::Duration;

use madilink_frame::{Command, FrameError};
use madilink_transport::TransportError;

use crate::body::BodyShape;

/// Broad classification of a [`DeviceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dial, write or read failure, including timeouts.
    Transport,
    /// The response did not have the shape the request calls for.
    ProtocolShape,
    /// The response failed checksum verification.
    Integrity,
    /// The device answered with NAK.
    DeviceRejected,
    /// The caller passed an invalid argument.
    Usage,
}

/// Errors that can occur in device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame could not be encoded.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// No complete response arrived in time.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// An earlier failure left unread bytes on the stream.
    #[error("connection unusable after an earlier failure")]
    ConnectionBroken,

    /// The ACK body length differs from the layout the request expects.
    #[error("{command} response body is {actual} bytes, expected {expected}")]
    BodySizeMismatch {
        command: Command,
        expected: usize,
        actual: usize,
    },

    /// The response opcode is neither ACK nor NAK.
    #[error("unrecognized response {opcode:#06X} to {command}")]
    UnrecognizedResponse { command: Command, opcode: u16 },

    /// The response body does not match its checksum.
    #[error("checksum mismatch on {command} response (expected {expected:#010X}, got {actual:#010X})")]
    ChecksumMismatch {
        command: Command,
        expected: u32,
        actual: u32,
    },

    /// The device refused the request.
    #[error("device rejected {command} (NAK)")]
    Rejected { command: Command },

    /// The request body does not have the layout `command` carries.
    #[error("{command} request carries a {expected:?} body, got {actual:?}")]
    RequestBodyMismatch {
        command: Command,
        expected: BodyShape,
        actual: BodyShape,
    },

    /// Channel index outside the table.
    #[error("channel {channel} out of range (0..{max})")]
    ChannelOutOfRange { channel: usize, max: usize },
}

impl DeviceError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeviceError::Transport(_) | DeviceError::Timeout(_) | DeviceError::ConnectionBroken => {
                ErrorKind::Transport
            }
            DeviceError::Frame(_)
            | DeviceError::BodySizeMismatch { .. }
            | DeviceError::UnrecognizedResponse { .. } => ErrorKind::ProtocolShape,
            DeviceError::ChecksumMismatch { .. } => ErrorKind::Integrity,
            DeviceError::Rejected { .. } => ErrorKind::DeviceRejected,
            DeviceError::RequestBodyMismatch { .. } | DeviceError::ChannelOutOfRange { .. } => {
                ErrorKind::Usage
            }
        }
    }

    /// Returns true if the device answered with NAK.
    pub fn is_rejected(&self) -> bool {
        matches!(self, DeviceError::Rejected { .. })
    }
}

impl From<FrameError> for DeviceError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => DeviceError::Transport(TransportError::Io(io)),
            FrameError::ConnectionClosed => DeviceError::Transport(TransportError::Closed),
            other => DeviceError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
