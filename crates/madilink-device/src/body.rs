//! Body layouts, indexed by command.
//!
//! The protocol has exactly one non-empty body layout: the channel name
//! table, sent with `SET_CHANNEL_NAMES` and returned in the ACK to
//! `GET_CHANNEL_NAMES`. Every other exchange is bodiless in both directions.

use madilink_frame::Command;

use crate::error::{DeviceError, Result};
use crate::names::{RawChannelNameTable, RAW_TABLE_SIZE};

/// A concrete frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    ChannelNames(RawChannelNameTable),
}

impl Body {
    /// Layout of this body.
    pub fn shape(&self) -> BodyShape {
        match self {
            Body::ChannelNames(_) => BodyShape::ChannelNames,
        }
    }

    /// Serialized body bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::ChannelNames(raw) => raw.as_bytes(),
        }
    }
}

/// The layout a body is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// No body (length field zero).
    Empty,
    /// The 1536-byte channel name table.
    ChannelNames,
}

impl BodyShape {
    /// Serialized size of this layout in bytes.
    pub fn size(self) -> usize {
        match self {
            BodyShape::Empty => 0,
            BodyShape::ChannelNames => RAW_TABLE_SIZE,
        }
    }

    /// Layout of the ACK body that answers `command`.
    pub fn response_to(command: Command) -> Self {
        match command {
            Command::GetChannelNames => BodyShape::ChannelNames,
            _ => BodyShape::Empty,
        }
    }

    /// Layout of the body that accompanies a `command` request.
    pub fn request_for(command: Command) -> Self {
        match command {
            Command::SetChannelNames => BodyShape::ChannelNames,
            _ => BodyShape::Empty,
        }
    }

    /// Decode response bytes for `command` into this layout.
    pub fn decode(self, command: Command, bytes: &[u8]) -> Result<Option<Body>> {
        let mismatch = || DeviceError::BodySizeMismatch {
            command,
            expected: self.size(),
            actual: bytes.len(),
        };
        match self {
            BodyShape::Empty if bytes.is_empty() => Ok(None),
            BodyShape::Empty => Err(mismatch()),
            BodyShape::ChannelNames => RawChannelNameTable::from_slice(bytes)
                .map(|raw| Some(Body::ChannelNames(raw)))
                .ok_or_else(mismatch),
        }
    }
}
