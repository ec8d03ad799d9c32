//! MADI channel name table.
//!
//! Each of the 64 input channels carries two short text lines. On the wire
//! every line is a 12-byte record: 8 content bytes, a terminator byte and
//! 3 reserved bytes, all zero-padded. The full table is 1536 bytes.

use serde::Serialize;

use crate::error::{DeviceError, Result};

/// Number of MADI input channels.
pub const NUM_CHANNELS: usize = 64;

/// Text lines per channel.
pub const LINES_PER_CHANNEL: usize = 2;

/// Maximum content bytes per line.
pub const NAME_LEN: usize = 8;

/// Content bytes plus terminator.
const FIELD_LEN: usize = NAME_LEN + 1;

const RESERVED_LEN: usize = 3;

/// Wire size of one line record.
pub const RECORD_LEN: usize = FIELD_LEN + RESERVED_LEN;

/// Wire size of the whole table.
pub const RAW_TABLE_SIZE: usize = NUM_CHANNELS * LINES_PER_CHANNEL * RECORD_LEN;

/// The two name lines of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelName {
    /// First display line.
    pub line1: String,
    /// Second display line.
    pub line2: String,
}

impl ChannelName {
    /// Build a channel name from its two lines.
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
        }
    }
}

/// Logical channel name table: exactly 64 channels, indexed by position.
///
/// Lines are stored as given. Anything past 8 bytes is dropped when the
/// table is encoded, so a decoded table never holds a longer line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChannelNameTable {
    channels: Vec<ChannelName>,
}

impl Default for ChannelNameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelNameTable {
    /// A table with every line empty.
    pub fn new() -> Self {
        Self {
            channels: vec![ChannelName::default(); NUM_CHANNELS],
        }
    }

    /// Names of `channel`, or `None` if out of range.
    pub fn get(&self, channel: usize) -> Option<&ChannelName> {
        self.channels.get(channel)
    }

    /// Replace both lines of `channel`.
    pub fn set(
        &mut self,
        channel: usize,
        line1: impl Into<String>,
        line2: impl Into<String>,
    ) -> Result<()> {
        let slot = self
            .channels
            .get_mut(channel)
            .ok_or(DeviceError::ChannelOutOfRange {
                channel,
                max: NUM_CHANNELS,
            })?;
        *slot = ChannelName::new(line1, line2);
        Ok(())
    }

    /// Iterate `(channel, names)` pairs in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ChannelName)> {
        self.channels.iter().enumerate()
    }

    /// Encode into the fixed-width wire table.
    pub fn encode(&self) -> RawChannelNameTable {
        let mut raw = RawChannelNameTable::zeroed();
        for (channel, name) in self.iter() {
            encode_line(raw.field_mut(channel, 0), &name.line1);
            encode_line(raw.field_mut(channel, 1), &name.line2);
        }
        raw
    }

    /// Decode from the fixed-width wire table.
    pub fn decode(raw: &RawChannelNameTable) -> Self {
        let channels = (0..NUM_CHANNELS)
            .map(|channel| ChannelName {
                line1: decode_line(raw.field(channel, 0)),
                line2: decode_line(raw.field(channel, 1)),
            })
            .collect();
        Self { channels }
    }
}

/// Copy at most 8 bytes of `text` into a zeroed 9-byte field, never
/// splitting a multi-byte character.
fn encode_line(field: &mut [u8], text: &str) {
    let mut n = text.len().min(NAME_LEN);
    while !text.is_char_boundary(n) {
        n -= 1;
    }
    field[..n].copy_from_slice(&text.as_bytes()[..n]);
}

/// Bytes before the first zero, clamped to 8 when the terminator is missing.
fn decode_line(field: &[u8]) -> String {
    let content = &field[..NAME_LEN];
    let end = content.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    String::from_utf8_lossy(&content[..end]).into_owned()
}

/// Wire form of the channel name table.
#[derive(Clone, PartialEq, Eq)]
pub struct RawChannelNameTable {
    bytes: Box<[u8; RAW_TABLE_SIZE]>,
}

impl RawChannelNameTable {
    /// An all-zero table (every line empty).
    pub fn zeroed() -> Self {
        Self {
            bytes: Box::new([0u8; RAW_TABLE_SIZE]),
        }
    }

    /// Copy a table out of a body, or `None` if it is not exactly 1536 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; RAW_TABLE_SIZE] = bytes.try_into().ok()?;
        Some(Self {
            bytes: Box::new(bytes),
        })
    }

    /// The table as wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// The full 12-byte record of one line, reserved bytes included.
    ///
    /// Returns `None` if `channel` or `line` is out of range.
    pub fn record(&self, channel: usize, line: usize) -> Option<&[u8]> {
        if channel >= NUM_CHANNELS || line >= LINES_PER_CHANNEL {
            return None;
        }
        let start = record_offset(channel, line);
        Some(&self.bytes[start..start + RECORD_LEN])
    }

    fn field(&self, channel: usize, line: usize) -> &[u8] {
        let start = record_offset(channel, line);
        &self.bytes[start..start + FIELD_LEN]
    }

    fn field_mut(&mut self, channel: usize, line: usize) -> &mut [u8] {
        let start = record_offset(channel, line);
        &mut self.bytes[start..start + FIELD_LEN]
    }
}

/// Callers pass indices already known to be in range.
fn record_offset(channel: usize, line: usize) -> usize {
    (channel * LINES_PER_CHANNEL + line) * RECORD_LEN
}

impl std::fmt::Debug for RawChannelNameTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = (0..NUM_CHANNELS)
            .filter(|&c| self.field(c, 0)[0] != 0 || self.field(c, 1)[0] != 0)
            .count();
        f.debug_struct("RawChannelNameTable")
            .field("size", &RAW_TABLE_SIZE)
            .field("named_channels", &used)
            .finish()
    }
}

impl From<&ChannelNameTable> for RawChannelNameTable {
    fn from(table: &ChannelNameTable) -> Self {
        table.encode()
    }
}

impl From<&RawChannelNameTable> for ChannelNameTable {
    fn from(raw: &RawChannelNameTable) -> Self {
        ChannelNameTable::decode(raw)
    }
}
