//! Device operations.
//!
//! Each operation is a short fixed sequence of exchanges that always ends
//! with DISCONNECT, which tells the device the session is over. If a step
//! fails the remaining steps are skipped and the error is returned as-is;
//! nothing that already reached the device is undone.

use madilink_frame::Command;
use tracing::debug;

use crate::body::{Body, BodyShape};
use crate::connector::connect_with_config;
use crate::error::{DeviceError, Result};
use crate::names::{ChannelNameTable, NUM_CHANNELS, RAW_TABLE_SIZE};
use crate::session::{Connection, ConnectionConfig};

impl Connection {
    /// Reboot the unit, then end the session.
    pub fn reset(&mut self) -> Result<()> {
        self.send_and_receive(Command::ResetUnit, None, BodyShape::Empty)?;
        self.disconnect()
    }

    /// Read the channel name table, then end the session.
    pub fn get_channel_names(&mut self) -> Result<ChannelNameTable> {
        let body = self.send_and_receive(
            Command::GetChannelNames,
            None,
            BodyShape::response_to(Command::GetChannelNames),
        )?;
        let table = match body {
            Some(Body::ChannelNames(raw)) => ChannelNameTable::decode(&raw),
            None => {
                return Err(DeviceError::BodySizeMismatch {
                    command: Command::GetChannelNames,
                    expected: RAW_TABLE_SIZE,
                    actual: 0,
                })
            }
        };
        self.disconnect()?;
        Ok(table)
    }

    /// Write the channel name table, then end the session.
    ///
    /// Lines longer than 8 bytes are truncated.
    pub fn set_channel_names(&mut self, table: &ChannelNameTable) -> Result<()> {
        let body = Body::ChannelNames(table.encode());
        self.send_and_receive(Command::SetChannelNames, Some(&body), BodyShape::Empty)?;
        self.disconnect()
    }

    /// Send DISCONNECT and wait for its acknowledgement.
    pub fn disconnect(&mut self) -> Result<()> {
        self.send_and_receive(Command::Disconnect, None, BodyShape::Empty)?;
        Ok(())
    }
}

/// Rename one channel, leaving the others as the device has them.
///
/// Reads the current table over one connection and writes the updated
/// table back over a second one. Returns the table as the device now holds
/// it, with long lines already truncated.
pub fn rename_channel(
    host: &str,
    config: &ConnectionConfig,
    channel: usize,
    line1: &str,
    line2: &str,
) -> Result<ChannelNameTable> {
    if channel >= NUM_CHANNELS {
        return Err(DeviceError::ChannelOutOfRange {
            channel,
            max: NUM_CHANNELS,
        });
    }

    let mut table = connect_with_config(host, config)?.get_channel_names()?;
    table.set(channel, line1, line2)?;
    let written = ChannelNameTable::decode(&table.encode());
    connect_with_config(host, config)?.set_channel_names(&written)?;
    debug!(host = host, channel = channel, "renamed channel");
    Ok(written)
}
