//! Command opcodes.
//!
//! Every request and every response carries a 16-bit opcode in the first
//! two bytes of the header. Responses are always `ACK` or `NAK`.

use std::fmt;

/// No operation.
pub const NOP: u16 = 0x0000;

/// Positive acknowledgement (response envelope).
pub const ACK: u16 = 0x0006;

/// Reboot the unit.
pub const RESET_UNIT: u16 = 0x000A;

/// Negative acknowledgement (response envelope).
pub const NAK: u16 = 0x0015;

/// End-of-session notification, revision 1 firmware.
pub const DISCONNECT_V1: u16 = 0x0004;

/// End-of-session notification, revision 2 firmware.
pub const DISCONNECT_V2: u16 = 0x0017;

/// Read the MADI channel name table.
pub const GET_CHANNEL_NAMES: u16 = 0x1000;

/// Write the MADI channel name table.
pub const SET_CHANNEL_NAMES: u16 = 0x1001;

/// Firmware generation the client talks to.
///
/// The generations agree on every opcode except `DISCONNECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolRevision {
    /// `DISCONNECT` is `0x0004`.
    V1,
    /// `DISCONNECT` is `0x0017`.
    #[default]
    V2,
}

impl ProtocolRevision {
    /// The `DISCONNECT` opcode for this revision.
    pub fn disconnect_opcode(self) -> u16 {
        match self {
            ProtocolRevision::V1 => DISCONNECT_V1,
            ProtocolRevision::V2 => DISCONNECT_V2,
        }
    }
}

/// A recognized protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// No operation.
    Nop,
    /// Positive acknowledgement; the envelope of every successful response.
    Ack,
    /// Reboot the unit.
    ResetUnit,
    /// Negative acknowledgement.
    Nak,
    /// End the control session.
    Disconnect,
    /// Read the channel name table.
    GetChannelNames,
    /// Write the channel name table.
    SetChannelNames,
}

impl Command {
    /// Wire opcode of this command under `revision`.
    pub fn opcode(self, revision: ProtocolRevision) -> u16 {
        match self {
            Command::Nop => NOP,
            Command::Ack => ACK,
            Command::ResetUnit => RESET_UNIT,
            Command::Nak => NAK,
            Command::Disconnect => revision.disconnect_opcode(),
            Command::GetChannelNames => GET_CHANNEL_NAMES,
            Command::SetChannelNames => SET_CHANNEL_NAMES,
        }
    }

    /// Look up the command for a wire opcode under `revision`.
    ///
    /// Returns `None` for opcodes outside the recognized set, including the
    /// other revision's `DISCONNECT`.
    pub fn from_opcode(opcode: u16, revision: ProtocolRevision) -> Option<Self> {
        match opcode {
            NOP => Some(Command::Nop),
            ACK => Some(Command::Ack),
            RESET_UNIT => Some(Command::ResetUnit),
            NAK => Some(Command::Nak),
            GET_CHANNEL_NAMES => Some(Command::GetChannelNames),
            SET_CHANNEL_NAMES => Some(Command::SetChannelNames),
            op if op == revision.disconnect_opcode() => Some(Command::Disconnect),
            _ => None,
        }
    }

    /// Protocol name of the command.
    pub fn name(self) -> &'static str {
        match self {
            Command::Nop => "NOP",
            Command::Ack => "ACK",
            Command::ResetUnit => "RESET_UNIT",
            Command::Nak => "NAK",
            Command::Disconnect => "DISCONNECT",
            Command::GetChannelNames => "GET_CHANNEL_NAMES",
            Command::SetChannelNames => "SET_CHANNEL_NAMES",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns a human-readable name for a wire opcode.
pub fn command_name(opcode: u16, revision: ProtocolRevision) -> &'static str {
    Command::from_opcode(opcode, revision)
        .map(Command::name)
        .unwrap_or("UNKNOWN")
}
