//! Checksummed binary framing for the MADI interface control protocol.
//!
//! Every message is framed with an 8-byte header:
//! - A 2-byte little-endian command opcode
//! - A 2-byte little-endian body length
//! - A 4-byte little-endian checksum (two's complement of the byte sum)
//!
//! The body follows the header directly. Callers read the header first and
//! decide how many body bytes to accept.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    byte_sum, checksum, decode_frame, encode_frame, Frame, Header, HEADER_SIZE, MAX_BODY_SIZE,
};
pub use command::{
    command_name, Command, ProtocolRevision, ACK, DISCONNECT_V1, DISCONNECT_V2,
    GET_CHANNEL_NAMES, NAK, NOP, RESET_UNIT, SET_CHANNEL_NAMES,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
