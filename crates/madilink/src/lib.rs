//! Configure MADI audio interfaces over their TCP control protocol.
//!
//! madilink speaks the vendor's binary command/response protocol: read and
//! write the 64-channel name table, and reset the unit.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP dialing and the device stream
//! - [`frame`]: 8-byte header framing, opcodes and checksums
//! - [`device`]: request/response engine and device operations
//!
//! The `madilink` binary (behind the `cli` feature) wraps [`device`] for
//! shell use.

/// Re-export transport types.
pub mod transport {
    pub use madilink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use madilink_frame::*;
}

/// Re-export device types.
pub mod device {
    pub use madilink_device::*;
}

pub use madilink_device::{
    connect, connect_with_config, rename_channel, ChannelName, ChannelNameTable, Connection,
    ConnectionConfig, DeviceError, Result,
};
