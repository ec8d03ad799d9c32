//! Request/response engine and device operations for MADI interface control.
//!
//! This is the layer applications use. Dial a device, then query or apply
//! channel names or reset the unit. Each call is one blocking sequence of
//! request/response exchanges ending with DISCONNECT.
//!
//! ```no_run
//! use madilink_device::connect;
//!
//! fn main() -> madilink_device::Result<()> {
//!     let mut names = connect("10.0.0.20")?.get_channel_names()?;
//!     names.set(6, "HELLO", "NICK")?;
//!     connect("10.0.0.20")?.set_channel_names(&names)?;
//!     Ok(())
//! }
//! ```

pub mod body;
pub mod connector;
pub mod device;
pub mod error;
pub mod names;
pub mod session;

pub use body::{Body, BodyShape};
pub use connector::{connect, connect_with_config};
pub use device::rename_channel;
pub use error::{DeviceError, ErrorKind, Result};
pub use names::{
    ChannelName, ChannelNameTable, RawChannelNameTable, LINES_PER_CHANNEL, NAME_LEN,
    NUM_CHANNELS, RAW_TABLE_SIZE, RECORD_LEN,
};
pub use session::{Connection, ConnectionConfig, ExchangeState, DEFAULT_READ_TIMEOUT};
