//! TCP transport for MADI interface control connections.
//!
//! The interface exposes its configuration protocol on a plain TCP port
//! (no TLS, no authentication). This is the lowest layer of madilink;
//! everything else builds on the [`DeviceStream`] type provided here.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{connect, DeviceListener, DEFAULT_PORT};
pub use traits::{DeviceStream, ReadTimeout};
