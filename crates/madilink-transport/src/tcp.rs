use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::DeviceStream;

/// TCP port the interface listens on for control connections.
pub const DEFAULT_PORT: u16 = 9760;

/// Connect to a device control port (blocking).
///
/// Every address `host` resolves to is tried in order; the error from the
/// last attempt is returned if none succeeds.
pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<DeviceStream> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Resolve {
            host: host.to_string(),
            port,
            source: e,
        })?
        .collect();

    let mut last_err = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                // Frames are small and strictly request/response.
                stream.set_nodelay(true)?;
                debug!(%addr, "connected to device");
                return Ok(DeviceStream::from_tcp(stream));
            }
            Err(source) => {
                debug!(%addr, error = %source, "connect attempt failed");
                last_err = Some(TransportError::Connect { addr, source });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| TransportError::Resolve {
        host: host.to_string(),
        port,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved"),
    }))
}

/// Listening side of the control protocol.
///
/// Used by device emulators and test fixtures that stand in for hardware.
pub struct DeviceListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl DeviceListener {
    /// Bind and listen on `addr` (e.g. `127.0.0.1:0` for an ephemeral port).
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(addr = %local, "listening for control connections");
        Ok(Self {
            listener,
            addr: local,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<DeviceStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted control connection");
        Ok(DeviceStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
