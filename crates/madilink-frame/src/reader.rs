use std::io::{ErrorKind, Read};
use std::time::Instant;

use bytes::Bytes;
use madilink_transport::ReadTimeout;
use tracing::trace;

use crate::codec::{Frame, Header, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads frames from any `Read` stream.
///
/// The header and the body are read in separate steps so a caller can
/// validate the header against the body it expects before consuming more
/// bytes. Short reads are retried internally; EOF before the requested
/// bytes arrive is reported as [`FrameError::ConnectionClosed`].
pub struct FrameReader<T> {
    inner: T,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read the next 8-byte header (blocking).
    pub fn read_header(&mut self) -> Result<Header> {
        let mut raw = [0u8; HEADER_SIZE];
        fill(&mut self.inner, &mut raw, |_| Ok(()))?;
        let header = Header::parse(&raw);
        trace!(command = header.command, body_len = header.body_len, "read header");
        Ok(header)
    }

    /// Read exactly `len` body bytes (blocking).
    pub fn read_body(&mut self, len: usize) -> Result<Bytes> {
        let mut body = vec![0u8; len];
        fill(&mut self.inner, &mut body, |_| Ok(()))?;
        Ok(Bytes::from(body))
    }

    /// Read a complete frame and verify its checksum (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let header = self.read_header()?;
        let body = self.read_body(header.body_len as usize)?;
        header.verify(&body)?;
        Ok(Frame {
            command: header.command,
            body,
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: ReadTimeout> FrameReader<T> {
    /// Read the next header, failing with a `TimedOut` I/O error once
    /// `deadline` passes.
    pub fn read_header_by(&mut self, deadline: Instant) -> Result<Header> {
        let mut raw = [0u8; HEADER_SIZE];
        fill(&mut self.inner, &mut raw, |inner| arm_timeout(inner, deadline))?;
        let header = Header::parse(&raw);
        trace!(command = header.command, body_len = header.body_len, "read header");
        Ok(header)
    }

    /// Read exactly `len` body bytes before `deadline`.
    pub fn read_body_by(&mut self, len: usize, deadline: Instant) -> Result<Bytes> {
        let mut body = vec![0u8; len];
        fill(&mut self.inner, &mut body, |inner| arm_timeout(inner, deadline))?;
        Ok(Bytes::from(body))
    }
}

/// Set the stream's read timeout to whatever is left before `deadline`.
fn arm_timeout<T: ReadTimeout>(inner: &mut T, deadline: Instant) -> Result<()> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(FrameError::Io(std::io::Error::from(ErrorKind::TimedOut)));
    }
    inner.set_read_timeout(Some(remaining)).map_err(FrameError::Io)
}

fn fill<T: Read>(
    inner: &mut T,
    buf: &mut [u8],
    mut before_read: impl FnMut(&mut T) -> Result<()>,
) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        before_read(inner)?;
        match inner.read(&mut buf[filled..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}
