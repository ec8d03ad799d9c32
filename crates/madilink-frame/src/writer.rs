use std::io::{ErrorKind, Write};
use std::time::Duration;

use bytes::BytesMut;
use madilink_transport::DeviceStream;
use tracing::trace;

use crate::codec::{encode_frame, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 2 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send a command with an optional body.
    pub fn send(&mut self, command: u16, body: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(command, body, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        trace!(
            command = command,
            body_len = self.buf.len() - HEADER_SIZE,
            "wrote frame"
        );

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameWriter<DeviceStream> {
    /// Create a frame writer for a `DeviceStream` and apply a write timeout.
    pub fn with_write_timeout(inner: DeviceStream, timeout: Option<Duration>) -> Result<Self> {
        inner
            .set_write_timeout(timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}

fn transport_to_frame_error(err: madilink_transport::TransportError) -> FrameError {
    match err {
        madilink_transport::TransportError::Io(io)
        | madilink_transport::TransportError::Accept(io) => FrameError::Io(io),
        madilink_transport::TransportError::Bind { source, .. }
        | madilink_transport::TransportError::Connect { source, .. }
        | madilink_transport::TransportError::Resolve { source, .. } => FrameError::Io(source),
        madilink_transport::TransportError::Closed => FrameError::ConnectionClosed,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{byte_sum, decode_frame};
    use crate::command::{RESET_UNIT, SET_CHANNEL_NAMES};
    use crate::reader::FrameReader;

    #[test]
    fn send_writes_checksummed_frame() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.send(RESET_UNIT, &[]).unwrap();

        let wire = writer.into_inner();
        assert_eq!(wire.len(), HEADER_SIZE);
        assert_eq!(byte_sum(&wire), 0);
    }

    #[test]
    fn consecutive_sends_do_not_leak_buffer() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.send(SET_CHANNEL_NAMES, b"first body").unwrap();
        writer.send(RESET_UNIT, &[]).unwrap();

        let mut wire = BytesMut::from(writer.into_inner().as_slice());
        let f1 = decode_frame(&mut wire).unwrap().unwrap();
        let f2 = decode_frame(&mut wire).unwrap().unwrap();
        assert_eq!(f1.body.as_ref(), b"first body");
        assert_eq!(f2.command, RESET_UNIT);
        assert!(f2.body.is_empty());
    }

    #[test]
    fn zero_length_write_reports_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(RESET_UNIT, &[]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn roundtrip_over_tcp() {
        let listener = madilink_transport::DeviceListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().port();

        let server = std::thread::spawn(move || {
            let stream = listener.accept().unwrap();
            let mut reader = FrameReader::new(stream);
            reader.read_frame().unwrap()
        });

        let stream = madilink_transport::connect("127.0.0.1", port, None).unwrap();
        let mut writer =
            FrameWriter::with_write_timeout(stream, Some(Duration::from_secs(1))).unwrap();
        writer.send(SET_CHANNEL_NAMES, &[7u8; 1536]).unwrap();

        let frame = server.join().unwrap();
        assert_eq!(frame.command, SET_CHANNEL_NAMES);
        assert_eq!(frame.body.len(), 1536);
    }

    #[test]
    fn accessors() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let _ = writer.get_ref();
        let _ = writer.get_mut();
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
