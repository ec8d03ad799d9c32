use std::net::SocketAddr;
use std::time::{Duration, Instant};

use madilink_frame::{
    command_name, Command, FrameError, FrameReader, FrameWriter, ProtocolRevision, ACK, NAK,
};
use madilink_transport::{DeviceStream, DEFAULT_PORT};
use tracing::debug;

use crate::body::{Body, BodyShape};
use crate::error::{DeviceError, Result};

/// How long a response may take to arrive in full.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Control port on the device.
    pub port: u16,
    /// Timeout for establishing the TCP connection.
    pub connect_timeout: Option<Duration>,
    /// Deadline for each complete response (header and body).
    pub read_timeout: Duration,
    /// Timeout for each blocking write.
    pub write_timeout: Option<Duration>,
    /// Firmware generation; selects the DISCONNECT opcode.
    pub revision: ProtocolRevision,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Some(Duration::from_secs(5)),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: Some(DEFAULT_READ_TIMEOUT),
            revision: ProtocolRevision::default(),
        }
    }
}

/// Where the most recent exchange got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing sent yet on this connection.
    Idle,
    /// Request written, response not yet awaited.
    Sent,
    /// Blocked on the response.
    AwaitingResponse,
    /// Last exchange completed with an ACK.
    Done,
    /// Last exchange failed.
    Failed,
}

/// A control session with one device.
///
/// Exactly one request is in flight at a time. Every operation takes
/// `&mut self`, so a connection cannot be driven from two threads at once.
pub struct Connection {
    reader: FrameReader<DeviceStream>,
    writer: FrameWriter<DeviceStream>,
    config: ConnectionConfig,
    state: ExchangeState,
    broken: bool,
}

impl Connection {
    /// Build a session over an already connected stream.
    pub fn from_stream(stream: DeviceStream, config: ConnectionConfig) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let writer = FrameWriter::with_write_timeout(stream, config.write_timeout)?;
        Ok(Self {
            reader: FrameReader::new(reader_stream),
            writer,
            config,
            state: ExchangeState::Idle,
            broken: false,
        })
    }

    /// Write one request frame. No response is awaited.
    pub fn send_message(&mut self, command: Command, body: Option<&Body>) -> Result<()> {
        if self.broken {
            return Err(DeviceError::ConnectionBroken);
        }

        let shape = body.map_or(BodyShape::Empty, Body::shape);
        let expected = BodyShape::request_for(command);
        if shape != expected {
            return Err(DeviceError::RequestBodyMismatch {
                command,
                expected,
                actual: shape,
            });
        }

        let opcode = command.opcode(self.config.revision);
        let bytes = body.map_or(&[][..], Body::as_bytes);
        if let Err(err) = self.writer.send(opcode, bytes) {
            return Err(self.fail(err.into(), true));
        }

        debug!(%command, opcode = opcode, body_len = bytes.len(), "sent request");
        self.state = ExchangeState::Sent;
        Ok(())
    }

    /// Wait for the response to `command` and decode its body as `expected`.
    ///
    /// The whole response must arrive within the configured read timeout.
    /// The body length is checked against `expected` before the body is
    /// read, so a length mismatch is reported without a checksum check.
    pub fn receive_message(
        &mut self,
        command: Command,
        expected: BodyShape,
    ) -> Result<Option<Body>> {
        if self.broken {
            return Err(DeviceError::ConnectionBroken);
        }
        self.state = ExchangeState::AwaitingResponse;
        let deadline = Instant::now() + self.config.read_timeout;

        let header = match self.reader.read_header_by(deadline) {
            Ok(header) => header,
            Err(err) => {
                let err = self.read_error(err);
                return Err(self.fail(err, true));
            }
        };

        match header.command {
            ACK => {
                let actual = header.body_len as usize;
                if actual != expected.size() {
                    let err = DeviceError::BodySizeMismatch {
                        command,
                        expected: expected.size(),
                        actual,
                    };
                    return Err(self.fail(err, true));
                }

                let body = match self.reader.read_body_by(actual, deadline) {
                    Ok(body) => body,
                    Err(err) => {
                        let err = self.read_error(err);
                        return Err(self.fail(err, true));
                    }
                };

                if let Err(err) = header.verify(&body) {
                    let err = match err {
                        FrameError::ChecksumMismatch {
                            expected: want,
                            actual: got,
                        } => DeviceError::ChecksumMismatch {
                            command,
                            expected: want,
                            actual: got,
                        },
                        other => other.into(),
                    };
                    // The body was consumed in full; the stream is still in step.
                    return Err(self.fail(err, false));
                }

                let decoded = match expected.decode(command, &body) {
                    Ok(decoded) => decoded,
                    Err(err) => return Err(self.fail(err, false)),
                };
                debug!(%command, body_len = actual, "received ACK");
                self.state = ExchangeState::Done;
                Ok(decoded)
            }
            NAK => {
                debug!(%command, "received NAK");
                // A NAK body is left unread, so a non-empty one puts the stream out of step.
                let desync = header.body_len != 0;
                Err(self.fail(DeviceError::Rejected { command }, desync))
            }
            opcode => {
                debug!(
                    %command,
                    opcode = opcode,
                    received = command_name(opcode, self.config.revision),
                    "unexpected response opcode"
                );
                let err = DeviceError::UnrecognizedResponse { command, opcode };
                Err(self.fail(err, true))
            }
        }
    }

    /// Send `command` and wait for its response.
    pub fn send_and_receive(
        &mut self,
        command: Command,
        body: Option<&Body>,
        expected: BodyShape,
    ) -> Result<Option<Body>> {
        self.send_message(command, body)?;
        self.receive_message(command, expected)
    }

    /// State of the most recent exchange.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Returns true once a failure has left the stream out of step.
    ///
    /// A broken connection refuses further exchanges; dial a new one.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Address of the device.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.writer.get_ref().peer_addr()?)
    }

    /// Shut the stream down.
    pub fn close(self) -> Result<()> {
        self.writer.get_ref().shutdown()?;
        Ok(())
    }

    fn read_error(&self, err: FrameError) -> DeviceError {
        if err.is_timeout() {
            DeviceError::Timeout(self.config.read_timeout)
        } else {
            err.into()
        }
    }

    fn fail(&mut self, err: DeviceError, desync: bool) -> DeviceError {
        debug!(error = %err, desync = desync, "exchange failed");
        self.state = ExchangeState::Failed;
        self.broken |= desync;
        err
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("stream", self.writer.get_ref())
            .field("revision", &self.config.revision)
            .field("state", &self.state)
            .field("broken", &self.broken)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::thread::{self, JoinHandle};

    use madilink_frame::{Header, GET_CHANNEL_NAMES, RESET_UNIT};
    use madilink_transport::DeviceListener;

    use super::*;
    use crate::names::RAW_TABLE_SIZE;

    /// Accept one connection and hand it to `device`.
    fn stub<F>(config: ConnectionConfig, device: F) -> (Connection, JoinHandle<()>)
    where
        F: FnOnce(FrameReader<DeviceStream>, DeviceStream) + Send + 'static,
    {
        let listener = DeviceListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().port();
        let handle = thread::spawn(move || {
            let stream = listener.accept().unwrap();
            let reader = FrameReader::new(stream.try_clone().unwrap());
            device(reader, stream);
        });
        let stream = madilink_transport::connect("127.0.0.1", port, None).unwrap();
        (Connection::from_stream(stream, config).unwrap(), handle)
    }

    fn raw_frame(command: u16, body_len: u16, checksum: u32, body: &[u8]) -> Vec<u8> {
        let mut out = Header {
            command,
            body_len,
            checksum,
        }
        .to_bytes()
        .to_vec();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn bodiless_exchange_succeeds() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, stream| {
            let request = reader.read_frame().unwrap();
            assert_eq!(request.command, RESET_UNIT);
            assert!(request.body.is_empty());
            FrameWriter::new(stream).send(ACK, &[]).unwrap();
        });

        assert_eq!(conn.state(), ExchangeState::Idle);
        let body = conn
            .send_and_receive(Command::ResetUnit, None, BodyShape::Empty)
            .unwrap();
        assert!(body.is_none());
        assert_eq!(conn.state(), ExchangeState::Done);
        device.join().unwrap();
    }

    #[test]
    fn size_mismatch_reported_before_checksum() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, mut stream| {
            reader.read_frame().unwrap();
            // Wrong length and a garbage checksum.
            stream
                .write_all(&raw_frame(ACK, 10, 0x1234_5678, &[0xEE; 10]))
                .unwrap();
        });

        let err = conn
            .send_and_receive(Command::GetChannelNames, None, BodyShape::ChannelNames)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::BodySizeMismatch {
                command: Command::GetChannelNames,
                expected: RAW_TABLE_SIZE,
                actual: 10,
            }
        ));
        assert!(conn.is_broken());
        device.join().unwrap();
    }

    #[test]
    fn nak_is_rejected_regardless_of_length() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, mut stream| {
            reader.read_frame().unwrap();
            stream.write_all(&raw_frame(NAK, 1536, 0, &[])).unwrap();
        });

        let err = conn
            .send_and_receive(Command::GetChannelNames, None, BodyShape::ChannelNames)
            .unwrap_err();
        assert!(err.is_rejected());
        assert_eq!(conn.state(), ExchangeState::Failed);
        device.join().unwrap();
    }

    #[test]
    fn bodiless_nak_keeps_connection_usable() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, stream| {
            let mut writer = FrameWriter::new(stream);
            reader.read_frame().unwrap();
            writer.send(NAK, &[]).unwrap();
            reader.read_frame().unwrap();
            writer.send(ACK, &[]).unwrap();
        });

        let err = conn
            .send_and_receive(Command::ResetUnit, None, BodyShape::Empty)
            .unwrap_err();
        assert!(err.is_rejected());
        assert!(!conn.is_broken());

        conn.send_and_receive(Command::Disconnect, None, BodyShape::Empty)
            .unwrap();
        device.join().unwrap();
    }

    #[test]
    fn unrecognized_opcode() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, stream| {
            reader.read_frame().unwrap();
            FrameWriter::new(stream).send(GET_CHANNEL_NAMES, &[]).unwrap();
        });

        let err = conn
            .send_and_receive(Command::ResetUnit, None, BodyShape::Empty)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::UnrecognizedResponse {
                command: Command::ResetUnit,
                opcode: GET_CHANNEL_NAMES,
            }
        ));
        device.join().unwrap();
    }

    #[test]
    fn corrupted_body_fails_integrity_check() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, mut stream| {
            reader.read_frame().unwrap();
            let mut wire = bytes::BytesMut::new();
            madilink_frame::encode_frame(ACK, &[0u8; RAW_TABLE_SIZE], &mut wire).unwrap();
            wire[100] = 0x41;
            stream.write_all(&wire).unwrap();
        });

        let err = conn
            .send_and_receive(Command::GetChannelNames, None, BodyShape::ChannelNames)
            .unwrap_err();
        assert!(matches!(err, DeviceError::ChecksumMismatch { .. }));
        assert!(!conn.is_broken());
        device.join().unwrap();
    }

    #[test]
    fn timeout_breaks_connection() {
        let config = ConnectionConfig {
            read_timeout: Duration::from_millis(100),
            ..ConnectionConfig::default()
        };
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let (mut conn, device) = stub(config, move |mut reader, _stream| {
            reader.read_frame().unwrap();
            // Hold the connection open without answering.
            let _ = done_rx.recv();
        });

        let started = Instant::now();
        let err = conn
            .send_and_receive(Command::ResetUnit, None, BodyShape::Empty)
            .unwrap_err();
        assert!(matches!(err, DeviceError::Timeout(t) if t == Duration::from_millis(100)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(conn.is_broken());

        let err = conn
            .send_and_receive(Command::Disconnect, None, BodyShape::Empty)
            .unwrap_err();
        assert!(matches!(err, DeviceError::ConnectionBroken));

        done_tx.send(()).unwrap();
        device.join().unwrap();
    }

    #[test]
    fn short_read_is_transport_error() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |mut reader, mut stream| {
            reader.read_frame().unwrap();
            stream.write_all(&[ACK as u8, 0x00, 0x00]).unwrap();
            stream.shutdown().unwrap();
        });

        let err = conn
            .send_and_receive(Command::ResetUnit, None, BodyShape::Empty)
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Transport(madilink_transport::TransportError::Closed)
        ));
        device.join().unwrap();
    }

    #[test]
    fn request_body_must_match_command() {
        let (mut conn, device) = stub(ConnectionConfig::default(), |_reader, _stream| {});

        let body = Body::ChannelNames(crate::names::RawChannelNameTable::zeroed());
        let err = conn
            .send_message(Command::ResetUnit, Some(&body))
            .unwrap_err();
        assert!(matches!(err, DeviceError::RequestBodyMismatch { .. }));

        let err = conn
            .send_message(Command::SetChannelNames, None)
            .unwrap_err();
        assert!(matches!(err, DeviceError::RequestBodyMismatch { .. }));
        assert_eq!(conn.state(), ExchangeState::Idle);
        device.join().unwrap();
    }
}
