use tracing::debug;

use crate::error::Result;
use crate::session::{Connection, ConnectionConfig};

/// Connect to a device's control port with default configuration.
pub fn connect(host: &str) -> Result<Connection> {
    connect_with_config(host, &ConnectionConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(host: &str, config: &ConnectionConfig) -> Result<Connection> {
    let stream = madilink_transport::connect(host, config.port, config.connect_timeout)?;
    debug!(
        host = host,
        port = config.port,
        revision = ?config.revision,
        "control session opened"
    );
    Connection::from_stream(stream, config.clone())
}

#[cfg(test)]
mod tests {
    use std::thread;

    use madilink_frame::{FrameReader, FrameWriter, ACK, DISCONNECT_V2};
    use madilink_transport::{DeviceListener, TransportError};

    use super::*;
    use crate::error::DeviceError;

    #[test]
    fn connect_with_config_uses_port() {
        let listener = DeviceListener::bind("127.0.0.1:0").expect("listener should bind");
        let port = listener.local_addr().port();

        let device = thread::spawn(move || {
            let stream = listener.accept().expect("listener should accept");
            let mut reader = FrameReader::new(stream.try_clone().expect("clone"));
            let frame = reader.read_frame().expect("should receive request");
            assert_eq!(frame.command, DISCONNECT_V2);
            FrameWriter::new(stream)
                .send(ACK, &[])
                .expect("should acknowledge");
        });

        let config = ConnectionConfig {
            port,
            ..ConnectionConfig::default()
        };
        let mut conn = connect_with_config("127.0.0.1", &config).expect("client should connect");
        conn.disconnect().expect("disconnect should succeed");
        assert_eq!(conn.peer_addr().expect("peer addr").port(), port);
        conn.close().expect("close should succeed");

        device.join().expect("device thread should complete");
    }

    #[test]
    fn connect_failure_is_transport_error() {
        let port = {
            let listener = DeviceListener::bind("127.0.0.1:0").expect("listener should bind");
            listener.local_addr().port()
        };
        let config = ConnectionConfig {
            port,
            ..ConnectionConfig::default()
        };
        let err = connect_with_config("127.0.0.1", &config).expect_err("nothing is listening");
        assert!(matches!(
            err,
            DeviceError::Transport(TransportError::Connect { .. })
        ));
    }
}
