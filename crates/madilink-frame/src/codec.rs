use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: command (2) + body length (2) + checksum (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest body the 16-bit length field can describe.
pub const MAX_BODY_SIZE: usize = u16::MAX as usize;

const CHECKSUM_OFFSET: usize = 4;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Command opcode.
    pub command: u16,
    /// Number of body bytes following the header.
    pub body_len: u16,
    /// Two's complement of the byte sum of the rest of the frame.
    pub checksum: u32,
}

impl Header {
    /// Extract the header fields. No validation happens here; the caller
    /// knows which body shape to expect.
    pub fn parse(buf: &[u8; HEADER_SIZE]) -> Self {
        Self {
            command: u16::from_le_bytes([buf[0], buf[1]]),
            body_len: u16::from_le_bytes([buf[2], buf[3]]),
            checksum: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }

    /// Serialize the header as it appears on the wire.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..2].copy_from_slice(&self.command.to_le_bytes());
        out[2..4].copy_from_slice(&self.body_len.to_le_bytes());
        out[4..8].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    /// Check the checksum invariant against `body`.
    ///
    /// The command bytes, length bytes and body bytes plus the checksum
    /// field must sum to zero modulo 2^32.
    pub fn verify(&self, body: &[u8]) -> Result<()> {
        let expected = checksum(self.command, self.body_len, body);
        if expected != self.checksum {
            return Err(FrameError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }
        Ok(())
    }
}

/// Wrapping byte sum of `bytes`.
pub fn byte_sum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
}

/// The checksum field value for a frame with these contents.
pub fn checksum(command: u16, body_len: u16, body: &[u8]) -> u32 {
    byte_sum(&command.to_le_bytes())
        .wrapping_add(byte_sum(&body_len.to_le_bytes()))
        .wrapping_add(byte_sum(body))
        .wrapping_neg()
}

/// A complete frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode.
    pub command: u16,
    /// The frame body (empty for bodiless commands).
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(command: u16, body: impl Into<Bytes>) -> Self {
        Self {
            command,
            body: body.into(),
        }
    }
}

/// Encode a frame into the wire format.
///
/// Wire format (all integers little-endian):
/// ```text
/// ┌──────────────┬──────────────┬────────────────┬──────────────────┐
/// │ Command (2B) │ Length (2B)  │ Checksum (4B)  │ Body             │
/// │              │              │                │ (Length bytes)   │
/// └──────────────┴──────────────┴────────────────┴──────────────────┘
/// ```
///
/// The checksum is written last: the frame is assembled with a zero
/// placeholder, summed byte by byte, and the negated sum is stored.
pub fn encode_frame(command: u16, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > MAX_BODY_SIZE {
        return Err(FrameError::BodyTooLarge {
            size: body.len(),
            max: MAX_BODY_SIZE,
        });
    }

    let start = dst.len();
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_u16_le(command);
    dst.put_u16_le(body.len() as u16);
    dst.put_u32_le(0);
    dst.put_slice(body);

    let sum = byte_sum(&dst[start..]).wrapping_neg();
    let field = start + CHECKSUM_OFFSET;
    dst[field..field + 4].copy_from_slice(&sum.to_le_bytes());
    Ok(())
}

/// Decode a frame from a buffer and verify its checksum.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(&src[..HEADER_SIZE]);
    let header = Header::parse(&raw);

    let total = HEADER_SIZE + header.body_len as usize;
    if src.len() < total {
        return Ok(None);
    }

    header.verify(&src[HEADER_SIZE..total])?;

    src.advance(HEADER_SIZE);
    let body = src.split_to(header.body_len as usize).freeze();

    Ok(Some(Frame {
        command: header.command,
        body,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ACK, DISCONNECT_V2, GET_CHANNEL_NAMES, RESET_UNIT};

    fn frame_sum(wire: &[u8]) -> u32 {
        byte_sum(wire)
    }

    #[test]
    fn test_encode_bodiless_command() {
        let mut buf = BytesMut::new();
        encode_frame(RESET_UNIT, &[], &mut buf).unwrap();

        // 0x0A + 0x00 + 0x00 + 0x00 = 10, negated.
        assert_eq!(
            buf.as_ref(),
            &[0x0A, 0x00, 0x00, 0x00, 0xF6, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let body = b"channel names";

        encode_frame(GET_CHANNEL_NAMES, body, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + body.len());

        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(frame.command, GET_CHANNEL_NAMES);
        assert_eq!(frame.body.as_ref(), body);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_whole_frame_sums_to_zero() {
        for (command, body) in [
            (ACK, Vec::new()),
            (DISCONNECT_V2, Vec::new()),
            (GET_CHANNEL_NAMES, vec![0xFF; 1536]),
            (0xFFFF, vec![0x80; 300]),
        ] {
            let mut buf = BytesMut::new();
            encode_frame(command, &body, &mut buf).unwrap();
            assert_eq!(frame_sum(&buf), 0, "command {command:#06X}");

            let mut raw = [0u8; HEADER_SIZE];
            raw.copy_from_slice(&buf[..HEADER_SIZE]);
            let header = Header::parse(&raw);
            assert_eq!(header.command, command);
            assert_eq!(header.body_len as usize, body.len());
            header.verify(&buf[HEADER_SIZE..]).unwrap();
        }
    }

    #[test]
    fn test_single_byte_body_corruption_detected() {
        let body: Vec<u8> = (0..64u8).collect();
        let mut clean = BytesMut::new();
        encode_frame(ACK, &body, &mut clean).unwrap();

        for pos in HEADER_SIZE..clean.len() {
            for delta in [1u8, 0x7F, 0xFF] {
                let mut corrupted = clean.clone();
                corrupted[pos] = corrupted[pos].wrapping_add(delta);
                let result = decode_frame(&mut corrupted);
                assert!(
                    matches!(result, Err(FrameError::ChecksumMismatch { .. })),
                    "corruption at {pos} by {delta} not detected"
                );
            }
        }
    }

    #[test]
    fn test_header_roundtrip_bytes() {
        let header = Header {
            command: 0x1001,
            body_len: 1536,
            checksum: 0xDEADBEEF,
        };
        assert_eq!(Header::parse(&header.to_bytes()), header);
        assert_eq!(
            header.to_bytes(),
            [0x01, 0x10, 0x00, 0x06, 0xEF, 0xBE, 0xAD, 0xDE]
        );
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x06, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_frame(ACK, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_encode_body_too_large() {
        let mut buf = BytesMut::new();
        let body = vec![0u8; MAX_BODY_SIZE + 1];
        let result = encode_frame(ACK, &body, &mut buf);
        assert!(matches!(result, Err(FrameError::BodyTooLarge { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(ACK, b"first", &mut buf).unwrap();
        encode_frame(RESET_UNIT, b"", &mut buf).unwrap();
        assert_eq!(frame_sum(&buf), 0);

        let f1 = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(f1.command, ACK);
        assert_eq!(f1.body.as_ref(), b"first");

        let f2 = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(f2.command, RESET_UNIT);
        assert!(f2.body.is_empty());

        assert!(buf.is_empty());
    }
}
