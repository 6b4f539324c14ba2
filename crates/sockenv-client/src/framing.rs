//! Message delimiting on the byte stream.
//!
//! Two framings are supported (see [`Framing`]):
//!
//! - **Raw** (protocol v1, default): encoded bytes are written unframed and a
//!   reply is whatever a single `read` of at most the receive capacity
//!   returns. Replies larger than the capacity are silently truncated.
//! - **Length-prefixed** (protocol v2): every message is a 4-byte
//!   **little-endian** `u32` length followed by the payload.
//!
//! # Length-prefixed wire format
//!
//! ```text
//! +----------------+------------------+
//! | Length (4B LE) | Encoded message  |
//! +----------------+------------------+
//! ```

use std::io::{ErrorKind, Read, Write};

use sockenv_core::config::Framing;
use sockenv_core::error::{ClientError, EncodingError};

/// Write one encoded message and flush.
pub fn write_frame<W: Write>(
    writer: &mut W,
    framing: Framing,
    bytes: &[u8],
) -> Result<(), ClientError> {
    match framing {
        Framing::Raw => writer.write_all(bytes)?,
        Framing::LengthPrefixed => {
            let len = u32::try_from(bytes.len()).map_err(|_| EncodingError::PayloadTooLarge {
                size: bytes.len(),
                max: u32::MAX as usize,
            })?;
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(bytes)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read one reply into `buf` and return the filled prefix.
///
/// `buf.len()` is the receive capacity. With [`Framing::Raw`] this performs
/// exactly one `read`; whatever it returns is the reply, so a reply larger
/// than `buf` is cut short and the rest stays on the stream. A zero-byte read
/// means the peer hung up and is reported as an `UnexpectedEof` transport
/// error.
///
/// With [`Framing::LengthPrefixed`] the declared length is checked against
/// the capacity before the payload is read.
pub fn read_frame<'a, R: Read>(
    reader: &mut R,
    framing: Framing,
    buf: &'a mut [u8],
) -> Result<&'a [u8], ClientError> {
    match framing {
        Framing::Raw => {
            let n = loop {
                match reader.read(buf) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(ClientError::Transport(e)),
                }
            };
            if n == 0 {
                return Err(peer_hung_up());
            }
            Ok(&buf[..n])
        }
        Framing::LengthPrefixed => {
            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf)?;
            let len = u32::from_le_bytes(len_buf) as usize;
            if len > buf.len() {
                return Err(EncodingError::PayloadTooLarge {
                    size: len,
                    max: buf.len(),
                }
                .into());
            }
            reader.read_exact(&mut buf[..len])?;
            Ok(&buf[..len])
        }
    }
}

fn peer_hung_up() -> ClientError {
    ClientError::Transport(std::io::Error::new(
        ErrorKind::UnexpectedEof,
        "peer closed the connection",
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn raw_write_is_unframed() {
        let mut out = Vec::new();
        write_frame(&mut out, Framing::Raw, b"hello").unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn length_prefix_is_little_endian() {
        let mut out = Vec::new();
        write_frame(&mut out, Framing::LengthPrefixed, b"hello").unwrap();
        let len = u32::from_le_bytes([out[0], out[1], out[2], out[3]]) as usize;
        assert_eq!(len, 5);
        assert_eq!(&out[4..], b"hello");
    }

    #[test]
    fn raw_read_returns_single_read() {
        let mut cursor = Cursor::new(b"abcdef".to_vec());
        let mut buf = [0u8; 16];
        let got = read_frame(&mut cursor, Framing::Raw, &mut buf).unwrap();
        assert_eq!(got, b"abcdef");
    }

    #[test]
    fn raw_read_truncates_to_capacity_without_error() {
        let mut cursor = Cursor::new(b"abcdefgh".to_vec());
        let mut buf = [0u8; 3];
        let got = read_frame(&mut cursor, Framing::Raw, &mut buf).unwrap();
        assert_eq!(got, b"abc");

        // The rest of the oversized reply is left on the stream.
        let mut buf = [0u8; 16];
        let rest = read_frame(&mut cursor, Framing::Raw, &mut buf).unwrap();
        assert_eq!(rest, b"defgh");
    }

    #[test]
    fn raw_read_eof_is_transport_error() {
        let mut cursor = Cursor::new(Vec::new());
        let mut buf = [0u8; 8];
        let err = read_frame(&mut cursor, Framing::Raw, &mut buf).unwrap_err();
        match err {
            ClientError::Transport(e) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn length_prefixed_roundtrip_sequence() {
        let mut out = Vec::new();
        write_frame(&mut out, Framing::LengthPrefixed, b"first").unwrap();
        write_frame(&mut out, Framing::LengthPrefixed, b"second!").unwrap();

        let mut cursor = Cursor::new(out);
        let mut buf = [0u8; 32];
        assert_eq!(
            read_frame(&mut cursor, Framing::LengthPrefixed, &mut buf).unwrap(),
            b"first"
        );
        assert_eq!(
            read_frame(&mut cursor, Framing::LengthPrefixed, &mut buf).unwrap(),
            b"second!"
        );
    }

    #[test]
    fn length_prefixed_rejects_oversized_reply() {
        let mut out = Vec::new();
        write_frame(&mut out, Framing::LengthPrefixed, &[7u8; 64]).unwrap();
        let mut cursor = Cursor::new(out);
        let mut buf = [0u8; 16];
        let err = read_frame(&mut cursor, Framing::LengthPrefixed, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Encoding(EncodingError::PayloadTooLarge { size: 64, max: 16 })
        ));
    }

    #[test]
    fn length_prefixed_short_stream_is_transport_error() {
        let mut cursor = Cursor::new(vec![10u8, 0, 0, 0, 1, 2]);
        let mut buf = [0u8; 16];
        let err = read_frame(&mut cursor, Framing::LengthPrefixed, &mut buf).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn empty_length_prefixed_frame() {
        let mut out = Vec::new();
        write_frame(&mut out, Framing::LengthPrefixed, &[]).unwrap();
        let mut cursor = Cursor::new(out);
        let mut buf = [0u8; 4];
        assert!(
            read_frame(&mut cursor, Framing::LengthPrefixed, &mut buf)
                .unwrap()
                .is_empty()
        );
    }
}
