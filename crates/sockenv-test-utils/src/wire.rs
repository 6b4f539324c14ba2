//! Peer-side view of the wire format.
//!
//! Messages are JSON objects `{"tag": ..., "payload": ...}`. With raw framing
//! they follow each other back to back on the stream; with length-prefixed
//! framing each is preceded by a 4-byte little-endian length.

use std::io;

use serde_json::{Deserializer, Value, json};
use sockenv_core::config::Framing;
use sockenv_core::types::Payload;

/// Encode one message as the peer would put it on the wire.
pub fn encode(framing: Framing, tag: &str, payload: &Payload) -> Vec<u8> {
    let body = serde_json::to_vec(&json!({ "tag": tag, "payload": payload }))
        .expect("payload serialises");
    match framing {
        Framing::Raw => body,
        Framing::LengthPrefixed => {
            let len = u32::try_from(body.len()).expect("message fits in u32");
            let mut out = len.to_le_bytes().to_vec();
            out.extend_from_slice(&body);
            out
        }
    }
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

/// Accumulates bytes written by a client and splits them into messages.
#[derive(Debug)]
pub struct Inbox {
    framing: Framing,
    buf: Vec<u8>,
}

impl Inbox {
    pub const fn new(framing: Framing) -> Self {
        Self {
            framing,
            buf: Vec::new(),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet part of a complete message.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Next complete `(tag, payload)`, or `None` if more bytes are needed.
    pub fn next_message(&mut self) -> io::Result<Option<(String, Payload)>> {
        match self.framing {
            Framing::Raw => self.next_raw(),
            Framing::LengthPrefixed => self.next_length_prefixed(),
        }
    }

    fn next_raw(&mut self) -> io::Result<Option<(String, Payload)>> {
        let (value, used) = {
            let mut values = Deserializer::from_slice(&self.buf).into_iter::<Value>();
            match values.next() {
                None => return Ok(None),
                Some(Err(e)) if e.is_eof() => return Ok(None),
                Some(Err(e)) => return Err(invalid(e)),
                Some(Ok(value)) => (value, values.byte_offset()),
            }
        };
        self.buf.drain(..used);
        split(value).map(Some)
    }

    fn next_length_prefixed(&mut self) -> io::Result<Option<(String, Payload)>> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_le_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if self.buf.len() < 4 + len {
            return Ok(None);
        }
        let body: Vec<u8> = self.buf.drain(..4 + len).skip(4).collect();
        let value: Value = serde_json::from_slice(&body).map_err(invalid)?;
        split(value).map(Some)
    }
}

fn split(value: Value) -> io::Result<(String, Payload)> {
    let tag = value
        .get("tag")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("message has no string tag"))?
        .to_string();
    let payload = value.get("payload").cloned().unwrap_or(Value::Null);
    let payload = serde_json::from_value(payload).map_err(invalid)?;
    Ok((tag, payload))
}

fn invalid<E>(e: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, e)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_messages_split_back_to_back() {
        let mut inbox = Inbox::new(Framing::Raw);
        let mut bytes = encode(Framing::Raw, "RESET", &Payload::Int(1));
        bytes.extend(encode(Framing::Raw, "STATE", &Payload::Int(1)));
        inbox.push(&bytes);

        assert_eq!(
            inbox.next_message().unwrap(),
            Some(("RESET".to_string(), Payload::Int(1)))
        );
        assert_eq!(
            inbox.next_message().unwrap(),
            Some(("STATE".to_string(), Payload::Int(1)))
        );
        assert_eq!(inbox.next_message().unwrap(), None);
    }

    #[test]
    fn raw_partial_message_waits_for_more() {
        let bytes = encode(Framing::Raw, "CONTROL", &Payload::Array(vec![0.5, 0.25]));
        let (head, tail) = bytes.split_at(7);

        let mut inbox = Inbox::new(Framing::Raw);
        inbox.push(head);
        assert_eq!(inbox.next_message().unwrap(), None);
        inbox.push(tail);
        assert_eq!(
            inbox.next_message().unwrap(),
            Some(("CONTROL".to_string(), Payload::Array(vec![0.5, 0.25])))
        );
        assert_eq!(inbox.pending(), 0);
    }

    #[test]
    fn length_prefixed_split_across_pushes() {
        let bytes = encode(Framing::LengthPrefixed, "REWARD", &Payload::Float(1.5));
        let mut inbox = Inbox::new(Framing::LengthPrefixed);
        inbox.push(&bytes[..2]);
        assert_eq!(inbox.next_message().unwrap(), None);
        inbox.push(&bytes[2..]);
        assert_eq!(
            inbox.next_message().unwrap(),
            Some(("REWARD".to_string(), Payload::Float(1.5)))
        );
    }

    #[test]
    fn message_without_tag_is_invalid() {
        let mut inbox = Inbox::new(Framing::Raw);
        inbox.push(br#"{"payload":1}"#);
        let err = inbox.next_message().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
