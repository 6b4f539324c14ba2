//! Byte-level codec boundary.
//!
//! A [`Codec`] turns a [`Message`] into bytes and back. It is trusted to be
//! symmetric: `decode(encode(m)) == m`. Framing (how many bytes make up one
//! message on the stream) is handled separately in [`crate::framing`].

use sockenv_core::error::EncodingError;

use crate::protocol::Message;

/// Serialises protocol messages.
pub trait Codec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, EncodingError>;

    fn decode(&self, bytes: &[u8]) -> Result<Message, EncodingError>;
}

/// JSON codec: `{"tag":"STATE","payload":1}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, EncodingError> {
        Ok(serde_json::to_vec(message)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Message, EncodingError> {
        if bytes.is_empty() {
            return Err(EncodingError::EmptyMessage);
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use sockenv_core::types::Payload;

    use super::*;
    use crate::protocol::MessageKind;

    #[test]
    fn json_codec_is_symmetric_for_every_payload_kind() {
        let messages = [
            Message::flag(MessageKind::Reset),
            Message::new(MessageKind::State, vec![0.1, 0.2, 0.3]),
            Message::new(MessageKind::Terminal, true),
            Message::new(MessageKind::Reward, -1.5),
        ];
        for msg in messages {
            let bytes = JsonCodec.encode(&msg).unwrap();
            assert_eq!(JsonCodec.decode(&bytes).unwrap(), msg);
        }
    }

    #[test]
    fn nested_state_decodes_and_round_trips() {
        let msg = JsonCodec
            .decode(br#"{"tag":"STATE","payload":[[1,2],[3,4]]}"#)
            .unwrap();
        assert_eq!(msg.tag, MessageKind::State);
        assert_eq!(
            msg.payload,
            Payload::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        );

        let bytes = JsonCodec.encode(&msg).unwrap();
        assert_eq!(bytes, br#"{"tag":"STATE","payload":[[1.0,2.0],[3.0,4.0]]}"#);
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn decode_empty_is_error() {
        let err = JsonCodec.decode(&[]).unwrap_err();
        assert!(matches!(err, EncodingError::EmptyMessage));
    }

    #[test]
    fn decode_garbage_is_json_error() {
        let err = JsonCodec.decode(b"not json at all").unwrap_err();
        assert!(matches!(err, EncodingError::Json(_)));
    }

    #[test]
    fn decode_unknown_tag_is_json_error() {
        let err = JsonCodec
            .decode(br#"{"tag":"JUMP","payload":1}"#)
            .unwrap_err();
        assert!(matches!(err, EncodingError::Json(_)));
    }

    #[test]
    fn decode_truncated_message_is_error() {
        let bytes = JsonCodec
            .encode(&Message::new(MessageKind::State, vec![1.0; 8]))
            .unwrap();
        let err = JsonCodec.decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, EncodingError::Json(_)));
    }

    #[test]
    fn non_finite_payload_encodes_as_null_and_fails_to_decode() {
        let bytes = JsonCodec
            .encode(&Message::new(MessageKind::Reward, f64::NAN))
            .unwrap();
        assert_eq!(bytes, br#"{"tag":"REWARD","payload":null}"#);
        assert!(JsonCodec.decode(&bytes).is_err());
    }
}
