use thiserror::Error;

/// Top-level error type for client operations.
///
/// Every variant propagates synchronously to the caller of the call that
/// triggered it. Nothing in sockenv retries or reconnects.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The initial connect failed. Only raised while constructing a client.
    #[error("Connection error: could not connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A write or read on an established connection failed.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The connection (or the environment owning it) was already closed.
    #[error("Connection is closed")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

/// Codec and framing errors.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty message")]
    EmptyMessage,

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Ring buffer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Invalid capacity: {0} (must be > 0)")]
    InvalidCapacity(usize),

    #[error("Invalid element shape: {0:?} (dimensions must be non-empty and > 0)")]
    InvalidShape(Vec<usize>),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_from_io_is_transport() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ClientError = io_err.into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn client_error_from_encoding_error() {
        let err: ClientError = EncodingError::EmptyMessage.into();
        assert!(matches!(err, ClientError::Encoding(_)));
    }

    #[test]
    fn client_error_from_config_error() {
        let err = ConfigError::InvalidValue {
            field: "port".into(),
            message: "must be > 0".into(),
        };
        let err: ClientError = err.into();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn client_error_from_buffer_error() {
        let err: ClientError = BufferError::InvalidCapacity(0).into();
        assert!(matches!(err, ClientError::Buffer(_)));
    }

    #[test]
    fn connection_error_names_address() {
        let err = ClientError::Connection {
            addr: "localhost:12230".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(
            err.to_string(),
            "Connection error: could not connect to localhost:12230: refused"
        );
    }

    #[test]
    fn buffer_error_display_messages() {
        assert_eq!(
            BufferError::ShapeMismatch {
                expected: vec![2],
                got: vec![3]
            }
            .to_string(),
            "Shape mismatch: expected [2], got [3]"
        );
        assert_eq!(
            BufferError::InvalidCapacity(0).to_string(),
            "Invalid capacity: 0 (must be > 0)"
        );
        assert_eq!(
            BufferError::InvalidShape(vec![2, 0]).to_string(),
            "Invalid element shape: [2, 0] (dimensions must be non-empty and > 0)"
        );
    }

    #[test]
    fn encoding_error_display_messages() {
        assert_eq!(EncodingError::EmptyMessage.to_string(), "Empty message");
        assert_eq!(
            EncodingError::PayloadTooLarge { size: 10, max: 4 }.to_string(),
            "Payload too large: 10 bytes (max 4)"
        );
    }

    #[test]
    fn closed_display_message() {
        assert_eq!(ClientError::Closed.to_string(), "Connection is closed");
    }
}
