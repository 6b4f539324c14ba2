use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Verbosity;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_port() -> u16 {
    12230
}
const fn default_verbosity() -> Verbosity {
    Verbosity::LIFECYCLE
}
const fn default_buffer_size() -> usize {
    262_144
}
const fn default_frequency() -> u32 {
    1
}
const fn default_history_length() -> usize {
    20
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// How replies are delimited on the byte stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Protocol v1. Encoded messages go on the wire unframed and each reply
    /// is taken from a single read of at most `buffer_size` bytes.
    ///
    /// A reply larger than `buffer_size` is truncated without any error being
    /// signalled; decoding the partial bytes gives an undefined result.
    #[default]
    Raw,
    /// Protocol v2. Every message carries a 4-byte little-endian `u32` length
    /// prefix. Not wire compatible with v1 peers.
    LengthPrefixed,
}

impl Framing {
    /// Protocol version number advertised for this framing.
    pub const fn protocol_version(self) -> u32 {
        match self {
            Self::Raw => 1,
            Self::LengthPrefixed => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Action-history tracking: ring buffer length and sink throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Emit a snapshot to the sink once every `frequency` steps (default: 1).
    #[serde(default = "default_frequency")]
    pub frequency: u32,

    /// Ring buffer capacity, in actions (default: 20).
    #[serde(default = "default_history_length")]
    pub length: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            length: default_history_length(),
        }
    }
}

impl HistoryConfig {
    pub const fn new(frequency: u32, length: usize) -> Self {
        Self { frequency, length }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.frequency".into(),
                message: "must be > 0".into(),
            });
        }
        if self.length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.length".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Connection parameters for a remote environment client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Peer host. When unset the local machine name is used.
    #[serde(default)]
    pub host: Option<String>,

    /// Peer port (default: 12230).
    #[serde(default = "default_port")]
    pub port: u16,

    /// 0 = silent, 1 = connection/lifecycle logging, >= 2 = per-call payloads.
    #[serde(default = "default_verbosity")]
    pub verbosity: Verbosity,

    /// Receive allocation in bytes (default: 262144).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Optional read timeout. Unset means a call blocks until the peer replies.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    #[serde(default)]
    pub framing: Framing,

    /// Action-history tracking; disabled when absent.
    #[serde(default)]
    pub history: Option<HistoryConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            verbosity: default_verbosity(),
            buffer_size: default_buffer_size(),
            read_timeout_ms: None,
            framing: Framing::default(),
            history: None,
        }
    }
}

impl ClientConfig {
    /// Config for `host:port` with every other field at its default.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port,
            ..Self::default()
        }
    }

    /// Builder: set verbosity.
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Builder: set the receive allocation.
    #[must_use]
    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Builder: set the framing.
    #[must_use]
    pub const fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Builder: enable action-history tracking.
    #[must_use]
    pub const fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = Some(history);
        self
    }

    /// Builder: set a read timeout in milliseconds.
    #[must_use]
    pub const fn with_read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = Some(ms);
        self
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".into(),
                message: "must be > 0".into(),
            });
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "buffer_size".into(),
                message: "must be > 0".into(),
            });
        }
        if self.read_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "read_timeout_ms".into(),
                message: "must be > 0 when set".into(),
            });
        }
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                field: "host".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(history) = &self.history {
            history.validate()?;
        }
        Ok(())
    }

    /// Host to connect to: the configured one, else the local machine name.
    pub fn resolved_host(&self) -> String {
        self.host.clone().unwrap_or_else(local_hostname)
    }

    /// `host:port` string used for connecting and in log messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.resolved_host(), self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Name of the local machine as reported by the OS, or `localhost` if it is
/// empty or not valid UTF-8.
fn local_hostname() -> String {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // ---- defaults ----

    #[test]
    fn client_config_default_values() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.host, None);
        assert_eq!(cfg.port, 12230);
        assert_eq!(cfg.verbosity, Verbosity::LIFECYCLE);
        assert_eq!(cfg.buffer_size, 262_144);
        assert_eq!(cfg.read_timeout_ms, None);
        assert_eq!(cfg.framing, Framing::Raw);
        assert!(cfg.history.is_none());
    }

    #[test]
    fn history_config_default_values() {
        let cfg = HistoryConfig::default();
        assert_eq!(cfg.frequency, 1);
        assert_eq!(cfg.length, 20);
    }

    #[test]
    fn framing_protocol_versions() {
        assert_eq!(Framing::Raw.protocol_version(), 1);
        assert_eq!(Framing::LengthPrefixed.protocol_version(), 2);
    }

    // ---- validate ----

    #[test]
    fn validate_ok() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_port() {
        let cfg = ClientConfig {
            port: 0,
            ..ClientConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "port"));
    }

    #[test]
    fn validate_rejects_zero_buffer_size() {
        let cfg = ClientConfig::default().with_buffer_size(0);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "buffer_size"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = ClientConfig::default().with_read_timeout_ms(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_host() {
        let cfg = ClientConfig::new("  ", 9000);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_history_frequency() {
        let cfg = ClientConfig::default().with_history(HistoryConfig::new(0, 20));
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "history.frequency")
        );
    }

    #[test]
    fn validate_rejects_zero_history_length() {
        let cfg = ClientConfig::default().with_history(HistoryConfig::new(1, 0));
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "history.length")
        );
    }

    // ---- host resolution ----

    #[test]
    fn explicit_host_is_used() {
        let cfg = ClientConfig::new("peer.local", 4000);
        assert_eq!(cfg.resolved_host(), "peer.local");
        assert_eq!(cfg.address(), "peer.local:4000");
    }

    #[test]
    fn unset_host_resolves_to_machine_name() {
        let machine = gethostname::gethostname();
        let expected = machine
            .to_str()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("localhost");
        let cfg = ClientConfig::default();
        assert_eq!(cfg.resolved_host(), expected);
        assert_eq!(cfg.address(), format!("{expected}:12230"));
    }

    #[test]
    fn configured_host_wins_over_machine_name() {
        let cfg = ClientConfig::new("sim-box", 9000);
        assert_eq!(cfg.resolved_host(), "sim-box");
    }

    #[test]
    fn read_timeout_conversion() {
        let cfg = ClientConfig::default().with_read_timeout_ms(250);
        assert_eq!(cfg.read_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(ClientConfig::default().read_timeout(), None);
    }

    // ---- TOML ----

    #[test]
    fn parse_minimal_toml_uses_defaults() {
        let cfg = ClientConfig::from_toml_str("port = 9000").unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.buffer_size, 262_144);
        assert_eq!(cfg.framing, Framing::Raw);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
            host = "127.0.0.1"
            port = 9001
            verbosity = 2
            buffer_size = 4096
            read_timeout_ms = 500
            framing = "length_prefixed"

            [history]
            frequency = 5
            length = 50
        "#;
        let cfg = ClientConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.verbosity, Verbosity::PAYLOADS);
        assert_eq!(cfg.buffer_size, 4096);
        assert_eq!(cfg.read_timeout_ms, Some(500));
        assert_eq!(cfg.framing, Framing::LengthPrefixed);
        assert_eq!(cfg.history, Some(HistoryConfig::new(5, 50)));
    }

    #[test]
    fn parse_history_table_defaults() {
        let cfg = ClientConfig::from_toml_str("[history]").unwrap();
        assert_eq!(cfg.history, Some(HistoryConfig::default()));
    }

    #[test]
    fn parse_invalid_toml_is_error() {
        let err = ClientConfig::from_toml_str("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn parse_runs_validation() {
        let err = ClientConfig::from_toml_str("buffer_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let cfg = ClientConfig::new("10.0.0.2", 7000)
            .with_framing(Framing::LengthPrefixed)
            .with_history(HistoryConfig::new(3, 8));
        let text = cfg.to_toml_string().unwrap();
        let cfg2 = ClientConfig::from_toml_str(&text).unwrap();
        assert_eq!(cfg, cfg2);
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8123\nverbosity = 0").unwrap();
        let cfg = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.port, 8123);
        assert_eq!(cfg.verbosity, Verbosity::SILENT);
    }

    #[test]
    fn from_missing_file_is_io_error() {
        let err = ClientConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
