//! Message vocabulary of the remote environment protocol.
//!
//! Every exchange is a single [`Message`]: a [`MessageKind`] tag plus a
//! [`Payload`]. The client sends one message per logical request and, except
//! for [`MessageKind::Close`], waits for exactly one message in reply.
//!
//! The tags are fixed, case-sensitive identifiers on the wire:
//! `RESET, STATE, CONTROL, EVOLVE, TERMINAL, REWARD, CLOSE`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use sockenv_core::types::Payload;

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// Request kinds understood by the peer.
///
/// # Example
///
/// ```
/// use sockenv_client::protocol::MessageKind;
///
/// let kind: MessageKind = "EVOLVE".parse().unwrap();
/// assert_eq!(kind, MessageKind::Evolve);
/// assert_eq!(kind.as_str(), "EVOLVE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Start a new episode.
    Reset,
    /// Query the current state.
    State,
    /// Apply a control action.
    Control,
    /// Advance the simulation by one step.
    Evolve,
    /// Query whether the episode has ended.
    Terminal,
    /// Query the reward of the last step.
    Reward,
    /// Shutdown notification. Never answered.
    Close,
}

impl MessageKind {
    pub const ALL: [Self; 7] = [
        Self::Reset,
        Self::State,
        Self::Control,
        Self::Evolve,
        Self::Terminal,
        Self::Reward,
        Self::Close,
    ];

    /// Wire identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::State => "STATE",
            Self::Control => "CONTROL",
            Self::Evolve => "EVOLVE",
            Self::Terminal => "TERMINAL",
            Self::Reward => "REWARD",
            Self::Close => "CLOSE",
        }
    }

    /// Whether the peer answers this kind of message.
    pub const fn expects_reply(self) -> bool {
        !matches!(self, Self::Close)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message tag: {0:?}")]
pub struct UnknownTag(pub String);

impl FromStr for MessageKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One tagged protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub tag: MessageKind,
    pub payload: Payload,
}

impl Message {
    pub fn new(tag: MessageKind, payload: impl Into<Payload>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// A request that carries only the scalar flag `1`.
    pub const fn flag(tag: MessageKind) -> Self {
        Self {
            tag,
            payload: Payload::FLAG,
        }
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
