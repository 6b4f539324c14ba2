//! Socket client for environments whose dynamics run in a remote peer.
//!
//! - [`protocol`] — closed set of [`MessageKind`] tags and the [`Message`] pair
//! - [`codec`] — [`Codec`] boundary and the JSON [`JsonCodec`]
//! - [`framing`] — raw (v1) and length-prefixed (v2) stream framing
//! - [`state_machine`] — [`ConnectionStateMachine`] rejecting traffic once closed
//! - [`client`] — blocking half-duplex [`ProtocolClient`]
//! - [`env`](mod@env) — [`RemoteEnvironment`], the `reset`/`execute` orchestrator
//!
//! Every request is answered by exactly one reply except `CLOSE`, which is
//! one-way. Use [`RemoteEnvironment::scoped`] or [`with_environment`] so the
//! peer is always told when the client goes away.

pub mod client;
pub mod codec;
pub mod env;
pub mod framing;
pub mod protocol;
pub mod state_machine;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{ClientOptions, ProtocolClient};
pub use codec::{Codec, JsonCodec};
pub use env::{RemoteEnvironment, StepOutcome, with_environment};
pub use protocol::{Message, MessageKind, UnknownTag};
pub use state_machine::{ConnectionState, ConnectionStateMachine};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ClientOptions, Codec, ConnectionState, JsonCodec, Message, MessageKind, ProtocolClient,
        RemoteEnvironment, StepOutcome, with_environment,
    };
    pub use sockenv_core::prelude::*;
}
