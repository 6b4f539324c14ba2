//! Shared test fixtures for sockenv crates.
//!
//! Provides a scripted peer that speaks the tag/payload protocol, both as an
//! in-memory stream and as a loopback TCP server, plus a recording action
//! sink and a static environment description.

pub mod description;
pub mod peer;
pub mod responder;
pub mod sinks;
pub mod stream;
pub mod wire;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use description::test_description;
pub use peer::{PeerHandle, spawn_peer};
pub use responder::{CountingEnv, Reply, Responder};
pub use sinks::RecordingSink;
pub use stream::ScriptedStream;
