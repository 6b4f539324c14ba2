//! Blocking request/reply client.
//!
//! [`ProtocolClient`] owns one connection and performs strict half-duplex
//! round trips: encode, write, then exactly one framed read and decode. The
//! call does not return until the reply has been consumed, and every method
//! that touches the wire takes `&mut self`. Two requests can therefore never
//! be outstanding on the same connection, and no lock is needed.
//!
//! There is no timeout unless one is configured: a call blocks for as long as
//! the peer stays silent.

use std::io::{Read, Write};
use std::net::TcpStream;

use sockenv_core::config::{ClientConfig, Framing};
use sockenv_core::error::ClientError;
use sockenv_core::types::{Payload, Verbosity};
use tracing::{debug, info, warn};

use crate::codec::{Codec, JsonCodec};
use crate::framing::{read_frame, write_frame};
use crate::protocol::{Message, MessageKind};
use crate::state_machine::{ConnectionState, ConnectionStateMachine};

// ---------------------------------------------------------------------------
// ClientOptions
// ---------------------------------------------------------------------------

/// Per-connection settings taken from a [`ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Receive allocation in bytes; the most a single reply can occupy.
    pub recv_capacity: usize,
    pub verbosity: Verbosity,
    pub framing: Framing,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for ClientOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            recv_capacity: config.buffer_size,
            verbosity: config.verbosity,
            framing: config.framing,
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolClient
// ---------------------------------------------------------------------------

/// Client side of one peer connection.
///
/// Dropping a client that is still connected sends the one-way `CLOSE`
/// notification, exactly like [`close`](Self::close).
pub struct ProtocolClient<S = TcpStream, C = JsonCodec>
where
    S: Read + Write,
    C: Codec,
{
    stream: S,
    codec: C,
    sm: ConnectionStateMachine,
    recv_buf: Vec<u8>,
    options: ClientOptions,
    peer: String,
}

impl ProtocolClient<TcpStream, JsonCodec> {
    /// Connect to the peer described by `config`.
    ///
    /// This is the only place a connection failure is fatal; it is reported
    /// as [`ClientError::Connection`] and never retried.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let addr = config.address();

        let stream = TcpStream::connect(&addr).map_err(|source| ClientError::Connection {
            addr: addr.clone(),
            source,
        })?;
        stream
            .set_read_timeout(config.read_timeout())
            .map_err(|source| ClientError::Connection {
                addr: addr.clone(),
                source,
            })?;

        if config.verbosity.lifecycle() {
            info!(
                "connected to {addr} (protocol v{})",
                config.framing.protocol_version()
            );
        }

        Ok(Self::from_stream(stream, JsonCodec, ClientOptions::from(config)).with_peer(addr))
    }
}

impl<S, C> ProtocolClient<S, C>
where
    S: Read + Write,
    C: Codec,
{
    /// Wrap a stream that is already connected to a peer.
    pub fn from_stream(stream: S, codec: C, options: ClientOptions) -> Self {
        let mut sm = ConnectionStateMachine::new();
        sm.on_connected();
        Self {
            stream,
            codec,
            sm,
            recv_buf: vec![0; options.recv_capacity.max(1)],
            options,
            peer: "stream".to_string(),
        }
    }

    /// Builder: label used for the peer in log messages.
    #[must_use]
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// Send `(kind, payload)` and block until the reply is decoded.
    ///
    /// With [`Framing::Raw`] the reply is a single read of at most the
    /// receive capacity. A larger reply is truncated without any error being
    /// raised here; decoding the partial bytes usually fails with
    /// [`ClientError::Encoding`] but may also yield a wrong message. Use
    /// [`Framing::LengthPrefixed`] (protocol v2) to turn this into an error.
    ///
    /// If the write, the read or the decode fails (including a read timeout),
    /// the connection becomes [`ConnectionState::Broken`]: a late or partial
    /// reply may still be in flight, so every later request fails with
    /// [`ClientError::Closed`] instead of returning someone else's reply.
    ///
    /// [`MessageKind::Close`] is never answered, so for that kind the message
    /// is only sent and echoed back as the result.
    pub fn request(&mut self, kind: MessageKind, payload: Payload) -> Result<Message, ClientError> {
        if !kind.expects_reply() {
            let message = Message::new(kind, payload);
            self.send_message(&message)?;
            return Ok(message);
        }

        self.send_message(&Message::new(kind, payload))?;

        let reply = self.receive();
        if reply.is_err() {
            self.sm.on_failure();
        }
        let reply = reply?;
        if self.options.verbosity.payloads() {
            debug!(peer = %self.peer, tag = %reply.tag, payload = ?reply.payload, "recv");
        }
        Ok(reply)
    }

    /// One-way send: encode and write, without reading a reply.
    pub fn send(&mut self, kind: MessageKind, payload: Payload) -> Result<(), ClientError> {
        self.send_message(&Message::new(kind, payload))
    }

    /// Send the one-way `CLOSE` notification and enter the `Closed` state.
    ///
    /// Does nothing if the connection is already closed. A broken connection
    /// still gets a best-effort `CLOSE`. Failures while sending are logged
    /// and suppressed.
    pub fn close(&mut self) {
        if !self.sm.close() {
            return;
        }
        if let Err(e) = self.write_message(&Message::flag(MessageKind::Close)) {
            warn!(peer = %self.peer, "failed to send CLOSE: {e}");
        }
        if self.options.verbosity.lifecycle() {
            info!("closed connection to {}", self.peer);
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.sm.state()
    }

    pub const fn is_connected(&self) -> bool {
        self.sm.state().is_connected()
    }

    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub const fn verbosity(&self) -> Verbosity {
        self.options.verbosity
    }

    /// Peer label: `host:port` for TCP clients.
    pub fn peer_addr(&self) -> &str {
        &self.peer
    }

    /// The underlying stream.
    pub const fn stream(&self) -> &S {
        &self.stream
    }

    fn send_message(&mut self, message: &Message) -> Result<(), ClientError> {
        self.sm.on_request(message.tag)?;
        self.write_message(message)
    }

    fn write_message(&mut self, message: &Message) -> Result<(), ClientError> {
        let bytes = self.codec.encode(message)?;
        if self.options.verbosity.payloads() {
            debug!(peer = %self.peer, tag = %message.tag, payload = ?message.payload, "send");
        }
        let written = write_frame(&mut self.stream, self.options.framing, &bytes);
        if written.is_err() {
            self.sm.on_failure();
        }
        written
    }

    fn receive(&mut self) -> Result<Message, ClientError> {
        let bytes = read_frame(&mut self.stream, self.options.framing, &mut self.recv_buf)?;
        Ok(self.codec.decode(bytes)?)
    }
}

impl<S, C> Drop for ProtocolClient<S, C>
where
    S: Read + Write,
    C: Codec,
{
    fn drop(&mut self) {
        self.close();
    }
}

impl<S, C> std::fmt::Debug for ProtocolClient<S, C>
where
    S: Read + Write,
    C: Codec,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("peer", &self.peer)
            .field("state", &self.sm.state())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
