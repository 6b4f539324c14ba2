//! Scripted peer behaviour.
//!
//! A [`Responder`] decides how the peer answers each request. Closures
//! `FnMut(&str, &Payload) -> Reply` are responders, and [`CountingEnv`] is a
//! small deterministic environment used as the default.

use std::io;
use std::time::Duration;

use sockenv_core::config::Framing;
use sockenv_core::types::Payload;

use crate::wire::{Inbox, encode};

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// What the peer does in answer to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Answer with the request's tag and this payload.
    Send(Payload),
    /// Answer with a different tag.
    SendTagged(String, Payload),
    /// Write these bytes verbatim, without framing.
    Raw(Vec<u8>),
    /// Close the connection without answering.
    Hangup,
    /// Answer nothing for this long.
    Stall(Duration),
    /// Answer with this payload, but only after waiting this long.
    Late(Duration, Payload),
}

/// Answers requests on behalf of a scripted peer.
pub trait Responder: Send {
    fn respond(&mut self, tag: &str, payload: &Payload) -> Reply;
}

impl<F> Responder for F
where
    F: FnMut(&str, &Payload) -> Reply + Send,
{
    fn respond(&mut self, tag: &str, payload: &Payload) -> Reply {
        self(tag, payload)
    }
}

// ---------------------------------------------------------------------------
// CountingEnv
// ---------------------------------------------------------------------------

/// Deterministic environment: the state is `[step, step / 2]`, every step is
/// worth a reward of `1.0`, and the episode is terminal once `horizon` steps
/// have been taken.
#[derive(Debug, Clone)]
pub struct CountingEnv {
    horizon: u64,
    step: u64,
}

impl CountingEnv {
    pub const fn new(horizon: u64) -> Self {
        Self { horizon, step: 0 }
    }

    pub const fn step(&self) -> u64 {
        self.step
    }
}

impl Responder for CountingEnv {
    #[allow(clippy::cast_precision_loss)]
    fn respond(&mut self, tag: &str, payload: &Payload) -> Reply {
        match tag {
            "RESET" => {
                self.step = 0;
                Reply::Send(Payload::FLAG)
            }
            "STATE" => {
                let step = self.step as f64;
                Reply::Send(Payload::Array(vec![step, step * 0.5]))
            }
            "CONTROL" => Reply::Send(payload.clone()),
            "EVOLVE" => {
                self.step += 1;
                Reply::Send(Payload::FLAG)
            }
            "TERMINAL" => Reply::Send(Payload::Bool(self.step >= self.horizon)),
            "REWARD" => Reply::Send(Payload::Float(1.0)),
            _ => Reply::Hangup,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Something the peer should do after receiving bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Bytes(Vec<u8>),
    Hangup,
    Stall(Duration),
    /// Wait, then write the bytes.
    Late(Duration, Vec<u8>),
    /// The client sent `CLOSE`.
    Closed,
}

/// Peer-side state of one connection: parses incoming bytes, records every
/// message, and asks the responder for answers. `CLOSE` is never answered.
pub struct Conversation {
    framing: Framing,
    inbox: Inbox,
    responder: Box<dyn Responder>,
    received: Vec<(String, Payload)>,
}

impl Conversation {
    pub fn new(framing: Framing, responder: Box<dyn Responder>) -> Self {
        Self {
            framing,
            inbox: Inbox::new(framing),
            responder,
            received: Vec::new(),
        }
    }

    /// Feed bytes written by the client.
    pub fn feed(&mut self, bytes: &[u8]) -> io::Result<Vec<Outgoing>> {
        self.inbox.push(bytes);
        let mut out = Vec::new();
        while let Some((tag, payload)) = self.inbox.next_message()? {
            let action = if tag == "CLOSE" {
                Outgoing::Closed
            } else {
                match self.responder.respond(&tag, &payload) {
                    Reply::Send(p) => Outgoing::Bytes(encode(self.framing, &tag, &p)),
                    Reply::SendTagged(t, p) => Outgoing::Bytes(encode(self.framing, &t, &p)),
                    Reply::Raw(bytes) => Outgoing::Bytes(bytes),
                    Reply::Hangup => Outgoing::Hangup,
                    Reply::Stall(d) => Outgoing::Stall(d),
                    Reply::Late(d, p) => Outgoing::Late(d, encode(self.framing, &tag, &p)),
                }
            };
            self.received.push((tag, payload));
            out.push(action);
        }
        Ok(out)
    }

    /// Every message received so far, in order.
    pub fn received(&self) -> &[(String, Payload)] {
        &self.received
    }

    pub fn into_received(self) -> Vec<(String, Payload)> {
        self.received
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
