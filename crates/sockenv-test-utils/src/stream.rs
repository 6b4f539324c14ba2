//! In-memory peer connection.
//!
//! [`ScriptedStream`] implements `Read + Write`. Bytes written to it are
//! parsed as requests and answered by a [`Responder`]; answers are queued and
//! handed out by subsequent reads. A stalled or late answer makes the next
//! read fail with `WouldBlock`, the way a socket read timeout does.
//!
//! Clones share the same connection, so a test can keep one clone to inspect
//! traffic after moving the other into a client.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sockenv_core::config::Framing;
use sockenv_core::types::Payload;

use crate::responder::{Conversation, Outgoing, Responder};

struct Shared {
    conversation: Conversation,
    outbound: VecDeque<u8>,
    hung_up: bool,
    stalled: bool,
    broken: bool,
    reads: usize,
}

/// Scripted in-memory peer.
#[derive(Clone)]
pub struct ScriptedStream {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedStream {
    pub fn new(framing: Framing, responder: impl Responder + 'static) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                conversation: Conversation::new(framing, Box::new(responder)),
                outbound: VecDeque::new(),
                hung_up: false,
                stalled: false,
                broken: false,
                reads: 0,
            })),
        }
    }

    /// Tags received so far, in order.
    pub fn tags(&self) -> Vec<String> {
        self.lock()
            .conversation
            .received()
            .iter()
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Messages received so far, in order.
    pub fn messages(&self) -> Vec<(String, Payload)> {
        self.lock().conversation.received().to_vec()
    }

    /// Number of `read` calls made on the stream.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    /// Make every later write fail with `BrokenPipe`.
    pub fn break_pipe(&self) {
        self.lock().broken = true;
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut shared = self.lock();
        shared.reads += 1;
        if shared.stalled {
            shared.stalled = false;
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "peer stalled"));
        }
        let n = buf.len().min(shared.outbound.len());
        for (dst, src) in buf.iter_mut().zip(shared.outbound.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut shared = self.lock();
        if shared.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
        }
        for action in shared.conversation.feed(buf)? {
            match action {
                Outgoing::Bytes(bytes) if !shared.hung_up => shared.outbound.extend(bytes),
                Outgoing::Hangup => shared.hung_up = true,
                Outgoing::Stall(_) => shared.stalled = true,
                Outgoing::Late(_, bytes) => {
                    shared.stalled = true;
                    if !shared.hung_up {
                        shared.outbound.extend(bytes);
                    }
                }
                Outgoing::Bytes(_) | Outgoing::Closed => {}
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for ScriptedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("ScriptedStream")
            .field("received", &shared.conversation.received().len())
            .field("outbound", &shared.outbound.len())
            .field("hung_up", &shared.hung_up)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
