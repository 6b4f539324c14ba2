//! Loopback TCP peer.
//!
//! [`spawn_peer`] binds `127.0.0.1:0`, accepts exactly one connection on a
//! background thread, and serves it with a [`Responder`] until the client
//! sends `CLOSE`, hangs up, or the responder hangs up.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use sockenv_core::config::Framing;
use sockenv_core::types::Payload;

use crate::responder::{Conversation, Outgoing, Responder};

/// Handle to a running peer thread.
#[derive(Debug)]
pub struct PeerHandle {
    addr: SocketAddr,
    handle: JoinHandle<Vec<(String, Payload)>>,
}

impl PeerHandle {
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the connection to end and return the tags received.
    pub fn join(self) -> Vec<String> {
        self.join_messages()
            .into_iter()
            .map(|(tag, _)| tag)
            .collect()
    }

    /// Wait for the connection to end and return every message received.
    pub fn join_messages(self) -> Vec<(String, Payload)> {
        self.handle.join().expect("peer thread panicked")
    }
}

/// Start a peer on an ephemeral loopback port.
pub fn spawn_peer(framing: Framing, responder: impl Responder + 'static) -> PeerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return Vec::new();
        };
        serve(stream, Conversation::new(framing, Box::new(responder)))
    });
    PeerHandle { addr, handle }
}

fn serve(mut stream: TcpStream, mut conversation: Conversation) -> Vec<(String, Payload)> {
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let Ok(actions) = conversation.feed(&buf[..n]) else {
            break;
        };
        for action in actions {
            match action {
                Outgoing::Bytes(bytes) => {
                    if stream.write_all(&bytes).is_err() {
                        return conversation.into_received();
                    }
                }
                Outgoing::Stall(duration) => thread::sleep(duration),
                Outgoing::Late(duration, bytes) => {
                    thread::sleep(duration);
                    if stream.write_all(&bytes).is_err() {
                        return conversation.into_received();
                    }
                }
                Outgoing::Hangup | Outgoing::Closed => return conversation.into_received(),
            }
        }
    }
    conversation.into_received()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::CountingEnv;
    use crate::wire::{Inbox, encode};

    #[test]
    fn peer_answers_over_tcp() {
        let peer = spawn_peer(Framing::LengthPrefixed, CountingEnv::new(3));
        let mut stream = TcpStream::connect(peer.addr()).unwrap();

        stream
            .write_all(&encode(Framing::LengthPrefixed, "REWARD", &Payload::FLAG))
            .unwrap();
        let mut inbox = Inbox::new(Framing::LengthPrefixed);
        let mut buf = [0u8; 256];
        let reply = loop {
            let n = stream.read(&mut buf).unwrap();
            inbox.push(&buf[..n]);
            if let Some(message) = inbox.next_message().unwrap() {
                break message;
            }
        };
        assert_eq!(reply, ("REWARD".to_string(), Payload::Float(1.0)));

        stream
            .write_all(&encode(Framing::LengthPrefixed, "CLOSE", &Payload::FLAG))
            .unwrap();
        assert_eq!(peer.join(), vec!["REWARD", "CLOSE"]);
    }
}
