//! Connection state machine.
//!
//! [`ConnectionStateMachine`] tracks the [`ConnectionState`] of a client and
//! validates that a message may be sent in the current state.
//!
//! ```text
//! Disconnected --connect--> Connected --CLOSE--> Closed
//!                               |                  ^
//!                         I/O failure            CLOSE
//!                               v                  |
//!                             Broken --------------+
//! ```
//!
//! `Broken` means a request was written but its reply was not cleanly
//! consumed, so the stream may be out of step. Only `CLOSE` may still be
//! attempted. `Closed` is terminal.

use sockenv_core::error::ClientError;

use crate::protocol::MessageKind;

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Broken,
    Closed,
}

impl ConnectionState {
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// `Connected` or `Broken`: the peer has not been told to close yet.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Connected | Self::Broken)
    }
}

/// Tracks connection state and rejects messages once closed.
///
/// # Example
///
/// ```
/// use sockenv_client::state_machine::{ConnectionState, ConnectionStateMachine};
///
/// let mut sm = ConnectionStateMachine::new();
/// assert_eq!(sm.state(), ConnectionState::Disconnected);
/// sm.on_connected();
/// assert_eq!(sm.state(), ConnectionState::Connected);
/// ```
#[derive(Debug, Default)]
pub struct ConnectionStateMachine {
    state: ConnectionState,
}

impl ConnectionStateMachine {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// The stream is established. Only valid from `Disconnected`; later
    /// calls are ignored.
    pub const fn on_connected(&mut self) {
        if matches!(self.state, ConnectionState::Disconnected) {
            self.state = ConnectionState::Connected;
        }
    }

    /// Validate an outgoing message.
    ///
    /// Any kind may be sent while connected. Sending [`MessageKind::Close`]
    /// moves to `Closed`. Anything sent while not connected fails with
    /// [`ClientError::Closed`].
    pub fn on_request(&mut self, kind: MessageKind) -> Result<(), ClientError> {
        if !self.state.is_connected() {
            return Err(ClientError::Closed);
        }
        if matches!(kind, MessageKind::Close) {
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    /// A write, read or decode failed mid-exchange. Later requests fail
    /// with [`ClientError::Closed`].
    pub const fn on_failure(&mut self) {
        if matches!(self.state, ConnectionState::Connected) {
            self.state = ConnectionState::Broken;
        }
    }

    /// Force the terminal state. Returns `true` if the connection was open.
    pub const fn close(&mut self) -> bool {
        let was_open = self.state.is_open();
        self.state = ConnectionState::Closed;
        was_open
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> ConnectionStateMachine {
        let mut sm = ConnectionStateMachine::new();
        sm.on_connected();
        sm
    }

    #[test]
    fn new_starts_disconnected() {
        assert_eq!(
            ConnectionStateMachine::new().state(),
            ConnectionState::Disconnected
        );
        assert_eq!(
            ConnectionStateMachine::default().state(),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn disconnected_rejects_requests() {
        let mut sm = ConnectionStateMachine::new();
        let err = sm.on_request(MessageKind::Reset).unwrap_err();
        assert!(matches!(err, ClientError::Closed));
    }

    #[test]
    fn connected_accepts_every_kind() {
        for kind in MessageKind::ALL {
            let mut sm = connected();
            sm.on_request(kind).unwrap();
        }
    }

    #[test]
    fn non_close_requests_stay_connected() {
        let mut sm = connected();
        for kind in MessageKind::ALL.into_iter().filter(|k| k.expects_reply()) {
            sm.on_request(kind).unwrap();
        }
        assert_eq!(sm.state(), ConnectionState::Connected);
    }

    #[test]
    fn close_request_closes() {
        let mut sm = connected();
        sm.on_request(MessageKind::Close).unwrap();
        assert_eq!(sm.state(), ConnectionState::Closed);
    }

    #[test]
    fn closed_rejects_everything() {
        let mut sm = connected();
        sm.close();
        for kind in MessageKind::ALL {
            assert!(matches!(sm.on_request(kind), Err(ClientError::Closed)));
        }
    }

    #[test]
    fn closed_cannot_reconnect() {
        let mut sm = connected();
        sm.close();
        sm.on_connected();
        assert_eq!(sm.state(), ConnectionState::Closed);
    }

    #[test]
    fn failure_breaks_connection() {
        let mut sm = connected();
        sm.on_failure();
        assert_eq!(sm.state(), ConnectionState::Broken);
        assert!(sm.state().is_open());
        for kind in MessageKind::ALL {
            assert!(matches!(sm.on_request(kind), Err(ClientError::Closed)));
        }
    }

    #[test]
    fn broken_can_still_close() {
        let mut sm = connected();
        sm.on_failure();
        assert!(sm.close());
        assert_eq!(sm.state(), ConnectionState::Closed);
    }

    #[test]
    fn failure_after_close_stays_closed() {
        let mut sm = connected();
        sm.close();
        sm.on_failure();
        assert_eq!(sm.state(), ConnectionState::Closed);
    }

    #[test]
    fn close_reports_previous_state() {
        let mut sm = connected();
        assert!(sm.close());
        assert!(!sm.close());
    }
}
