//! Connection phase tracking.

use crate::error::ProtocolError;
use crate::message::{Message, MessageKind, HANDSHAKE_LOGIN, HANDSHAKE_STATUS};
use crate::state::{ConnectionState, Direction};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Tracks the current [`ConnectionState`] and gates messages against it.
///
/// Shared between the receive path and the tick thread.
#[derive(Debug)]
pub struct ConnectionStateMachine {
    state: Mutex<ConnectionState>,
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateMachine {
    /// Start disconnected.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: &mut ConnectionState, to: ConnectionState) {
        if *from != to {
            info!(from = %from, to = %to, "connection state changed");
            *from = to;
        }
    }

    /// A transport was attached: `Disconnected` moves to `Handshake`.
    pub fn connect(&self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != ConnectionState::Disconnected {
            return Err(ProtocolError::IllegalStateTransition {
                state: *state,
                kind: MessageKind::Handshake,
            });
        }
        self.transition(&mut state, ConnectionState::Handshake);
        Ok(())
    }

    /// Fail unless the client may send `kind` now.
    pub fn check_outgoing(&self, kind: MessageKind) -> Result<(), ProtocolError> {
        self.check(kind, Direction::Serverbound)
    }

    /// Fail unless the server may send `kind` now.
    pub fn check_incoming(&self, kind: MessageKind) -> Result<(), ProtocolError> {
        self.check(kind, Direction::Clientbound)
    }

    fn check(&self, kind: MessageKind, direction: Direction) -> Result<(), ProtocolError> {
        let state = self.state();
        if kind.direction() != direction || kind.state() != state {
            return Err(ProtocolError::IllegalStateTransition { state, kind });
        }
        Ok(())
    }

    /// Apply the transition caused by sending `message`.
    pub fn on_sent(&self, message: &Message) {
        let Message::Handshake(handshake) = message else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != ConnectionState::Handshake {
            return;
        }
        match handshake.next_state {
            HANDSHAKE_STATUS => self.transition(&mut state, ConnectionState::Status),
            HANDSHAKE_LOGIN => self.transition(&mut state, ConnectionState::Login),
            _ => {}
        }
    }

    /// Apply the transition caused by receiving `message`.
    pub fn on_received(&self, message: &Message) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match (message, *state) {
            (Message::LoginSuccess(_), ConnectionState::Login) => {
                self.transition(&mut state, ConnectionState::Play)
            }
            (Message::LoginDisconnect(_), ConnectionState::Login)
            | (Message::PlayDisconnect(_), ConnectionState::Play) => {
                self.transition(&mut state, ConnectionState::Disconnected)
            }
            _ => {}
        }
    }

    /// Move to `Disconnected`. Returns whether the state changed.
    pub fn disconnect(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == ConnectionState::Disconnected {
            return false;
        }
        self.transition(&mut state, ConnectionState::Disconnected);
        true
    }
}
