//! Connection phases and packet directions.

use serde::Serialize;
use std::fmt;

/// Protocol phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConnectionState {
    /// No connection, or the connection was torn down.
    Disconnected,
    /// Waiting for the client's handshake.
    Handshake,
    /// Server list ping.
    Status,
    /// Login sequence.
    Login,
    /// In game.
    Play,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Handshake => "handshake",
            ConnectionState::Status => "status",
            ConnectionState::Login => "login",
            ConnectionState::Play => "play",
        };
        f.write_str(name)
    }
}

/// Which side sends a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    /// Server to client.
    Clientbound,
    /// Client to server.
    Serverbound,
}
