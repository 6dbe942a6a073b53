//! Client error type.

use craftbot_protocol::{DispatchError, ProtocolError};
use std::io;
use thiserror::Error;

/// Errors surfaced by the client session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Codec, table or state-machine failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Dispatch failure.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The window is not open.
    #[error("window {0} is not open")]
    UnknownWindow(u8),

    /// The window's next transaction id still waits for an acknowledgement.
    #[error("transaction id {transaction_id} of window {window_id} is still pending")]
    TransactionIdsExhausted {
        /// Window the click targeted.
        window_id: u8,
        /// Id the counter would have handed out.
        transaction_id: i16,
    },

    /// No transport is attached, or the session is over.
    #[error("not connected")]
    NotConnected,

    /// The transport failed to write.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The configuration cannot be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
