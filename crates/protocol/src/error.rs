//! Codec and state-machine errors.

use crate::message::MessageKind;
use crate::state::{ConnectionState, Direction};
use thiserror::Error;

/// Errors raised while building tables, encoding, decoding or gating packets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The version (or the message kind within it) has no codec table entry.
    #[error("unsupported protocol version {version} (message kind: {kind:?})")]
    UnsupportedProtocolVersion {
        /// Raw protocol number.
        version: u32,
        /// Message kind that was requested, if the lookup was per kind.
        kind: Option<MessageKind>,
    },

    /// Two kinds map to the same id in one (state, direction).
    #[error("packet id {id:#04x} is shared by {first:?} and {second:?} in protocol {version}")]
    DuplicatePacketId {
        /// Raw protocol number.
        version: u32,
        /// Conflicting id.
        id: i32,
        /// Kind registered first.
        first: MessageKind,
        /// Kind registered second.
        second: MessageKind,
    },

    /// The byte stream ended before every declared field was read.
    #[error("malformed packet ({kind:?}): {reason}")]
    MalformedPacket {
        /// Kind being decoded, once the id has been read.
        kind: Option<MessageKind>,
        /// What was missing.
        reason: String,
    },

    /// Bytes remained after the last declared field.
    #[error("{remaining} trailing bytes after {kind:?}")]
    TrailingBytes {
        /// Kind that was decoded.
        kind: MessageKind,
        /// Number of unread bytes.
        remaining: usize,
    },

    /// No kind is registered for this id outside the play state.
    #[error("unknown {direction:?} packet id {id:#04x} in {state} state")]
    UnknownPacketId {
        /// State the packet arrived in.
        state: ConnectionState,
        /// Packet direction.
        direction: Direction,
        /// Raw id.
        id: i32,
    },

    /// A message is not legal in the current connection state.
    #[error("{kind:?} is not legal in {state} state")]
    IllegalStateTransition {
        /// Active state.
        state: ConnectionState,
        /// Offending kind.
        kind: MessageKind,
    },

    /// A version-gated field is present when the version lacks it, or missing when it needs it.
    #[error("{kind:?}.{field} does not match the layout of protocol {version}")]
    FieldLayoutMismatch {
        /// Kind being encoded.
        kind: MessageKind,
        /// Field name.
        field: &'static str,
        /// Raw protocol number.
        version: u32,
    },

    /// A field holds a value the protocol does not allow.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field uses an encoding this codec does not read.
    #[error("unsupported encoding for {field}: {reason}")]
    UnsupportedField {
        /// Field name.
        field: &'static str,
        /// What was found.
        reason: String,
    },
}

impl ProtocolError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ProtocolError::MalformedPacket {
            kind: None,
            reason: reason.into(),
        }
    }

    /// Attach the message kind to a malformed-packet error raised by a field reader.
    pub(crate) fn for_kind(self, kind: MessageKind) -> Self {
        match self {
            ProtocolError::MalformedPacket { kind: None, reason } => {
                ProtocolError::MalformedPacket {
                    kind: Some(kind),
                    reason,
                }
            }
            other => other,
        }
    }

    /// Whether the error means the byte stream can no longer be trusted.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            ProtocolError::MalformedPacket { .. }
                | ProtocolError::TrailingBytes { .. }
                | ProtocolError::UnknownPacketId { .. }
                | ProtocolError::InvalidValue { .. }
                | ProtocolError::UnsupportedField { .. }
        )
    }
}
