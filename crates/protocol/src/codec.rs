//! Packet encoding and decoding for one protocol version.
//!
//! Body format: [id: VarInt][fields in declared order]. Framing lives in
//! [`crate::frame`].

use crate::error::ProtocolError;
use crate::fields::{read_body, write_body};
use crate::message::{Message, MessageKind, Unparsed};
use crate::state::{ConnectionState, Direction};
use crate::table::PacketTable;
use crate::version::ProtocolVersion;
use crate::wire::{WireRead, WireWrite};
use bytes::Buf;
use tracing::trace;

/// Version-bound packet codec.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    table: PacketTable,
}

impl PacketCodec {
    /// Build the codec for `version`.
    pub fn new(version: ProtocolVersion) -> Result<Self, ProtocolError> {
        Ok(Self {
            table: PacketTable::new(version)?,
        })
    }

    /// Negotiated version.
    pub fn version(&self) -> ProtocolVersion {
        self.table.version()
    }

    /// Id table backing this codec.
    pub fn table(&self) -> &PacketTable {
        &self.table
    }

    /// Whether the version defines `kind`.
    pub fn supports(&self, kind: MessageKind) -> bool {
        self.table.supports(kind)
    }

    /// Fail unless the version defines `kind`.
    pub fn require(&self, kind: MessageKind) -> Result<(), ProtocolError> {
        self.table.require(kind).map(|_| ())
    }

    /// Encode `message` as an id followed by its fields.
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        let kind = message.kind();
        let id = match message {
            Message::Unparsed(unparsed) => unparsed.id,
            _ => self.table.require(kind)?,
        };
        let mut buf = Vec::new();
        buf.put_var_int(id);
        write_body(message, &mut buf, self.version())?;
        trace!(?kind, id, len = buf.len(), "encoded packet");
        Ok(buf)
    }

    /// Decode one packet body received in `state`.
    ///
    /// Unknown play ids come back as [`Message::Unparsed`]; unknown ids in any
    /// other state are errors.
    pub fn decode(
        &self,
        direction: Direction,
        state: ConnectionState,
        bytes: &[u8],
    ) -> Result<Message, ProtocolError> {
        let mut buf = bytes;
        let id = buf.read_var_int()?;
        let Some(kind) = self.table.kind_of(state, direction, id) else {
            if state == ConnectionState::Play {
                trace!(id, len = buf.len(), "passing through unknown play packet");
                return Ok(Message::Unparsed(Unparsed {
                    id,
                    payload: buf.to_vec(),
                }));
            }
            return Err(ProtocolError::UnknownPacketId {
                state,
                direction,
                id,
            });
        };
        let message = read_body(kind, &mut buf, self.version()).map_err(|err| err.for_kind(kind))?;
        if buf.has_remaining() {
            return Err(ProtocolError::TrailingBytes {
                kind,
                remaining: buf.remaining(),
            });
        }
        trace!(?kind, id, "decoded packet");
        Ok(message)
    }
}
