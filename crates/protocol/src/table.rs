//! Packet id tables, one column per supported version.

use crate::error::ProtocolError;
use crate::message::MessageKind;
use crate::state::{ConnectionState, Direction};
use crate::version::ProtocolVersion;
use std::collections::HashMap;

const fn every(id: i32) -> [Option<i32>; 7] {
    [Some(id); 7]
}

const fn from_1_17(id: i32) -> [Option<i32>; 7] {
    [None, None, None, None, None, Some(id), Some(id)]
}

const fn until_1_16(ids: [i32; 5]) -> [Option<i32>; 7] {
    [
        Some(ids[0]),
        Some(ids[1]),
        Some(ids[2]),
        Some(ids[3]),
        Some(ids[4]),
        None,
        None,
    ]
}

const fn columns(ids: [i32; 7]) -> [Option<i32>; 7] {
    [
        Some(ids[0]),
        Some(ids[1]),
        Some(ids[2]),
        Some(ids[3]),
        Some(ids[4]),
        Some(ids[5]),
        Some(ids[6]),
    ]
}

// Columns: 340, 404, 498, 578, 754, 756, 757.
const IDS: [(MessageKind, [Option<i32>; 7]); 33] = [
    (MessageKind::Handshake, every(0x00)),
    (MessageKind::StatusRequest, every(0x00)),
    (MessageKind::StatusPing, every(0x01)),
    (MessageKind::StatusResponse, every(0x00)),
    (MessageKind::StatusPong, every(0x01)),
    (MessageKind::LoginStart, every(0x00)),
    (MessageKind::LoginDisconnect, every(0x00)),
    (MessageKind::EncryptionRequest, every(0x01)),
    (MessageKind::LoginSuccess, every(0x02)),
    (MessageKind::SetCompression, every(0x03)),
    (
        MessageKind::KeepAliveClientbound,
        columns([0x1F, 0x21, 0x20, 0x21, 0x1F, 0x21, 0x21]),
    ),
    (
        MessageKind::PlayDisconnect,
        columns([0x1A, 0x1B, 0x1A, 0x1B, 0x19, 0x1A, 0x1A]),
    ),
    (
        MessageKind::PlayerPositionAndLook,
        columns([0x2F, 0x32, 0x35, 0x36, 0x34, 0x38, 0x38]),
    ),
    (
        MessageKind::ConfirmTransactionClientbound,
        until_1_16([0x11, 0x12, 0x12, 0x13, 0x11]),
    ),
    (
        MessageKind::OpenWindow,
        columns([0x13, 0x14, 0x2E, 0x2F, 0x2D, 0x2E, 0x2E]),
    ),
    (
        MessageKind::CloseWindowClientbound,
        columns([0x12, 0x13, 0x13, 0x14, 0x12, 0x13, 0x13]),
    ),
    (
        MessageKind::BlockChange,
        columns([0x0B, 0x0B, 0x0B, 0x0C, 0x0B, 0x0C, 0x0C]),
    ),
    (
        MessageKind::UpdateHealth,
        columns([0x41, 0x44, 0x48, 0x49, 0x49, 0x52, 0x52]),
    ),
    (
        MessageKind::ChangeDifficulty,
        columns([0x0D, 0x0D, 0x0D, 0x0E, 0x0D, 0x0E, 0x0E]),
    ),
    (
        MessageKind::PlayerAbilities,
        columns([0x2C, 0x2E, 0x31, 0x32, 0x30, 0x32, 0x32]),
    ),
    (
        MessageKind::SetSimulationDistance,
        [None, None, None, None, None, None, Some(0x57)],
    ),
    (MessageKind::Ping, from_1_17(0x30)),
    (MessageKind::TeleportConfirm, every(0x00)),
    (
        MessageKind::Chat,
        columns([0x02, 0x02, 0x03, 0x03, 0x03, 0x03, 0x03]),
    ),
    (
        MessageKind::ClientStatus,
        columns([0x03, 0x03, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ),
    (
        MessageKind::ClientSettings,
        columns([0x04, 0x04, 0x05, 0x05, 0x05, 0x05, 0x05]),
    ),
    (
        MessageKind::ConfirmTransactionServerbound,
        until_1_16([0x05, 0x06, 0x07, 0x07, 0x07]),
    ),
    (
        MessageKind::ContainerClick,
        columns([0x07, 0x08, 0x09, 0x09, 0x09, 0x08, 0x08]),
    ),
    (
        MessageKind::CloseWindowServerbound,
        columns([0x08, 0x09, 0x0A, 0x0A, 0x0A, 0x09, 0x09]),
    ),
    (
        MessageKind::KeepAliveServerbound,
        columns([0x0B, 0x0E, 0x0F, 0x0F, 0x10, 0x0F, 0x0F]),
    ),
    (
        MessageKind::PlayerPositionRotation,
        columns([0x0E, 0x11, 0x12, 0x12, 0x13, 0x12, 0x12]),
    ),
    (
        MessageKind::SeenAdvancements,
        columns([0x19, 0x1E, 0x20, 0x20, 0x22, 0x22, 0x22]),
    ),
    (MessageKind::Pong, from_1_17(0x1D)),
];

/// Bidirectional id lookup for one protocol version.
#[derive(Debug, Clone)]
pub struct PacketTable {
    version: ProtocolVersion,
    ids: HashMap<MessageKind, i32>,
    kinds: HashMap<(ConnectionState, Direction, i32), MessageKind>,
}

impl PacketTable {
    /// Build the table for `version`, rejecting id collisions.
    pub fn new(version: ProtocolVersion) -> Result<Self, ProtocolError> {
        let column = version
            .index()
            .ok_or(ProtocolError::UnsupportedProtocolVersion {
                version: version.number(),
                kind: None,
            })?;
        let mut ids = HashMap::new();
        let mut kinds = HashMap::new();
        for (kind, row) in IDS.iter() {
            let Some(id) = row[column] else {
                continue;
            };
            let key = (kind.state(), kind.direction(), id);
            if let Some(first) = kinds.insert(key, *kind) {
                return Err(ProtocolError::DuplicatePacketId {
                    version: version.number(),
                    id,
                    first,
                    second: *kind,
                });
            }
            ids.insert(*kind, id);
        }
        Ok(Self {
            version,
            ids,
            kinds,
        })
    }

    /// Version this table describes.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Wire id of `kind`, if the version defines it.
    pub fn id_of(&self, kind: MessageKind) -> Option<i32> {
        self.ids.get(&kind).copied()
    }

    /// Kind registered for `id` in the given state and direction.
    pub fn kind_of(
        &self,
        state: ConnectionState,
        direction: Direction,
        id: i32,
    ) -> Option<MessageKind> {
        self.kinds.get(&(state, direction, id)).copied()
    }

    /// Whether the version defines `kind`.
    pub fn supports(&self, kind: MessageKind) -> bool {
        self.ids.contains_key(&kind)
    }

    /// Fail unless the version defines `kind`.
    pub fn require(&self, kind: MessageKind) -> Result<i32, ProtocolError> {
        self.id_of(kind)
            .ok_or(ProtocolError::UnsupportedProtocolVersion {
                version: self.version.number(),
                kind: Some(kind),
            })
    }
}
