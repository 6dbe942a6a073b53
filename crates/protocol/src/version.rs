//! Supported game protocol versions and the layout gates that depend on them.

use crate::error::ProtocolError;
use serde::Serialize;
use std::fmt;

/// A validated game protocol version.
///
/// The only way to obtain one is [`ProtocolVersion::new`] (or one of the
/// associated constants), so every value refers to a version the codec tables
/// cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProtocolVersion(u32);

impl ProtocolVersion {
    /// 1.12.2
    pub const V1_12_2: Self = Self(340);
    /// 1.13.2
    pub const V1_13_2: Self = Self(404);
    /// 1.14.4
    pub const V1_14_4: Self = Self(498);
    /// 1.15.2
    pub const V1_15_2: Self = Self(578);
    /// 1.16.5
    pub const V1_16_5: Self = Self(754);
    /// 1.17.1
    pub const V1_17_1: Self = Self(756);
    /// 1.18
    pub const V1_18: Self = Self(757);

    /// Every version the codec tables cover, oldest first.
    pub const SUPPORTED: [Self; 7] = [
        Self::V1_12_2,
        Self::V1_13_2,
        Self::V1_14_4,
        Self::V1_15_2,
        Self::V1_16_5,
        Self::V1_17_1,
        Self::V1_18,
    ];

    /// Validate a raw protocol number.
    pub fn new(number: u32) -> Result<Self, ProtocolError> {
        Self::SUPPORTED
            .iter()
            .copied()
            .find(|v| v.0 == number)
            .ok_or(ProtocolError::UnsupportedProtocolVersion {
                version: number,
                kind: None,
            })
    }

    /// Raw protocol number as sent in the handshake.
    pub fn number(self) -> u32 {
        self.0
    }

    /// Column of this version in the packet id tables.
    pub(crate) fn index(self) -> Option<usize> {
        Self::SUPPORTED.iter().position(|v| *v == self)
    }

    /// Game release name.
    pub fn release(self) -> &'static str {
        match self.0 {
            340 => "1.12.2",
            404 => "1.13.2",
            498 => "1.14.4",
            578 => "1.15.2",
            754 => "1.16.5",
            756 => "1.17.1",
            757 => "1.18",
            _ => "unknown",
        }
    }

    /// Item slots use a signed short item id (and carry damage) instead of a
    /// presence flag.
    pub fn uses_legacy_slots(self) -> bool {
        self.0 < 402
    }

    /// Packed block positions use the `x | y | z` bit order.
    pub fn uses_legacy_block_position(self) -> bool {
        self.0 < 477
    }

    /// Open-window packets carry a string window type and a slot count.
    pub fn uses_legacy_open_window(self) -> bool {
        self.0 < 477
    }

    /// Login success carries a binary UUID instead of a hyphenated string.
    pub fn has_binary_login_uuid(self) -> bool {
        self.0 >= 735
    }

    /// Difficulty packets carry the lock flag.
    pub fn has_difficulty_lock(self) -> bool {
        self.0 > 463
    }

    /// Inventory clicks are acknowledged with confirm-transaction packets.
    pub fn has_transaction_acks(self) -> bool {
        self.0 < 755
    }

    /// Server position packets carry the dismount-vehicle flag.
    pub fn has_dismount_flag(self) -> bool {
        self.0 >= 755
    }

    /// Inventory clicks list every slot they changed.
    pub fn has_changed_slots(self) -> bool {
        self.0 >= 755
    }

    /// Inventory clicks carry the container state id.
    pub fn has_container_state_id(self) -> bool {
        self.0 >= 756
    }

    /// Client settings carry the text-filtering flag.
    pub fn has_text_filtering(self) -> bool {
        self.0 >= 755
    }

    /// Client settings carry the server-listing flag.
    pub fn has_server_listing(self) -> bool {
        self.0 >= 757
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.release())
    }
}
