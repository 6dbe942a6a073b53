//! Typed packets.
//!
//! Fields that only exist in some protocol versions are `Option`s. A message is
//! valid for a version when each such field is `Some` exactly when the version
//! defines it; the codec refuses to encode anything else, and decoding always
//! produces a valid message.

use crate::state::{ConnectionState, Direction};
use crate::version::ProtocolVersion;
use serde::Serialize;
use uuid::Uuid;

/// Handshake `next_state` requesting the status phase.
pub const HANDSHAKE_STATUS: i32 = 1;
/// Handshake `next_state` requesting the login phase.
pub const HANDSHAKE_LOGIN: i32 = 2;

/// `ClientStatus` action asking the server to respawn the player.
pub const CLIENT_STATUS_RESPAWN: i32 = 0;

/// Identifies a packet kind independently of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MessageKind {
    /// Serverbound handshake.
    Handshake,
    /// Serverbound status request.
    StatusRequest,
    /// Serverbound status ping.
    StatusPing,
    /// Clientbound status response.
    StatusResponse,
    /// Clientbound status pong.
    StatusPong,
    /// Serverbound login start.
    LoginStart,
    /// Clientbound disconnect during login.
    LoginDisconnect,
    /// Clientbound encryption request.
    EncryptionRequest,
    /// Clientbound login success.
    LoginSuccess,
    /// Clientbound compression threshold.
    SetCompression,
    /// Clientbound keep-alive.
    KeepAliveClientbound,
    /// Serverbound keep-alive.
    KeepAliveServerbound,
    /// Clientbound disconnect during play.
    PlayDisconnect,
    /// Clientbound teleport.
    PlayerPositionAndLook,
    /// Serverbound teleport acknowledgement.
    TeleportConfirm,
    /// Serverbound position and rotation update.
    PlayerPositionRotation,
    /// Clientbound inventory transaction acknowledgement.
    ConfirmTransactionClientbound,
    /// Serverbound transaction apology.
    ConfirmTransactionServerbound,
    /// Serverbound inventory click.
    ContainerClick,
    /// Clientbound window open.
    OpenWindow,
    /// Clientbound window close.
    CloseWindowClientbound,
    /// Serverbound window close.
    CloseWindowServerbound,
    /// Clientbound single block update.
    BlockChange,
    /// Clientbound health update.
    UpdateHealth,
    /// Serverbound client status (respawn).
    ClientStatus,
    /// Clientbound difficulty.
    ChangeDifficulty,
    /// Clientbound player abilities.
    PlayerAbilities,
    /// Serverbound client settings.
    ClientSettings,
    /// Serverbound chat.
    Chat,
    /// Serverbound advancement tab notification.
    SeenAdvancements,
    /// Clientbound simulation distance.
    SetSimulationDistance,
    /// Clientbound ping.
    Ping,
    /// Serverbound pong.
    Pong,
    /// Clientbound play packet this codec does not model.
    Unparsed,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [MessageKind; 34] = [
        MessageKind::Handshake,
        MessageKind::StatusRequest,
        MessageKind::StatusPing,
        MessageKind::StatusResponse,
        MessageKind::StatusPong,
        MessageKind::LoginStart,
        MessageKind::LoginDisconnect,
        MessageKind::EncryptionRequest,
        MessageKind::LoginSuccess,
        MessageKind::SetCompression,
        MessageKind::KeepAliveClientbound,
        MessageKind::KeepAliveServerbound,
        MessageKind::PlayDisconnect,
        MessageKind::PlayerPositionAndLook,
        MessageKind::TeleportConfirm,
        MessageKind::PlayerPositionRotation,
        MessageKind::ConfirmTransactionClientbound,
        MessageKind::ConfirmTransactionServerbound,
        MessageKind::ContainerClick,
        MessageKind::OpenWindow,
        MessageKind::CloseWindowClientbound,
        MessageKind::CloseWindowServerbound,
        MessageKind::BlockChange,
        MessageKind::UpdateHealth,
        MessageKind::ClientStatus,
        MessageKind::ChangeDifficulty,
        MessageKind::PlayerAbilities,
        MessageKind::ClientSettings,
        MessageKind::Chat,
        MessageKind::SeenAdvancements,
        MessageKind::SetSimulationDistance,
        MessageKind::Ping,
        MessageKind::Pong,
        MessageKind::Unparsed,
    ];

    /// Connection state in which this kind is legal.
    pub fn state(self) -> ConnectionState {
        match self {
            MessageKind::Handshake => ConnectionState::Handshake,
            MessageKind::StatusRequest
            | MessageKind::StatusPing
            | MessageKind::StatusResponse
            | MessageKind::StatusPong => ConnectionState::Status,
            MessageKind::LoginStart
            | MessageKind::LoginDisconnect
            | MessageKind::EncryptionRequest
            | MessageKind::LoginSuccess
            | MessageKind::SetCompression => ConnectionState::Login,
            MessageKind::KeepAliveClientbound
            | MessageKind::KeepAliveServerbound
            | MessageKind::PlayDisconnect
            | MessageKind::PlayerPositionAndLook
            | MessageKind::TeleportConfirm
            | MessageKind::PlayerPositionRotation
            | MessageKind::ConfirmTransactionClientbound
            | MessageKind::ConfirmTransactionServerbound
            | MessageKind::ContainerClick
            | MessageKind::OpenWindow
            | MessageKind::CloseWindowClientbound
            | MessageKind::CloseWindowServerbound
            | MessageKind::BlockChange
            | MessageKind::UpdateHealth
            | MessageKind::ClientStatus
            | MessageKind::ChangeDifficulty
            | MessageKind::PlayerAbilities
            | MessageKind::ClientSettings
            | MessageKind::Chat
            | MessageKind::SeenAdvancements
            | MessageKind::SetSimulationDistance
            | MessageKind::Ping
            | MessageKind::Pong
            | MessageKind::Unparsed => ConnectionState::Play,
        }
    }

    /// Which side sends this kind.
    pub fn direction(self) -> Direction {
        match self {
            MessageKind::Handshake
            | MessageKind::StatusRequest
            | MessageKind::StatusPing
            | MessageKind::LoginStart
            | MessageKind::KeepAliveServerbound
            | MessageKind::TeleportConfirm
            | MessageKind::PlayerPositionRotation
            | MessageKind::ConfirmTransactionServerbound
            | MessageKind::ContainerClick
            | MessageKind::CloseWindowServerbound
            | MessageKind::ClientStatus
            | MessageKind::ClientSettings
            | MessageKind::Chat
            | MessageKind::SeenAdvancements
            | MessageKind::Pong => Direction::Serverbound,
            MessageKind::StatusResponse
            | MessageKind::StatusPong
            | MessageKind::LoginDisconnect
            | MessageKind::EncryptionRequest
            | MessageKind::LoginSuccess
            | MessageKind::SetCompression
            | MessageKind::KeepAliveClientbound
            | MessageKind::PlayDisconnect
            | MessageKind::PlayerPositionAndLook
            | MessageKind::ConfirmTransactionClientbound
            | MessageKind::OpenWindow
            | MessageKind::CloseWindowClientbound
            | MessageKind::BlockChange
            | MessageKind::UpdateHealth
            | MessageKind::ChangeDifficulty
            | MessageKind::PlayerAbilities
            | MessageKind::SetSimulationDistance
            | MessageKind::Ping
            | MessageKind::Unparsed => Direction::Clientbound,
        }
    }
}

/// Every packet this client understands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Message {
    /// Serverbound handshake.
    Handshake(Handshake),
    /// Serverbound status request.
    StatusRequest(StatusRequest),
    /// Serverbound status ping.
    StatusPing(StatusPing),
    /// Clientbound status response.
    StatusResponse(StatusResponse),
    /// Clientbound status pong.
    StatusPong(StatusPong),
    /// Serverbound login start.
    LoginStart(LoginStart),
    /// Clientbound disconnect during login.
    LoginDisconnect(LoginDisconnect),
    /// Clientbound encryption request.
    EncryptionRequest(EncryptionRequest),
    /// Clientbound login success.
    LoginSuccess(LoginSuccess),
    /// Clientbound compression threshold.
    SetCompression(SetCompression),
    /// Clientbound keep-alive.
    KeepAliveClientbound(KeepAliveClientbound),
    /// Serverbound keep-alive.
    KeepAliveServerbound(KeepAliveServerbound),
    /// Clientbound disconnect during play.
    PlayDisconnect(PlayDisconnect),
    /// Clientbound teleport.
    PlayerPositionAndLook(PlayerPositionAndLook),
    /// Serverbound teleport acknowledgement.
    TeleportConfirm(TeleportConfirm),
    /// Serverbound position and rotation update.
    PlayerPositionRotation(PlayerPositionRotation),
    /// Clientbound inventory transaction acknowledgement.
    ConfirmTransactionClientbound(ConfirmTransactionClientbound),
    /// Serverbound transaction apology.
    ConfirmTransactionServerbound(ConfirmTransactionServerbound),
    /// Serverbound inventory click.
    ContainerClick(ContainerClick),
    /// Clientbound window open.
    OpenWindow(OpenWindow),
    /// Clientbound window close.
    CloseWindowClientbound(CloseWindowClientbound),
    /// Serverbound window close.
    CloseWindowServerbound(CloseWindowServerbound),
    /// Clientbound single block update.
    BlockChange(BlockChange),
    /// Clientbound health update.
    UpdateHealth(UpdateHealth),
    /// Serverbound client status.
    ClientStatus(ClientStatus),
    /// Clientbound difficulty.
    ChangeDifficulty(ChangeDifficulty),
    /// Clientbound player abilities.
    PlayerAbilities(PlayerAbilities),
    /// Serverbound client settings.
    ClientSettings(ClientSettings),
    /// Serverbound chat.
    Chat(Chat),
    /// Serverbound advancement tab notification.
    SeenAdvancements(SeenAdvancements),
    /// Clientbound simulation distance.
    SetSimulationDistance(SetSimulationDistance),
    /// Clientbound ping.
    Ping(Ping),
    /// Serverbound pong.
    Pong(Pong),
    /// Clientbound play packet this codec does not model.
    Unparsed(Unparsed),
}

impl Message {
    /// Kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Handshake(_) => MessageKind::Handshake,
            Message::StatusRequest(_) => MessageKind::StatusRequest,
            Message::StatusPing(_) => MessageKind::StatusPing,
            Message::StatusResponse(_) => MessageKind::StatusResponse,
            Message::StatusPong(_) => MessageKind::StatusPong,
            Message::LoginStart(_) => MessageKind::LoginStart,
            Message::LoginDisconnect(_) => MessageKind::LoginDisconnect,
            Message::EncryptionRequest(_) => MessageKind::EncryptionRequest,
            Message::LoginSuccess(_) => MessageKind::LoginSuccess,
            Message::SetCompression(_) => MessageKind::SetCompression,
            Message::KeepAliveClientbound(_) => MessageKind::KeepAliveClientbound,
            Message::KeepAliveServerbound(_) => MessageKind::KeepAliveServerbound,
            Message::PlayDisconnect(_) => MessageKind::PlayDisconnect,
            Message::PlayerPositionAndLook(_) => MessageKind::PlayerPositionAndLook,
            Message::TeleportConfirm(_) => MessageKind::TeleportConfirm,
            Message::PlayerPositionRotation(_) => MessageKind::PlayerPositionRotation,
            Message::ConfirmTransactionClientbound(_) => {
                MessageKind::ConfirmTransactionClientbound
            }
            Message::ConfirmTransactionServerbound(_) => {
                MessageKind::ConfirmTransactionServerbound
            }
            Message::ContainerClick(_) => MessageKind::ContainerClick,
            Message::OpenWindow(_) => MessageKind::OpenWindow,
            Message::CloseWindowClientbound(_) => MessageKind::CloseWindowClientbound,
            Message::CloseWindowServerbound(_) => MessageKind::CloseWindowServerbound,
            Message::BlockChange(_) => MessageKind::BlockChange,
            Message::UpdateHealth(_) => MessageKind::UpdateHealth,
            Message::ClientStatus(_) => MessageKind::ClientStatus,
            Message::ChangeDifficulty(_) => MessageKind::ChangeDifficulty,
            Message::PlayerAbilities(_) => MessageKind::PlayerAbilities,
            Message::ClientSettings(_) => MessageKind::ClientSettings,
            Message::Chat(_) => MessageKind::Chat,
            Message::SeenAdvancements(_) => MessageKind::SeenAdvancements,
            Message::SetSimulationDistance(_) => MessageKind::SetSimulationDistance,
            Message::Ping(_) => MessageKind::Ping,
            Message::Pong(_) => MessageKind::Pong,
            Message::Unparsed(_) => MessageKind::Unparsed,
        }
    }

    /// Structured key/value view for logs and tests. Not wire compatible.
    pub fn diagnostic(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            serde_json::json!({
                "kind": format!("{:?}", self.kind()),
                "error": err.to_string(),
            })
        })
    }
}

/// Packed block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockPosition {
    /// X coordinate (26 bits).
    pub x: i32,
    /// Y coordinate (12 bits).
    pub y: i32,
    /// Z coordinate (26 bits).
    pub z: i32,
}

impl BlockPosition {
    /// Create a position.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Pack into the 64-bit wire layout of `version`.
    pub fn pack(&self, version: ProtocolVersion) -> i64 {
        let x = i64::from(self.x) & 0x3FF_FFFF;
        let y = i64::from(self.y) & 0xFFF;
        let z = i64::from(self.z) & 0x3FF_FFFF;
        if version.uses_legacy_block_position() {
            (x << 38) | (y << 26) | z
        } else {
            (x << 38) | (z << 12) | y
        }
    }

    /// Unpack from the 64-bit wire layout of `version`, sign-extending each axis.
    pub fn unpack(packed: i64, version: ProtocolVersion) -> Self {
        if version.uses_legacy_block_position() {
            Self {
                x: (packed >> 38) as i32,
                y: ((packed << 26) >> 52) as i32,
                z: ((packed << 38) >> 38) as i32,
            }
        } else {
            Self {
                x: (packed >> 38) as i32,
                y: ((packed << 52) >> 52) as i32,
                z: ((packed << 26) >> 38) as i32,
            }
        }
    }
}

/// Contents of a non-empty inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStack {
    /// Item registry id.
    pub item_id: i32,
    /// Stack size.
    pub count: i8,
    /// Item damage; only carried by the legacy slot layout.
    pub damage: Option<i16>,
}

/// An inventory slot; `None` is empty.
pub type Slot = Option<ItemStack>;

/// One entry of a click's changed-slot list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedSlot {
    /// Slot index.
    pub slot: i16,
    /// New slot contents.
    pub item: Slot,
}

/// Serverbound handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handshake {
    /// Protocol number the client speaks.
    pub protocol_version: i32,
    /// Host name used to connect.
    pub server_address: String,
    /// Port used to connect.
    pub server_port: u16,
    /// [`HANDSHAKE_STATUS`] or [`HANDSHAKE_LOGIN`].
    pub next_state: i32,
}

/// Serverbound status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRequest {}

/// Serverbound status ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPing {
    /// Opaque value echoed by the server.
    pub payload: i64,
}

/// Clientbound status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Server list JSON document.
    pub json: String,
}

/// Clientbound status pong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPong {
    /// Value from the ping.
    pub payload: i64,
}

/// Serverbound login start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginStart {
    /// Player name.
    pub username: String,
}

/// Clientbound disconnect during login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginDisconnect {
    /// Chat JSON reason.
    pub reason: String,
}

/// Clientbound encryption request (online-mode servers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptionRequest {
    /// Server id string.
    pub server_id: String,
    /// DER-encoded public key.
    pub public_key: Vec<u8>,
    /// Token to echo back encrypted.
    pub verify_token: Vec<u8>,
}

/// Clientbound login success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginSuccess {
    /// Player UUID (hyphenated string on the wire before 1.16).
    pub uuid: Uuid,
    /// Player name.
    pub username: String,
}

/// Clientbound compression threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetCompression {
    /// Minimum packet size to compress; negative disables compression.
    pub threshold: i32,
}

/// Clientbound keep-alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeepAliveClientbound {
    /// Value to echo.
    pub id: i64,
}

/// Serverbound keep-alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeepAliveServerbound {
    /// Echoed value.
    pub id: i64,
}

/// Clientbound disconnect during play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayDisconnect {
    /// Chat JSON reason.
    pub reason: String,
}

/// Clientbound teleport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPositionAndLook {
    /// X coordinate (absolute or relative, see `flags`).
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Relative-field bit set.
    pub flags: i8,
    /// Id to echo in [`TeleportConfirm`].
    pub teleport_id: i32,
    /// Present from 1.17.
    pub dismount_vehicle: Option<bool>,
}

impl PlayerPositionAndLook {
    /// `x` is relative.
    pub const RELATIVE_X: i8 = 0x01;
    /// `y` is relative.
    pub const RELATIVE_Y: i8 = 0x02;
    /// `z` is relative.
    pub const RELATIVE_Z: i8 = 0x04;
    /// `yaw` is relative.
    pub const RELATIVE_YAW: i8 = 0x08;
    /// `pitch` is relative.
    pub const RELATIVE_PITCH: i8 = 0x10;

    /// Whether the given relative bit is set.
    pub fn is_relative(&self, bit: i8) -> bool {
        self.flags & bit != 0
    }
}

/// Serverbound teleport acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeleportConfirm {
    /// Id from the teleport.
    pub teleport_id: i32,
}

/// Serverbound position and rotation update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPositionRotation {
    /// X coordinate.
    pub x: f64,
    /// Feet Y coordinate.
    pub feet_y: f64,
    /// Z coordinate.
    pub z: f64,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Whether the player stands on a block.
    pub on_ground: bool,
}

/// Clientbound inventory transaction acknowledgement (until 1.16).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmTransactionClientbound {
    /// Window the click targeted.
    pub window_id: i8,
    /// Transaction id of the click.
    pub action_number: i16,
    /// Whether the server applied the click.
    pub accepted: bool,
}

/// Serverbound apology for a rejected transaction (until 1.16).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmTransactionServerbound {
    /// Window the click targeted.
    pub window_id: i8,
    /// Transaction id of the click.
    pub action_number: i16,
    /// Echo of the server's flag.
    pub accepted: bool,
}

/// Serverbound inventory click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerClick {
    /// Window the click targets.
    pub window_id: u8,
    /// Last container state id seen; present from 1.17.1.
    pub state_id: Option<i32>,
    /// Clicked slot (-999 outside the window).
    pub slot: i16,
    /// Mouse button or hotbar key.
    pub button: i8,
    /// Transaction id; present until 1.16.
    pub action_number: Option<i16>,
    /// Click mode.
    pub mode: i32,
    /// Slots changed by the click; present from 1.17.
    pub changed_slots: Option<Vec<ChangedSlot>>,
    /// Item clicked (until 1.16) or carried afterwards (from 1.17).
    pub carried_item: Slot,
}

impl ContainerClick {
    /// Build a click whose gated fields match `version`.
    ///
    /// The transaction id is left at zero; the transaction tracker stamps it.
    pub fn new(version: ProtocolVersion, window_id: u8, slot: i16, button: i8, mode: i32) -> Self {
        Self {
            window_id,
            state_id: version.has_container_state_id().then_some(0),
            slot,
            button,
            action_number: version.has_transaction_acks().then_some(0),
            mode,
            changed_slots: version.has_changed_slots().then(Vec::new),
            carried_item: None,
        }
    }
}

/// Window type as described by the legacy and registry-based layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WindowType {
    /// Before 1.14: string type plus slot count.
    Legacy {
        /// Type name, e.g. `minecraft:chest`.
        name: String,
        /// Number of slots.
        slot_count: u8,
        /// Horse entity id, present only for `EntityHorse`.
        horse_entity_id: Option<i32>,
    },
    /// From 1.14: registry id.
    Registry {
        /// Menu registry id.
        id: i32,
    },
}

/// Legacy window type that carries a horse entity id.
pub const LEGACY_HORSE_WINDOW: &str = "EntityHorse";

/// Clientbound window open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenWindow {
    /// Window id (u8 on the wire before 1.14).
    pub window_id: i32,
    /// Window type.
    pub window_type: WindowType,
    /// Chat JSON title.
    pub title: String,
}

/// Clientbound window close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseWindowClientbound {
    /// Closed window.
    pub window_id: u8,
}

/// Serverbound window close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseWindowServerbound {
    /// Closed window.
    pub window_id: u8,
}

/// Clientbound single block update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockChange {
    /// Block coordinates.
    pub position: BlockPosition,
    /// New block state id.
    pub block_state: i32,
}

/// Clientbound health update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateHealth {
    /// Health points; zero or less means dead.
    pub health: f32,
    /// Food level.
    pub food: i32,
    /// Food saturation.
    pub saturation: f32,
}

/// Serverbound client status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStatus {
    /// [`CLIENT_STATUS_RESPAWN`] or a statistics request.
    pub action: i32,
}

/// Clientbound difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDifficulty {
    /// 0 peaceful to 3 hard.
    pub difficulty: u8,
    /// Lock flag; present from 1.14.
    pub locked: Option<bool>,
}

/// Clientbound player abilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAbilities {
    /// Ability bit set.
    pub flags: i8,
    /// Flying speed.
    pub flying_speed: f32,
    /// Field of view modifier.
    pub fov_modifier: f32,
}

impl PlayerAbilities {
    /// Whether the player may fly.
    pub fn allows_flying(&self) -> bool {
        self.flags & 0x04 != 0
    }

    /// Whether blocks break instantly.
    pub fn is_creative(&self) -> bool {
        self.flags & 0x08 != 0
    }
}

/// Serverbound client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSettings {
    /// Locale such as `en_us`.
    pub locale: String,
    /// View distance in chunks.
    pub view_distance: i8,
    /// 0 enabled, 1 commands only, 2 hidden.
    pub chat_mode: i32,
    /// Whether chat colors are shown.
    pub chat_colors: bool,
    /// Displayed skin part bit set.
    pub displayed_skin_parts: u8,
    /// 0 left, 1 right.
    pub main_hand: i32,
    /// Present from 1.17.
    pub text_filtering: Option<bool>,
    /// Present from 1.18.
    pub server_listing: Option<bool>,
}

impl ClientSettings {
    /// Settings with every gated field set for `version`.
    pub fn for_version(version: ProtocolVersion, locale: &str, view_distance: i8) -> Self {
        Self {
            locale: locale.to_string(),
            view_distance,
            chat_mode: 0,
            chat_colors: true,
            displayed_skin_parts: 0xFF,
            main_hand: 1,
            text_filtering: version.has_text_filtering().then_some(false),
            server_listing: version.has_server_listing().then_some(true),
        }
    }
}

/// Serverbound chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chat {
    /// Raw text.
    pub message: String,
}

/// Serverbound advancement tab notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeenAdvancements {
    /// 0 opened tab, 1 closed screen.
    pub action: i32,
    /// Tab identifier; present exactly when `action` is 0.
    pub tab: Option<String>,
}

/// Clientbound simulation distance (1.18).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetSimulationDistance {
    /// Distance in chunks.
    pub distance: i32,
}

/// Clientbound ping (from 1.17).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ping {
    /// Value to echo.
    pub id: i32,
}

/// Serverbound pong (from 1.17).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pong {
    /// Echoed value.
    pub id: i32,
}

/// A play packet with an id outside this codec's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unparsed {
    /// Raw packet id.
    pub id: i32,
    /// Undecoded body after the id.
    pub payload: Vec<u8>,
}
