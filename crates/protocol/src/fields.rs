//! Per-kind field layouts.

use crate::error::ProtocolError;
use crate::message::*;
use crate::version::ProtocolVersion;
use crate::wire::{WireRead, WireWrite};
use bytes::{Buf, BufMut};
use uuid::Uuid;

type Result<T> = std::result::Result<T, ProtocolError>;

/// Body layout of one packet struct, after the id.
pub(crate) trait PacketFields: Sized {
    const KIND: MessageKind;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self>;

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()>;
}

/// Check that an optional field is present exactly when `defined` says so.
fn gated<'a, T>(
    kind: MessageKind,
    field: &'static str,
    version: ProtocolVersion,
    defined: bool,
    value: &'a Option<T>,
) -> Result<Option<&'a T>> {
    if value.is_some() != defined {
        return Err(ProtocolError::FieldLayoutMismatch {
            kind,
            field,
            version: version.number(),
        });
    }
    Ok(value.as_ref())
}

fn read_gated<B: Buf, T>(
    buf: &mut B,
    defined: bool,
    read: impl FnOnce(&mut B) -> Result<T>,
) -> Result<Option<T>> {
    if defined {
        read(buf).map(Some)
    } else {
        Ok(None)
    }
}

fn read_empty_nbt<B: Buf>(buf: &mut B) -> Result<()> {
    match buf.read_u8()? {
        0 => Ok(()),
        tag => Err(ProtocolError::UnsupportedField {
            field: "nbt",
            reason: format!("tag type {tag:#04x}, only an empty tag is read"),
        }),
    }
}

pub(crate) fn read_slot<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Slot> {
    if version.uses_legacy_slots() {
        let item_id = buf.read_i16()?;
        if item_id == -1 {
            return Ok(None);
        }
        let count = buf.read_i8()?;
        let damage = buf.read_i16()?;
        read_empty_nbt(buf)?;
        Ok(Some(ItemStack {
            item_id: i32::from(item_id),
            count,
            damage: Some(damage),
        }))
    } else {
        if !buf.read_bool()? {
            return Ok(None);
        }
        let item_id = buf.read_var_int()?;
        let count = buf.read_i8()?;
        read_empty_nbt(buf)?;
        Ok(Some(ItemStack {
            item_id,
            count,
            damage: None,
        }))
    }
}

pub(crate) fn write_slot<B: BufMut>(
    buf: &mut B,
    slot: &Slot,
    kind: MessageKind,
    version: ProtocolVersion,
) -> Result<()> {
    let legacy = version.uses_legacy_slots();
    let Some(stack) = slot else {
        if legacy {
            buf.put_i16(-1);
        } else {
            buf.put_bool(false);
        }
        return Ok(());
    };
    let damage = gated(kind, "damage", version, legacy, &stack.damage)?;
    match damage {
        Some(damage) => {
            let item_id = i16::try_from(stack.item_id)
                .ok()
                .filter(|id| *id != -1)
                .ok_or_else(|| ProtocolError::InvalidValue {
                    field: "item_id",
                    reason: format!("{} is not a legacy item id", stack.item_id),
                })?;
            buf.put_i16(item_id);
            buf.put_i8(stack.count);
            buf.put_i16(*damage);
        }
        None => {
            buf.put_bool(true);
            buf.put_var_int(stack.item_id);
            buf.put_i8(stack.count);
        }
    }
    buf.put_u8(0);
    Ok(())
}

fn check_next_state(next_state: i32) -> Result<i32> {
    match next_state {
        HANDSHAKE_STATUS | HANDSHAKE_LOGIN => Ok(next_state),
        other => Err(ProtocolError::InvalidValue {
            field: "next_state",
            reason: format!("{other} is neither status (1) nor login (2)"),
        }),
    }
}

impl PacketFields for Handshake {
    const KIND: MessageKind = MessageKind::Handshake;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            protocol_version: buf.read_var_int()?,
            server_address: buf.read_string()?,
            server_port: buf.read_u16()?,
            next_state: check_next_state(buf.read_var_int()?)?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_var_int(self.protocol_version);
        buf.put_string(&self.server_address);
        buf.put_u16(self.server_port);
        buf.put_var_int(check_next_state(self.next_state)?);
        Ok(())
    }
}

impl PacketFields for StatusRequest {
    const KIND: MessageKind = MessageKind::StatusRequest;

    fn read_fields<B: Buf>(_buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {})
    }

    fn write_fields<B: BufMut>(&self, _buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        Ok(())
    }
}

impl PacketFields for StatusPing {
    const KIND: MessageKind = MessageKind::StatusPing;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            payload: buf.read_i64()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i64(self.payload);
        Ok(())
    }
}

impl PacketFields for StatusResponse {
    const KIND: MessageKind = MessageKind::StatusResponse;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            json: buf.read_string()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_string(&self.json);
        Ok(())
    }
}

impl PacketFields for StatusPong {
    const KIND: MessageKind = MessageKind::StatusPong;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            payload: buf.read_i64()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i64(self.payload);
        Ok(())
    }
}

impl PacketFields for LoginStart {
    const KIND: MessageKind = MessageKind::LoginStart;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            username: buf.read_string()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_string(&self.username);
        Ok(())
    }
}

impl PacketFields for LoginDisconnect {
    const KIND: MessageKind = MessageKind::LoginDisconnect;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            reason: buf.read_string()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_string(&self.reason);
        Ok(())
    }
}

impl PacketFields for EncryptionRequest {
    const KIND: MessageKind = MessageKind::EncryptionRequest;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            server_id: buf.read_string()?,
            public_key: buf.read_byte_array()?,
            verify_token: buf.read_byte_array()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_string(&self.server_id);
        buf.put_byte_array(&self.public_key);
        buf.put_byte_array(&self.verify_token);
        Ok(())
    }
}

impl PacketFields for LoginSuccess {
    const KIND: MessageKind = MessageKind::LoginSuccess;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        let uuid = if version.has_binary_login_uuid() {
            buf.read_uuid()?
        } else {
            let text = buf.read_string()?;
            Uuid::parse_str(&text).map_err(|err| ProtocolError::InvalidValue {
                field: "uuid",
                reason: format!("{text:?}: {err}"),
            })?
        };
        Ok(Self {
            uuid,
            username: buf.read_string()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        if version.has_binary_login_uuid() {
            buf.put_uuid(&self.uuid);
        } else {
            buf.put_string(&self.uuid.hyphenated().to_string());
        }
        buf.put_string(&self.username);
        Ok(())
    }
}

impl PacketFields for SetCompression {
    const KIND: MessageKind = MessageKind::SetCompression;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            threshold: buf.read_var_int()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_var_int(self.threshold);
        Ok(())
    }
}

impl PacketFields for KeepAliveClientbound {
    const KIND: MessageKind = MessageKind::KeepAliveClientbound;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            id: buf.read_i64()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i64(self.id);
        Ok(())
    }
}

impl PacketFields for KeepAliveServerbound {
    const KIND: MessageKind = MessageKind::KeepAliveServerbound;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            id: buf.read_i64()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i64(self.id);
        Ok(())
    }
}

impl PacketFields for PlayDisconnect {
    const KIND: MessageKind = MessageKind::PlayDisconnect;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            reason: buf.read_string()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_string(&self.reason);
        Ok(())
    }
}

impl PacketFields for PlayerPositionAndLook {
    const KIND: MessageKind = MessageKind::PlayerPositionAndLook;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            x: buf.read_f64()?,
            y: buf.read_f64()?,
            z: buf.read_f64()?,
            yaw: buf.read_f32()?,
            pitch: buf.read_f32()?,
            flags: buf.read_i8()?,
            teleport_id: buf.read_var_int()?,
            dismount_vehicle: read_gated(buf, version.has_dismount_flag(), |b| b.read_bool())?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        let dismount = gated(
            Self::KIND,
            "dismount_vehicle",
            version,
            version.has_dismount_flag(),
            &self.dismount_vehicle,
        )?;
        buf.put_f64(self.x);
        buf.put_f64(self.y);
        buf.put_f64(self.z);
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
        buf.put_i8(self.flags);
        buf.put_var_int(self.teleport_id);
        if let Some(dismount) = dismount {
            buf.put_bool(*dismount);
        }
        Ok(())
    }
}

impl PacketFields for TeleportConfirm {
    const KIND: MessageKind = MessageKind::TeleportConfirm;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            teleport_id: buf.read_var_int()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_var_int(self.teleport_id);
        Ok(())
    }
}

impl PacketFields for PlayerPositionRotation {
    const KIND: MessageKind = MessageKind::PlayerPositionRotation;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            x: buf.read_f64()?,
            feet_y: buf.read_f64()?,
            z: buf.read_f64()?,
            yaw: buf.read_f32()?,
            pitch: buf.read_f32()?,
            on_ground: buf.read_bool()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_f64(self.x);
        buf.put_f64(self.feet_y);
        buf.put_f64(self.z);
        buf.put_f32(self.yaw);
        buf.put_f32(self.pitch);
        buf.put_bool(self.on_ground);
        Ok(())
    }
}

impl PacketFields for ConfirmTransactionClientbound {
    const KIND: MessageKind = MessageKind::ConfirmTransactionClientbound;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            window_id: buf.read_i8()?,
            action_number: buf.read_i16()?,
            accepted: buf.read_bool()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i8(self.window_id);
        buf.put_i16(self.action_number);
        buf.put_bool(self.accepted);
        Ok(())
    }
}

impl PacketFields for ConfirmTransactionServerbound {
    const KIND: MessageKind = MessageKind::ConfirmTransactionServerbound;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            window_id: buf.read_i8()?,
            action_number: buf.read_i16()?,
            accepted: buf.read_bool()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i8(self.window_id);
        buf.put_i16(self.action_number);
        buf.put_bool(self.accepted);
        Ok(())
    }
}

impl PacketFields for ContainerClick {
    const KIND: MessageKind = MessageKind::ContainerClick;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        let window_id = buf.read_u8()?;
        let state_id = read_gated(buf, version.has_container_state_id(), |b| b.read_var_int())?;
        let slot = buf.read_i16()?;
        let button = buf.read_i8()?;
        let action_number = read_gated(buf, version.has_transaction_acks(), |b| b.read_i16())?;
        let mode = buf.read_var_int()?;
        let changed_slots = read_gated(buf, version.has_changed_slots(), |b| {
            let count = b.read_len("changed slots")?;
            let mut changed = Vec::new();
            for _ in 0..count {
                changed.push(ChangedSlot {
                    slot: b.read_i16()?,
                    item: read_slot(b, version)?,
                });
            }
            Ok(changed)
        })?;
        let carried_item = read_slot(buf, version)?;
        Ok(Self {
            window_id,
            state_id,
            slot,
            button,
            action_number,
            mode,
            changed_slots,
            carried_item,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        let state_id = gated(
            Self::KIND,
            "state_id",
            version,
            version.has_container_state_id(),
            &self.state_id,
        )?;
        let action_number = gated(
            Self::KIND,
            "action_number",
            version,
            version.has_transaction_acks(),
            &self.action_number,
        )?;
        let changed_slots = gated(
            Self::KIND,
            "changed_slots",
            version,
            version.has_changed_slots(),
            &self.changed_slots,
        )?;

        buf.put_u8(self.window_id);
        if let Some(state_id) = state_id {
            buf.put_var_int(*state_id);
        }
        buf.put_i16(self.slot);
        buf.put_i8(self.button);
        if let Some(action_number) = action_number {
            buf.put_i16(*action_number);
        }
        buf.put_var_int(self.mode);
        if let Some(changed) = changed_slots {
            buf.put_var_int(changed.len() as i32);
            for entry in changed {
                buf.put_i16(entry.slot);
                write_slot(buf, &entry.item, Self::KIND, version)?;
            }
        }
        write_slot(buf, &self.carried_item, Self::KIND, version)
    }
}

impl PacketFields for OpenWindow {
    const KIND: MessageKind = MessageKind::OpenWindow;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        if version.uses_legacy_open_window() {
            let window_id = i32::from(buf.read_u8()?);
            let name = buf.read_string()?;
            let title = buf.read_string()?;
            let slot_count = buf.read_u8()?;
            let horse_entity_id = read_gated(buf, name == LEGACY_HORSE_WINDOW, |b| b.read_i32())?;
            Ok(Self {
                window_id,
                window_type: WindowType::Legacy {
                    name,
                    slot_count,
                    horse_entity_id,
                },
                title,
            })
        } else {
            Ok(Self {
                window_id: buf.read_var_int()?,
                window_type: WindowType::Registry {
                    id: buf.read_var_int()?,
                },
                title: buf.read_string()?,
            })
        }
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        match (&self.window_type, version.uses_legacy_open_window()) {
            (
                WindowType::Legacy {
                    name,
                    slot_count,
                    horse_entity_id,
                },
                true,
            ) => {
                let horse = gated(
                    Self::KIND,
                    "horse_entity_id",
                    version,
                    name == LEGACY_HORSE_WINDOW,
                    horse_entity_id,
                )?;
                let window_id =
                    u8::try_from(self.window_id).map_err(|_| ProtocolError::InvalidValue {
                        field: "window_id",
                        reason: format!("{} does not fit in a byte", self.window_id),
                    })?;
                buf.put_u8(window_id);
                buf.put_string(name);
                buf.put_string(&self.title);
                buf.put_u8(*slot_count);
                if let Some(horse) = horse {
                    buf.put_i32(*horse);
                }
                Ok(())
            }
            (WindowType::Registry { id }, false) => {
                buf.put_var_int(self.window_id);
                buf.put_var_int(*id);
                buf.put_string(&self.title);
                Ok(())
            }
            _ => Err(ProtocolError::FieldLayoutMismatch {
                kind: Self::KIND,
                field: "window_type",
                version: version.number(),
            }),
        }
    }
}

impl PacketFields for CloseWindowClientbound {
    const KIND: MessageKind = MessageKind::CloseWindowClientbound;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            window_id: buf.read_u8()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_u8(self.window_id);
        Ok(())
    }
}

impl PacketFields for CloseWindowServerbound {
    const KIND: MessageKind = MessageKind::CloseWindowServerbound;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            window_id: buf.read_u8()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_u8(self.window_id);
        Ok(())
    }
}

impl PacketFields for BlockChange {
    const KIND: MessageKind = MessageKind::BlockChange;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            position: buf.read_position(version)?,
            block_state: buf.read_var_int()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        buf.put_position(&self.position, version);
        buf.put_var_int(self.block_state);
        Ok(())
    }
}

impl PacketFields for UpdateHealth {
    const KIND: MessageKind = MessageKind::UpdateHealth;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            health: buf.read_f32()?,
            food: buf.read_var_int()?,
            saturation: buf.read_f32()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_f32(self.health);
        buf.put_var_int(self.food);
        buf.put_f32(self.saturation);
        Ok(())
    }
}

impl PacketFields for ClientStatus {
    const KIND: MessageKind = MessageKind::ClientStatus;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            action: buf.read_var_int()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_var_int(self.action);
        Ok(())
    }
}

impl PacketFields for ChangeDifficulty {
    const KIND: MessageKind = MessageKind::ChangeDifficulty;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            difficulty: buf.read_u8()?,
            locked: read_gated(buf, version.has_difficulty_lock(), |b| b.read_bool())?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        let locked = gated(
            Self::KIND,
            "locked",
            version,
            version.has_difficulty_lock(),
            &self.locked,
        )?;
        buf.put_u8(self.difficulty);
        if let Some(locked) = locked {
            buf.put_bool(*locked);
        }
        Ok(())
    }
}

impl PacketFields for PlayerAbilities {
    const KIND: MessageKind = MessageKind::PlayerAbilities;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            flags: buf.read_i8()?,
            flying_speed: buf.read_f32()?,
            fov_modifier: buf.read_f32()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i8(self.flags);
        buf.put_f32(self.flying_speed);
        buf.put_f32(self.fov_modifier);
        Ok(())
    }
}

impl PacketFields for ClientSettings {
    const KIND: MessageKind = MessageKind::ClientSettings;

    fn read_fields<B: Buf>(buf: &mut B, version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            locale: buf.read_string()?,
            view_distance: buf.read_i8()?,
            chat_mode: buf.read_var_int()?,
            chat_colors: buf.read_bool()?,
            displayed_skin_parts: buf.read_u8()?,
            main_hand: buf.read_var_int()?,
            text_filtering: read_gated(buf, version.has_text_filtering(), |b| b.read_bool())?,
            server_listing: read_gated(buf, version.has_server_listing(), |b| b.read_bool())?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        let text_filtering = gated(
            Self::KIND,
            "text_filtering",
            version,
            version.has_text_filtering(),
            &self.text_filtering,
        )?;
        let server_listing = gated(
            Self::KIND,
            "server_listing",
            version,
            version.has_server_listing(),
            &self.server_listing,
        )?;
        buf.put_string(&self.locale);
        buf.put_i8(self.view_distance);
        buf.put_var_int(self.chat_mode);
        buf.put_bool(self.chat_colors);
        buf.put_u8(self.displayed_skin_parts);
        buf.put_var_int(self.main_hand);
        if let Some(flag) = text_filtering {
            buf.put_bool(*flag);
        }
        if let Some(flag) = server_listing {
            buf.put_bool(*flag);
        }
        Ok(())
    }
}

impl PacketFields for Chat {
    const KIND: MessageKind = MessageKind::Chat;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            message: buf.read_string()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_string(&self.message);
        Ok(())
    }
}

impl PacketFields for SeenAdvancements {
    const KIND: MessageKind = MessageKind::SeenAdvancements;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        let action = buf.read_var_int()?;
        let tab = read_gated(buf, action == 0, |b| b.read_string())?;
        Ok(Self { action, tab })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, version: ProtocolVersion) -> Result<()> {
        let tab = gated(Self::KIND, "tab", version, self.action == 0, &self.tab)?;
        buf.put_var_int(self.action);
        if let Some(tab) = tab {
            buf.put_string(tab);
        }
        Ok(())
    }
}

impl PacketFields for SetSimulationDistance {
    const KIND: MessageKind = MessageKind::SetSimulationDistance;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            distance: buf.read_var_int()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_var_int(self.distance);
        Ok(())
    }
}

impl PacketFields for Ping {
    const KIND: MessageKind = MessageKind::Ping;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            id: buf.read_i32()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i32(self.id);
        Ok(())
    }
}

impl PacketFields for Pong {
    const KIND: MessageKind = MessageKind::Pong;

    fn read_fields<B: Buf>(buf: &mut B, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            id: buf.read_i32()?,
        })
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B, _version: ProtocolVersion) -> Result<()> {
        buf.put_i32(self.id);
        Ok(())
    }
}

/// Decode the body of a modeled kind. The caller checks for trailing bytes.
pub(crate) fn read_body<B: Buf>(
    kind: MessageKind,
    buf: &mut B,
    version: ProtocolVersion,
) -> Result<Message> {
    let message = match kind {
        MessageKind::Handshake => Message::Handshake(Handshake::read_fields(buf, version)?),
        MessageKind::StatusRequest => {
            Message::StatusRequest(StatusRequest::read_fields(buf, version)?)
        }
        MessageKind::StatusPing => Message::StatusPing(StatusPing::read_fields(buf, version)?),
        MessageKind::StatusResponse => {
            Message::StatusResponse(StatusResponse::read_fields(buf, version)?)
        }
        MessageKind::StatusPong => Message::StatusPong(StatusPong::read_fields(buf, version)?),
        MessageKind::LoginStart => Message::LoginStart(LoginStart::read_fields(buf, version)?),
        MessageKind::LoginDisconnect => {
            Message::LoginDisconnect(LoginDisconnect::read_fields(buf, version)?)
        }
        MessageKind::EncryptionRequest => {
            Message::EncryptionRequest(EncryptionRequest::read_fields(buf, version)?)
        }
        MessageKind::LoginSuccess => {
            Message::LoginSuccess(LoginSuccess::read_fields(buf, version)?)
        }
        MessageKind::SetCompression => {
            Message::SetCompression(SetCompression::read_fields(buf, version)?)
        }
        MessageKind::KeepAliveClientbound => {
            Message::KeepAliveClientbound(KeepAliveClientbound::read_fields(buf, version)?)
        }
        MessageKind::KeepAliveServerbound => {
            Message::KeepAliveServerbound(KeepAliveServerbound::read_fields(buf, version)?)
        }
        MessageKind::PlayDisconnect => {
            Message::PlayDisconnect(PlayDisconnect::read_fields(buf, version)?)
        }
        MessageKind::PlayerPositionAndLook => {
            Message::PlayerPositionAndLook(PlayerPositionAndLook::read_fields(buf, version)?)
        }
        MessageKind::TeleportConfirm => {
            Message::TeleportConfirm(TeleportConfirm::read_fields(buf, version)?)
        }
        MessageKind::PlayerPositionRotation => {
            Message::PlayerPositionRotation(PlayerPositionRotation::read_fields(buf, version)?)
        }
        MessageKind::ConfirmTransactionClientbound => Message::ConfirmTransactionClientbound(
            ConfirmTransactionClientbound::read_fields(buf, version)?,
        ),
        MessageKind::ConfirmTransactionServerbound => Message::ConfirmTransactionServerbound(
            ConfirmTransactionServerbound::read_fields(buf, version)?,
        ),
        MessageKind::ContainerClick => {
            Message::ContainerClick(ContainerClick::read_fields(buf, version)?)
        }
        MessageKind::OpenWindow => Message::OpenWindow(OpenWindow::read_fields(buf, version)?),
        MessageKind::CloseWindowClientbound => {
            Message::CloseWindowClientbound(CloseWindowClientbound::read_fields(buf, version)?)
        }
        MessageKind::CloseWindowServerbound => {
            Message::CloseWindowServerbound(CloseWindowServerbound::read_fields(buf, version)?)
        }
        MessageKind::BlockChange => Message::BlockChange(BlockChange::read_fields(buf, version)?),
        MessageKind::UpdateHealth => {
            Message::UpdateHealth(UpdateHealth::read_fields(buf, version)?)
        }
        MessageKind::ClientStatus => {
            Message::ClientStatus(ClientStatus::read_fields(buf, version)?)
        }
        MessageKind::ChangeDifficulty => {
            Message::ChangeDifficulty(ChangeDifficulty::read_fields(buf, version)?)
        }
        MessageKind::PlayerAbilities => {
            Message::PlayerAbilities(PlayerAbilities::read_fields(buf, version)?)
        }
        MessageKind::ClientSettings => {
            Message::ClientSettings(ClientSettings::read_fields(buf, version)?)
        }
        MessageKind::Chat => Message::Chat(Chat::read_fields(buf, version)?),
        MessageKind::SeenAdvancements => {
            Message::SeenAdvancements(SeenAdvancements::read_fields(buf, version)?)
        }
        MessageKind::SetSimulationDistance => {
            Message::SetSimulationDistance(SetSimulationDistance::read_fields(buf, version)?)
        }
        MessageKind::Ping => Message::Ping(Ping::read_fields(buf, version)?),
        MessageKind::Pong => Message::Pong(Pong::read_fields(buf, version)?),
        MessageKind::Unparsed => {
            return Err(ProtocolError::UnsupportedField {
                field: "id",
                reason: "unparsed packets have no field layout".to_string(),
            });
        }
    };
    Ok(message)
}

/// Encode the body of `message` (everything after the id).
pub(crate) fn write_body<B: BufMut>(
    message: &Message,
    buf: &mut B,
    version: ProtocolVersion,
) -> Result<()> {
    match message {
        Message::Handshake(m) => m.write_fields(buf, version),
        Message::StatusRequest(m) => m.write_fields(buf, version),
        Message::StatusPing(m) => m.write_fields(buf, version),
        Message::StatusResponse(m) => m.write_fields(buf, version),
        Message::StatusPong(m) => m.write_fields(buf, version),
        Message::LoginStart(m) => m.write_fields(buf, version),
        Message::LoginDisconnect(m) => m.write_fields(buf, version),
        Message::EncryptionRequest(m) => m.write_fields(buf, version),
        Message::LoginSuccess(m) => m.write_fields(buf, version),
        Message::SetCompression(m) => m.write_fields(buf, version),
        Message::KeepAliveClientbound(m) => m.write_fields(buf, version),
        Message::KeepAliveServerbound(m) => m.write_fields(buf, version),
        Message::PlayDisconnect(m) => m.write_fields(buf, version),
        Message::PlayerPositionAndLook(m) => m.write_fields(buf, version),
        Message::TeleportConfirm(m) => m.write_fields(buf, version),
        Message::PlayerPositionRotation(m) => m.write_fields(buf, version),
        Message::ConfirmTransactionClientbound(m) => m.write_fields(buf, version),
        Message::ConfirmTransactionServerbound(m) => m.write_fields(buf, version),
        Message::ContainerClick(m) => m.write_fields(buf, version),
        Message::OpenWindow(m) => m.write_fields(buf, version),
        Message::CloseWindowClientbound(m) => m.write_fields(buf, version),
        Message::CloseWindowServerbound(m) => m.write_fields(buf, version),
        Message::BlockChange(m) => m.write_fields(buf, version),
        Message::UpdateHealth(m) => m.write_fields(buf, version),
        Message::ClientStatus(m) => m.write_fields(buf, version),
        Message::ChangeDifficulty(m) => m.write_fields(buf, version),
        Message::PlayerAbilities(m) => m.write_fields(buf, version),
        Message::ClientSettings(m) => m.write_fields(buf, version),
        Message::Chat(m) => m.write_fields(buf, version),
        Message::SeenAdvancements(m) => m.write_fields(buf, version),
        Message::SetSimulationDistance(m) => m.write_fields(buf, version),
        Message::Ping(m) => m.write_fields(buf, version),
        Message::Pong(m) => m.write_fields(buf, version),
        Message::Unparsed(m) => {
            buf.put_slice(&m.payload);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body<T: PacketFields>(value: &T, version: ProtocolVersion) -> Vec<u8> {
        let mut buf = Vec::new();
        value.write_fields(&mut buf, version).unwrap();
        buf
    }

    #[test]
    fn legacy_empty_slot_is_minus_one() {
        let mut buf = Vec::new();
        write_slot(&mut buf, &None, MessageKind::ContainerClick, ProtocolVersion::V1_12_2)
            .unwrap();
        assert_eq!(buf, [0xFF, 0xFF]);
    }

    #[test]
    fn modern_slot_uses_presence_flag() {
        let slot = Some(ItemStack {
            item_id: 1,
            count: 64,
            damage: None,
        });
        let mut buf = Vec::new();
        write_slot(&mut buf, &slot, MessageKind::ContainerClick, ProtocolVersion::V1_18).unwrap();
        assert_eq!(buf, [0x01, 0x01, 0x40, 0x00]);
        assert_eq!(read_slot(&mut buf.as_slice(), ProtocolVersion::V1_18).unwrap(), slot);
    }

    #[test]
    fn non_empty_nbt_is_unsupported() {
        let mut slice: &[u8] = &[0x01, 0x01, 0x01, 0x0A];
        assert!(matches!(
            read_slot(&mut slice, ProtocolVersion::V1_18),
            Err(ProtocolError::UnsupportedField { field: "nbt", .. })
        ));
    }

    #[test]
    fn container_click_gates_follow_version() {
        let v1_16 = ContainerClick::new(ProtocolVersion::V1_16_5, 0, 36, 0, 0);
        // window, slot, button, action, mode, empty slot
        assert_eq!(body(&v1_16, ProtocolVersion::V1_16_5).len(), 1 + 2 + 1 + 2 + 1 + 1);

        let v1_17 = ContainerClick::new(ProtocolVersion::V1_17_1, 0, 36, 0, 0);
        // window, state id, slot, button, mode, changed count, empty slot
        assert_eq!(body(&v1_17, ProtocolVersion::V1_17_1).len(), 1 + 1 + 2 + 1 + 1 + 1 + 1);

        let err = v1_17
            .write_fields(&mut Vec::new(), ProtocolVersion::V1_16_5)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::FieldLayoutMismatch { .. }));
    }

    #[test]
    fn legacy_open_window_reads_horse_id_only_for_horses() {
        let horse = OpenWindow {
            window_id: 3,
            window_type: WindowType::Legacy {
                name: LEGACY_HORSE_WINDOW.into(),
                slot_count: 2,
                horse_entity_id: Some(77),
            },
            title: "{}".into(),
        };
        let bytes = body(&horse, ProtocolVersion::V1_12_2);
        let decoded = OpenWindow::read_fields(&mut bytes.as_slice(), ProtocolVersion::V1_12_2);
        assert_eq!(decoded.unwrap(), horse);

        let chest = OpenWindow {
            window_id: 3,
            window_type: WindowType::Legacy {
                name: "minecraft:chest".into(),
                slot_count: 27,
                horse_entity_id: Some(77),
            },
            title: "{}".into(),
        };
        assert!(chest
            .write_fields(&mut Vec::new(), ProtocolVersion::V1_12_2)
            .is_err());
    }

    #[test]
    fn seen_advancements_tab_follows_action() {
        let closed = SeenAdvancements {
            action: 1,
            tab: Some("story/root".into()),
        };
        assert!(closed
            .write_fields(&mut Vec::new(), ProtocolVersion::V1_18)
            .is_err());
    }

    #[test]
    fn handshake_rejects_unknown_next_state() {
        let hs = Handshake {
            protocol_version: 757,
            server_address: "localhost".into(),
            server_port: 25565,
            next_state: 3,
        };
        assert!(matches!(
            hs.write_fields(&mut Vec::new(), ProtocolVersion::V1_18),
            Err(ProtocolError::InvalidValue { field: "next_state", .. })
        ));
    }

    #[test]
    fn login_uuid_layout_changes_in_1_16() {
        let login = LoginSuccess {
            uuid: Uuid::from_u128(0x1234),
            username: "bot".into(),
        };
        let legacy = body(&login, ProtocolVersion::V1_15_2);
        assert_eq!(legacy[0], 36);
        let modern = body(&login, ProtocolVersion::V1_16_5);
        assert_eq!(modern.len(), 16 + 1 + 3);
        for (bytes, version) in [
            (legacy, ProtocolVersion::V1_15_2),
            (modern, ProtocolVersion::V1_16_5),
        ] {
            let decoded = LoginSuccess::read_fields(&mut bytes.as_slice(), version).unwrap();
            assert_eq!(decoded, login);
        }
    }
}
