//! The local player and its health.

use craftbot_physics::PlayerState;
use craftbot_protocol::{MessageHandler, MessageKind, PlayerPositionAndLook, UpdateHealth};
use glam::DVec3;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Last health values sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Health {
    /// Health points.
    pub health: f32,
    /// Food level.
    pub food: i32,
    /// Food saturation.
    pub saturation: f32,
}

/// Owns the local player's state.
#[derive(Debug, Default)]
pub struct EntityManager {
    player: Arc<Mutex<PlayerState>>,
    health: Mutex<Option<Health>>,
}

impl EntityManager {
    /// Kinds this manager listens to.
    pub const SUBSCRIPTIONS: &'static [MessageKind] = &[
        MessageKind::PlayerPositionAndLook,
        MessageKind::UpdateHealth,
    ];

    /// Manager with a default player.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the player state.
    pub fn player(&self) -> Arc<Mutex<PlayerState>> {
        Arc::clone(&self.player)
    }

    /// Lock the player state.
    pub fn lock_player(&self) -> MutexGuard<'_, PlayerState> {
        self.player.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last known health.
    pub fn health(&self) -> Option<Health> {
        *self.health.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageHandler for EntityManager {
    fn on_player_position_and_look(&self, msg: &PlayerPositionAndLook) {
        let mut player = self.lock_player();
        let relative = |bit: i8, current: f64, value: f64| {
            if msg.is_relative(bit) {
                current + value
            } else {
                value
            }
        };
        let position = DVec3::new(
            relative(PlayerPositionAndLook::RELATIVE_X, player.position.x, msg.x),
            relative(PlayerPositionAndLook::RELATIVE_Y, player.position.y, msg.y),
            relative(PlayerPositionAndLook::RELATIVE_Z, player.position.z, msg.z),
        );
        let yaw = relative(
            PlayerPositionAndLook::RELATIVE_YAW,
            f64::from(player.yaw),
            f64::from(msg.yaw),
        ) as f32;
        let pitch = relative(
            PlayerPositionAndLook::RELATIVE_PITCH,
            f64::from(player.pitch),
            f64::from(msg.pitch),
        ) as f32;
        player.teleport(position, yaw, pitch);
        debug!(?position, yaw, pitch, "player teleported");
    }

    fn on_update_health(&self, msg: &UpdateHealth) {
        *self.health.lock().unwrap_or_else(PoisonError::into_inner) = Some(Health {
            health: msg.health,
            food: msg.food,
            saturation: msg.saturation,
        });
    }
}
