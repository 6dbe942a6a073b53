//! Physical state of the local player.

use crate::aabb::Aabb;
use glam::DVec3;
use serde::Serialize;

/// Player collider width (x and z).
pub const PLAYER_WIDTH: f64 = 0.6;
/// Player collider height.
pub const PLAYER_HEIGHT: f64 = 1.8;

/// Kinematic state of the local player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    /// Feet position.
    pub position: DVec3,
    /// Velocity in blocks per tick.
    pub velocity: DVec3,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Standing on a block after the last resolve.
    pub on_ground: bool,
    /// Moved by something other than physics since the last tick.
    pub has_moved: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            has_moved: false,
        }
    }
}

impl PlayerState {
    /// Player standing at `position`.
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Collision box around the feet position.
    pub fn collider(&self) -> Aabb {
        let half = PLAYER_WIDTH / 2.0;
        Aabb::new(
            self.position - DVec3::new(half, 0.0, half),
            self.position + DVec3::new(half, PLAYER_HEIGHT, half),
        )
    }

    /// Place the player and mark the move for the next position sync.
    pub fn teleport(&mut self, position: DVec3, yaw: f32, pitch: f32) {
        self.position = position;
        self.yaw = yaw;
        self.pitch = pitch;
        self.velocity = DVec3::ZERO;
        self.has_moved = true;
    }
}
