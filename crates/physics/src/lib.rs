#![warn(missing_docs)]
//! Player collision physics (AABB sweeps against block shapes).

mod aabb;
mod engine;
mod player;
mod world;

pub use aabb::{Aabb, SweepHit};
pub use engine::{
    Collision, PhysicsEngine, ResolveOutcome, COLLISION_EPSILON, DRAG, GRAVITY, HAS_MOVED_EPSILON,
};
pub use player::{PlayerState, PLAYER_HEIGHT, PLAYER_WIDTH};
pub use world::{BlockShapes, WorldView};
