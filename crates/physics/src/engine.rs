//! Swept AABB resolution of the player's per-tick velocity.

use crate::aabb::Aabb;
use crate::player::PlayerState;
use crate::world::WorldView;
use glam::{DVec3, IVec3};
use serde::Serialize;
use tracing::trace;

/// Below this speed on every axis a player that was not moved is left alone.
pub const HAS_MOVED_EPSILON: f64 = 1e-3;
/// Back-off from the contact point so the collider never ends up inside a face.
pub const COLLISION_EPSILON: f64 = 1e-6;
/// Downward acceleration in blocks per tick squared.
pub const GRAVITY: f64 = 0.08;
/// Vertical velocity multiplier applied each tick.
pub const DRAG: f64 = 0.98;

/// What one resolve did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveOutcome {
    /// The fast path was taken; position and velocity are untouched.
    pub skipped: bool,
    /// The player was marked moved, or still had speed after collisions.
    pub moved: bool,
    /// A floor face was hit.
    pub on_ground: bool,
    /// A ceiling face was hit.
    pub hit_ceiling: bool,
    /// Number of shapes that truncated the velocity.
    pub contacts: usize,
}

/// Collision result before it is applied to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Velocity after every contact's truncation and slide.
    pub velocity: DVec3,
    /// A contact normal pointed up.
    pub hit_down: bool,
    /// A contact normal pointed down.
    pub hit_up: bool,
    /// Contacts found.
    pub contacts: usize,
}

/// Stateless player physics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsEngine;

fn is_still(state: &PlayerState) -> bool {
    !state.has_moved && state.velocity.abs().max_element() < HAS_MOVED_EPSILON
}

impl PhysicsEngine {
    /// New engine.
    pub fn new() -> Self {
        Self
    }

    /// Sweep the player's collider through the world and return the slid velocity.
    pub fn collide(&self, state: &PlayerState, world: &dyn WorldView) -> Collision {
        let collider = state.collider();
        let mut velocity = state.velocity;
        let broadphase = collider.swept_bounds(velocity);

        let lo = broadphase.min.floor();
        let hi = broadphase.max.ceil();
        let mut collision = Collision {
            velocity,
            hit_down: false,
            hit_up: false,
            contacts: 0,
        };

        for x in lo.x as i32..hi.x as i32 {
            for y in lo.y as i32..hi.y as i32 {
                for z in lo.z as i32..hi.z as i32 {
                    let block = IVec3::new(x, y, z);
                    let Some(shapes) = world.block_shapes_at(block) else {
                        continue;
                    };
                    let offset = block.as_dvec3();
                    for shape in shapes.iter() {
                        let shape: Aabb = shape.translated(offset);
                        if !broadphase.intersects(&shape) {
                            continue;
                        }
                        let Some(hit) = collider.sweep(velocity, &shape) else {
                            continue;
                        };
                        if hit.time < 1.0 {
                            let remaining = velocity * (1.0 - hit.time);
                            velocity = velocity * (hit.time - COLLISION_EPSILON)
                                + (remaining - hit.normal * remaining.dot(hit.normal));
                            collision.contacts += 1;
                        }
                        if hit.normal.y == 1.0 {
                            collision.hit_down = true;
                        } else if hit.normal.y == -1.0 {
                            collision.hit_up = true;
                        }
                    }
                }
            }
        }

        collision.velocity = velocity;
        collision
    }

    /// Resolve one tick of movement.
    ///
    /// Collides, moves the player, then prepares the next tick's velocity:
    /// horizontal speed is cleared and vertical speed gets gravity and drag
    /// unless the player stands on a block. A player that was not moved and
    /// has no speed is returned untouched.
    pub fn resolve(&self, state: &mut PlayerState, world: &dyn WorldView) -> ResolveOutcome {
        if is_still(state) {
            return ResolveOutcome {
                skipped: true,
                on_ground: state.on_ground,
                ..ResolveOutcome::default()
            };
        }

        let collision = self.collide(state, world);
        state.velocity = collision.velocity;
        state.position += state.velocity;
        state.on_ground = collision.hit_down;
        if collision.hit_up {
            state.velocity.y = 0.0;
        }

        let moved = !is_still(state);
        state.has_moved = false;
        Self::prepare_next_tick(state);

        trace!(
            contacts = collision.contacts,
            on_ground = state.on_ground,
            moved,
            "resolved player movement"
        );
        ResolveOutcome {
            skipped: false,
            moved,
            on_ground: collision.hit_down,
            hit_ceiling: collision.hit_up,
            contacts: collision.contacts,
        }
    }

    /// One full tick: [`resolve`](Self::resolve), plus gravity for an
    /// airborne player the fast path skipped.
    pub fn tick(&self, state: &mut PlayerState, world: &dyn WorldView) -> ResolveOutcome {
        let outcome = self.resolve(state, world);
        if outcome.skipped {
            Self::prepare_next_tick(state);
        }
        outcome
    }

    fn prepare_next_tick(state: &mut PlayerState) {
        state.velocity.x = 0.0;
        state.velocity.z = 0.0;
        state.velocity.y = if state.on_ground {
            0.0
        } else {
            (state.velocity.y - GRAVITY) * DRAG
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BlockShapes;
    use std::collections::HashSet;
    use std::sync::Arc;

    struct Blocks(HashSet<IVec3>);

    impl Blocks {
        fn new(blocks: &[(i32, i32, i32)]) -> Self {
            Self(blocks.iter().map(|&(x, y, z)| IVec3::new(x, y, z)).collect())
        }
    }

    impl WorldView for Blocks {
        fn block_shapes_at(&self, pos: IVec3) -> Option<BlockShapes> {
            self.0.contains(&pos).then(|| Arc::from(vec![Aabb::unit()]))
        }
    }

    #[test]
    fn still_player_is_untouched() {
        let world = Blocks::new(&[(0, 63, 0)]);
        let mut player = PlayerState::at(DVec3::new(0.5, 70.0, 0.5));
        player.velocity = DVec3::new(0.0005, 0.0, -0.0005);
        let before = player.clone();
        let outcome = PhysicsEngine::new().resolve(&mut player, &world);
        assert!(outcome.skipped && !outcome.moved);
        assert_eq!(player, before);
    }

    #[test]
    fn skipped_airborne_player_starts_falling_on_tick() {
        let world = Blocks::new(&[]);
        let mut player = PlayerState::at(DVec3::new(0.5, 70.0, 0.5));
        let outcome = PhysicsEngine::new().tick(&mut player, &world);
        assert!(outcome.skipped);
        assert!((player.velocity.y + GRAVITY * DRAG).abs() < 1e-12);
    }

    #[test]
    fn falling_player_lands_on_floor() {
        let world = Blocks::new(&[(0, 63, 0)]);
        let mut player = PlayerState::at(DVec3::new(0.5, 64.5, 0.5));
        player.velocity = DVec3::new(0.0, -1.0, 0.0);
        let outcome = PhysicsEngine::new().resolve(&mut player, &world);
        assert!(outcome.on_ground && outcome.moved);
        assert!(player.on_ground);
        assert!(player.velocity.y >= 0.0);
        assert!(player.position.y >= 64.0 - 1e-5 && player.position.y < 64.0 + 1e-5);
    }

    #[test]
    fn free_fall_applies_gravity_and_drag() {
        let world = Blocks::new(&[]);
        let mut player = PlayerState::at(DVec3::new(0.5, 70.0, 0.5));
        player.velocity = DVec3::new(0.0, -0.5, 0.0);
        PhysicsEngine::new().resolve(&mut player, &world);
        assert!((player.position.y - 69.5).abs() < 1e-12);
        assert!((player.velocity.y - (-0.5 - GRAVITY) * DRAG).abs() < 1e-12);
        assert!(!player.on_ground);
    }

    #[test]
    fn wall_contact_keeps_tangential_velocity() {
        // Wall one block east of the player, velocity into it and along it.
        let world = Blocks::new(&[
            (1, 64, -1),
            (1, 64, 0),
            (1, 64, 1),
            (1, 65, -1),
            (1, 65, 0),
            (1, 65, 1),
        ]);
        let mut player = PlayerState::at(DVec3::new(0.5, 64.0, 0.5));
        player.on_ground = true;
        player.velocity = DVec3::new(0.5, 0.0, 0.25);
        let collision = PhysicsEngine::new().collide(&player, &world);
        assert!(collision.contacts >= 1);
        // Only 0.2 of the 0.5 east travel fits before the wall.
        assert!(collision.velocity.x > 0.19 && collision.velocity.x < 0.2);
        assert!((collision.velocity.z - 0.25).abs() < 1e-6);
        assert!(!collision.hit_down);
    }

    #[test]
    fn ceiling_hit_zeroes_vertical_speed() {
        let world = Blocks::new(&[(0, 66, 0)]);
        let mut player = PlayerState::at(DVec3::new(0.5, 64.0, 0.5));
        player.velocity = DVec3::new(0.0, 0.42, 0.0);
        let outcome = PhysicsEngine::new().resolve(&mut player, &world);
        assert!(outcome.hit_ceiling);
        assert!(player.position.y + 1.8 <= 66.0);
        // Zeroed by the hit, then gravity for the next tick.
        assert!((player.velocity.y + GRAVITY * DRAG).abs() < 1e-12);
    }

    #[test]
    fn missing_blocks_never_collide() {
        struct Unloaded;
        impl WorldView for Unloaded {
            fn block_shapes_at(&self, _pos: IVec3) -> Option<BlockShapes> {
                None
            }
        }
        let mut player = PlayerState::at(DVec3::new(0.5, 64.0, 0.5));
        player.velocity = DVec3::new(0.0, -3.0, 0.0);
        let outcome = PhysicsEngine::new().resolve(&mut player, &Unloaded);
        assert_eq!(outcome.contacts, 0);
        assert!((player.position.y - 61.0).abs() < 1e-12);
    }

    #[test]
    fn teleported_player_reports_movement_once() {
        let world = Blocks::new(&[(0, 63, 0)]);
        let mut player = PlayerState::at(DVec3::new(0.5, 64.0, 0.5));
        player.on_ground = true;
        player.teleport(DVec3::new(0.5, 64.0, 0.5), 0.0, 0.0);
        let engine = PhysicsEngine::new();
        assert!(engine.tick(&mut player, &world).moved);
        assert!(!engine.tick(&mut player, &world).moved);
    }
}
