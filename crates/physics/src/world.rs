//! Block shape lookups used by collision.

use crate::aabb::Aabb;
use glam::IVec3;
use std::sync::Arc;

/// Collision boxes of one block, relative to its minimum corner.
pub type BlockShapes = Arc<[Aabb]>;

/// Read access to block collision shapes.
///
/// Implementations lock per query; physics calls this once per candidate
/// block and never holds the world across a whole tick.
pub trait WorldView: Send + Sync {
    /// Shapes of the solid block at `pos`, or `None` for air, non-solid
    /// blocks and chunks that are not loaded.
    fn block_shapes_at(&self, pos: IVec3) -> Option<BlockShapes>;
}
