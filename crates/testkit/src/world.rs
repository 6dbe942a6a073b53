//! Canned worlds for physics and tick tests.

use craftbot_physics::{Aabb, BlockShapes, WorldView};
use glam::IVec3;
use std::collections::HashSet;

/// Static world of full cubes: an optional infinite floor plus single blocks.
#[derive(Debug, Clone)]
pub struct FlatWorld {
    floor_y: Option<i32>,
    blocks: HashSet<IVec3>,
    cube: BlockShapes,
}

impl Default for FlatWorld {
    fn default() -> Self {
        Self {
            floor_y: None,
            blocks: HashSet::new(),
            cube: BlockShapes::from(vec![Aabb::unit()]),
        }
    }
}

impl FlatWorld {
    /// World with no blocks at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fill the whole layer `y` with solid blocks.
    pub fn with_floor(mut self, y: i32) -> Self {
        self.floor_y = Some(y);
        self
    }

    /// Add one solid block.
    pub fn with_block(mut self, pos: IVec3) -> Self {
        self.blocks.insert(pos);
        self
    }

    /// Add a vertical wall segment at `x`, spanning `z` and `y` inclusive.
    pub fn with_wall_x(mut self, x: i32, ys: (i32, i32), zs: (i32, i32)) -> Self {
        for y in ys.0..=ys.1 {
            for z in zs.0..=zs.1 {
                self.blocks.insert(IVec3::new(x, y, z));
            }
        }
        self
    }

    fn is_solid(&self, pos: IVec3) -> bool {
        self.floor_y == Some(pos.y) || self.blocks.contains(&pos)
    }
}

impl WorldView for FlatWorld {
    fn block_shapes_at(&self, pos: IVec3) -> Option<BlockShapes> {
        self.is_solid(pos).then(|| BlockShapes::clone(&self.cube))
    }
}
