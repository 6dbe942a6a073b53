//! Block storage fed by the server and read by physics.

use craftbot_physics::{Aabb, BlockShapes, WorldView};
use craftbot_protocol::{BlockChange, MessageHandler, MessageKind};
use glam::IVec3;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Block state id of air.
pub const AIR: i32 = 0;

/// Collision shapes per block state id.
///
/// Air has no shape. States without an entry use the fallback, a full cube
/// unless configured otherwise.
#[derive(Debug, Clone)]
pub struct BlockShapeRegistry {
    shapes: HashMap<i32, BlockShapes>,
    fallback: BlockShapes,
}

impl Default for BlockShapeRegistry {
    fn default() -> Self {
        let mut shapes = HashMap::new();
        shapes.insert(AIR, BlockShapes::from(Vec::new()));
        Self {
            shapes,
            fallback: BlockShapes::from(vec![Aabb::unit()]),
        }
    }
}

impl BlockShapeRegistry {
    /// Registry with only air registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shapes of `state`. An empty list makes it passable.
    pub fn set(&mut self, state: i32, shapes: Vec<Aabb>) {
        self.shapes.insert(state, BlockShapes::from(shapes));
    }

    /// Make `state` passable.
    pub fn set_passable(&mut self, state: i32) {
        self.set(state, Vec::new());
    }

    /// Shapes used for states without an entry.
    pub fn set_fallback(&mut self, shapes: Vec<Aabb>) {
        self.fallback = BlockShapes::from(shapes);
    }

    /// Shapes of `state`, or `None` when it does not collide.
    pub fn shapes_for(&self, state: i32) -> Option<BlockShapes> {
        let shapes = self.shapes.get(&state).unwrap_or(&self.fallback);
        if shapes.is_empty() {
            None
        } else {
            Some(Arc::clone(shapes))
        }
    }
}

/// Known block states, shared between the receive path and the tick thread.
///
/// Every query takes the lock for that single lookup.
#[derive(Debug)]
pub struct SharedWorld {
    blocks: Mutex<HashMap<IVec3, i32>>,
    shapes: Arc<BlockShapeRegistry>,
}

impl SharedWorld {
    /// Empty world using `shapes` for collisions.
    pub fn new(shapes: Arc<BlockShapeRegistry>) -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            shapes,
        }
    }

    /// Record the state of one block. Air removes the entry.
    pub fn set_block(&self, pos: IVec3, state: i32) {
        let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        if state == AIR {
            blocks.remove(&pos);
        } else {
            blocks.insert(pos, state);
        }
    }

    /// State of the block at `pos`, if known.
    pub fn block_state(&self, pos: IVec3) -> Option<i32> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pos)
            .copied()
    }

    /// Number of non-air blocks known.
    pub fn len(&self) -> usize {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no block is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every block.
    pub fn clear(&self) {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Kinds this world listens to.
    pub const SUBSCRIPTIONS: &'static [MessageKind] = &[MessageKind::BlockChange];
}

impl WorldView for SharedWorld {
    fn block_shapes_at(&self, pos: IVec3) -> Option<BlockShapes> {
        let state = self.block_state(pos)?;
        self.shapes.shapes_for(state)
    }
}

impl MessageHandler for SharedWorld {
    fn on_block_change(&self, msg: &BlockChange) {
        let pos = IVec3::new(msg.position.x, msg.position.y, msg.position.z);
        trace!(?pos, state = msg.block_state, "block changed");
        self.set_block(pos, msg.block_state);
    }
}
