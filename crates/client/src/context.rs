//! Startup context shared by a client's subsystems.

use crate::config::ClientConfig;
use crate::world::BlockShapeRegistry;
use std::sync::Arc;

/// Everything a client needs at construction.
///
/// Shared read-only data lives here; nothing is global.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Startup settings.
    pub config: ClientConfig,
    /// Collision shapes per block state.
    pub shapes: Arc<BlockShapeRegistry>,
}

impl ClientContext {
    /// Context with the default shape registry.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            shapes: Arc::new(BlockShapeRegistry::default()),
        }
    }

    /// Replace the shape registry.
    pub fn with_shapes(mut self, shapes: BlockShapeRegistry) -> Self {
        self.shapes = Arc::new(shapes);
        self
    }
}
