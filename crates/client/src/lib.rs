#![warn(missing_docs)]
//! Protocol client session: login, play-state subsystems and the tick loop.

mod client;
pub mod config;
mod context;
pub mod entity;
mod error;
pub mod inventory;
mod outbox;
pub mod tick;
pub mod transaction;
pub mod world;

pub use client::{Client, GameInfo, MAX_USERNAME_LEN};
pub use config::ClientConfig;
pub use context::ClientContext;
pub use entity::{EntityManager, Health};
pub use error::{ClientError, Result};
pub use inventory::{InventoryManager, Window, PLAYER_WINDOW};
pub use outbox::Outbox;
pub use tick::{PositionSync, TickScheduler, TickSettings, TickShared};
pub use transaction::{AckOutcome, PendingTransaction, TransactionTracker};
pub use world::{BlockShapeRegistry, SharedWorld, AIR};
