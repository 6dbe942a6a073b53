#![warn(missing_docs)]
//! Versioned game protocol: wire primitives, packet tables, codec, framing and dispatch.

mod codec;
mod connection;
mod dispatch;
mod error;
mod fields;
mod frame;
mod message;
mod state;
mod table;
mod transport;
mod version;
pub mod wire;

pub use codec::PacketCodec;
pub use connection::ConnectionStateMachine;
pub use dispatch::{dispatch_message, DispatchError, DispatchRegistry, MessageHandler, SubscriberId};
pub use error::ProtocolError;
pub use frame::{frame, FrameSplitter, MAX_FRAME_LEN};
pub use message::*;
pub use state::{ConnectionState, Direction};
pub use table::PacketTable;
pub use transport::Transport;
pub use version::ProtocolVersion;
