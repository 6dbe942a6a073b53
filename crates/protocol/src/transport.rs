//! Byte sink the client writes framed packets into.

use std::io;

/// Outbound side of a connection.
///
/// Implementations own the socket plus any compression or encryption layers.
/// They must be callable from the receive path and the tick thread at once.
pub trait Transport: Send + Sync {
    /// Write one framed packet.
    fn send_bytes(&self, bytes: &[u8]) -> io::Result<()>;

    /// Enable compression for packets at least `threshold` bytes long.
    fn set_compression_threshold(&self, _threshold: i32) {}

    /// Close the connection. Must be idempotent.
    fn close(&self) {}
}
