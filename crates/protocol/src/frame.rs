//! Length-prefixed framing.
//!
//! Frame format: [length: VarInt][body: length bytes]. Compression and
//! encryption sit below this layer and are the transport's job.

use crate::error::ProtocolError;
use crate::wire::{WireWrite, MAX_VAR_INT_LEN};
use bytes::{Buf, Bytes, BytesMut};

/// Largest body accepted from a peer.
pub const MAX_FRAME_LEN: usize = 2 * 1024 * 1024;

/// Prefix `body` with its VarInt length.
pub fn frame(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + MAX_VAR_INT_LEN);
    out.put_var_int(body.len() as i32);
    out.extend_from_slice(body);
    out
}

/// Reassembles frames from arbitrarily chunked input.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buf: BytesMut,
}

impl FrameSplitter {
    /// Empty splitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes held that do not yet form a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Pop the next complete frame body, if one is buffered.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        let Some((len, header)) = self.peek_len()? else {
            return Ok(None);
        };
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(ProtocolError::malformed(format!(
                "frame length {len} outside 1..={MAX_FRAME_LEN}"
            )));
        }
        if self.buf.len() < header + len {
            return Ok(None);
        }
        self.buf.advance(header);
        Ok(Some(self.buf.split_to(len).freeze()))
    }

    /// Decode the length prefix without consuming it.
    fn peek_len(&self) -> Result<Option<(usize, usize)>, ProtocolError> {
        let mut value: u32 = 0;
        for (group, byte) in self.buf.iter().take(MAX_VAR_INT_LEN).enumerate() {
            value |= u32::from(byte & 0x7F) << (7 * group);
            if byte & 0x80 == 0 {
                let len = value as i32;
                let len = usize::try_from(len).map_err(|_| {
                    ProtocolError::malformed(format!("negative frame length {len}"))
                })?;
                return Ok(Some((len, group + 1)));
            }
        }
        if self.buf.len() >= MAX_VAR_INT_LEN {
            return Err(ProtocolError::malformed("frame length VarInt longer than 5 bytes"));
        }
        Ok(None)
    }
}
