//! In-memory transport that records every frame the client writes.

use anyhow::{anyhow, Context, Result};
use craftbot_protocol::{
    frame, ConnectionState, Direction, FrameSplitter, Message, PacketCodec, Transport,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Records written frames and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    frames: Mutex<Vec<Vec<u8>>>,
    written: Condvar,
    compression: Mutex<Option<i32>>,
    closed: AtomicBool,
    failing: AtomicBool,
}

impl RecordingTransport {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later writes fail with `BrokenPipe`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every frame written so far, length prefix included.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Position to pass to [`RecordingTransport::messages_since`].
    pub fn mark(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Decode the serverbound frames written after `mark` as packets of `state`.
    pub fn messages_since(
        &self,
        mark: usize,
        codec: &PacketCodec,
        state: ConnectionState,
    ) -> Result<Vec<Message>> {
        let frames = self.frames();
        frames
            .get(mark..)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(offset, bytes)| {
                let body = unframe(bytes).with_context(|| format!("frame {}", mark + offset))?;
                codec
                    .decode(Direction::Serverbound, state, &body)
                    .with_context(|| format!("decoding frame {} in {state} state", mark + offset))
            })
            .collect()
    }

    /// Block until at least `count` frames were written or `timeout` passes.
    pub fn wait_for_frames(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        while frames.len() < count {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            frames = self
                .written
                .wait_timeout(frames, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Threshold received through [`Transport::set_compression_threshold`].
    pub fn compression_threshold(&self) -> Option<i32> {
        *self
            .compression
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether [`Transport::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            debug!(len = bytes.len(), "recording transport refused a frame");
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "recording transport failing"));
        }
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        frames.push(bytes.to_vec());
        trace!(index = frames.len() - 1, len = bytes.len(), "frame recorded");
        self.written.notify_all();
        Ok(())
    }

    fn set_compression_threshold(&self, threshold: i32) {
        *self
            .compression
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(threshold);
        debug!(threshold, "recording transport compression set");
    }

    fn close(&self) {
        let already = self.closed.swap(true, Ordering::SeqCst);
        debug!(already, "recording transport closed");
    }
}

fn unframe(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut splitter = FrameSplitter::new();
    splitter.push(bytes);
    let body = splitter
        .next_frame()?
        .ok_or_else(|| anyhow!("incomplete frame of {} bytes", bytes.len()))?;
    if splitter.buffered() > 0 {
        return Err(anyhow!("{} bytes after the frame", splitter.buffered()));
    }
    Ok(body.to_vec())
}

/// Encode and frame clientbound messages the way a server would send them.
pub fn server_bytes(codec: &PacketCodec, messages: &[Message]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for message in messages {
        let body = codec
            .encode(message)
            .with_context(|| format!("encoding {:?}", message.kind()))?;
        out.extend_from_slice(&frame(&body));
    }
    Ok(out)
}
