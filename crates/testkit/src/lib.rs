#![warn(missing_docs)]
//! Test surfaces: recording transport, canned worlds and packet logs.

mod transport;
mod world;

use anyhow::Result;
use chrono::{DateTime, Utc};
use craftbot_protocol::{ConnectionState, Direction, Message};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use transport::*;
pub use world::*;

/// One logged packet.
#[derive(Debug, Serialize)]
pub struct PacketRecord {
    /// Wall-clock time of the record.
    pub at: DateTime<Utc>,
    /// Who sent the packet.
    pub direction: Direction,
    /// State the packet belongs to.
    pub state: ConnectionState,
    /// Structured view of the message.
    pub message: serde_json::Value,
}

impl PacketRecord {
    /// Record `message` as seen now.
    pub fn new(direction: Direction, message: &Message) -> Self {
        Self {
            at: Utc::now(),
            direction,
            state: message.kind().state(),
            message: message.diagnostic(),
        }
    }
}

/// Writes packets as newline-delimited JSON.
pub struct PacketLogSink {
    file: File,
    written: usize,
}

impl PacketLogSink {
    /// Create a sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
            written: 0,
        })
    }

    /// Append one packet.
    pub fn write(&mut self, direction: Direction, message: &Message) -> Result<()> {
        let line = serde_json::to_string(&PacketRecord::new(direction, message))?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written.
    pub fn len(&self) -> usize {
        self.written
    }

    /// Whether nothing was written.
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
}

/// Route `tracing` output to the test harness. Safe to call from every test.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // A second call finds the subscriber already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
