//! Transport layer: the only place raw bytes cross the process boundary.
//!
//! A transport is a byte stream with timed reads. The real one spawns a
//! child (usually `ssh` or `telnet`) on a pseudo-terminal; the scripted and
//! replay transports stand in for it in tests and replays.

pub mod config;
mod pty;
mod replay;
mod scripted;

use std::time::Duration;

use async_trait::async_trait;

pub use config::SpawnConfig;
pub use pty::PtyTransport;
pub use replay::ReplayTransport;
pub use scripted::ScriptedTransport;

use crate::error::Result;

/// Outcome of a single timed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Bytes arrived.
    Data(Vec<u8>),

    /// Nothing arrived before the timeout. Not an error.
    Timeout,

    /// The other side closed the stream.
    Eof,
}

/// Byte stream underneath a session.
#[async_trait]
pub trait Transport: Send {
    /// Wait up to `timeout` for the next chunk of output.
    async fn read(&mut self, timeout: Duration) -> Result<ReadEvent>;

    /// Write bytes verbatim.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Release the underlying process or stream.
    async fn close(&mut self) -> Result<()>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}
