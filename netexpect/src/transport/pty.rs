//! Child process transport on a pseudo-terminal.

use std::io::{Read, Write};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;

use super::config::SpawnConfig;
use super::{ReadEvent, Transport};
use crate::error::{Result, TransportError};

/// Transport that owns a spawned child process and its PTY.
///
/// The PTY master is read on a dedicated blocking thread that forwards
/// chunks over a channel, so reads can be awaited with a timeout.
pub struct PtyTransport {
    /// Spawn configuration, kept for log lines.
    config: SpawnConfig,

    /// Master side of the PTY; dropping it hangs up the child.
    master: Box<dyn MasterPty + Send>,

    /// Writer into the PTY.
    writer: Box<dyn Write + Send>,

    /// The spawned child.
    child: Box<dyn Child + Send + Sync>,

    /// Chunks read by the reader thread.
    output: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl PtyTransport {
    /// Spawn `config.program` on a fresh PTY.
    pub fn spawn(config: SpawnConfig) -> Result<Self> {
        let spawn_error = |reason: String| TransportError::Spawn {
            program: config.program.clone(),
            reason,
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: config.terminal_height,
                cols: config.terminal_width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| spawn_error(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&config.program);
        cmd.args(&config.args);
        cmd.env("TERM", "vt100");
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| spawn_error(e.to_string()))?;
        // The child holds its own copy of the slave side.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_error(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_error(e.to_string()))?;

        let (tx, output) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name(format!("pty-reader-{}", config.program))
            .spawn(move || read_loop(reader, tx))
            .map_err(|e| spawn_error(e.to_string()))?;

        debug!(
            "spawned '{}' (pid {:?})",
            config.command_line(),
            child.process_id()
        );

        Ok(Self {
            config,
            master: pair.master,
            writer,
            child,
            output,
        })
    }

    /// Process id of the child, if the platform reports one.
    pub fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Resize the PTY window.
    pub fn resize(&self, width: u16, height: u16) -> Result<()> {
        self.master
            .resize(PtySize {
                rows: height,
                cols: width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TransportError::Io(std::io::Error::other(e.to_string())).into())
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        // An interrupted script must not leave ssh or telnet running.
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
    }
}

/// Forward PTY output until EOF or a read error.
fn read_loop(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(chunk[..n].to_vec()).is_err() {
                    break;
                }
            }
            // EIO is how Linux reports a hung-up PTY.
            Err(_) => break,
        }
    }
}

#[async_trait]
impl Transport for PtyTransport {
    async fn read(&mut self, timeout: Duration) -> Result<ReadEvent> {
        match tokio::time::timeout(timeout, self.output.recv()).await {
            Ok(Some(data)) => Ok(ReadEvent::Data(data)),
            Ok(None) => Ok(ReadEvent::Eof),
            Err(_) => Ok(ReadEvent::Timeout),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).map_err(TransportError::Io)?;
        self.writer.flush().map_err(TransportError::Io)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("'{}' already exited: {:?}", self.config.program, status);
            }
            Ok(None) => {
                if let Err(e) = self.child.kill() {
                    warn!("failed to kill '{}': {}", self.config.program, e);
                }
            }
            Err(e) => warn!("failed to query '{}': {}", self.config.program, e),
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("pty:{}", self.config.command_line())
    }
}
