//! Deterministic in-memory transport for tests and demos.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{ReadEvent, Transport};
use crate::error::Result;

#[derive(Debug)]
struct Step {
    /// Text a write must contain to trigger this step; `None` fires immediately.
    trigger: Option<String>,
    reply: Vec<u8>,
}

/// A fake device driven by a script of outputs and write-triggered replies.
///
/// Steps run in order. An output step is readable as soon as every step
/// before it has fired; a reply step fires when a write contains its
/// trigger text. Reads with nothing ready return [`ReadEvent::Timeout`]
/// immediately, or [`ReadEvent::Eof`] once the script is exhausted and
/// [`then_close`](Self::then_close) was requested.
///
/// # Example
///
/// ```rust
/// use netexpect::transport::ScriptedTransport;
///
/// let device = ScriptedTransport::new()
///     .output("login: ")
///     .on_write("admin", "Password: ")
///     .on_write("\r", "\r\nrouter#");
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    steps: VecDeque<Step>,
    readable: VecDeque<Vec<u8>>,
    close_when_done: bool,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: bool,
}

impl ScriptedTransport {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `text` once all earlier steps have fired.
    pub fn output(mut self, text: impl AsRef<[u8]>) -> Self {
        self.steps.push_back(Step {
            trigger: None,
            reply: text.as_ref().to_vec(),
        });
        self
    }

    /// Emit `reply` after a write containing `trigger`.
    pub fn on_write(mut self, trigger: impl Into<String>, reply: impl AsRef<[u8]>) -> Self {
        self.steps.push_back(Step {
            trigger: Some(trigger.into()),
            reply: reply.as_ref().to_vec(),
        });
        self
    }

    /// Report EOF once every step has fired and its output was read.
    pub fn then_close(mut self) -> Self {
        self.close_when_done = true;
        self
    }

    /// Append another script's steps after this one's.
    pub fn append(&mut self, other: ScriptedTransport) {
        self.steps.extend(other.steps);
        self.close_when_done |= other.close_when_done;
    }

    /// Shared log of every write, for assertions after the transport moved.
    pub fn writes(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.writes)
    }

    /// Move leading untriggered steps into the readable queue.
    fn release_outputs(&mut self) {
        while self.steps.front().is_some_and(|s| s.trigger.is_none()) {
            if let Some(step) = self.steps.pop_front() {
                self.readable.push_back(step.reply);
            }
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn read(&mut self, _timeout: Duration) -> Result<ReadEvent> {
        self.release_outputs();
        if let Some(data) = self.readable.pop_front() {
            return Ok(ReadEvent::Data(data));
        }
        if self.closed || (self.close_when_done && self.steps.is_empty()) {
            return Ok(ReadEvent::Eof);
        }
        Ok(ReadEvent::Timeout)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(data.to_vec());

        self.release_outputs();
        let text = String::from_utf8_lossy(data);
        let fires = self
            .steps
            .front()
            .and_then(|s| s.trigger.as_deref())
            .is_some_and(|trigger| text.contains(trigger));
        if fires {
            if let Some(step) = self.steps.pop_front() {
                self.readable.push_back(step.reply);
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn test_outputs_then_timeout() {
        let mut t = ScriptedTransport::new().output("a").output("b");
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Data(b"a".to_vec()));
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Data(b"b".to_vec()));
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Timeout);
    }

    #[tokio::test]
    async fn test_reply_waits_for_trigger() {
        let mut t = ScriptedTransport::new().on_write("show", "output");
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Timeout);

        t.write(b"other\r").await.unwrap();
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Timeout);

        t.write(b"show clock\r").await.unwrap();
        assert_eq!(
            t.read(WAIT).await.unwrap(),
            ReadEvent::Data(b"output".to_vec())
        );
    }

    #[tokio::test]
    async fn test_then_close_and_write_log() {
        let mut t = ScriptedTransport::new()
            .on_write("exit", "logout\r\n")
            .then_close();
        let writes = t.writes();

        t.write(b"exit\r").await.unwrap();
        assert!(matches!(t.read(WAIT).await.unwrap(), ReadEvent::Data(_)));
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Eof);
        assert_eq!(writes.lock().unwrap().as_slice(), [b"exit\r".to_vec()]);
    }
}
