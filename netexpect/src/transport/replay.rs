//! Transport that serves a recorded session instead of a live device.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use super::{ReadEvent, Transport};
use crate::channel::MASK;
use crate::error::{HarnessError, Result};
use crate::harness::capture::TransportEvent;

/// Replays a component's recorded transport events in order.
///
/// Reads return the recorded chunks, timeouts and EOF exactly where they
/// happened in the recording, without waiting. Writes are discarded; in
/// strict mode a write that differs from the recorded one is an error.
#[derive(Debug)]
pub struct ReplayTransport {
    component: String,
    events: VecDeque<TransportEvent>,
    strict: bool,
}

impl ReplayTransport {
    /// Create a replay over `events` for the named component.
    pub fn new(component: impl Into<String>, events: Vec<TransportEvent>) -> Self {
        Self {
            component: component.into(),
            events: events.into(),
            strict: false,
        }
    }

    /// Fail on writes that differ from the recording.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Number of recorded events not yet replayed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn read(&mut self, _timeout: Duration) -> Result<ReadEvent> {
        while let Some(event) = self.events.pop_front() {
            match event {
                TransportEvent::Read { data } => return Ok(ReadEvent::Data(data.0)),
                TransportEvent::Timeout => return Ok(ReadEvent::Timeout),
                TransportEvent::Eof => return Ok(ReadEvent::Eof),
                TransportEvent::Write { data } => {
                    warn!(
                        "[{}] replay skipped recorded write {:?} the script never made",
                        self.component,
                        data.as_str_lossy()
                    );
                }
            }
        }
        Ok(ReadEvent::Eof)
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let actual = String::from_utf8_lossy(data).into_owned();
        match self.events.front() {
            Some(TransportEvent::Write { data: recorded }) => {
                let expected = recorded.as_str_lossy().into_owned();
                if expected != actual && !expected.contains(MASK) {
                    if self.strict {
                        return Err(HarnessError::Diverged {
                            component: self.component.clone(),
                            expected,
                            actual,
                        }
                        .into());
                    }
                    warn!(
                        "[{}] replay write {:?} differs from recorded {:?}",
                        self.component, actual, expected
                    );
                }
                self.events.pop_front();
            }
            _ => {
                if self.strict {
                    return Err(HarnessError::Diverged {
                        component: self.component.clone(),
                        expected: String::new(),
                        actual,
                    }
                    .into());
                }
                debug!("[{}] replay discarded unrecorded write", self.component);
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.events.is_empty() {
            debug!(
                "[{}] replay closed with {} recorded events left",
                self.component,
                self.events.len()
            );
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("replay:{}", self.component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::capture::Payload;

    const WAIT: Duration = Duration::from_secs(5);

    fn read(text: &str) -> TransportEvent {
        TransportEvent::Read {
            data: Payload::from(text),
        }
    }

    fn write(text: &str) -> TransportEvent {
        TransportEvent::Write {
            data: Payload::from(text),
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_without_waiting() {
        let mut t = ReplayTransport::new(
            "session",
            vec![read("login: "), write("admin\r"), TransportEvent::Timeout],
        );
        assert_eq!(
            t.read(WAIT).await.unwrap(),
            ReadEvent::Data(b"login: ".to_vec())
        );
        t.write(b"admin\r").await.unwrap();
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Timeout);
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Eof);
    }

    #[tokio::test]
    async fn test_masked_write_accepted_in_strict_mode() {
        let mut t = ReplayTransport::new("session", vec![write("********\r")]).strict(true);
        t.write(b"different-secret\r").await.unwrap();
        assert_eq!(t.remaining(), 0);
    }

    #[tokio::test]
    async fn test_strict_divergence() {
        let mut t = ReplayTransport::new("session", vec![write("show version\r")]).strict(true);
        let err = t.write(b"show clock\r").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Harness(HarnessError::Diverged { .. })
        ));
    }

    #[tokio::test]
    async fn test_lenient_skips_unmade_write() {
        let mut t = ReplayTransport::new("session", vec![write("terminal length 0\r"), read("x")]);
        assert_eq!(t.read(WAIT).await.unwrap(), ReadEvent::Data(b"x".to_vec()));
    }
}
