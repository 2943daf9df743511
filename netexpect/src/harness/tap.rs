//! Recording hooks: the session-side transport tap and the stream writers.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::capture::{Payload, TestCapture, TransportEvent};

/// Shared, lockable capture for one harness run.
pub type SharedCapture = Arc<Mutex<TestCapture>>;

pub(crate) fn lock(capture: &SharedCapture) -> MutexGuard<'_, TestCapture> {
    // A panic elsewhere must not cost us the recording.
    capture.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Appends one component's transport events to the shared capture.
///
/// Attached to a session in record mode. Writes arrive already masked, so
/// secrets never reach the capture.
#[derive(Debug, Clone)]
pub struct CaptureTap {
    capture: SharedCapture,
    component: String,
}

impl CaptureTap {
    pub fn new(capture: SharedCapture, component: impl Into<String>) -> Self {
        Self {
            capture,
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn read(&self, data: &[u8]) {
        self.push(TransportEvent::Read {
            data: Payload::from(data),
        });
    }

    pub fn write(&self, masked: &[u8]) {
        self.push(TransportEvent::Write {
            data: Payload::from(masked),
        });
    }

    pub fn timeout(&self) {
        self.push(TransportEvent::Timeout);
    }

    pub fn eof(&self) {
        self.push(TransportEvent::Eof);
    }

    fn push(&self, event: TransportEvent) {
        lock(&self.capture)
            .component_mut(&self.component)
            .events
            .push(event);
    }
}

/// Which process stream a [`HarnessWriter`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Writer for the script's stdout or stderr.
///
/// Every chunk is appended to the capture. Unless the harness is in test
/// mode the chunk is also passed through to the real stream.
#[derive(Debug, Clone)]
pub struct HarnessWriter {
    capture: SharedCapture,
    stream: Stream,
    echo: bool,
}

impl HarnessWriter {
    pub(crate) fn new(capture: SharedCapture, stream: Stream, echo: bool) -> Self {
        Self {
            capture,
            stream,
            echo,
        }
    }
}

impl Write for HarnessWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = String::from_utf8_lossy(buf).into_owned();
        {
            let mut capture = lock(&self.capture);
            match self.stream {
                Stream::Stdout => capture.harness.stdout.push(chunk),
                Stream::Stderr => capture.harness.stderr.push(chunk),
            }
        }
        if self.echo {
            match self.stream {
                Stream::Stdout => io::stdout().write_all(buf)?,
                Stream::Stderr => io::stderr().write_all(buf)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.echo {
            match self.stream {
                Stream::Stdout => io::stdout().flush()?,
                Stream::Stderr => io::stderr().flush()?,
            }
        }
        Ok(())
    }
}
