//! Record/replay/test harness.
//!
//! One [`Harness`] per process. In record mode it captures every session's
//! transport traffic, the script's stdout and stderr, and the resolved
//! options into a single file. In replay mode it serves sessions from that
//! file instead of spawning anything; test mode additionally compares the
//! new stdout and stderr against the recording.
//!
//! ```rust,no_run
//! use netexpect::harness::{Harness, Mode, Verdict};
//! use netexpect::driver::{Credentials, SessionBuilder};
//! use std::io::Write;
//!
//! # async fn example() -> Result<(), netexpect::Error> {
//! let harness = Harness::new(Mode::Record { path: "run.json".into() })?;
//! let config = SessionBuilder::new().build()?;
//! let mut session = harness.connect("router", config)?;
//! session.login(&Credentials::new("admin", "secret")).await?;
//! let response = session.command("show version").await?;
//! write!(harness.stdout(), "{}", response.result).ok();
//! session.close().await?;
//! assert!(matches!(harness.finish()?, Verdict::Recorded(_)));
//! # Ok(())
//! # }
//! ```

pub mod capture;
mod diff;
mod tap;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};

pub use capture::{OPTIONS_COMPONENT, REDACTED, TestCapture, TransportEvent};
pub use diff::{Diff, DiffLine, filter_volatile};
pub use tap::{CaptureTap, HarnessWriter, SharedCapture, Stream};

use crate::driver::{Session, SessionConfig};
use crate::error::{HarnessError, Result};
use crate::transport::ReplayTransport;

/// What the harness does with sessions and streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Plain run: spawn sessions, capture nothing to disk.
    Live,
    /// Spawn sessions and write everything to `path` on finish.
    Record { path: PathBuf },
    /// Serve sessions from `path`. With `test`, diff the output on finish.
    Replay { path: PathBuf, test: bool },
}

/// How a harness run ended.
#[derive(Debug)]
pub enum Verdict {
    /// Nothing to report.
    Done,
    /// The capture was written here.
    Recorded(PathBuf),
    /// Test mode: new output matched the recording.
    Passed,
    /// Test mode: new output differs; one diff per differing stream.
    Failed(Vec<Diff>),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Process-wide record/replay context.
#[derive(Debug)]
pub struct Harness {
    mode: Mode,
    current: SharedCapture,
    recorded: Option<TestCapture>,
    strict: bool,
}

impl Harness {
    /// Create the harness. Replay modes load the capture now, so a missing
    /// or corrupt file fails before anything runs.
    pub fn new(mode: Mode) -> Result<Self> {
        let recorded = match &mode {
            Mode::Replay { path, .. } => {
                let capture = TestCapture::load(path)?;
                debug!(
                    "replaying {} ({} components)",
                    path.display(),
                    capture.components.len()
                );
                Some(capture)
            }
            Mode::Live | Mode::Record { .. } => None,
        };
        Ok(Self {
            mode,
            current: SharedCapture::default(),
            recorded,
            strict: false,
        })
    }

    /// A harness that records nothing.
    pub fn live() -> Self {
        Self {
            mode: Mode::Live,
            current: SharedCapture::default(),
            recorded: None,
            strict: false,
        }
    }

    /// Fail replayed sessions whose writes differ from the recording.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_replay(&self) -> bool {
        matches!(self.mode, Mode::Replay { .. })
    }

    pub fn is_test(&self) -> bool {
        matches!(self.mode, Mode::Replay { test: true, .. })
    }

    /// The loaded recording, in replay modes.
    pub fn recorded(&self) -> Option<&TestCapture> {
        self.recorded.as_ref()
    }

    /// Open a session named `name`.
    ///
    /// Live and record modes spawn `config.spawn`; record mode also taps the
    /// session's traffic. Replay modes serve the recorded component of the
    /// same name.
    pub fn connect(&self, name: &str, config: SessionConfig) -> Result<Session> {
        match &self.mode {
            Mode::Live => Session::spawn(name, config),
            Mode::Record { .. } => {
                let mut session = Session::spawn(name, config)?;
                if let Some(tap) = self.tap(name) {
                    session.attach_tap(tap);
                }
                Ok(session)
            }
            Mode::Replay { .. } => {
                let component = self
                    .recorded
                    .as_ref()
                    .and_then(|capture| capture.component(name))
                    .ok_or_else(|| HarnessError::ComponentMissing {
                        name: name.to_string(),
                    })?;
                debug!("[{}] replaying {} events", name, component.events.len());
                let transport =
                    ReplayTransport::new(name, component.events.clone()).strict(self.strict);
                Ok(Session::new(name, Box::new(transport), config))
            }
        }
    }

    /// Recording tap for a component, in record mode.
    ///
    /// [`connect`](Self::connect) attaches one itself; this is for sessions
    /// built on other transports.
    pub fn tap(&self, name: &str) -> Option<CaptureTap> {
        matches!(self.mode, Mode::Record { .. })
            .then(|| CaptureTap::new(self.current.clone(), name))
    }

    /// Writer for the script's standard output.
    pub fn stdout(&self) -> HarnessWriter {
        HarnessWriter::new(self.current.clone(), Stream::Stdout, !self.is_test())
    }

    /// Writer for the script's standard error.
    pub fn stderr(&self) -> HarnessWriter {
        HarnessWriter::new(self.current.clone(), Stream::Stderr, !self.is_test())
    }

    /// Store resolved option values for the capture. Secrets must already
    /// be redacted.
    pub fn record_options(&self, options: IndexMap<String, String>, args: Vec<String>) {
        let mut capture = tap::lock(&self.current);
        let component = capture.component_mut(OPTIONS_COMPONENT);
        component.options = options;
        component.args = Some(args);
    }

    /// Option values saved by the recording, in replay modes.
    pub fn recorded_options(&self) -> Option<&IndexMap<String, String>> {
        self.recorded
            .as_ref()?
            .component(OPTIONS_COMPONENT)
            .map(|c| &c.options)
    }

    /// Extra arguments saved by the recording, in replay modes.
    pub fn recorded_args(&self) -> Option<&[String]> {
        self.recorded
            .as_ref()?
            .component(OPTIONS_COMPONENT)?
            .args
            .as_deref()
    }

    /// Copy of everything captured so far.
    ///
    /// The logger writes through [`Harness::stderr`], so the capture lock
    /// must not be held across a log call.
    fn snapshot(&self) -> TestCapture {
        tap::lock(&self.current).clone()
    }

    /// Finalize the run: write the capture, or compare against it.
    ///
    /// Safe to call after an interrupted script; whatever was captured so
    /// far is saved or compared.
    pub fn finish(&self) -> Result<Verdict> {
        match &self.mode {
            Mode::Live => Ok(Verdict::Done),
            Mode::Record { path } => {
                save(&self.snapshot(), path)?;
                Ok(Verdict::Recorded(path.clone()))
            }
            Mode::Replay { test: false, .. } => Ok(Verdict::Done),
            Mode::Replay { test: true, .. } => {
                let Some(recorded) = &self.recorded else {
                    return Ok(Verdict::Done);
                };
                let current = self.snapshot();
                let diffs: Vec<Diff> = [
                    (
                        "stdout",
                        recorded.harness.stdout_text(),
                        current.harness.stdout_text(),
                    ),
                    (
                        "stderr",
                        recorded.harness.stderr_text(),
                        current.harness.stderr_text(),
                    ),
                ]
                .into_iter()
                .map(|(label, expected, actual)| {
                    Diff::lines(label, &filter_volatile(&expected), &filter_volatile(&actual))
                })
                .filter(|diff| !diff.is_empty())
                .collect();

                if diffs.is_empty() {
                    info!("replay output matches the recording");
                    Ok(Verdict::Passed)
                } else {
                    Ok(Verdict::Failed(diffs))
                }
            }
        }
    }
}

fn save(capture: &TestCapture, path: &Path) -> Result<()> {
    capture.save(path)?;
    info!("recorded {} components to {}", capture.components.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::driver::SessionBuilder;
    use crate::error::Error;

    #[test]
    fn test_missing_replay_file_fails_early() {
        let err = Harness::new(Mode::Replay {
            path: "/nonexistent/capture.json".into(),
            test: true,
        })
        .unwrap_err();
        assert!(matches!(err, Error::Harness(HarnessError::ReplayMissing { .. })));
    }

    #[test]
    fn test_corrupt_replay_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        let err = Harness::new(Mode::Replay {
            path: file.path().to_path_buf(),
            test: false,
        })
        .unwrap_err();
        assert!(matches!(err, Error::Harness(HarnessError::ReplayCorrupt { .. })));
    }

    #[test]
    fn test_record_writes_options_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let harness = Harness::new(Mode::Record { path: path.clone() }).unwrap();

        let mut options = IndexMap::new();
        options.insert("username".to_string(), "admin".to_string());
        options.insert("password".to_string(), REDACTED.to_string());
        harness.record_options(options, vec!["show clock".to_string()]);
        writeln!(harness.stdout(), "10:00").unwrap();

        assert!(matches!(harness.finish().unwrap(), Verdict::Recorded(_)));

        let replay = Harness::new(Mode::Replay { path, test: false }).unwrap();
        let options = replay.recorded_options().unwrap();
        assert_eq!(options["password"], REDACTED);
        assert_eq!(replay.recorded_args().unwrap(), ["show clock"]);
    }

    #[test]
    fn test_replay_unknown_component() {
        let file = tempfile::NamedTempFile::new().unwrap();
        TestCapture::new().save(file.path()).unwrap();
        let harness = Harness::new(Mode::Replay {
            path: file.path().to_path_buf(),
            test: false,
        })
        .unwrap();

        let config = SessionBuilder::new().build().unwrap();
        let err = harness.connect("router", config).unwrap_err();
        assert!(matches!(err, Error::Harness(HarnessError::ComponentMissing { .. })));
    }

    #[test]
    fn test_test_mode_diffs_filtered_streams() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut recorded = TestCapture::new();
        recorded.harness.stdout = vec!["uptime 3 weeks\n".into(), "pid 100 done\n".into()];
        recorded.save(file.path()).unwrap();

        let harness = Harness::new(Mode::Replay {
            path: file.path().to_path_buf(),
            test: true,
        })
        .unwrap();
        write!(harness.stdout(), "uptime 4 weeks\npid 200 done\n").unwrap();

        let Verdict::Failed(diffs) = harness.finish().unwrap() else {
            panic!("expected a diff");
        };
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].removed().collect::<Vec<_>>(), ["uptime 3 weeks"]);
        assert_eq!(diffs[0].added().collect::<Vec<_>>(), ["uptime 4 weeks"]);
    }
}
