//! A session: one spawned child plus its pattern buffer and prompt state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::builder::SessionConfig;
use super::cache::CommandCache;
use crate::channel::{LogFilter, PatternBuffer};
use crate::error::{ChannelError, ConfigError, DriverError, Error, Result};
use crate::harness::CaptureTap;
use crate::platform::{DefaultBehavior, VendorBehavior};
use crate::transport::{PtyTransport, ReadEvent, Transport};

/// Upper bound on each wait for the device to hang up after a close command.
const CLOSE_WAIT: Duration = Duration::from_secs(2);

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Spawned, login not attempted yet.
    Spawned,
    /// Prompt learned; commands may run.
    LoggedIn,
    /// Login failed. The session must be closed; a retry needs a new session.
    Failed,
    /// Closed. Terminal.
    Closed,
}

/// Text consumed by a successful wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the pattern that matched.
    pub index: usize,
    /// Everything before the match.
    pub before: String,
    /// The matched text itself.
    pub matched: String,
}

impl Match {
    /// `before` followed by `matched`.
    pub fn text(&self) -> String {
        format!("{}{}", self.before, self.matched)
    }
}

/// Result of [`Session::expect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    Matched(Match),
    /// Nothing matched in time. `pending` is the unconsumed output, still buffered.
    Timeout { pending: String },
}

/// An interactive session with one device.
///
/// Drives a [`Transport`] sequentially: every operation takes `&mut self`
/// and waits for its own result before returning. Use [`Session::spawn`]
/// for a live child, or [`Session::new`] with any other transport.
pub struct Session {
    name: String,
    transport: Box<dyn Transport>,
    buffer: PatternBuffer,
    pub(super) config: SessionConfig,
    pub(super) behavior: Arc<dyn VendorBehavior>,
    pub(super) prompt: Option<Regex>,
    pub(super) prompt_text: Option<String>,
    timeout: Duration,
    log_filter: LogFilter,
    pub(super) cache: CommandCache,
    tap: Option<CaptureTap>,
    pub(super) state: SessionState,
}

impl Session {
    /// Wrap an already-open transport.
    pub fn new(name: impl Into<String>, transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        let behavior = config
            .platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));
        let name = name.into();
        debug!(
            "[{}] session on {} using profile '{}'",
            name,
            transport.describe(),
            config.platform.name
        );
        Self {
            name,
            transport,
            buffer: PatternBuffer::new(config.search_depth),
            timeout: config.timeout,
            behavior,
            prompt: None,
            prompt_text: None,
            log_filter: LogFilter::default(),
            cache: CommandCache::new(),
            tap: None,
            state: SessionState::Spawned,
            config,
        }
    }

    /// Spawn the configured command on a pseudo-terminal.
    pub fn spawn(name: impl Into<String>, config: SessionConfig) -> Result<Self> {
        let spawn = config.spawn.clone().ok_or(ConfigError::MissingSpawn)?;
        let name = name.into();
        // Replayed sessions never spawn; keep this below info so logs match.
        debug!("[{}] spawning {}", name, spawn.command_line());
        let transport = PtyTransport::spawn(spawn)?;
        Ok(Self::new(name, Box::new(transport), config))
    }

    /// Record every transport event through `tap`.
    pub fn attach_tap(&mut self, tap: CaptureTap) {
        self.tap = Some(tap);
    }

    /// Get the session name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if login completed.
    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::LoggedIn
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the learned prompt pattern, once logged in.
    pub fn prompt_pattern(&self) -> Option<&Regex> {
        self.prompt.as_ref()
    }

    /// Get the learned prompt text, once logged in.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt_text.as_deref()
    }

    /// Get the default timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the default timeout for each wait.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Get the log filter currently applied to this session's log lines.
    pub fn log_filter(&self) -> &LogFilter {
        &self.log_filter
    }

    /// Discard any output not yet consumed by a match.
    pub fn flush(&mut self) {
        let dropped = self.buffer.take();
        if !dropped.is_empty() {
            trace!(
                "[{}] flushed {:?}",
                self.name,
                self.log_filter.mask_bytes(&dropped)
            );
        }
    }

    /// Wait until one of `patterns` matches the unconsumed output.
    ///
    /// Patterns are tried in order; the first that matches anywhere wins.
    /// The match and everything before it are consumed. A timeout is not an
    /// error and leaves the output buffered. The stream closing is
    /// [`ChannelError::Closed`].
    pub async fn expect(&mut self, patterns: &[&Regex], timeout: Duration) -> Result<Expect> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = self.buffer.find_first(patterns) {
                let consumed = self.buffer.consume(found.end);
                let (before, matched) = consumed.split_at(found.start);
                let result = Match {
                    index: found.index,
                    before: String::from_utf8_lossy(before).into_owned(),
                    matched: String::from_utf8_lossy(matched).into_owned(),
                };
                trace!(
                    "[{}] pattern {} matched {:?}",
                    self.name,
                    result.index,
                    self.log_filter.mask(&result.matched)
                );
                return Ok(Expect::Matched(result));
            }
            self.buffer.mark_scanned();

            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = if remaining.is_zero() {
                ReadEvent::Timeout
            } else {
                self.transport.read(remaining).await?
            };

            match event {
                ReadEvent::Data(data) => {
                    trace!(
                        "[{}] recv {:?}",
                        self.name,
                        self.log_filter.mask_bytes(&data)
                    );
                    if let Some(tap) = &self.tap {
                        tap.read(&data);
                    }
                    self.buffer.extend(&data);
                }
                ReadEvent::Timeout => {
                    if let Some(tap) = &self.tap {
                        tap.timeout();
                    }
                    let pending = self.buffer.as_str_lossy().into_owned();
                    debug!(
                        "[{}] timed out after {:?} with {} bytes pending",
                        self.name,
                        timeout,
                        pending.len()
                    );
                    return Ok(Expect::Timeout { pending });
                }
                ReadEvent::Eof => {
                    if let Some(tap) = &self.tap {
                        tap.eof();
                    }
                    debug!("[{}] stream closed", self.name);
                    return Err(ChannelError::Closed.into());
                }
            }
        }
    }

    /// Write `text` verbatim.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let logged = self.log_filter.mask(text).into_owned();
        debug!("[{}] send {:?}", self.name, logged);
        if let Some(tap) = &self.tap {
            tap.write(logged.as_bytes());
        }
        self.transport.write(text.as_bytes()).await
    }

    /// Write `text` followed by the profile's line ending.
    pub async fn send_line(&mut self, text: &str) -> Result<()> {
        let line = format!("{}{}", text, self.config.line_ending);
        self.send(&line).await
    }

    /// Send a secret line with the log filter active for the write.
    pub async fn send_secret(&mut self, secret: &SecretString) -> Result<()> {
        self.log_filter.set(secret);
        let result = self.send_line(secret.expose_secret()).await;
        self.log_filter.clear();
        result
    }

    /// Invalidate every cached command result.
    pub fn command_cache_clear(&mut self) {
        self.cache.clear();
        debug!(
            "[{}] command cache cleared (generation {})",
            self.name,
            self.cache.generation()
        );
    }

    /// Close the session.
    ///
    /// A logged-in session first sends the profile's close commands. A
    /// command that fails, times out, or makes the device hang up is only
    /// logged; the child is released either way. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        if self.state == SessionState::LoggedIn {
            let wait = self.timeout.min(CLOSE_WAIT);
            for command in self.config.platform.on_close_commands.clone() {
                if let Err(e) = self.send_line(&command).await {
                    warn!("[{}] close command {:?} failed: {}", self.name, command, e);
                    break;
                }
                match self.expect(&[], wait).await {
                    Ok(_) => {}
                    Err(Error::Channel(ChannelError::Closed)) => break,
                    Err(e) => {
                        warn!("[{}] close command {:?} failed: {}", self.name, command, e);
                        break;
                    }
                }
            }
        }

        if let Err(e) = self.transport.close().await {
            warn!("[{}] error releasing transport: {}", self.name, e);
        }
        self.state = SessionState::Closed;
        self.prompt = None;
        info!("[{}] closed", self.name);
        Ok(())
    }

    pub(super) fn ensure_logged_in(&self) -> Result<()> {
        match self.state {
            SessionState::LoggedIn => Ok(()),
            SessionState::Closed => Err(DriverError::AlreadyClosed.into()),
            SessionState::Spawned | SessionState::Failed => Err(DriverError::NotLoggedIn.into()),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("transport", &self.transport.describe())
            .field("platform", &self.config.platform.name)
            .field("state", &self.state)
            .field("prompt", &self.prompt_text)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::LoggedIn {
            warn!(
                "[{}] dropped while logged in; call close() to send the close commands",
                self.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::patterns::compile_pattern;
    use crate::driver::SessionBuilder;
    use crate::transport::ScriptedTransport;

    fn session(transport: ScriptedTransport) -> Session {
        let config = SessionBuilder::new().build().unwrap();
        Session::new("test", Box::new(transport), config)
    }

    #[tokio::test]
    async fn test_expect_first_pattern_in_list_order_wins() {
        let mut session = session(ScriptedTransport::new().output("Password: ok> "));
        let password = compile_pattern(r"Password:").unwrap();
        let prompt = compile_pattern(r"> $").unwrap();

        let result = session
            .expect(&[&prompt, &password], Duration::from_millis(50))
            .await
            .unwrap();
        let Expect::Matched(m) = result else {
            panic!("expected a match");
        };
        assert_eq!(m.index, 0);
        assert_eq!(m.before, "Password: ok");
        assert_eq!(m.matched, "> ");
    }

    #[tokio::test]
    async fn test_expect_keeps_remainder() {
        let mut session = session(ScriptedTransport::new().output("one\ntwo\n"));
        let newline = compile_pattern(r"\n").unwrap();

        let first = session.expect(&[&newline], Duration::from_millis(50)).await.unwrap();
        assert!(matches!(first, Expect::Matched(ref m) if m.before == "one"));
        let second = session.expect(&[&newline], Duration::from_millis(50)).await.unwrap();
        assert!(matches!(second, Expect::Matched(ref m) if m.before == "two"));
    }

    #[tokio::test]
    async fn test_expect_timeout_leaves_output_pending() {
        let mut session = session(ScriptedTransport::new().output("partial"));
        let never = compile_pattern(r"never").unwrap();

        let result = session.expect(&[&never], Duration::from_millis(20)).await.unwrap();
        assert_eq!(
            result,
            Expect::Timeout {
                pending: "partial".to_string()
            }
        );

        session.flush();
        let result = session.expect(&[&never], Duration::from_millis(20)).await.unwrap();
        assert_eq!(
            result,
            Expect::Timeout {
                pending: String::new()
            }
        );
    }

    #[tokio::test]
    async fn test_expect_eof_is_closed_error() {
        let mut session = session(ScriptedTransport::new().output("bye").then_close());
        let never = compile_pattern(r"never").unwrap();

        let err = session.expect(&[&never], Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_send_line_appends_line_ending() {
        let transport = ScriptedTransport::new();
        let writes = transport.writes();
        let mut session = session(transport);

        session.send_line("show clock").await.unwrap();
        assert_eq!(writes.lock().unwrap().as_slice(), [b"show clock\r".to_vec()]);
    }

    #[tokio::test]
    async fn test_commands_require_login() {
        let mut session = session(ScriptedTransport::new());
        let err = session.command("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotLoggedIn)));

        session.close().await.unwrap();
        let err = session.command("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::AlreadyClosed)));
        session.close().await.unwrap();
    }
}
