//! Login state machine: username, password, then prompt learning.

use std::fmt;

use log::{debug, info, warn};
use regex::bytes::Regex;
use secrecy::SecretString;

use super::rules::Invocation;
use super::session::{Expect, Match, Session, SessionState};
use crate::channel::LogFilter;
use crate::channel::patterns::{anchored_prompt, prompt_line};
use crate::error::{ChannelError, ConfigError, DriverError, Result};
use crate::terminal;

/// Most prompt observations made before giving up on a stable prompt.
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

/// What to answer the login prompts with.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Sent at the username prompt. Without one the username step is skipped.
    pub username: Option<String>,

    /// Sent at the password prompt.
    pub password: Option<SecretString>,

    /// Wait for a password prompt even without a password, and ask for
    /// one on the controlling terminal when it shows up.
    pub password_in: bool,
}

impl Credentials {
    /// No username, no password: go straight to prompt detection.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(SecretString::from(password.into())),
            password_in: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Ask for the password interactively when the device wants one.
    pub fn with_password_prompt(mut self) -> Self {
        self.password_in = true;
        self
    }

    fn wants_password(&self) -> bool {
        self.password.is_some() || self.password_in
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_in", &self.password_in)
            .finish()
    }
}

impl Session {
    /// Log in and learn the prompt.
    ///
    /// Each step waits for its own prompt or, when configured, for the
    /// failed-login pattern. On success the learned prompt replaces the
    /// profile's prompt pattern and the profile's on-open commands run.
    /// On failure the session is left in [`SessionState::Failed`]; close it
    /// and start a new one to retry.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        match self.state {
            SessionState::Spawned => {}
            SessionState::LoggedIn => return Err(DriverError::AlreadyLoggedIn.into()),
            SessionState::Closed => return Err(DriverError::AlreadyClosed.into()),
            SessionState::Failed => {
                return Err(DriverError::LoginFailed {
                    message: "an earlier login attempt failed on this session".to_string(),
                }
                .into());
            }
        }

        if let Err(e) = self.authenticate(credentials).await {
            self.state = SessionState::Failed;
            warn!("[{}] login failed: {}", self.name(), e);
            return Err(e);
        }
        self.state = SessionState::LoggedIn;
        info!(
            "[{}] logged in, prompt {:?}",
            self.name(),
            self.prompt().unwrap_or_default()
        );

        self.run_on_open_commands().await;
        Ok(())
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let mut filter = credentials
            .password
            .as_ref()
            .map(LogFilter::for_secret)
            .unwrap_or_default();

        if let Some(username) = &credentials.username {
            let pattern = self.config.username_pattern.clone();
            self.expect_step(&pattern, "username", &filter).await?;
            self.send_line(username).await?;
        }

        if credentials.wants_password() {
            let pattern = self.config.password_pattern.clone();
            self.expect_step(&pattern, "password", &filter).await?;
            let password = match &credentials.password {
                Some(password) => password.clone(),
                None => {
                    let password = self.read_password().await?;
                    filter.set(&password);
                    password
                }
            };
            self.send_secret(&password).await?;
        }

        self.learn_prompt(&filter).await
    }

    /// Wait for `pattern`, treating the failed-login pattern as rejection.
    ///
    /// The step's own pattern is checked before the failed pattern, so a
    /// legitimate prompt wins when both are present.
    async fn expect_step(
        &mut self,
        pattern: &Regex,
        stage: &'static str,
        filter: &LogFilter,
    ) -> Result<Match> {
        let failed = self.config.failed_pattern.clone();
        let mut patterns = vec![pattern];
        if let Some(failed) = &failed {
            patterns.push(failed);
        }

        let timeout = self.timeout();
        match self.expect(&patterns, timeout).await? {
            Expect::Matched(m) if m.index == 0 => Ok(m),
            Expect::Matched(m) => Err(DriverError::LoginFailed {
                message: filter.mask(m.matched.trim()).into_owned(),
            }
            .into()),
            Expect::Timeout { pending } => {
                debug!(
                    "[{}] no {} prompt in {:?}",
                    self.name(),
                    stage,
                    filter.mask(&pending)
                );
                Err(DriverError::LoginTimeout { stage }.into())
            }
        }
    }

    /// Observe the prompt until two consecutive observations agree.
    ///
    /// After each observation the buffer is flushed and a bare line ending
    /// is sent to make the device print the prompt again.
    async fn learn_prompt(&mut self, filter: &LogFilter) -> Result<()> {
        let observe = self.config.prompt_pattern.clone();
        let mut previous: Option<String> = None;

        for attempt in 1..=MAX_PROMPT_ATTEMPTS {
            let m = self.expect_step(&observe, "command", filter).await?;
            let observed = prompt_line(m.text().as_bytes());
            debug!(
                "[{}] prompt observation {}: {:?}",
                self.name(),
                attempt,
                filter.mask(&observed)
            );

            if !observed.is_empty() && previous.as_deref() == Some(observed.as_str()) {
                self.prompt = Some(anchored_prompt(&observed).map_err(ChannelError::InvalidPattern)?);
                self.prompt_text = Some(observed);
                return Ok(());
            }

            previous = Some(observed);
            if attempt < MAX_PROMPT_ATTEMPTS {
                self.flush();
                let line_ending = self.config.line_ending.clone();
                self.send(&line_ending).await?;
            }
        }

        Err(DriverError::LoginFailed {
            message: format!("prompt did not stabilize after {MAX_PROMPT_ATTEMPTS} observations"),
        }
        .into())
    }

    async fn read_password(&self) -> Result<SecretString> {
        let prompt = format!("Password for {}: ", self.name());
        let password = tokio::task::spawn_blocking(move || terminal::read_password(&prompt))
            .await
            .map_err(|e| ConfigError::PasswordPrompt(e.to_string()))??;
        Ok(password)
    }

    async fn run_on_open_commands(&mut self) {
        for command in self.config.platform.on_open_commands.clone() {
            match self.run(Invocation::new(command.as_str()).no_cache()).await {
                Ok(response) if response.is_success() => {}
                Ok(response) => warn!(
                    "[{}] on-open command {:?} ended with {:?}",
                    self.name(),
                    command,
                    response.outcome
                ),
                Err(e) => warn!("[{}] on-open command {:?} failed: {}", self.name(), command, e),
            }
        }
    }
}
