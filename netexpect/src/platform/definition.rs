//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;

use super::VendorBehavior;
use crate::channel::patterns::{
    DEFAULT_PAGING_KEY, DEFAULT_PASSWORD_PATTERN, DEFAULT_PROMPT_PATTERN,
    DEFAULT_USERNAME_PATTERN,
};

/// Platform definition containing all vendor-specific configuration.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "linux", "cisco_ios", "juniper_junos").
    pub name: String,

    /// Pattern for the username prompt.
    pub username_pattern: String,

    /// Pattern for the password or passcode prompt.
    pub password_pattern: String,

    /// Pattern used to observe the prompt during login.
    pub prompt_pattern: String,

    /// Pattern signalling a rejected login. Off unless set: broad patterns
    /// misfire on banner text such as "connection refused" notices.
    pub failed_pattern: Option<String>,

    /// Pattern marking a paused pager.
    pub paging_pattern: Option<String>,

    /// Key sent to resume a paused pager.
    pub paging_key: String,

    /// Appended to every command and to login responses.
    pub line_ending: String,

    /// Commands to run right after login.
    pub on_open_commands: Vec<String>,

    /// Commands sent when the session closes.
    pub on_close_commands: Vec<String>,

    /// Terminal width for the PTY.
    pub terminal_width: u16,

    /// Terminal height for the PTY.
    pub terminal_height: u16,

    /// Optional vendor-specific behavior (not serializable).
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a new platform definition with the generic defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username_pattern: DEFAULT_USERNAME_PATTERN.to_string(),
            password_pattern: DEFAULT_PASSWORD_PATTERN.to_string(),
            prompt_pattern: DEFAULT_PROMPT_PATTERN.to_string(),
            failed_pattern: None,
            paging_pattern: None,
            paging_key: DEFAULT_PAGING_KEY.to_string(),
            line_ending: "\r".to_string(),
            on_open_commands: vec![],
            on_close_commands: vec!["exit".to_string()],
            terminal_width: 511,
            terminal_height: 24,
            behavior: None,
        }
    }

    /// Set the prompt pattern observed during login.
    pub fn with_prompt_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.prompt_pattern = pattern.into();
        self
    }

    /// Set the username prompt pattern.
    pub fn with_username_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.username_pattern = pattern.into();
        self
    }

    /// Set the password prompt pattern.
    pub fn with_password_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.password_pattern = pattern.into();
        self
    }

    /// Enable login failure detection.
    pub fn with_failed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_pattern = Some(pattern.into());
        self
    }

    /// Enable pagination handling.
    pub fn with_paging(mut self, pattern: impl Into<String>, key: impl Into<String>) -> Self {
        self.paging_pattern = Some(pattern.into());
        self.paging_key = key.into();
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Replace the close sequence.
    pub fn with_close_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.on_close_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("username_pattern", &self.username_pattern)
            .field("password_pattern", &self.password_pattern)
            .field("prompt_pattern", &self.prompt_pattern)
            .field("failed_pattern", &self.failed_pattern)
            .field("paging_pattern", &self.paging_pattern)
            .field("paging_key", &self.paging_key)
            .field("on_open_commands", &self.on_open_commands)
            .field("on_close_commands", &self.on_close_commands)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}
