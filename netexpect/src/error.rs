//! Error types for netexpect.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for netexpect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport creation and raw I/O errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors (login, commands)
    #[error("Session error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/profile errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Record/replay harness errors
    #[error("Harness error: {0}")]
    Harness(#[from] HarnessError),

    /// Option resolution errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Transport layer errors (spawning, raw reads and writes).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The child process could not be started
    #[error("Failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// Empty command line given to spawn
    #[error("Empty spawn command")]
    EmptyCommand,

    /// Spawn command line could not be split into words
    #[error("Invalid spawn command {command_line:?}: {reason}")]
    InvalidCommand { command_line: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, session stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The remote side closed the stream while we were waiting on it
    #[error("Session closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session layer errors (login, command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Commands require a completed login
    #[error("Session not logged in - call login() first")]
    NotLoggedIn,

    /// Session is already logged in
    #[error("Session already logged in")]
    AlreadyLoggedIn,

    /// Session was closed
    #[error("Session already closed")]
    AlreadyClosed,

    /// A login step did not see its prompt in time
    #[error("Login timed out waiting for {stage} prompt")]
    LoginTimeout { stage: &'static str },

    /// Login was rejected or never reached a stable prompt
    #[error("Login failed: {message}")]
    LoginFailed { message: String },
}

/// Platform/profile errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No profile registered under this name
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A profile with this name already exists
    #[error("Platform '{name}' already registered")]
    AlreadyRegistered { name: String },
}

/// Record/replay harness errors.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Replay source could not be read
    #[error("Replay file {} is missing or unreadable: {source}", path.display())]
    ReplayMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Replay source is not a valid capture
    #[error("Replay file {} is corrupt: {message}", path.display())]
    ReplayCorrupt { path: PathBuf, message: String },

    /// Capture could not be saved at the end of a record run
    #[error("Failed to write record file {}: {reason}", path.display())]
    RecordWrite { path: PathBuf, reason: String },

    /// A component asked for by the script is absent from the capture
    #[error("Replay file has no recorded component '{name}'")]
    ComponentMissing { name: String },

    /// Strict replay saw a write that differs from the recording
    #[error("Replay diverged in '{component}': expected write {expected:?}, got {actual:?}")]
    Diverged {
        component: String,
        expected: String,
        actual: String,
    },
}

/// Option resolution errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No spawn command from any source
    #[error("No spawn command given (use --spawn or NETEXPECT_SPAWN)")]
    MissingSpawn,

    /// Option value could not be parsed
    #[error("Invalid value {value:?} for option '{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    /// Option value is not a valid regex
    #[error("Invalid pattern for option '{option}': {source}")]
    InvalidPattern {
        option: String,
        #[source]
        source: regex::Error,
    },

    /// Interactive password entry failed or was interrupted
    #[error("Password prompt failed: {0}")]
    PasswordPrompt(String),
}

/// Result type alias using netexpect's Error.
pub type Result<T> = std::result::Result<T, Error>;
