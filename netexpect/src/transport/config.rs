//! Spawn configuration.

use crate::error::TransportError;

/// How to start the child process behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnConfig {
    /// Executable to run (looked up on `PATH`).
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Terminal width for the PTY.
    pub terminal_width: u16,

    /// Terminal height for the PTY.
    pub terminal_height: u16,

    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl SpawnConfig {
    /// Create a spawn configuration for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            terminal_width: 511,
            terminal_height: 24,
            env: Vec::new(),
        }
    }

    /// Parse a command line such as `ssh -l admin "core router"`.
    pub fn parse(command_line: &str) -> Result<Self, TransportError> {
        let words = shell_words::split(command_line).map_err(|e| TransportError::InvalidCommand {
            command_line: command_line.to_string(),
            reason: e.to_string(),
        })?;
        let mut words = words.into_iter();
        let program = words.next().ok_or(TransportError::EmptyCommand)?;
        Ok(Self::new(program).with_args(words))
    }

    /// Append arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Add an environment variable for the child.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The full command line, for log lines.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let config = SpawnConfig::parse("ssh -l admin 10.0.0.1").unwrap();
        assert_eq!(config.program, "ssh");
        assert_eq!(config.args, ["-l", "admin", "10.0.0.1"]);
        assert_eq!(config.command_line(), "ssh -l admin 10.0.0.1");
    }

    #[test]
    fn test_parse_quotes() {
        let config = SpawnConfig::parse(r#"sh -c 'echo "hi there"' "a b" c\ d ''"#).unwrap();
        assert_eq!(config.program, "sh");
        assert_eq!(config.args, ["-c", r#"echo "hi there""#, "a b", "c d", ""]);
    }

    #[test]
    fn test_parse_unclosed_quote() {
        let err = SpawnConfig::parse("ssh 'core1").unwrap_err();
        assert!(matches!(
            err,
            TransportError::InvalidCommand { ref command_line, .. } if command_line == "ssh 'core1"
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            SpawnConfig::parse("   "),
            Err(TransportError::EmptyCommand)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = SpawnConfig::new("telnet").with_terminal_size(132, 50);
        assert_eq!(config.terminal_width, 132);
        assert_eq!(config.terminal_height, 50);
        assert!(config.env.is_empty());
    }
}
