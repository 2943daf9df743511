//! Response type for command execution results.

use std::time::Duration;

/// How a command's wait loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The session prompt came back.
    Prompt,

    /// A prompt rule asked to stop waiting.
    Stopped,

    /// Nothing matched before the timeout. Callers decide whether that is
    /// acceptable; logout-style commands often end this way.
    TimedOut,
}

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// How the wait ended.
    pub outcome: Outcome,

    /// Whether this response came from the command cache.
    pub cached: bool,
}

impl Response {
    /// Create a response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        outcome: Outcome,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            outcome,
            cached: false,
        }
    }

    /// Create the "no output" response for a command that timed out.
    pub fn timed_out(command: impl Into<String>, raw_result: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(command, "", raw_result, "", elapsed, Outcome::TimedOut)
    }

    /// Check if the command ran to the prompt.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Prompt
    }

    /// Check if the command produced no result before timing out.
    pub fn is_timeout(&self) -> bool {
        self.outcome == Outcome::TimedOut
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
