//! Prompt rules for commands that ask questions mid-stream.
//!
//! Many network device commands stop to ask for input:
//! - `reload` asks "Proceed with reload? [confirm]"
//! - `copy running-config startup-config` asks for a destination filename
//! - `delete flash:file` asks "Delete filename [confirm]?"
//!
//! An [`Invocation`] carries an ordered list of [`PromptRule`]s. While the
//! command runs, each rule's pattern is checked in order; the first one
//! that matches decides what happens next.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::bytes::Regex;

use super::session::Session;

/// What a decision function wants done after its pattern matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this text followed by the line ending, then keep waiting.
    Send(String),

    /// Stop waiting and return the output gathered so far.
    Stop,

    /// Keep waiting without sending anything.
    Continue,
}

/// Decision function: sees the session and the output accumulated so far.
pub type Decider = Arc<dyn Fn(&Session, &str) -> Reply + Send + Sync>;

/// Response attached to a prompt rule.
#[derive(Clone)]
pub enum Action {
    /// Send this text followed by the line ending, then keep waiting.
    Send(String),

    /// Stop waiting and return the output gathered so far.
    Stop,

    /// Let a function decide.
    Decide(Decider),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send(text) => f.debug_tuple("Send").field(text).finish(),
            Self::Stop => f.write_str("Stop"),
            Self::Decide(_) => f.write_str("Decide(<fn>)"),
        }
    }
}

/// A pattern and what to do when it shows up.
#[derive(Debug, Clone)]
pub struct PromptRule {
    /// Pattern searched in the command's output.
    pub pattern: Regex,

    /// Response when the pattern matches.
    pub action: Action,
}

impl PromptRule {
    /// Create a rule, returning an error if the pattern is invalid.
    pub fn new(pattern: &str, action: Action) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            action,
        })
    }

    /// Answer `pattern` with `text`.
    pub fn send(pattern: &str, text: impl Into<String>) -> Result<Self, regex::Error> {
        Self::new(pattern, Action::Send(text.into()))
    }

    /// Stop waiting when `pattern` shows up.
    pub fn stop(pattern: &str) -> Result<Self, regex::Error> {
        Self::new(pattern, Action::Stop)
    }

    /// Let `decide` choose the response when `pattern` shows up.
    pub fn decide<F>(pattern: &str, decide: F) -> Result<Self, regex::Error>
    where
        F: Fn(&Session, &str) -> Reply + Send + Sync + 'static,
    {
        Self::new(pattern, Action::Decide(Arc::new(decide)))
    }
}

/// One command request: text, optional timeout override, prompt rules.
///
/// # Example
///
/// ```rust
/// use netexpect::driver::{Invocation, PromptRule};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), regex::Error> {
/// let reload = Invocation::new("reload")
///     .rule(PromptRule::send(r"Save\? \[yes/no\]", "no")?)
///     .rule(PromptRule::send(r"\[confirm\]", "")?)
///     .timeout(Duration::from_secs(5))
///     .no_cache();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The command text, without line ending.
    pub command: String,

    /// Overrides the session timeout for each wait in this command.
    pub timeout: Option<Duration>,

    /// Rules checked in order after the pager and before the prompt.
    pub rules: Vec<PromptRule>,

    /// Whether the command cache may answer or store this command.
    pub use_cache: bool,
}

impl Invocation {
    /// Create an invocation for `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            rules: Vec::new(),
            use_cache: true,
        }
    }

    /// Set a timeout for this command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Append a prompt rule.
    pub fn rule(mut self, rule: PromptRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Bypass the command cache.
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_defaults() {
        let invocation = Invocation::new("show version");
        assert_eq!(invocation.command, "show version");
        assert!(invocation.timeout.is_none());
        assert!(invocation.rules.is_empty());
        assert!(invocation.use_cache);
    }

    #[test]
    fn test_rules_keep_order() {
        let invocation = Invocation::new("reload")
            .rule(PromptRule::send(r"\[yes/no\]", "no").unwrap())
            .rule(PromptRule::stop(r"\[confirm\]").unwrap())
            .no_cache();

        assert_eq!(invocation.rules.len(), 2);
        assert!(matches!(&invocation.rules[0].action, Action::Send(t) if t == "no"));
        assert!(matches!(invocation.rules[1].action, Action::Stop));
        assert!(!invocation.use_cache);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PromptRule::stop(r"[unclosed").is_err());
    }

    #[test]
    fn test_action_debug_hides_closure() {
        let rule = PromptRule::decide("x", |_, _| Reply::Continue).unwrap();
        assert_eq!(format!("{:?}", rule.action), "Decide(<fn>)");
    }
}
