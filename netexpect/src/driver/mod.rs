//! Session layer: login, prompt learning and command execution.
//!
//! A [`Session`] drives one spawned child through a [`Transport`]. It logs
//! in with [`Session::login`], learning the device prompt, then runs
//! commands with [`Session::command`] or, for commands that ask questions,
//! [`Session::run`] with an [`Invocation`] carrying [`PromptRule`]s.
//!
//! [`Transport`]: crate::transport::Transport

mod builder;
mod cache;
mod command;
mod login;
pub(crate) mod response;
mod rules;
mod session;

pub use builder::{DEFAULT_SEARCH_DEPTH, DEFAULT_TIMEOUT, SessionBuilder, SessionConfig};
pub use cache::CommandCache;
pub use login::{Credentials, MAX_PROMPT_ATTEMPTS};
pub use response::{Outcome, Response};
pub use rules::{Action, Decider, Invocation, PromptRule, Reply};
pub use session::{Expect, Match, Session, SessionState};
