//! # netexpect
//!
//! Scripted interactive CLI sessions for network device automation.
//!
//! netexpect spawns `ssh` or `telnet` on a pseudo-terminal, logs in, learns
//! the device prompt, and runs commands through pagers and confirmation
//! questions. A record/replay harness captures a whole run to a JSON file
//! so the same script can later be replayed, and its output diffed, without
//! the device.
//!
//! ## Features
//!
//! - Login state machine with prompt learning (username, password, stable prompt)
//! - Pagination and ordered prompt rules for commands that ask questions
//! - Per-session command cache with generation-based invalidation
//! - Vendor profiles (generic, Linux, Cisco IOS, Juniper JUNOS)
//! - Secret masking in logs, errors and recordings
//! - Record, replay and test modes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netexpect::driver::{Credentials, Session, SessionBuilder};
//! use netexpect::transport::SpawnConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netexpect::Error> {
//!     let config = SessionBuilder::new()
//!         .platform("cisco_ios")
//!         .spawn(SpawnConfig::parse("ssh -l admin 192.0.2.1")?)
//!         .build()?;
//!
//!     let mut session = Session::spawn("core1", config)?;
//!     session.login(&Credentials::none().with_password_prompt()).await?;
//!
//!     let response = session.command("show version").await?;
//!     print!("{}", response.result);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod harness;
pub mod logging;
pub mod platform;
pub mod terminal;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Credentials, Invocation, PromptRule, Response, Session, SessionBuilder};
pub use error::Error;
pub use harness::{Harness, Mode};
pub use platform::{PlatformDefinition, PlatformRegistry};
pub use transport::SpawnConfig;
