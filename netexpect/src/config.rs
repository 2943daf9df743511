//! Layered option resolution for the `netexpect` command.
//!
//! A value is taken from the first layer that has it:
//!
//! 1. the command line,
//! 2. the `NETEXPECT_*` environment variables,
//! 3. the options saved in a replayed capture (unless `--reset NAME`),
//! 4. a [`Pragma`] set in code,
//! 5. the profile or built-in default.
//!
//! Layers 1 and 2 are merged by clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use indexmap::IndexMap;
use log::debug;
use secrecy::SecretString;

use crate::channel::MASK;
use crate::driver::{Credentials, SessionBuilder};
use crate::error::{ConfigError, Result};
use crate::harness::{Mode, REDACTED};
use crate::transport::SpawnConfig;

/// Options whose values never reach a capture file.
pub const SECRET_OPTIONS: &[&str] = &["password"];

/// Command line for `netexpect`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "netexpect",
    version,
    about = "Drive an interactive device session, with record and replay"
)]
pub struct Cli {
    /// Command line that starts the session (e.g. "ssh -l admin 192.0.2.1")
    #[arg(long, env = "NETEXPECT_SPAWN")]
    pub spawn: Option<String>,

    /// Platform profile: generic, linux, cisco_ios, juniper_junos
    #[arg(long, env = "NETEXPECT_PROFILE")]
    pub profile: Option<String>,

    /// Username sent at the username prompt
    #[arg(long, env = "NETEXPECT_USERNAME")]
    pub username: Option<String>,

    /// Password sent at the password prompt
    #[arg(long, env = "NETEXPECT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Ask for the password on the terminal when the device wants one
    #[arg(long)]
    pub password_in: bool,

    #[arg(long, env = "NETEXPECT_USERNAME_PATTERN")]
    pub username_pattern: Option<String>,

    #[arg(long, env = "NETEXPECT_PASSWORD_PATTERN")]
    pub password_pattern: Option<String>,

    /// Pattern used to observe the prompt during login
    #[arg(long, env = "NETEXPECT_PROMPT_PATTERN")]
    pub prompt_pattern: Option<String>,

    /// Pattern that marks a rejected login (off unless given)
    #[arg(long, env = "NETEXPECT_FAILED_PATTERN")]
    pub failed_pattern: Option<String>,

    #[arg(long, env = "NETEXPECT_PAGING_PATTERN")]
    pub paging_pattern: Option<String>,

    #[arg(long, env = "NETEXPECT_PAGING_KEY")]
    pub paging_key: Option<String>,

    /// Seconds to wait for each expected pattern [default: 30]
    #[arg(long, env = "NETEXPECT_TIMEOUT")]
    pub timeout: Option<String>,

    /// Record the run to this file
    #[arg(long, env = "NETEXPECT_RECORD", conflicts_with = "replay")]
    pub record: Option<PathBuf>,

    /// Replay a recorded run instead of spawning
    #[arg(long, env = "NETEXPECT_REPLAY")]
    pub replay: Option<PathBuf>,

    /// With --replay: compare output against the recording
    #[arg(long, requires = "replay")]
    pub test: bool,

    /// With --replay: fail when a write differs from the recording
    #[arg(long, requires = "replay")]
    pub strict: bool,

    /// Ignore the recorded value of an option; bare --reset ignores the recorded commands
    #[arg(long, num_args = 0..=1, default_missing_value = "", action = ArgAction::Append)]
    pub reset: Vec<String>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Commands to run after login
    pub commands: Vec<String>,
}

impl Cli {
    /// Harness mode selected by `--record`, `--replay` and `--test`.
    pub fn mode(&self) -> Mode {
        match (&self.record, &self.replay) {
            (_, Some(path)) => Mode::Replay {
                path: path.clone(),
                test: self.test,
            },
            (Some(path), None) => Mode::Record { path: path.clone() },
            (None, None) => Mode::Live,
        }
    }

    fn values(&self) -> IndexMap<String, String> {
        let flag = |set: bool| set.then(|| "true".to_string());
        [
            ("spawn", self.spawn.clone()),
            ("profile", self.profile.clone()),
            ("username", self.username.clone()),
            ("password", self.password.clone()),
            ("password_in", flag(self.password_in)),
            ("username_pattern", self.username_pattern.clone()),
            ("password_pattern", self.password_pattern.clone()),
            ("prompt_pattern", self.prompt_pattern.clone()),
            ("failed_pattern", self.failed_pattern.clone()),
            ("paging_pattern", self.paging_pattern.clone()),
            ("paging_key", self.paging_key.clone()),
            ("timeout", self.timeout.clone()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }

    fn resets(&self, name: &str) -> bool {
        self.reset.iter().any(|r| r == name)
    }
}

/// Option overrides supplied in code, below the recording in precedence.
#[derive(Debug, Clone, Default)]
pub struct Pragma {
    values: IndexMap<String, String>,
}

impl Pragma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(option.into(), value.into());
        self
    }
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    values: IndexMap<String, String>,
    /// Commands to run after login.
    pub commands: Vec<String>,
    replaying: bool,
    password_recorded: bool,
}

impl Options {
    /// Resolve every layer.
    ///
    /// `recorded` is the replayed capture's options and extra arguments.
    /// Recorded secrets are stored redacted and count as absent.
    pub fn resolve(
        cli: &Cli,
        recorded: Option<(&IndexMap<String, String>, Option<&[String]>)>,
        pragma: &Pragma,
    ) -> Self {
        let mut values = cli.values();
        let password_recorded = recorded.is_some_and(|(options, _)| {
            options.get("password").map(String::as_str) == Some(REDACTED) && !cli.resets("password")
        });

        if let Some((options, _)) = recorded {
            for (name, value) in options {
                if values.contains_key(name) || cli.resets(name) || value == REDACTED {
                    continue;
                }
                debug!("option {} taken from the recording", name);
                values.insert(name.clone(), value.clone());
            }
        }

        for (name, value) in &pragma.values {
            values.entry(name.clone()).or_insert_with(|| value.clone());
        }

        let commands = if !cli.commands.is_empty() || cli.resets("") {
            cli.commands.clone()
        } else {
            recorded
                .and_then(|(_, args)| args)
                .map(<[String]>::to_vec)
                .unwrap_or_default()
        };

        Self {
            values,
            commands,
            replaying: recorded.is_some(),
            password_recorded,
        }
    }

    /// Resolved value of an option.
    pub fn get(&self, option: &str) -> Option<&str> {
        self.values.get(option).map(String::as_str)
    }

    /// The values as they go into a capture: secrets redacted.
    pub fn redacted(&self) -> IndexMap<String, String> {
        self.values
            .iter()
            .map(|(name, value)| {
                let value = if SECRET_OPTIONS.contains(&name.as_str()) {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Session timeout, when set.
    pub fn timeout(&self) -> std::result::Result<Option<Duration>, ConfigError> {
        self.get("timeout")
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|secs| secs.is_finite() && *secs > 0.0)
                    .map(Duration::from_secs_f64)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        option: "timeout".to_string(),
                        value: raw.to_string(),
                        reason: "expected a positive number of seconds".to_string(),
                    })
            })
            .transpose()
    }

    /// Session settings from the resolved options.
    pub fn session_builder(&self) -> Result<SessionBuilder> {
        let mut builder = SessionBuilder::new();
        if let Some(spawn) = self.get("spawn") {
            builder = builder.spawn(SpawnConfig::parse(spawn)?);
        }
        if let Some(profile) = self.get("profile") {
            builder = builder.platform(profile);
        }
        if let Some(pattern) = self.get("username_pattern") {
            builder = builder.username_pattern(pattern);
        }
        if let Some(pattern) = self.get("password_pattern") {
            builder = builder.password_pattern(pattern);
        }
        if let Some(pattern) = self.get("prompt_pattern") {
            builder = builder.prompt_pattern(pattern);
        }
        if let Some(pattern) = self.get("failed_pattern") {
            builder = builder.failed_pattern(pattern);
        }
        if let Some(pattern) = self.get("paging_pattern") {
            builder = builder.paging_pattern(pattern);
        }
        if let Some(key) = self.get("paging_key") {
            builder = builder.paging_key(key);
        }
        if let Some(timeout) = self.timeout()? {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    /// Login credentials from the resolved options.
    ///
    /// A replay never prompts: when the recording sent a password that is
    /// not known now, a placeholder is sent instead. Recorded password
    /// writes are masked, so the replay accepts it.
    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials {
            username: self.get("username").map(str::to_string),
            password: self
                .get("password")
                .map(|p| SecretString::from(p.to_string())),
            password_in: self.get("password_in") == Some("true"),
        };
        if self.replaying
            && credentials.password.is_none()
            && (credentials.password_in || self.password_recorded)
        {
            debug!("replay: sending a placeholder password");
            credentials.password = Some(SecretString::from(MASK.to_string()));
            credentials.password_in = false;
        }
        credentials
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("netexpect").chain(args.iter().copied())).unwrap()
    }

    fn recorded() -> IndexMap<String, String> {
        [
            ("spawn", "ssh r1"),
            ("username", "admin"),
            ("password", REDACTED),
            ("timeout", "5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_cli_beats_recording_beats_pragma() {
        let cli = cli(&["--username", "ops"]);
        let recorded = recorded();
        let args = vec!["show clock".to_string()];
        let pragma = Pragma::new().set("timeout", "60").set("profile", "cisco_ios");

        let options = Options::resolve(&cli, Some((&recorded, Some(&args))), &pragma);
        assert_eq!(options.get("username"), Some("ops"));
        assert_eq!(options.get("spawn"), Some("ssh r1"));
        assert_eq!(options.get("timeout"), Some("5"));
        assert_eq!(options.get("profile"), Some("cisco_ios"));
        assert_eq!(options.commands, ["show clock"]);
    }

    #[test]
    fn test_redacted_recording_counts_as_absent() {
        let recorded = recorded();
        let options = Options::resolve(&cli(&[]), Some((&recorded, None)), &Pragma::new());
        assert_eq!(options.get("password"), None);
        let password = options.credentials().password.unwrap();
        assert_eq!(password.expose_secret(), MASK);
    }

    #[test]
    fn test_replay_never_prompts_for_password() {
        let recorded: IndexMap<String, String> = [("spawn", "ssh r1"), ("password_in", "true")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let credentials =
            Options::resolve(&cli(&[]), Some((&recorded, None)), &Pragma::new()).credentials();
        assert!(!credentials.password_in);
        assert!(credentials.password.is_some());

        let credentials =
            Options::resolve(&cli(&[]), Some((&self::recorded(), None)), &Pragma::new()).credentials();
        assert!(credentials.password.is_some());

        // Live runs still prompt.
        let credentials = Options::resolve(&cli(&["--password-in"]), None, &Pragma::new()).credentials();
        assert!(credentials.password_in);
        assert!(credentials.password.is_none());
    }

    #[test]
    fn test_reset_ignores_recorded_value() {
        let recorded = recorded();
        let args = vec!["show clock".to_string()];

        let options = Options::resolve(
            &cli(&["--reset", "timeout"]),
            Some((&recorded, Some(&args))),
            &Pragma::new(),
        );
        assert_eq!(options.get("timeout"), None);
        assert_eq!(options.commands, ["show clock"]);

        let options = Options::resolve(&cli(&["--reset"]), Some((&recorded, Some(&args))), &Pragma::new());
        assert!(options.commands.is_empty());
        assert_eq!(options.get("timeout"), Some("5"));
    }

    #[test]
    fn test_redacted_hides_password() {
        let options = Options::resolve(&cli(&["--password", "hunter2"]), None, &Pragma::new());
        assert_eq!(options.redacted()["password"], REDACTED);
        assert_eq!(options.get("password"), Some("hunter2"));
    }

    #[test]
    fn test_timeout_validation() {
        let options = Options::resolve(&cli(&["--timeout", "2.5"]), None, &Pragma::new());
        assert_eq!(options.timeout().unwrap(), Some(Duration::from_millis(2500)));

        let options = Options::resolve(&cli(&["--timeout", "soon"]), None, &Pragma::new());
        assert!(matches!(
            options.timeout(),
            Err(ConfigError::InvalidValue { ref option, .. }) if option == "timeout"
        ));
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(cli(&[]).mode(), Mode::Live);
        assert_eq!(
            cli(&["--replay", "run.json", "--test"]).mode(),
            Mode::Replay {
                path: "run.json".into(),
                test: true
            }
        );
        assert!(Cli::try_parse_from(["netexpect", "--test"]).is_err());
        assert!(Cli::try_parse_from(["netexpect", "--record", "a", "--replay", "b"]).is_err());
        assert!(Cli::try_parse_from(["netexpect", "--strict"]).is_err());
        assert!(cli(&["--replay", "run.json", "--strict"]).strict);
    }

    #[test]
    fn test_session_builder_applies_overrides() {
        let options = Options::resolve(
            &cli(&["--spawn", "telnet 192.0.2.1", "--profile", "cisco_ios", "--timeout", "3"]),
            None,
            &Pragma::new(),
        );
        let config = options.session_builder().unwrap().build().unwrap();
        assert_eq!(config.platform.name, "cisco_ios");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.spawn.unwrap().program, "telnet");
    }
}
