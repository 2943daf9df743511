//! Builder for session configuration.

use std::time::Duration;

use regex::bytes::Regex;

use crate::channel::patterns::compile_pattern;
use crate::error::{ConfigError, Result};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::SpawnConfig;

/// Default time to wait for any single expected pattern.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of already-searched bytes a new search looks back over.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Compiled settings for one session: profile plus overrides.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The profile the settings came from.
    pub platform: PlatformDefinition,

    /// Command to spawn. Only needed for live sessions.
    pub spawn: Option<SpawnConfig>,

    pub username_pattern: Regex,
    pub password_pattern: Regex,

    /// Observes the prompt during login; replaced by the learned prompt afterwards.
    pub prompt_pattern: Regex,

    pub failed_pattern: Option<Regex>,
    pub paging_pattern: Option<Regex>,
    pub paging_key: String,
    pub line_ending: String,

    /// Default timeout for each wait.
    pub timeout: Duration,

    /// Tail-search depth for the pattern buffer.
    pub search_depth: usize,
}

/// Builder for [`SessionConfig`].
///
/// Pattern overrides replace the profile's pattern of the same name. All
/// patterns are compiled in [`build`](Self::build), so a bad override is
/// reported before anything is spawned.
///
/// # Example
///
/// ```rust
/// use netexpect::driver::SessionBuilder;
/// use netexpect::transport::SpawnConfig;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), netexpect::Error> {
/// let config = SessionBuilder::new()
///     .platform("cisco_ios")
///     .spawn(SpawnConfig::parse("ssh -l admin 192.0.2.1")?)
///     .failed_pattern(r"% (?:Authentication|Login) failed")
///     .timeout(Duration::from_secs(20))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    platform_name: Option<String>,
    custom_platform: Option<PlatformDefinition>,
    spawn: Option<SpawnConfig>,
    username_pattern: Option<String>,
    password_pattern: Option<String>,
    prompt_pattern: Option<String>,
    failed_pattern: Option<String>,
    paging_pattern: Option<String>,
    paging_key: Option<String>,
    timeout: Duration,
    search_depth: usize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a builder using the generic profile.
    pub fn new() -> Self {
        Self {
            platform_name: None,
            custom_platform: None,
            spawn: None,
            username_pattern: None,
            password_pattern: None,
            prompt_pattern: None,
            failed_pattern: None,
            paging_pattern: None,
            paging_key: None,
            timeout: DEFAULT_TIMEOUT,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Select a built-in profile by name (e.g., "linux", "cisco_ios").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    /// Use a custom platform definition.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Set the command to spawn.
    pub fn spawn(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = Some(spawn);
        self
    }

    pub fn username_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.username_pattern = Some(pattern.into());
        self
    }

    pub fn password_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.password_pattern = Some(pattern.into());
        self
    }

    pub fn prompt_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.prompt_pattern = Some(pattern.into());
        self
    }

    pub fn failed_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_pattern = Some(pattern.into());
        self
    }

    pub fn paging_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.paging_pattern = Some(pattern.into());
        self
    }

    pub fn paging_key(mut self, key: impl Into<String>) -> Self {
        self.paging_key = Some(key.into());
        self
    }

    /// Set the default timeout for each wait.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pattern buffer search depth.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Resolve the profile and compile every pattern.
    pub fn build(self) -> Result<SessionConfig> {
        self.build_with(&PlatformRegistry::with_builtins())
    }

    /// Like [`build`](Self::build), looking profiles up in `registry`.
    pub fn build_with(self, registry: &PlatformRegistry) -> Result<SessionConfig> {
        let platform = match (self.custom_platform, self.platform_name) {
            (Some(custom), _) => custom,
            (None, Some(name)) => registry.resolve(&name)?,
            (None, None) => registry.resolve(crate::platform::vendors::generic::PLATFORM_NAME)?,
        };

        let username = self
            .username_pattern
            .unwrap_or_else(|| platform.username_pattern.clone());
        let password = self
            .password_pattern
            .unwrap_or_else(|| platform.password_pattern.clone());
        let prompt = self
            .prompt_pattern
            .unwrap_or_else(|| platform.prompt_pattern.clone());
        let failed = self.failed_pattern.or_else(|| platform.failed_pattern.clone());
        let paging = self.paging_pattern.or_else(|| platform.paging_pattern.clone());

        let spawn = self.spawn.map(|spawn| {
            spawn.with_terminal_size(platform.terminal_width, platform.terminal_height)
        });

        Ok(SessionConfig {
            username_pattern: compile_option("username_pattern", &username)?,
            password_pattern: compile_option("password_pattern", &password)?,
            prompt_pattern: compile_option("prompt_pattern", &prompt)?,
            failed_pattern: failed
                .map(|p| compile_option("failed_pattern", &p))
                .transpose()?,
            paging_pattern: paging
                .map(|p| compile_option("paging_pattern", &p))
                .transpose()?,
            paging_key: self.paging_key.unwrap_or_else(|| platform.paging_key.clone()),
            line_ending: platform.line_ending.clone(),
            timeout: self.timeout,
            search_depth: self.search_depth,
            spawn,
            platform,
        })
    }
}

fn compile_option(option: &str, pattern: &str) -> std::result::Result<Regex, ConfigError> {
    compile_pattern(pattern).map_err(|source| ConfigError::InvalidPattern {
        option: option.to_string(),
        source,
    })
}
