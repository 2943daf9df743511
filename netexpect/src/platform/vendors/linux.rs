//! Linux platform definition.
//!
//! This is the simplest platform, supporting standard Linux/Unix shells
//! with `$` (user) and `#` (root) prompts.

use crate::platform::PlatformDefinition;

/// Platform name for Linux hosts.
pub const PLATFORM_NAME: &str = "linux";

/// Create the Linux platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME)
        .with_prompt_pattern(r"(?:^|[\r\n])[^\r\n]*[$#]\s*$")
        .with_on_open_command("export PAGER=cat")
        .with_close_commands(["exit"])
        .with_terminal_size(511, 24)
}
