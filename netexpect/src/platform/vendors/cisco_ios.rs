//! Cisco IOS / IOS-XE platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! router>                  # user exec
//! router#                  # privileged exec
//! router(config)#          # configuration
//! router(config-if)#       # interface configuration
//! ```
//!
//! Long output pauses at ` --More-- `; a space advances one page.

use crate::platform::PlatformDefinition;

/// Platform name for Cisco IOS.
pub const PLATFORM_NAME: &str = "cisco_ios";

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME)
        .with_username_pattern(r"(?i)username:\s*$")
        .with_prompt_pattern(r"(?:^|[\r\n])[\w.\-@/:]{1,63}(?:\([\w.\-@/:+]{0,32}\))?[>#]\s*$")
        .with_paging(r" ?--More-- ?", " ")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_close_commands(["exit"])
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::patterns::compile_pattern;

    #[test]
    fn test_cisco_platform() {
        let platform = platform();
        assert_eq!(platform.name, "cisco_ios");
        assert_eq!(
            platform.on_open_commands,
            ["terminal length 0", "terminal width 511"]
        );
        assert_eq!(platform.paging_key, " ");
    }

    #[test]
    fn test_prompt_match() {
        let prompt = compile_pattern(&platform().prompt_pattern).unwrap();
        assert!(prompt.is_match(b"router>"));
        assert!(prompt.is_match(b"\r\nrouter#"));
        assert!(prompt.is_match(b"\r\ncore-sw1.lab(config-if)# "));
        assert!(!prompt.is_match(b"Welcome to router#1 lab\r\n"));
    }

    #[test]
    fn test_paging_match() {
        let paging = compile_pattern(platform().paging_pattern.as_deref().unwrap()).unwrap();
        assert!(paging.is_match(b"line 23\r\n --More-- "));
    }
}
