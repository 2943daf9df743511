//! Juniper JUNOS platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! user@router>              # operational mode
//! user@router#              # configuration mode
//! {master:0}                # routing-engine indicator (separate line)
//! user@router>              # prompt on the next line
//! ```
//!
//! The pager shows `---(more)---` or `---(more 42%)---`.

use std::sync::Arc;

use crate::platform::{PlatformDefinition, VendorBehavior};

/// Platform name for Juniper JUNOS.
pub const PLATFORM_NAME: &str = "juniper_junos";

/// Create the Juniper JUNOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME)
        .with_prompt_pattern(r"(?:^|[\r\n])[\w\-@()/:.]{1,63}[>#%]\s?$")
        .with_paging(r"---\(more(?: \d+%)?\)---", " ")
        .with_on_open_command("set cli screen-length 0")
        .with_on_open_command("set cli screen-width 511")
        .with_close_commands(["exit"])
        .with_terminal_size(511, 24)
        .with_behavior(Arc::new(JuniperBehavior))
}

/// Juniper JUNOS-specific behavior.
pub struct JuniperBehavior;

impl VendorBehavior for JuniperBehavior {
    fn post_process_output(&self, output: &str) -> String {
        // Context and routing-engine lines belong to the prompt, not the output
        let mut kept: Vec<&str> = output
            .lines()
            .filter(|line| {
                let line = line.trim();
                !line.starts_with("[edit") && !is_routing_engine_marker(line)
            })
            .collect();
        if output.ends_with('\n') {
            kept.push("");
        }
        kept.join("\n")
    }
}

fn is_routing_engine_marker(line: &str) -> bool {
    line.starts_with('{') && line.ends_with('}') && line.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::patterns::compile_pattern;

    #[test]
    fn test_juniper_platform() {
        let platform = platform();
        assert_eq!(platform.name, "juniper_junos");
        assert!(platform.behavior.is_some());
        assert_eq!(platform.on_open_commands.len(), 2);
    }

    #[test]
    fn test_prompt_match() {
        let prompt = compile_pattern(&platform().prompt_pattern).unwrap();
        assert!(prompt.is_match(b"user@router>"));
        assert!(prompt.is_match(b"{master:0}\nadmin@mx960> "));
        assert!(prompt.is_match(b"[edit]\r\nuser@router# "));
        assert!(!prompt.is_match(b"user@router> show"));
    }

    #[test]
    fn test_paging_match() {
        let paging = compile_pattern(platform().paging_pattern.as_deref().unwrap()).unwrap();
        assert!(paging.is_match(b"---(more)---"));
        assert!(paging.is_match(b"---(more 42%)---"));
    }

    #[test]
    fn test_post_process_strips_context_lines() {
        let output = "ge-0/0/0 up\n[edit interfaces]\n{master:0}\nge-0/0/1 down\n";
        assert_eq!(
            JuniperBehavior.post_process_output(output),
            "ge-0/0/0 up\nge-0/0/1 down\n"
        );
    }
}
