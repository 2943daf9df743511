//! Pattern helpers for prompt detection.

use memchr::memrchr2;
use regex::bytes::Regex;

/// Matches `login:`, `Username:` and similar at the end of the buffer.
pub const DEFAULT_USERNAME_PATTERN: &str = r"(?i)(?:user(?:\s*name)?|login)\s*:\s*$";

/// Matches `Password:` and one-time `Passcode:` prompts.
pub const DEFAULT_PASSWORD_PATTERN: &str = r"(?i)pass(?:word|code)\s*:\s*$";

/// Matches a whole final line ending in one of the usual prompt characters.
pub const DEFAULT_PROMPT_PATTERN: &str = r"[^\r\n]*[#>$%]\s*$";

/// Key sent to advance a pager.
pub const DEFAULT_PAGING_KEY: &str = " ";

/// Compile a pattern string into a byte regex.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

/// Compile an observed prompt into the session's permanent prompt pattern.
///
/// The text is escaped, so prompts such as `router(config)#` or `[edit]`
/// match literally. It must start a line and end the buffer, allowing
/// trailing blanks.
pub fn anchored_prompt(observed: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?:^|[\r\n])[ \t]*{}[ \t]*$",
        regex::escape(observed)
    ))
}

/// Extract the prompt line from text consumed by a prompt match.
///
/// Returns the last line with surrounding whitespace removed.
pub fn prompt_line(text: &[u8]) -> String {
    let trimmed = trim_end_ascii(text);
    let start = memrchr2(b'\n', b'\r', trimmed).map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&trimmed[start..]).trim().to_string()
}

fn trim_end_ascii(text: &[u8]) -> &[u8] {
    let end = text
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &text[..end]
}
