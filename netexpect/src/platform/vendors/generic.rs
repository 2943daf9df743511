//! Generic platform definition.
//!
//! Default patterns only: `login:`/`Username:`, `Password:`/`Passcode:`,
//! and any final line ending in `#`, `>`, `$` or `%`. No pagination, no
//! post-login commands, `exit` on close.

use crate::platform::PlatformDefinition;

/// Platform name for the generic profile.
pub const PLATFORM_NAME: &str = "generic";

/// Create the generic platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME)
}
