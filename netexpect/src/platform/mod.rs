//! Platform profiles for multi-vendor support.
//!
//! A profile is plain configuration applied to the generic session engine:
//! recognition patterns, pagination, post-login commands, the close
//! sequence, and an optional output post-processing hook.

mod definition;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use registry::PlatformRegistry;

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Post-process normalized command output.
    fn post_process_output(&self, output: &str) -> String {
        output.to_string()
    }
}

/// Default vendor behavior implementation.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}
