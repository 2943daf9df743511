//! Platform registry for looking up profiles by name.

use std::collections::HashMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Registry for platform definitions.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in profiles.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for platform in [
            vendors::generic::platform(),
            vendors::linux::platform(),
            vendors::cisco_ios::platform(),
            vendors::juniper::platform(),
        ] {
            registry.platforms.insert(platform.name.clone(), platform);
        }
        registry
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    /// Get a clone of a platform, or an error naming the unknown platform.
    pub fn resolve(&self, name: &str) -> Result<PlatformDefinition> {
        self.get(name).cloned().ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// List all registered platform names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_builtins() {
        let registry = PlatformRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            ["cisco_ios", "generic", "juniper_junos", "linux"]
        );
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = PlatformRegistry::with_builtins();
        let err = registry
            .register(PlatformDefinition::new("linux"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::AlreadyRegistered { .. })
        ));

        registry
            .register(PlatformDefinition::new("lab_switch"))
            .unwrap();
        assert!(registry.contains("lab_switch"));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = PlatformRegistry::with_builtins();
        assert!(matches!(
            registry.resolve("nx-os"),
            Err(Error::Platform(PlatformError::UnknownPlatform { .. }))
        ));
    }
}
