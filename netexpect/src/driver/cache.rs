//! Generation-keyed command output cache.

use std::collections::HashMap;

use super::response::Response;

/// Maps command text to its last response within the current generation.
///
/// Clearing bumps the generation instead of deleting entries, so every
/// earlier response becomes unreachable at once.
#[derive(Debug, Default)]
pub struct CommandCache {
    generation: u64,
    entries: HashMap<(u64, String), Response>,
}

impl CommandCache {
    /// Create an empty cache at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `command` in the current generation.
    pub fn get(&self, command: &str) -> Option<&Response> {
        self.entries.get(&(self.generation, command.to_string()))
    }

    /// Store a response for `command` in the current generation.
    pub fn insert(&mut self, command: impl Into<String>, response: Response) {
        self.entries
            .insert((self.generation, command.into()), response);
    }

    /// Invalidate everything cached so far.
    pub fn clear(&mut self) {
        self.generation += 1;
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
