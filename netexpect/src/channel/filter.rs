//! Secret masking for transcript logging.

use std::borrow::Cow;

use secrecy::{ExposeSecret, SecretString};

/// Replacement shown wherever the active secret would appear.
pub const MASK: &str = "********";

/// Single-slot secret filter.
///
/// Set right before a secret is written to the transport and cleared right
/// after, so only the log lines describing that write are masked.
#[derive(Default)]
pub struct LogFilter {
    secret: Option<SecretString>,
}

impl LogFilter {
    /// Create a filter that is already active for `secret`.
    pub fn for_secret(secret: &SecretString) -> Self {
        let mut filter = Self::default();
        filter.set(secret);
        filter
    }

    /// Activate the filter. Empty secrets are ignored.
    pub fn set(&mut self, secret: &SecretString) {
        if !secret.expose_secret().is_empty() {
            self.secret = Some(secret.clone());
        }
    }

    /// Deactivate the filter.
    pub fn clear(&mut self) {
        self.secret = None;
    }

    /// Whether a secret is currently being masked.
    pub fn is_active(&self) -> bool {
        self.secret.is_some()
    }

    /// Mask every occurrence of the secret in `text`.
    ///
    /// Matching is literal, so secrets containing regex metacharacters are
    /// masked the same as any other.
    pub fn mask<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.secret {
            Some(secret) if text.contains(secret.expose_secret()) => {
                Cow::Owned(text.replace(secret.expose_secret(), MASK))
            }
            _ => Cow::Borrowed(text),
        }
    }

    /// Mask raw transcript bytes for logging.
    pub fn mask_bytes(&self, data: &[u8]) -> String {
        self.mask(&String::from_utf8_lossy(data)).into_owned()
    }
}

impl std::fmt::Debug for LogFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFilter")
            .field("active", &self.is_active())
            .finish()
    }
}
