//! Serializable test capture.
//!
//! A capture is one pretty-printed JSON document:
//!
//! ```text
//! {
//!   "version": 1,
//!   "harness": { "stdout": [...], "stderr": [...] },
//!   "components": {
//!     "options": { "options": { "username": "admin", ... }, "args": ["show version"] },
//!     "session": { "events": [ { "op": "read", "data": "login: " }, ... ] }
//!   }
//! }
//! ```
//!
//! Stream chunks and transport payloads are kept as plain strings so a
//! capture diffs cleanly under version control.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HarnessError;

/// Current capture format version.
pub const CAPTURE_VERSION: u32 = 1;

/// Component holding resolved options and extra arguments.
pub const OPTIONS_COMPONENT: &str = "options";

/// Stored in place of secret option values.
pub const REDACTED: &str = "<redacted>";

// ── Payload ───────────────────────────────────────────────────────────────────

/// Raw transport bytes: a JSON string when valid UTF-8, else `{"hex": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(pub Vec<u8>);

impl Payload {
    /// The bytes as text, lossily.
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PayloadRepr {
    Text(String),
    Hex { hex: String },
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match std::str::from_utf8(&self.0) {
            Ok(text) => PayloadRepr::Text(text.to_string()),
            Err(_) => PayloadRepr::Hex {
                hex: hex::encode(&self.0),
            },
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PayloadRepr::deserialize(deserializer)? {
            PayloadRepr::Text(text) => Ok(Self(text.into_bytes())),
            PayloadRepr::Hex { hex: digits } => hex::decode(&digits).map(Self).map_err(|e| {
                serde::de::Error::custom(format!("invalid hex payload {digits:?}: {e}"))
            }),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One step of a session's transport traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransportEvent {
    /// Bytes read from the device.
    Read { data: Payload },
    /// Bytes written to the device (secrets masked).
    Write { data: Payload },
    /// A read that timed out with nothing received.
    Timeout,
    /// The device closed the stream.
    Eof,
}

/// Process-level stdout/stderr, as the chunks were written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCapture {
    #[serde(default)]
    pub stdout: Vec<String>,
    #[serde(default)]
    pub stderr: Vec<String>,
}

impl StreamCapture {
    /// All stdout chunks joined.
    pub fn stdout_text(&self) -> String {
        self.stdout.concat()
    }

    /// All stderr chunks joined.
    pub fn stderr_text(&self) -> String {
        self.stderr.concat()
    }
}

/// Everything recorded for one named component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCapture {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TransportEvent>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

/// A full capture file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCapture {
    pub version: u32,

    #[serde(default)]
    pub harness: StreamCapture,

    #[serde(default)]
    pub components: IndexMap<String, ComponentCapture>,
}

impl Default for TestCapture {
    fn default() -> Self {
        Self {
            version: CAPTURE_VERSION,
            harness: StreamCapture::default(),
            components: IndexMap::new(),
        }
    }
}

impl TestCapture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a capture file.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let raw = fs::read_to_string(path).map_err(|source| HarnessError::ReplayMissing {
            path: path.to_path_buf(),
            source,
        })?;
        let capture: Self =
            serde_json::from_str(&raw).map_err(|e| HarnessError::ReplayCorrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if capture.version != CAPTURE_VERSION {
            return Err(HarnessError::ReplayCorrupt {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported capture version {} (expected {})",
                    capture.version, CAPTURE_VERSION
                ),
            });
        }
        Ok(capture)
    }

    /// Write the capture as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), HarnessError> {
        let record_error = |reason: String| HarnessError::RecordWrite {
            path: path.to_path_buf(),
            reason,
        };
        let mut json = serde_json::to_string_pretty(self).map_err(|e| record_error(e.to_string()))?;
        json.push('\n');
        fs::write(path, json).map_err(|e| record_error(e.to_string()))
    }

    /// Look up a component.
    pub fn component(&self, name: &str) -> Option<&ComponentCapture> {
        self.components.get(name)
    }

    /// Get or create a component.
    pub fn component_mut(&mut self, name: &str) -> &mut ComponentCapture {
        self.components.entry(name.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text_and_hex() {
        let text = serde_json::to_string(&Payload::from("router#")).unwrap();
        assert_eq!(text, r#""router#""#);

        let binary = serde_json::to_string(&Payload(vec![0xff, 0x00, 0x41])).unwrap();
        assert_eq!(binary, r#"{"hex":"ff0041"}"#);

        let back: Payload = serde_json::from_str(&binary).unwrap();
        assert_eq!(back.0, [0xff, 0x00, 0x41]);
    }

    #[test]
    fn test_bad_hex_rejected() {
        assert!(serde_json::from_str::<Payload>(r#"{"hex":"abc"}"#).is_err());
        assert!(serde_json::from_str::<Payload>(r#"{"hex":"zz"}"#).is_err());
    }

    #[test]
    fn test_event_layout() {
        let event = TransportEvent::Write {
            data: Payload::from("show version\r"),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"op":"write","data":"show version\r"}"#
        );
        assert_eq!(
            serde_json::to_string(&TransportEvent::Timeout).unwrap(),
            r#"{"op":"timeout"}"#
        );
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("nope.json");
        assert!(matches!(
            TestCapture::load(&missing),
            Err(HarnessError::ReplayMissing { .. })
        ));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(
            TestCapture::load(&corrupt),
            Err(HarnessError::ReplayCorrupt { .. })
        ));

        let future = dir.path().join("future.json");
        fs::write(&future, r#"{"version": 99}"#).unwrap();
        assert!(matches!(
            TestCapture::load(&future),
            Err(HarnessError::ReplayCorrupt { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.json");

        let mut capture = TestCapture::new();
        capture.harness.stdout.push("hello\n".into());
        capture.component_mut("session").events.push(TransportEvent::Read {
            data: Payload::from("login: "),
        });
        capture.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"op\": \"read\""));
        assert_eq!(TestCapture::load(&path).unwrap(), capture);
    }

    #[test]
    fn test_save_to_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/capture.json");
        assert!(matches!(
            TestCapture::new().save(&path),
            Err(HarnessError::RecordWrite { .. })
        ));
    }
}
