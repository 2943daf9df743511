//! Pattern buffer with tail-search optimization.
//!
//! Output accumulates here between matches. Each search only rescans the
//! last `search_depth` bytes of text that was already searched, plus
//! everything that arrived since, so long outputs (full routing tables,
//! `show tech`) do not turn every chunk into a full rescan.

use std::fmt;

use bytes::BytesMut;
use regex::bytes::Regex;

/// A successful search over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    /// Index of the pattern that matched, in the order given to the search.
    pub index: usize,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset where the match ends.
    pub end: usize,
}

/// Buffer for accumulating output and searching it for prompt patterns.
pub struct PatternBuffer {
    /// Accumulated, ANSI-stripped output not yet consumed by a match.
    buffer: BytesMut,

    /// How far back into already-searched text a new search reaches.
    search_depth: usize,

    /// Length of the buffer at the last unsuccessful search.
    scanned: usize,

    /// Escape-sequence parser; kept across chunks so split sequences strip cleanly.
    parser: vte::Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            scanned: 0,
            parser: vte::Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape sequences.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = PlainText {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, data);
    }

    /// Find the first pattern, in list order, that matches the unconsumed text.
    ///
    /// Pattern order is priority order: if both pattern 0 and pattern 2
    /// match, pattern 0 wins regardless of where in the buffer each matched.
    pub fn find_first(&self, patterns: &[&Regex]) -> Option<PatternMatch> {
        let from = self.scanned.saturating_sub(self.search_depth);
        patterns.iter().enumerate().find_map(|(index, pattern)| {
            pattern.find_at(&self.buffer, from).map(|m| PatternMatch {
                index,
                start: m.start(),
                end: m.end(),
            })
        })
    }

    /// Record that the current contents were searched without a match.
    pub fn mark_scanned(&mut self) {
        self.scanned = self.buffer.len();
    }

    /// Remove and return everything up to `end`; the remainder stays buffered.
    pub fn consume(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        self.scanned = 0;
        self.buffer.split_to(end).to_vec()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.scanned = 0;
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .field("scanned", &self.scanned)
            .finish()
    }
}

/// `vte` performer that keeps printable text and line control characters.
struct PlainText<'a> {
    out: &'a mut BytesMut,
}

impl vte::Perform for PlainText<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\n");
        assert_eq!(buffer.as_slice(), b"Green text\r\n");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"--More--\x1b[");
        buffer.extend(b"8D\x1b[Kline two");
        assert_eq!(buffer.as_slice(), b"--More--line two");
    }

    #[test]
    fn test_backspaces_dropped() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b" --More-- \x08\x08\x08\x08\x08\x08\x08\x08\x08\x08next");
        assert_eq!(buffer.as_slice(), b" --More-- next");
    }

    #[test]
    fn test_pattern_priority_is_list_order() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Proceed? [confirm]\nrouter#");
        let prompt = Regex::new(r"router#$").unwrap();
        let confirm = Regex::new(r"\[confirm\]").unwrap();

        let m = buffer.find_first(&[&prompt, &confirm]).unwrap();
        assert_eq!(m.index, 0);

        let m = buffer.find_first(&[&confirm, &prompt]).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(&buffer.as_slice()[m.start..m.end], b"[confirm]");
    }

    #[test]
    fn test_rescan_window_after_mark() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);
        buffer.mark_scanned();

        // Old text beyond the search depth is not rescanned
        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.find_first(&[&pattern]).is_none());

        // New text is always searched
        buffer.extend(b"\nrouter#");
        assert!(buffer.find_first(&[&pattern]).is_some());
    }

    #[test]
    fn test_consume_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"login: trailing");
        let consumed = buffer.consume(7);
        assert_eq!(consumed, b"login: ");
        assert_eq!(buffer.as_slice(), b"trailing");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
