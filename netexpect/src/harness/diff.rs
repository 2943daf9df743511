//! Line diff between a recorded run and a replayed one.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?")
        .expect("timestamp regex")
});

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}:\d{2}(?:\.\d+)?\b")
        .expect("clock regex")
});

static PID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pid[ =:]*)\d+").expect("pid regex")
});

/// Replace text that legitimately differs between runs.
///
/// Timestamps become `<timestamp>`, clock times `<time>`, and process ids
/// after `pid` become `<pid>`.
pub fn filter_volatile(text: &str) -> String {
    let text = ISO_TIMESTAMP.replace_all(text, "<timestamp>");
    let text = CLOCK_TIME.replace_all(&text, "<time>");
    PID.replace_all(&text, "${1}<pid>").into_owned()
}

/// One line of a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Same(String),
    Removed(String),
    Added(String),
}

/// Line-by-line comparison of two texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    label: String,
    lines: Vec<DiffLine>,
}

impl Diff {
    /// Diff `expected` against `actual`, labelling the output with `label`.
    pub fn lines(label: impl Into<String>, expected: &str, actual: &str) -> Self {
        let old: Vec<&str> = expected.lines().collect();
        let new: Vec<&str> = actual.lines().collect();
        Self {
            label: label.into(),
            lines: lcs_diff(&old, &new),
        }
    }

    /// True when both sides are identical.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| matches!(l, DiffLine::Same(_)))
    }

    /// Lines only in the recording.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            DiffLine::Removed(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Lines only in the new run.
    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            DiffLine::Added(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn entries(&self) -> &[DiffLine] {
        &self.lines
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        writeln!(f, "--- recorded {}", self.label)?;
        writeln!(f, "+++ replayed {}", self.label)?;
        for line in &self.lines {
            match line {
                DiffLine::Same(_) => {}
                DiffLine::Removed(s) => writeln!(f, "-{s}")?,
                DiffLine::Added(s) => writeln!(f, "+{s}")?,
            }
        }
        Ok(())
    }
}

/// Classic longest-common-subsequence table walk.
fn lcs_diff(old: &[&str], new: &[&str]) -> Vec<DiffLine> {
    let (n, m) = (old.len(), new.len());
    // lengths[i][j] = LCS length of old[i..] and new[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if old[i] == new[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut out = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            out.push(DiffLine::Same(old[i].to_string()));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            out.push(DiffLine::Removed(old[i].to_string()));
            i += 1;
        } else {
            out.push(DiffLine::Added(new[j].to_string()));
            j += 1;
        }
    }
    out.extend(old[i..].iter().map(|s| DiffLine::Removed(s.to_string())));
    out.extend(new[j..].iter().map(|s| DiffLine::Added(s.to_string())));
    out
}
