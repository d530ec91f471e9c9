use regex::bytes::Regex;
use tracing::debug;

use crate::errors::{ScanError, ScanResult};
use crate::patterns::{Confidence, PatternSpec};

/// A pattern ready to run against line bytes.
#[derive(Debug)]
pub struct CompiledPattern {
    pub name: String,
    pub confidence: Confidence,
    regex: Regex,
}

/// One pattern hit within a single line. The caller fills in the source
/// identifier and line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub pattern: String,
    pub confidence: Confidence,
    pub text: String,
    pub offset: usize,
}

/// The compiled pattern list for a scan session.
///
/// Compiled once up front and shared read-only across all workers; patterns
/// are never added or removed mid-scan, so no synchronization is needed.
#[derive(Debug, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compiles the ordered spec list into an index-aligned compiled list.
    ///
    /// Fail-fast: the first invalid regex aborts compilation with its pattern
    /// name, and the scan never starts. Byte-level regexes are used so lines
    /// containing invalid UTF-8 are still scanned.
    pub fn compile(specs: &[PatternSpec]) -> ScanResult<Self> {
        let mut patterns = Vec::with_capacity(specs.len());
        for spec in specs {
            let regex = Regex::new(&spec.regex)
                .map_err(|e| ScanError::invalid_pattern(&spec.name, e))?;
            patterns.push(CompiledPattern {
                name: spec.name.clone(),
                confidence: spec.confidence,
                regex,
            });
        }
        debug!("Compiled {} patterns", patterns.len());
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Runs every pattern over one logical line and returns all
    /// non-overlapping matches per pattern, leftmost-first.
    ///
    /// Different patterns may hit overlapping byte ranges; within one pattern
    /// the regex engine already guarantees non-overlap. `truncate` > 0 caps
    /// the reported text at that many characters with a `...` marker; 0
    /// reports matches whole. Pure function of its arguments.
    pub fn match_line(&self, line: &[u8], truncate: usize) -> Vec<LineMatch> {
        let mut matches = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(line) {
                let text = String::from_utf8_lossy(m.as_bytes());
                matches.push(LineMatch {
                    pattern: pattern.name.clone(),
                    confidence: pattern.confidence,
                    text: truncate_text(&text, truncate),
                    offset: m.start(),
                });
            }
        }
        matches
    }
}

/// Caps `text` at `max_chars` characters, marking the cut with `...`.
fn truncate_text(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    }
}
