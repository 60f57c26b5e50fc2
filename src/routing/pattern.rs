//! Wildcard path pattern matching.
//!
//! # Responsibilities
//! - Compile rule patterns once at load time
//! - Match request paths against compiled patterns
//!
//! # Design Decisions
//! - `*` matches any sequence of characters (including `/`)
//! - Patterns are anchored at both ends
//! - No regex: a chunk scan keeps matching O(path length)

use thiserror::Error;

/// Error raised when a pattern cannot be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern must not be empty")]
    Empty,
}

/// A compiled path pattern.
///
/// Internally the pattern is split on `*` into literal chunks; matching
/// requires the first chunk as a prefix, the last as a suffix, and the
/// middle chunks to occur in order in between.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    chunks: Vec<String>,
    starts_wild: bool,
    ends_wild: bool,
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let chunks: Vec<String> = pattern
            .split('*')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        Ok(Self {
            raw: pattern.to_string(),
            chunks,
            starts_wild: pattern.starts_with('*'),
            ends_wild: pattern.ends_with('*'),
        })
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` is accepted by this pattern.
    pub fn matches(&self, path: &str) -> bool {
        // No wildcard at all: exact match.
        if !self.raw.contains('*') {
            return path == self.raw;
        }

        let mut rest = path;

        for (i, chunk) in self.chunks.iter().enumerate() {
            let first = i == 0;
            let last = i == self.chunks.len() - 1;

            if first && !self.starts_wild {
                match rest.strip_prefix(chunk.as_str()) {
                    Some(r) => rest = r,
                    None => return false,
                }
                continue;
            }

            if last && !self.ends_wild {
                return rest.ends_with(chunk.as_str());
            }

            match rest.find(chunk.as_str()) {
                Some(pos) => rest = &rest[pos + chunk.len()..],
                None => return false,
            }
        }

        true
    }
}
