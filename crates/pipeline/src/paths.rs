//! Path filters with GitHub Actions glob semantics.
//!
//! A [`PathFilter`] is an ordered list of [`PathPattern`]s. A file matches the
//! filter when the *last* pattern that matches it is a positive one; a pattern
//! prefixed with `!` excludes files matched by earlier patterns.
//!
//! | Token | Matches |
//! |-------|---------|
//! | `*`   | any characters except `/` |
//! | `**`  | any characters, including `/` |
//! | `?`   | one character except `/` |
//! | other | itself, literally |

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::FilePath;

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;

/// A pattern that is not a usable glob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid path pattern '{pattern}': {reason}")]
pub struct PathPatternError {
    pub pattern: String,
    pub reason: String,
}

/// One compiled glob pattern, possibly negated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    source: String,
    negated: bool,
    regex: Regex,
}

impl PathPattern {
    /// Compiles a glob. A leading `!` makes the pattern an exclusion.
    pub fn parse(pattern: &str) -> Result<Self, PathPatternError> {
        let (negated, glob) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };
        if glob.is_empty() {
            return Err(PathPatternError {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }

        let regex = Regex::new(&glob_to_regex(glob)).map_err(|e| PathPatternError {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            negated,
            regex,
        })
    }

    /// The pattern as written, including any leading `!`.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if this is an exclusion pattern.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Returns `true` if the glob (ignoring negation) matches `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PathPattern {}

impl TryFrom<String> for PathPattern {
    type Error = PathPatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(value: PathPattern) -> Self {
        value.source
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------

/// An ordered list of path patterns.
///
/// An empty filter places no restriction on paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathFilter(Vec<PathPattern>);

impl PathFilter {
    /// Creates a filter from already-compiled patterns.
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self(patterns)
    }

    /// Compiles every pattern in order.
    pub fn parse<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<Self, PathPatternError> {
        patterns
            .into_iter()
            .map(PathPattern::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns `true` if the filter lists no patterns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The patterns in evaluation order.
    pub fn patterns(&self) -> &[PathPattern] {
        &self.0
    }

    /// Returns `true` if `path` is selected: the last matching pattern is positive.
    pub fn selects(&self, path: &FilePath) -> bool {
        self.0
            .iter()
            .rev()
            .find(|p| p.matches(path.as_str()))
            .is_some_and(|p| !p.is_negated())
    }

    /// Returns `true` if any of `files` is selected.
    pub fn selects_any<'a>(&self, files: impl IntoIterator<Item = &'a FilePath>) -> bool {
        files.into_iter().any(|f| self.selects(f))
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                // `**/` also matches zero directories.
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}
