//! Fact-name filters - a small glob language compiled to anchored regexes.
//!
//! Requests carry fact-name allow-lists written as globs: `**` matches any
//! sequence including `/`, `*` matches within one path segment, `?` matches
//! a single non-`/` character, and everything else is literal. A request
//! with no filters means "all facts"; with filters, a fact survives if it
//! matches at least one of them.

use regex::Regex;
use thiserror::Error;

/// A filter glob failed to compile.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid fact filter: {0}")]
    Regex(#[from] regex::Error),
}

/// A compiled set of fact-name filters.
#[derive(Debug, Clone, Default)]
pub struct FactFilter {
    patterns: Vec<Regex>,
}

impl FactFilter {
    /// Compiles a list of filter globs. An empty list compiles to the
    /// unrestricted filter.
    pub fn compile<S: AsRef<str>>(globs: &[S]) -> Result<Self, FilterError> {
        let mut patterns = Vec::with_capacity(globs.len());
        for glob in globs {
            patterns.push(Regex::new(&glob_to_regex(glob.as_ref()))?);
        }
        Ok(Self { patterns })
    }

    /// Returns true if no globs were supplied.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if the fact name survives the filter: always, when the
    /// filter is unrestricted, otherwise iff some glob matches the whole
    /// name.
    pub fn matches(&self, fact_name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.is_match(fact_name))
    }
}

/// Translates one glob into an anchored regex, scanning left to right and
/// emitting escaped literal chunks between operator translations.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    let mut literal = String::new();
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str("[^/]");
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}
