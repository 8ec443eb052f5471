//! Scenario name filter with glob semantics

use regex::Regex;
use thiserror::Error;

/// Matches scenario names against a glob.
///
/// An empty pattern matches everything. `*` matches any run of characters
/// (including none), `?` exactly one; everything else is literal. The whole
/// name must match.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    regex: Option<Regex>,
}

/// A filter that could not be compiled
#[derive(Debug, Error)]
#[error("Invalid scenario filter '{pattern}': {source}")]
pub struct FilterError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

impl NameFilter {
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Ok(Self::all());
        }

        let mut source = String::from("^");
        let mut previous = None;
        for ch in pattern.chars() {
            match ch {
                // Runs of `*` are one wildcard
                '*' if previous == Some('*') => {}
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(&other.to_string())),
            }
            previous = Some(ch);
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| FilterError {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex: Some(regex),
        })
    }

    /// Match every name
    pub fn all() -> Self {
        Self {
            pattern: String::new(),
            regex: None,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(name),
            None => true,
        }
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        Self::all()
    }
}
