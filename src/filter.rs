//! Variable exclusion by substring.

use serde::{Deserialize, Serialize};

/// Drops variables whose name contains any of the configured patterns.
///
/// An empty filter excludes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExclusionFilter {
    patterns: Vec<String>,
}

impl ExclusionFilter {
    /// Filter that keeps every variable.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a filter from a list of patterns. Empty patterns are ignored.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).filter(|p| !p.is_empty()).collect(),
        }
    }

    /// Parse a comma-delimited pattern list such as `"pooler,cls/"`.
    pub fn from_comma_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Configured patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when `name` must be dropped from the conversion.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

impl From<Vec<String>> for ExclusionFilter {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<ExclusionFilter> for Vec<String> {
    fn from(filter: ExclusionFilter) -> Self {
        filter.patterns
    }
}
