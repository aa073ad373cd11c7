//! Discovery requests: selectors, name filters and passthrough parameters.

use crate::model::ClassName;
use crate::unique_id::UniqueId;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;

/// One way of selecting what to discover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A whole root class.
    Class(ClassName),
    /// A single node (and, for containers, everything below it).
    UniqueId(UniqueId),
    /// Every rule class reachable under a classpath root.
    ClasspathRoot(PathBuf),
}

/// An invalid class name pattern.
#[derive(Debug, thiserror::Error)]
#[error("invalid class name pattern `{pattern}`: {source}")]
pub struct PatternError {
    /// The rejected pattern.
    pub pattern: String,
    /// Underlying regex error.
    pub source: regex::Error,
}

/// Include/exclude filters on fully qualified class names.
///
/// Patterns are regular expressions that must match the whole name. A class
/// passes if it matches no exclude pattern and, when include patterns exist,
/// at least one of them. Exclusion wins when both match.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl NameFilter {
    /// Creates an empty filter that accepts every class.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds include patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid regular expression.
    pub fn include<I, S>(mut self, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.include.push(compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Adds exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid regular expression.
    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.exclude.push(compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Merges the patterns of another filter into this one.
    pub fn extend(&mut self, other: Self) {
        self.include.extend(other.include);
        self.exclude.extend(other.exclude);
    }

    /// Returns true if the class passes the filter.
    #[must_use]
    pub fn accepts(&self, class: &ClassName) -> bool {
        let name = class.as_str();
        if self.exclude.iter().any(|r| r.is_match(name)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|r| r.is_match(name))
    }

    /// Returns true if no patterns are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| PatternError {
        pattern: pattern.to_string(),
        source,
    })
}

/// Everything a consumer asked discovery for.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    selectors: Vec<Selector>,
    name_filter: NameFilter,
    parameters: HashMap<String, String>,
}

impl DiscoveryRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a whole class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<ClassName>) -> Self {
        self.selectors.push(Selector::Class(class.into()));
        self
    }

    /// Selects a node by unique id.
    #[must_use]
    pub fn with_unique_id(mut self, id: UniqueId) -> Self {
        self.selectors.push(Selector::UniqueId(id));
        self
    }

    /// Selects every rule class under a classpath root.
    #[must_use]
    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.selectors.push(Selector::ClasspathRoot(root.into()));
        self
    }

    /// Adds a class name filter applied to classpath root scanning.
    #[must_use]
    pub fn with_name_filter(mut self, filter: NameFilter) -> Self {
        self.name_filter.extend(filter);
        self
    }

    /// Adds an opaque configuration parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the selectors in the order they were added.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Returns the combined name filter.
    #[must_use]
    pub fn name_filter(&self) -> &NameFilter {
        &self.name_filter
    }

    /// Returns the passthrough parameters.
    #[must_use]
    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ClassName {
        ClassName::new(s)
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = NameFilter::new();
        assert!(filter.is_empty());
        assert!(filter.accepts(&name("com.example.Anything")));
    }

    #[test]
    fn include_requires_full_match() {
        let filter = NameFilter::new().include([".*Rules"]).expect("valid");
        assert!(filter.accepts(&name("com.example.SimpleRules")));
        assert!(!filter.accepts(&name("com.example.SimpleRulesHelper")));
    }

    #[test]
    fn exclude_rejects_matches() {
        let filter = NameFilter::new().exclude([".*(W|w)rong.*"]).expect("valid");
        assert!(!filter.accepts(&name("com.example.wrong.WrongRuleMethod")));
        assert!(filter.accepts(&name("com.example.SimpleRules")));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = NameFilter::new()
            .include([".*Rules.*"])
            .and_then(|f| f.exclude([".*Wrong.*"]))
            .expect("valid");
        assert!(!filter.accepts(&name("com.example.WrongRules")));
        assert!(filter.accepts(&name("com.example.SimpleRules")));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = NameFilter::new().include(["(unclosed"]).unwrap_err();
        assert_eq!(err.pattern, "(unclosed");
    }

    #[test]
    fn request_collects_selectors_in_order() {
        let request = DiscoveryRequest::new()
            .with_class("com.example.A")
            .with_classpath_root("/classes")
            .with_parameter("k", "v");
        assert_eq!(
            request.selectors(),
            &[
                Selector::Class(name("com.example.A")),
                Selector::ClasspathRoot(PathBuf::from("/classes")),
            ]
        );
        assert_eq!(request.parameters().get("k").map(String::as_str), Some("v"));
    }
}
