//! Hierarchical identifiers for descriptor nodes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a single [`UniqueId`] segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    /// The engine root.
    Engine,
    /// A class (value is the fully qualified name).
    Class,
    /// A field declared on a class (value is the field name).
    Field,
    /// A method declared on a class (value is the method name).
    Method,
}

impl SegmentType {
    /// Returns the textual name used in the id form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Engine => "engine",
            Self::Class => "class",
            Self::Field => "field",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentType {
    type Err = UniqueIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "engine" => Ok(Self::Engine),
            "class" => Ok(Self::Class),
            "field" => Ok(Self::Field),
            "method" => Ok(Self::Method),
            other => Err(UniqueIdParseError::UnknownSegmentType(other.to_string())),
        }
    }
}

/// One `(type, value)` pair of a [`UniqueId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Segment {
    /// Segment kind.
    pub kind: SegmentType,
    /// Segment value.
    pub value: String,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub fn new(kind: SegmentType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.kind, self.value)
    }
}

/// Errors from parsing the textual form of a [`UniqueId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniqueIdParseError {
    /// The input was empty.
    #[error("unique id is empty")]
    Empty,

    /// A segment was not of the form `[type:value]`.
    #[error("malformed segment `{0}`, expected `[type:value]`")]
    MalformedSegment(String),

    /// The segment type is not one of engine, class, field, method.
    #[error("unknown segment type `{0}`")]
    UnknownSegmentType(String),
}

/// An ordered sequence of segments identifying a descriptor node.
///
/// Equality is structural: two nodes with equal ids are the same node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UniqueId {
    segments: Vec<Segment>,
}

impl UniqueId {
    /// Creates the root id of an engine.
    #[must_use]
    pub fn for_engine(engine_id: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::new(SegmentType::Engine, engine_id)],
        }
    }

    /// Returns a new id with one more segment.
    #[must_use]
    pub fn append(&self, kind: SegmentType, value: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::new(kind, value));
        Self { segments }
    }

    /// Returns all segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the last segment.
    #[must_use]
    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Returns the engine id of the first segment, if it is an engine segment.
    #[must_use]
    pub fn engine(&self) -> Option<&str> {
        self.segments
            .first()
            .filter(|s| s.kind == SegmentType::Engine)
            .map(|s| s.value.as_str())
    }

    /// Returns the id without its last segment, or `None` for a single segment.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns true if `self` equals `other` or is one of its ancestors.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for UniqueId {
    type Err = UniqueIdParseError;

    /// Parses `[engine:archunit]/[class:com.a.B]/[field:rule]`.
    ///
    /// Segment values may not contain `]/[`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UniqueIdParseError::Empty);
        }
        let inner = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| UniqueIdParseError::MalformedSegment(s.to_string()))?;

        let segments = inner
            .split("]/[")
            .map(|raw| {
                let (kind, value) = raw
                    .split_once(':')
                    .ok_or_else(|| UniqueIdParseError::MalformedSegment(raw.to_string()))?;
                Ok(Segment::new(kind.parse()?, value))
            })
            .collect::<Result<Vec<_>, UniqueIdParseError>>()?;

        Ok(Self { segments })
    }
}

impl From<UniqueId> for String {
    fn from(id: UniqueId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for UniqueId {
    type Error = UniqueIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_id() -> UniqueId {
        UniqueId::for_engine("archunit")
            .append(SegmentType::Class, "com.example.Rules")
            .append(SegmentType::Field, "no_cycles")
    }

    #[test]
    fn display_uses_bracketed_segments() {
        assert_eq!(
            rule_id().to_string(),
            "[engine:archunit]/[class:com.example.Rules]/[field:no_cycles]"
        );
    }

    #[test]
    fn parses_its_own_textual_form() {
        let parsed: UniqueId = rule_id().to_string().parse().expect("should parse");
        assert_eq!(parsed, rule_id());
    }

    #[test]
    fn rejects_unknown_segment_type() {
        let err = "[engine:archunit]/[package:com.example]"
            .parse::<UniqueId>()
            .unwrap_err();
        assert_eq!(err, UniqueIdParseError::UnknownSegmentType("package".into()));
    }

    #[test]
    fn rejects_missing_brackets() {
        assert!(matches!(
            "engine:archunit".parse::<UniqueId>(),
            Err(UniqueIdParseError::MalformedSegment(_))
        ));
        assert_eq!("".parse::<UniqueId>(), Err(UniqueIdParseError::Empty));
    }

    #[test]
    fn prefix_relation() {
        let class_id = rule_id().parent().expect("has parent");
        assert!(class_id.is_prefix_of(&rule_id()));
        assert!(rule_id().is_prefix_of(&rule_id()));
        assert!(!rule_id().is_prefix_of(&class_id));

        let sibling = class_id.append(SegmentType::Field, "no_cycles_2");
        assert!(!rule_id().is_prefix_of(&sibling));
    }

    #[test]
    fn engine_segment() {
        assert_eq!(rule_id().engine(), Some("archunit"));
        assert!(UniqueId::for_engine("x").parent().is_none());
    }

    #[test]
    fn serializes_as_textual_form() {
        let json = serde_json::to_string(&rule_id()).unwrap();
        assert_eq!(json, format!("\"{}\"", rule_id()));
        assert!(serde_json::from_str::<UniqueId>("\"[bogus:x]\"").is_err());
    }
}
