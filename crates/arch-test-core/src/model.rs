//! Reflected class metadata consumed by discovery.
//!
//! These types describe what the member reflector found on a class: its
//! markers (tags, ignore, analysis configuration) and its declared rule
//! members. They carry no behavior beyond small accessors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name of the marker that declares rule members.
pub const RULE_MARKER: &str = "ArchTest";

/// A fully qualified class name, e.g. `com.example.Outer$Inner`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    /// Creates a class name from its fully qualified form.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the fully qualified name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the simple name: the part after the last `.` and, for nested
    /// classes, after the last `$`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        let after_package = self.0.rsplit('.').next().unwrap_or(&self.0);
        after_package.rsplit('$').next().unwrap_or(after_package)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A tag attached to a class or member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The inputs determining which classes a root class's rules are evaluated
/// against. Used as part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisConfiguration {
    /// Packages to import.
    #[serde(default)]
    pub packages: Vec<String>,
    /// Classes whose packages should be imported.
    #[serde(default)]
    pub package_roots: Vec<String>,
    /// Location providers contributing additional locations.
    #[serde(default)]
    pub location_providers: Vec<String>,
    /// Import options filtering the imported locations.
    #[serde(default)]
    pub import_options: Vec<String>,
}

impl AnalysisConfiguration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package to import.
    #[must_use]
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.packages.push(package.into());
        self
    }

    /// Adds a class whose package should be imported.
    #[must_use]
    pub fn package_root(mut self, class: impl Into<String>) -> Self {
        self.package_roots.push(class.into());
        self
    }

    /// Adds a location provider.
    #[must_use]
    pub fn location_provider(mut self, provider: impl Into<String>) -> Self {
        self.location_providers.push(provider.into());
        self
    }

    /// Adds an import option.
    #[must_use]
    pub fn import_option(mut self, option: impl Into<String>) -> Self {
        self.import_options.push(option.into());
        self
    }
}

/// An ignore marker, optionally with a reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    /// Why the rule is ignored.
    #[serde(default)]
    pub reason: Option<String>,
}

impl Ignore {
    /// Creates an ignore marker with a reason.
    #[must_use]
    pub fn because(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    /// Returns the reason, or a generic description if none was given.
    #[must_use]
    pub fn describe(&self, target: &str) -> String {
        match &self.reason {
            Some(reason) if !reason.is_empty() => reason.clone(),
            _ => format!("{target} is ignored"),
        }
    }
}

/// Markers shared by all member kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberMarkers {
    /// Declared tags.
    pub tags: BTreeSet<Tag>,
    /// Ignore marker, if present.
    pub ignore: Option<Ignore>,
}

/// A rule-bearing member declared on a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredMember {
    /// A field holding a rule.
    Field {
        /// Field name.
        name: String,
        /// Member markers.
        markers: MemberMarkers,
    },
    /// A method implementing a rule.
    Method {
        /// Method name.
        name: String,
        /// Whether the method can be called without an instance.
        is_static: bool,
        /// Fully qualified parameter type names, in order.
        parameter_types: Vec<String>,
        /// Member markers.
        markers: MemberMarkers,
    },
    /// A field referencing another rule-bearing class whose rules are
    /// included as a nested container.
    Library {
        /// Name of the referencing field.
        name: String,
        /// The included class.
        class: ClassName,
        /// Member markers.
        markers: MemberMarkers,
    },
}

impl DeclaredMember {
    /// Creates a field rule without markers.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            markers: MemberMarkers::default(),
        }
    }

    /// Creates a method rule without markers.
    #[must_use]
    pub fn method<I, S>(name: impl Into<String>, is_static: bool, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Method {
            name: name.into(),
            is_static,
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
            markers: MemberMarkers::default(),
        }
    }

    /// Creates a library reference without markers.
    #[must_use]
    pub fn library(name: impl Into<String>, class: impl Into<ClassName>) -> Self {
        Self::Library {
            name: name.into(),
            class: class.into(),
            markers: MemberMarkers::default(),
        }
    }

    /// Adds a tag to this member.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.markers_mut().tags.insert(Tag::new(tag));
        self
    }

    /// Marks this member as ignored.
    #[must_use]
    pub fn ignored(mut self, ignore: Ignore) -> Self {
        self.markers_mut().ignore = Some(ignore);
        self
    }

    /// Returns the member name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field { name, .. } | Self::Method { name, .. } | Self::Library { name, .. } => {
                name
            }
        }
    }

    /// Returns the member markers.
    #[must_use]
    pub fn markers(&self) -> &MemberMarkers {
        match self {
            Self::Field { markers, .. }
            | Self::Method { markers, .. }
            | Self::Library { markers, .. } => markers,
        }
    }

    fn markers_mut(&mut self) -> &mut MemberMarkers {
        match self {
            Self::Field { markers, .. }
            | Self::Method { markers, .. }
            | Self::Library { markers, .. } => markers,
        }
    }
}

/// Everything the reflector knows about one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    /// The class.
    pub name: ClassName,
    /// The analysis marker. Only classes carrying it can be root classes.
    pub analysis: Option<AnalysisConfiguration>,
    /// Tags declared on the class.
    pub tags: BTreeSet<Tag>,
    /// Ignore marker on the class.
    pub ignore: Option<Ignore>,
    /// Declared rule members, in declaration order.
    pub members: Vec<DeclaredMember>,
}

impl ClassMetadata {
    /// Creates metadata for a class without markers or members.
    #[must_use]
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            analysis: None,
            tags: BTreeSet::new(),
            ignore: None,
            members: Vec::new(),
        }
    }

    /// Sets the analysis marker.
    #[must_use]
    pub fn analyze(mut self, configuration: AnalysisConfiguration) -> Self {
        self.analysis = Some(configuration);
        self
    }

    /// Adds a class tag.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(Tag::new(tag));
        self
    }

    /// Marks the class as ignored.
    #[must_use]
    pub fn ignored(mut self, ignore: Ignore) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Adds a declared member.
    #[must_use]
    pub fn member(mut self, member: DeclaredMember) -> Self {
        self.members.push(member);
        self
    }

    /// Returns true if this class can anchor a root subtree.
    #[must_use]
    pub fn is_rule_class(&self) -> bool {
        self.analysis.is_some()
    }
}

/// The member a rule is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleMember {
    /// A field rule.
    Field {
        /// Field name.
        name: String,
    },
    /// A method rule.
    Method {
        /// Method name.
        name: String,
    },
}

/// Identifies a single rule handed to the rule evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleRef {
    /// Class declaring the rule member.
    pub declaring_class: ClassName,
    /// The member.
    pub member: RuleMember,
}

impl RuleRef {
    /// Returns the member name.
    #[must_use]
    pub fn member_name(&self) -> &str {
        match &self.member {
            RuleMember::Field { name } | RuleMember::Method { name } => name,
        }
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.declaring_class.simple_name(),
            self.member_name()
        )
    }
}
