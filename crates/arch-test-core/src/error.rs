//! Errors raised by discovery and the class cache.

use crate::model::ClassName;
use crate::unique_id::UniqueId;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised during discovery, before anything executes.
#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    /// A rule member does not satisfy the marker's constraints.
    #[error("@{marker} method {class}.{member} {constraint}")]
    #[diagnostic(code(arch_test::invalid_rule_member))]
    InvalidRuleMember {
        /// Marker name (e.g. `ArchTest`).
        marker: &'static str,
        /// Simple name of the declaring class.
        class: String,
        /// Member name.
        member: String,
        /// The violated constraint.
        constraint: String,
    },

    /// Two members of one class map to the same identifier.
    #[error("duplicate rule id {id}: rule members of one class must have distinct names")]
    #[diagnostic(
        code(arch_test::duplicate_rule),
        help("overloaded rule methods share a name and cannot be told apart")
    )]
    DuplicateRule {
        /// The colliding id.
        id: UniqueId,
    },

    /// A rule library includes itself, directly or transitively.
    #[error("rule library {class} includes itself via {chain}")]
    #[diagnostic(code(arch_test::cyclic_library))]
    CyclicLibrary {
        /// The library class.
        class: ClassName,
        /// The inclusion chain, outermost first.
        chain: String,
    },

    /// A library member references a class the reflector does not know.
    #[error("field {class}.{member} references unknown rule library {library}")]
    #[diagnostic(code(arch_test::unknown_library))]
    UnknownLibrary {
        /// Simple name of the declaring class.
        class: String,
        /// Member name.
        member: String,
        /// The unresolvable library class.
        library: ClassName,
    },

    /// Listing classes under a classpath root failed.
    #[error("failed to scan classpath root {root}: {source}")]
    #[diagnostic(code(arch_test::scan))]
    Scan {
        /// The classpath root.
        root: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A root class lacks the analysis marker, so there is nothing to import.
    #[error("root class {class} has no analysis configuration")]
    #[diagnostic(
        code(arch_test::missing_analysis),
        help("only classes carrying the analysis marker can anchor a rule tree")
    )]
    MissingAnalysis {
        /// The unmarked class.
        class: ClassName,
    },

    /// A passthrough parameter carried an invalid value.
    #[error("Configuration error: {0}")]
    #[diagnostic(code(arch_test::config))]
    Config(#[from] crate::config::ConfigError),
}

impl DiscoveryError {
    /// Creates an [`InvalidRuleMember`](Self::InvalidRuleMember) error.
    #[must_use]
    pub fn invalid_member(
        class: &ClassName,
        member: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidRuleMember {
            marker: crate::model::RULE_MARKER,
            class: class.simple_name().to_string(),
            member: member.into(),
            constraint: constraint.into(),
        }
    }
}

/// The class importer failed for a cache key.
///
/// Memoized with the key, so every rule depending on the entry sees it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to import classes for {root}: {message}")]
pub struct CacheComputationError {
    /// Root class whose configuration failed.
    pub root: ClassName,
    /// Importer message.
    pub message: String,
}

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
