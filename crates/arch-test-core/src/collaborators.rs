//! Traits for the collaborators the engine orchestrates.
//!
//! The engine never inspects classes, imports them, or decides what a
//! violation is. Those concerns live behind these traits.

use crate::model::{AnalysisConfiguration, ClassMetadata, ClassName, RuleRef};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inspects classes for rule members and markers.
pub trait MemberReflector: Send + Sync {
    /// Returns the metadata of a class, or `None` if the class is unknown.
    fn class_metadata(&self, class: &ClassName) -> Option<ClassMetadata>;
}

/// Enumerates the classes reachable under a classpath root.
pub trait ClasspathScanner: Send + Sync {
    /// Lists the fully qualified names of all classes under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be read.
    fn scan(&self, root: &Path) -> Result<Vec<ClassName>, std::io::Error>;
}

/// Error returned by a [`ClassImporter`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ImportError {
    /// What went wrong.
    pub message: String,
}

impl ImportError {
    /// Creates an import error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns an analysis configuration into a set of analyzed classes.
pub trait ClassImporter: Send + Sync {
    /// The immutable class set produced by an import.
    type Classes: Send + Sync;

    /// Imports the classes described by `configuration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the classes cannot be imported.
    fn import(&self, configuration: &AnalysisConfiguration) -> Result<Self::Classes, ImportError>;
}

/// One class violating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// The violating class.
    pub class: ClassName,
    /// Details of the violation.
    pub message: String,
}

impl RuleViolation {
    /// Creates a violation.
    #[must_use]
    pub fn new(class: impl Into<ClassName>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// A defect raised while evaluating a rule. Not a violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvaluationError {
    /// What went wrong.
    pub message: String,
}

impl EvaluationError {
    /// Creates an evaluation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Evaluates rules against a class set.
pub trait RuleEvaluator<C>: Send + Sync {
    /// Evaluates `rule` and returns every violation found.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation itself fails.
    fn evaluate(&self, rule: &RuleRef, classes: &C) -> Result<Vec<RuleViolation>, EvaluationError>;
}
