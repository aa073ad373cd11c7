//! # arch-test-core
//!
//! Discovery and execution engine for architecture rule tests.
//!
//! Rule classes declare rules as fields, static methods or nested rule
//! libraries. This crate turns a discovery request into a tree of
//! descriptors, evaluates every rule against an imported class set and
//! reports the outcome of each node:
//!
//! - [`Engine`] for discovery and execution
//! - [`DescriptorTree`] for the discovered hierarchy
//! - [`ClassCache`] for sharing imported classes within a root class
//! - [`ExecutionListener`] for receiving results
//!
//! Class inspection, class import and rule evaluation are supplied through
//! the [`MemberReflector`], [`ClassImporter`] and [`RuleEvaluator`] traits.
//!
//! ## Example
//!
//! ```ignore
//! use arch_test_core::{ClassCache, DiscoveryRequest, Engine, StaticCatalog};
//!
//! let engine = Engine::builder()
//!     .reflector(StaticCatalog::from_toml(&catalog_toml)?)
//!     .build()?;
//!
//! let request = DiscoveryRequest::new().with_classpath_root("target/classes");
//! let cache = ClassCache::new(MyImporter::new());
//! let summary = engine.run(&request, &cache, &MyEvaluator)?;
//! println!("{}", summary.format_report());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod cache;
mod catalog;
mod collaborators;
mod config;
mod descriptor;
mod engine;
mod error;
mod execution;
mod model;
mod prune;
mod report;
mod resolver;
mod scanner;
mod selector;
mod unique_id;

pub use builder::TreeBuilder;
pub use cache::{AnalysisCache, ClassCache};
pub use catalog::{CatalogError, StaticCatalog};
pub use collaborators::{
    ClassImporter, ClasspathScanner, EvaluationError, ImportError, MemberReflector, RuleEvaluator,
    RuleViolation,
};
pub use config::{
    ConfigError, DiscoveryConfig, EngineConfig, DEFAULT_CLASSES_TYPE, PARAM_CLASSES_TYPE,
    PARAM_CLASS_FILE_EXTENSION, PARAM_REPLACE_UNDERSCORES,
};
pub use descriptor::{DescriptorNode, DescriptorTree, NodeId, NodeType, TestSource};
pub use engine::{Engine, EngineBuilder, EngineError, DEFAULT_DISPLAY_NAME, DEFAULT_ENGINE_ID};
pub use error::{CacheComputationError, DiscoveryError};
pub use execution::{
    violation_message, AbortSignal, ExecutionEvent, ExecutionListener, Executor, FailureCause,
    RecordingListener, TestResult,
};
pub use model::{
    AnalysisConfiguration, ClassMetadata, ClassName, DeclaredMember, Ignore, MemberMarkers,
    RuleMember, RuleRef, Tag, RULE_MARKER,
};
pub use prune::prune;
pub use report::{FailedRule, RunSummary};
pub use resolver::{ResolvedRequest, SelectorResolver};
pub use scanner::DirectoryScanner;
pub use selector::{DiscoveryRequest, NameFilter, PatternError, Selector};
pub use unique_id::{Segment, SegmentType, UniqueId, UniqueIdParseError};
