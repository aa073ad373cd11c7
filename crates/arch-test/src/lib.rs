//! # arch-test
//!
//! Architecture rule test engine.
//!
//! This is the facade crate that re-exports the core engine and adds
//! project-level helpers for running rules as part of `cargo test`.
//!
//! ## Quick Start
//!
//! ```toml
//! # arch-test.toml
//! [discovery]
//! replace_underscores_by_spaces = true
//! ```
//!
//! ```rust,ignore
//! // tests/architecture.rs
//! use arch_test::{ClassCache, DiscoveryRequest, StaticCatalog};
//!
//! #[test]
//! fn architecture() {
//!     let catalog = StaticCatalog::from_toml(include_str!("rules.toml")).unwrap();
//!     let engine = arch_test::project_engine(env!("CARGO_MANIFEST_DIR"), catalog).unwrap();
//!     let request = DiscoveryRequest::new().with_classpath_root("target/classes");
//!     arch_test::assert_rules_pass(&engine, &request, &ClassCache::new(MyImporter), &MyEvaluator);
//! }
//! ```

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use arch_test_core::*;

mod runner;

pub use runner::{assert_rules_pass, find_config, project_engine, CONFIG_CANDIDATES};
