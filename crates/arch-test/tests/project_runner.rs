//! Integration tests for the project runner.
//!
//! A rule catalog and an `arch-test.toml` are written to a temporary
//! project; the runner must pick up both and pass or panic accordingly.

use arch_test::{
    assert_rules_pass, project_engine, AnalysisConfiguration, ClassCache, ClassImporter,
    ClassName, DiscoveryRequest, EvaluationError, ImportError, RuleEvaluator, RuleRef,
    RuleViolation, StaticCatalog,
};
use std::path::Path;

const CATALOG: &str = r#"
[[classes]]
name = "com.example.ArchitectureTest"
analyze = { packages = ["com.example"] }

[[classes.members]]
kind = "field"
name = "services_should_not_access_controllers"

[[classes.members]]
kind = "method"
name = "no_cycles"
parameters = ["com.example.Classes"]
"#;

const CONFIG: &str = r#"
[discovery]
replace_underscores_by_spaces = true
classes_type_name = "com.example.Classes"
"#;

struct PackageImporter;

impl ClassImporter for PackageImporter {
    type Classes = Vec<ClassName>;

    fn import(&self, configuration: &AnalysisConfiguration) -> Result<Vec<ClassName>, ImportError> {
        Ok(configuration
            .packages
            .iter()
            .map(|p| ClassName::new(format!("{p}.OrderService")))
            .collect())
    }
}

struct Evaluator {
    violated: Option<&'static str>,
}

impl RuleEvaluator<Vec<ClassName>> for Evaluator {
    fn evaluate(
        &self,
        rule: &RuleRef,
        classes: &Vec<ClassName>,
    ) -> Result<Vec<RuleViolation>, EvaluationError> {
        if self.violated != Some(rule.member_name()) {
            return Ok(Vec::new());
        }
        Ok(classes
            .iter()
            .map(|c| RuleViolation::new(c.clone(), "calls OrderController"))
            .collect())
    }
}

fn project(dir: &Path) {
    std::fs::write(dir.join("arch-test.toml"), CONFIG).unwrap();
}

fn request() -> DiscoveryRequest {
    DiscoveryRequest::new().with_class("com.example.ArchitectureTest")
}

#[test]
fn passing_rules_do_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    let engine = project_engine(dir.path(), StaticCatalog::from_toml(CATALOG).unwrap()).unwrap();
    assert!(engine.config().discovery.replace_underscores_by_spaces);

    let tree = engine.discover(&request()).unwrap();
    let names: Vec<&str> = tree
        .tests(tree.root())
        .into_iter()
        .map(|n| tree.node(n).display_name.as_str())
        .collect();
    assert_eq!(names, vec!["services should not access controllers", "no cycles"]);

    let cache = ClassCache::new(PackageImporter);
    assert_rules_pass(&engine, &request(), &cache, &Evaluator { violated: None });
    assert!(cache.is_empty());
}

#[test]
#[should_panic(expected = "OrderService (com.example.OrderService): calls OrderController")]
fn failing_rules_panic_with_report() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());

    let engine = project_engine(dir.path(), StaticCatalog::from_toml(CATALOG).unwrap()).unwrap();
    let cache = ClassCache::new(PackageImporter);
    assert_rules_pass(
        &engine,
        &request(),
        &cache,
        &Evaluator {
            violated: Some("services_should_not_access_controllers"),
        },
    );
}

#[test]
#[should_panic(expected = "arch-test: discovery failed")]
fn rejected_discovery_panics() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").unwrap();

    // Without the config file the method's parameter type is not accepted.
    let engine = project_engine(dir.path(), StaticCatalog::from_toml(CATALOG).unwrap()).unwrap();
    let cache = ClassCache::new(PackageImporter);
    assert_rules_pass(&engine, &request(), &cache, &Evaluator { violated: None });
}
