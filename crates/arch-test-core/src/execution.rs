//! Execution of a discovered descriptor tree.

use crate::cache::AnalysisCache;
use crate::collaborators::{EvaluationError, RuleEvaluator, RuleViolation};
use crate::descriptor::{DescriptorNode, DescriptorTree, NodeId};
use crate::error::{panic_message, CacheComputationError};
use crate::model::{AnalysisConfiguration, ClassName, RuleRef};
use crate::unique_id::UniqueId;
use serde::Serialize;
use std::fmt::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a test failed, when the failure is not a plain rule violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureCause {
    /// The rule evaluator reported a defect.
    #[error("{0}")]
    Evaluation(String),
    /// The classes for the rule could not be imported.
    #[error("{0}")]
    Import(String),
    /// The class cache or the rule evaluator panicked.
    #[error("panicked: {0}")]
    Panic(String),
}

impl From<EvaluationError> for FailureCause {
    fn from(e: EvaluationError) -> Self {
        Self::Evaluation(e.message)
    }
}

impl From<CacheComputationError> for FailureCause {
    fn from(e: CacheComputationError) -> Self {
        Self::Import(e.to_string())
    }
}

/// Outcome of a finished node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    /// No violations. Containers always finish with this.
    Successful,
    /// Violations were found or evaluation failed.
    Failed {
        /// Human readable failure description.
        message: String,
        /// Set when the failure is not a rule violation.
        cause: Option<FailureCause>,
    },
    /// Execution was cancelled before or while visiting the node.
    Aborted,
}

impl TestResult {
    /// Returns true for [`TestResult::Failed`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Receives execution events.
pub trait ExecutionListener {
    /// A node is about to execute.
    fn started(&mut self, node: &DescriptorNode);

    /// A started node has completed.
    fn finished(&mut self, node: &DescriptorNode, result: &TestResult);

    /// A node was not executed because it is ignored.
    fn skipped(&mut self, node: &DescriptorNode, reason: &str) {
        let _ = (node, reason);
    }
}

/// A shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    /// Creates a signal that is not yet raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The root class and configuration a subtree is evaluated against.
struct RootContext {
    class: ClassName,
    configuration: AnalysisConfiguration,
}

impl RootContext {
    fn of(node: &DescriptorNode) -> Option<Self> {
        match (&node.root_class, &node.analysis) {
            (Some(class), Some(configuration)) => Some(Self {
                class: class.clone(),
                configuration: configuration.clone(),
            }),
            _ => {
                warn!("{} has no root class or analysis configuration", node.unique_id);
                None
            }
        }
    }
}

/// Clears a root's cache entries when dropped, however the subtree ended.
struct ClearOnDrop<'a, C: AnalysisCache> {
    cache: &'a C,
    root: ClassName,
}

impl<C: AnalysisCache> Drop for ClearOnDrop<'_, C> {
    fn drop(&mut self) {
        self.cache.clear(&self.root);
    }
}

/// Walks a descriptor tree depth-first and evaluates its rules.
pub struct Executor<'a, C, E> {
    cache: &'a C,
    evaluator: &'a E,
    abort: AbortSignal,
}

impl<'a, C, E> Executor<'a, C, E>
where
    C: AnalysisCache,
    E: RuleEvaluator<C::Classes>,
{
    /// Creates an executor evaluating rules through `evaluator` against
    /// classes from `cache`.
    #[must_use]
    pub fn new(cache: &'a C, evaluator: &'a E) -> Self {
        Self {
            cache,
            evaluator,
            abort: AbortSignal::new(),
        }
    }

    /// Uses `signal` for cancellation.
    #[must_use]
    pub fn with_abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = signal;
        self
    }

    /// Executes every node of `tree`, reporting to `listener`.
    ///
    /// Each child of the engine root is a root class subtree; its cache
    /// entries are cleared exactly once after the subtree was visited, even
    /// if a listener panics. A root without a root class or analysis
    /// configuration fails every test below it.
    pub fn execute(&self, tree: &DescriptorTree, listener: &mut dyn ExecutionListener) {
        let engine = tree.node(tree.root());
        info!("Executing {} rules", tree.tests(tree.root()).len());
        listener.started(engine);

        for (id, node) in tree.children(tree.root()) {
            if let Some(reason) = &node.skip_reason {
                listener.skipped(node, reason);
                continue;
            }
            let context = RootContext::of(node);
            let _clear = context.as_ref().map(|c| ClearOnDrop {
                cache: self.cache,
                root: c.class.clone(),
            });
            self.visit(tree, id, context.as_ref(), listener);
        }

        listener.finished(engine, &TestResult::Successful);
    }

    fn visit(
        &self,
        tree: &DescriptorTree,
        id: NodeId,
        context: Option<&RootContext>,
        listener: &mut dyn ExecutionListener,
    ) {
        let node = tree.node(id);
        if let Some(reason) = &node.skip_reason {
            debug!("Skipping {}: {reason}", node.unique_id);
            listener.skipped(node, reason);
            return;
        }

        listener.started(node);
        if node.is_container() {
            for (child, _) in tree.children(id) {
                self.visit(tree, child, context, listener);
            }
            listener.finished(node, &TestResult::Successful);
            return;
        }

        let result = if self.abort.is_aborted() {
            TestResult::Aborted
        } else {
            match (&node.rule, context) {
                (Some(rule), Some(context)) => self.run_rule(rule, context),
                (Some(rule), None) => TestResult::Failed {
                    message: format!("Rule '{rule}' has no root class to import classes for"),
                    cause: None,
                },
                (None, _) => TestResult::Failed {
                    message: format!("{} has no rule to evaluate", node.unique_id),
                    cause: None,
                },
            }
        };
        listener.finished(node, &result);
    }

    fn run_rule(&self, rule: &RuleRef, context: &RootContext) -> TestResult {
        let lookup = panic::catch_unwind(AssertUnwindSafe(|| {
            self.cache.get(&context.class, &context.configuration)
        }));
        let classes = match lookup {
            Ok(Ok(classes)) => classes,
            Err(payload) => return failed_with(rule, FailureCause::Panic(panic_message(&*payload))),
            Ok(Err(e)) => {
                warn!("Cannot evaluate {rule}: {e}");
                return TestResult::Failed {
                    message: format!("Rule '{rule}' could not be evaluated: {e}"),
                    cause: Some(e.into()),
                };
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.evaluator.evaluate(rule, &classes)
        }));
        match outcome {
            Ok(Ok(violations)) if violations.is_empty() => TestResult::Successful,
            Ok(Ok(violations)) => TestResult::Failed {
                message: violation_message(rule, &violations),
                cause: None,
            },
            Ok(Err(e)) => failed_with(rule, FailureCause::from(e)),
            Err(payload) => failed_with(rule, FailureCause::Panic(panic_message(&*payload))),
        }
    }
}

fn failed_with(rule: &RuleRef, cause: FailureCause) -> TestResult {
    warn!("Evaluating {rule} failed: {cause}");
    TestResult::Failed {
        message: format!("Rule '{rule}' could not be evaluated: {cause}"),
        cause: Some(cause),
    }
}

/// Formats a violation report naming every violating class.
#[must_use]
pub fn violation_message(rule: &RuleRef, violations: &[RuleViolation]) -> String {
    let times = if violations.len() == 1 { "time" } else { "times" };
    let mut message = format!(
        "Rule '{rule}' was violated ({} {times}):",
        violations.len()
    );
    for violation in violations {
        let _ = write!(
            message,
            "\n{} ({}): {}",
            violation.class.simple_name(),
            violation.class,
            violation.message
        );
    }
    message
}

/// One recorded execution event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ExecutionEvent {
    /// A node started.
    Started {
        /// Node id.
        id: UniqueId,
    },
    /// A node finished.
    Finished {
        /// Node id.
        id: UniqueId,
        /// Whether the node is a test leaf.
        is_test: bool,
        /// Display name of the node.
        display_name: String,
        /// Result.
        result: TestResult,
    },
    /// A node was skipped.
    Skipped {
        /// Node id.
        id: UniqueId,
        /// Display name of the node.
        display_name: String,
        /// Skip reason.
        reason: String,
    },
}

/// A listener that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Vec<ExecutionEvent>,
}

impl RecordingListener {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all events in order.
    #[must_use]
    pub fn events(&self) -> &[ExecutionEvent] {
        &self.events
    }

    /// Consumes the recorder, returning its events.
    #[must_use]
    pub fn into_events(self) -> Vec<ExecutionEvent> {
        self.events
    }

    /// Returns the result reported for `id`, if it finished.
    #[must_use]
    pub fn result_of(&self, id: &UniqueId) -> Option<&TestResult> {
        self.events.iter().find_map(|e| match e {
            ExecutionEvent::Finished { id: fid, result, .. } if fid == id => Some(result),
            _ => None,
        })
    }

    /// Returns the ids of all started nodes, in order.
    #[must_use]
    pub fn started_ids(&self) -> Vec<&UniqueId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::Started { id } => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl ExecutionListener for RecordingListener {
    fn started(&mut self, node: &DescriptorNode) {
        self.events.push(ExecutionEvent::Started {
            id: node.unique_id.clone(),
        });
    }

    fn finished(&mut self, node: &DescriptorNode, result: &TestResult) {
        self.events.push(ExecutionEvent::Finished {
            id: node.unique_id.clone(),
            is_test: !node.is_container(),
            display_name: node.display_name.clone(),
            result: result.clone(),
        });
    }

    fn skipped(&mut self, node: &DescriptorNode, reason: &str) {
        self.events.push(ExecutionEvent::Skipped {
            id: node.unique_id.clone(),
            display_name: node.display_name.clone(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleMember;

    fn rule() -> RuleRef {
        RuleRef {
            declaring_class: ClassName::new("com.example.SimpleRuleField"),
            member: RuleMember::Field {
                name: "simple_rule".into(),
            },
        }
    }

    #[test]
    fn violation_message_names_each_class() {
        let message = violation_message(
            &rule(),
            &[
                RuleViolation::new("com.example.UnwantedClass", "accesses System.out"),
                RuleViolation::new("com.example.Outer$Nested", "accesses System.err"),
            ],
        );
        assert_eq!(
            message,
            "Rule 'SimpleRuleField.simple_rule' was violated (2 times):\n\
             UnwantedClass (com.example.UnwantedClass): accesses System.out\n\
             Nested (com.example.Outer$Nested): accesses System.err"
        );
    }

    #[test]
    fn single_violation_uses_singular() {
        let message = violation_message(&rule(), &[RuleViolation::new("a.B", "bad")]);
        assert!(message.starts_with("Rule 'SimpleRuleField.simple_rule' was violated (1 time):"));
    }

    #[test]
    fn abort_signal_is_shared_between_clones() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_aborted());
        signal.abort();
        assert!(clone.is_aborted());
    }

    /// Counts lookups; every root imports an empty class set.
    #[derive(Default)]
    struct CountingCache {
        gets: parking_lot::Mutex<Vec<ClassName>>,
        clears: parking_lot::Mutex<Vec<ClassName>>,
    }

    impl AnalysisCache for CountingCache {
        type Classes = ();

        fn get(
            &self,
            root: &ClassName,
            _configuration: &AnalysisConfiguration,
        ) -> Result<Arc<()>, CacheComputationError> {
            self.gets.lock().push(root.clone());
            Ok(Arc::new(()))
        }

        fn clear(&self, root: &ClassName) {
            self.clears.lock().push(root.clone());
        }
    }

    struct Passing;

    impl RuleEvaluator<()> for Passing {
        fn evaluate(&self, _rule: &RuleRef, _classes: &()) -> Result<Vec<RuleViolation>, EvaluationError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn root_without_analysis_fails_its_tests() {
        let engine = UniqueId::for_engine("archunit");
        let class_id = engine.append(crate::unique_id::SegmentType::Class, "com.example.SimpleRuleField");
        let mut tree = DescriptorTree::new(engine, "ArchUnit JUnit 5");
        let container = tree.add_child(
            tree.root(),
            DescriptorNode::container(class_id.clone(), "SimpleRuleField"),
        );
        let leaf = tree.add_child(
            container,
            DescriptorNode::test(
                class_id.append(crate::unique_id::SegmentType::Field, "simple_rule"),
                "simple_rule",
                crate::descriptor::TestSource::Field {
                    class_name: ClassName::new("com.example.SimpleRuleField"),
                    field_name: "simple_rule".into(),
                },
                rule(),
            ),
        );

        let cache = CountingCache::default();
        let mut listener = RecordingListener::default();
        Executor::new(&cache, &Passing).execute(&tree, &mut listener);

        let Some(TestResult::Failed { message, cause }) =
            listener.result_of(&tree.node(leaf).unique_id)
        else {
            panic!("expected the rule to fail");
        };
        assert_eq!(
            message,
            "Rule 'SimpleRuleField.simple_rule' has no root class to import classes for"
        );
        assert_eq!(*cause, None);
        assert!(cache.gets.lock().is_empty());
        assert!(cache.clears.lock().is_empty());
    }
}
