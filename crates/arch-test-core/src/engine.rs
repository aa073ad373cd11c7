//! Engine facade tying discovery and execution together.

use crate::builder::TreeBuilder;
use crate::cache::AnalysisCache;
use crate::collaborators::{ClasspathScanner, MemberReflector, RuleEvaluator};
use crate::config::{ConfigError, EngineConfig};
use crate::descriptor::DescriptorTree;
use crate::error::DiscoveryError;
use crate::execution::{AbortSignal, ExecutionListener, Executor, RecordingListener};
use crate::prune::prune;
use crate::report::RunSummary;
use crate::resolver::SelectorResolver;
use crate::scanner::DirectoryScanner;
use crate::selector::DiscoveryRequest;
use crate::unique_id::UniqueId;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Engine id used when none is configured.
pub const DEFAULT_ENGINE_ID: &str = "archunit";

/// Engine display name used when none is configured.
pub const DEFAULT_DISPLAY_NAME: &str = "ArchUnit JUnit 5";

/// Errors that can occur while building an [`Engine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// No member reflector was supplied.
    #[error("an engine needs a member reflector")]
    MissingReflector,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    engine_id: Option<String>,
    display_name: Option<String>,
    reflector: Option<Box<dyn MemberReflector>>,
    scanner: Option<Box<dyn ClasspathScanner>>,
    config: Option<EngineConfig>,
    config_file: Option<PathBuf>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the engine id (default `archunit`).
    #[must_use]
    pub fn engine_id(mut self, id: impl Into<String>) -> Self {
        self.engine_id = Some(id.into());
        self
    }

    /// Sets the display name of the engine root.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the member reflector.
    #[must_use]
    pub fn reflector<R: MemberReflector + 'static>(mut self, reflector: R) -> Self {
        self.reflector = Some(Box::new(reflector));
        self
    }

    /// Sets the classpath scanner. Defaults to a [`DirectoryScanner`] for
    /// the configured class file extension.
    #[must_use]
    pub fn scanner<S: ClasspathScanner + 'static>(mut self, scanner: S) -> Self {
        self.scanner = Some(Box::new(scanner));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Reads the configuration from a TOML file at build time. Ignored if
    /// [`config`](Self::config) is also set.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if no reflector was set or the configuration file
    /// cannot be loaded.
    pub fn build(self) -> Result<Engine, EngineError> {
        let reflector = self.reflector.ok_or(EngineError::MissingReflector)?;
        let config = match (self.config, self.config_file) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::from_file(&path)?,
            (None, None) => EngineConfig::default(),
        };

        Ok(Engine {
            engine_id: UniqueId::for_engine(
                self.engine_id.unwrap_or_else(|| DEFAULT_ENGINE_ID.to_string()),
            ),
            display_name: self
                .display_name
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            reflector,
            scanner: self.scanner,
            config,
        })
    }
}

/// Discovers rule classes and executes the resulting tree.
///
/// Use [`Engine::builder()`] to construct an instance.
pub struct Engine {
    engine_id: UniqueId,
    display_name: String,
    reflector: Box<dyn MemberReflector>,
    scanner: Option<Box<dyn ClasspathScanner>>,
    config: EngineConfig,
}

impl Engine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns the id of the engine root.
    #[must_use]
    pub fn engine_id(&self) -> &UniqueId {
        &self.engine_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves `request`, builds the descriptor tree and prunes it to the
    /// requested nodes.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid parameters, unreadable classpath roots
    /// or invalid rule declarations. Nothing is partially discovered.
    pub fn discover(&self, request: &DiscoveryRequest) -> Result<DescriptorTree, DiscoveryError> {
        info!("Starting discovery for {}", self.engine_id);
        let config = self.config.with_parameters(request.parameters())?;

        let default_scanner;
        let scanner: &dyn ClasspathScanner = match &self.scanner {
            Some(scanner) => scanner.as_ref(),
            None => {
                default_scanner =
                    DirectoryScanner::new(config.discovery.class_file_extension.as_str());
                &default_scanner
            }
        };

        let resolved = SelectorResolver::new(&self.engine_id, self.reflector.as_ref(), scanner)
            .resolve(request)?;
        let tree = TreeBuilder::new(self.reflector.as_ref(), &config.discovery).build(
            &self.engine_id,
            &self.display_name,
            &resolved.root_classes,
        )?;
        let tree = prune(&tree, &resolved.requested);

        info!(
            "Discovery complete: {} rules in {} root classes",
            tree.tests(tree.root()).len(),
            tree.children(tree.root()).count()
        );
        Ok(tree)
    }

    /// Executes `tree`, reporting to `listener`.
    pub fn execute<C, E>(
        &self,
        tree: &DescriptorTree,
        cache: &C,
        evaluator: &E,
        listener: &mut dyn ExecutionListener,
        abort: &AbortSignal,
    ) where
        C: AnalysisCache,
        E: RuleEvaluator<C::Classes>,
    {
        Executor::new(cache, evaluator)
            .with_abort_signal(abort.clone())
            .execute(tree, listener);
    }

    /// Discovers and executes `request`, returning the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails.
    pub fn run<C, E>(
        &self,
        request: &DiscoveryRequest,
        cache: &C,
        evaluator: &E,
    ) -> Result<RunSummary, DiscoveryError>
    where
        C: AnalysisCache,
        E: RuleEvaluator<C::Classes>,
    {
        let tree = self.discover(request)?;
        let mut listener = RecordingListener::new();
        self.execute(&tree, cache, evaluator, &mut listener, &AbortSignal::new());

        let summary = RunSummary::from(&listener);
        info!(
            "Run complete: {} successful, {} failed, {} skipped",
            summary.successful, summary.failed, summary.skipped
        );
        Ok(summary)
    }
}
