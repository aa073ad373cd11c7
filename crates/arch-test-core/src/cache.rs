//! Class analysis cache.
//!
//! Imported class sets are expensive to compute and shared by every rule of
//! a root class. The cache computes each `(root class, configuration)` entry
//! at most once, even with concurrent callers, and drops all entries of a
//! root class when its subtree has finished executing.

use crate::collaborators::ClassImporter;
use crate::error::{panic_message, CacheComputationError};
use crate::model::{AnalysisConfiguration, ClassName};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Storage for imported class sets, scoped by root class.
pub trait AnalysisCache: Send + Sync {
    /// The cached class set type.
    type Classes: Send + Sync;

    /// Returns the classes for `root` and `configuration`, importing them on
    /// first access.
    ///
    /// # Errors
    ///
    /// Returns the (memoized) importer failure for this key. An importer
    /// panic is memoized as a failure too.
    fn get(
        &self,
        root: &ClassName,
        configuration: &AnalysisConfiguration,
    ) -> Result<Arc<Self::Classes>, CacheComputationError>;

    /// Evicts every entry of `root`. Idempotent.
    fn clear(&self, root: &ClassName);
}

type Slot<C> = Arc<OnceLock<Result<Arc<C>, CacheComputationError>>>;

/// A single-flight [`AnalysisCache`] backed by a [`ClassImporter`].
pub struct ClassCache<I: ClassImporter> {
    importer: I,
    entries: Mutex<HashMap<ClassName, HashMap<AnalysisConfiguration, Slot<I::Classes>>>>,
}

impl<I: ClassImporter> ClassCache<I> {
    /// Creates an empty cache importing through `importer`.
    #[must_use]
    pub fn new(importer: I) -> Self {
        Self {
            importer,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the importer.
    #[must_use]
    pub fn importer(&self) -> &I {
        &self.importer
    }

    /// Returns the number of cached entries across all root classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().values().map(HashMap::len).sum()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, root: &ClassName, configuration: &AnalysisConfiguration) -> Slot<I::Classes> {
        let mut entries = self.entries.lock();
        let slot = entries
            .entry(root.clone())
            .or_default()
            .entry(configuration.clone())
            .or_default();
        Arc::clone(slot)
    }
}

impl<I: ClassImporter> AnalysisCache for ClassCache<I> {
    type Classes = I::Classes;

    fn get(
        &self,
        root: &ClassName,
        configuration: &AnalysisConfiguration,
    ) -> Result<Arc<I::Classes>, CacheComputationError> {
        // The map lock is released before importing; the slot's OnceLock
        // blocks concurrent callers of the same key until the import is done.
        let slot = self.slot(root, configuration);
        slot.get_or_init(|| {
            info!("Importing classes for {root}");
            match panic::catch_unwind(AssertUnwindSafe(|| self.importer.import(configuration))) {
                Ok(Ok(classes)) => Ok(Arc::new(classes)),
                Ok(Err(e)) => Err(CacheComputationError {
                    root: root.clone(),
                    message: e.message,
                }),
                Err(payload) => {
                    let message = format!("importer panicked: {}", panic_message(&*payload));
                    warn!("Importing classes for {root} failed: {message}");
                    Err(CacheComputationError {
                        root: root.clone(),
                        message,
                    })
                }
            }
        })
        .clone()
    }

    fn clear(&self, root: &ClassName) {
        if self.entries.lock().remove(root).is_some() {
            debug!("Cleared cached classes of {root}");
        }
    }
}
