//! Turns a discovery request into root classes and requested ids.

use crate::collaborators::{ClasspathScanner, MemberReflector};
use crate::error::DiscoveryError;
use crate::model::{ClassMetadata, ClassName};
use crate::selector::{DiscoveryRequest, NameFilter, Selector};
use crate::unique_id::{SegmentType, UniqueId};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// The canonical result of resolving a request.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRequest {
    /// Root classes, deduplicated, in first-selected order.
    pub root_classes: Vec<ClassMetadata>,
    /// Requested node ids, deduplicated. Whole classes are requested by
    /// their container id.
    pub requested: Vec<UniqueId>,
}

impl ResolvedRequest {
    /// Returns true if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root_classes.is_empty()
    }

    fn add(&mut self, metadata: ClassMetadata, requested: UniqueId, seen: &mut Seen) {
        if seen.classes.insert(metadata.name.clone()) {
            self.root_classes.push(metadata);
        }
        if seen.ids.insert(requested.clone()) {
            self.requested.push(requested);
        }
    }
}

#[derive(Default)]
struct Seen {
    classes: HashSet<ClassName>,
    ids: HashSet<UniqueId>,
}

/// Resolves selectors against the reflector and classpath scanner.
pub struct SelectorResolver<'a> {
    engine_id: &'a UniqueId,
    reflector: &'a dyn MemberReflector,
    scanner: &'a dyn ClasspathScanner,
}

impl<'a> SelectorResolver<'a> {
    /// Creates a resolver for the engine with root id `engine_id`.
    #[must_use]
    pub fn new(
        engine_id: &'a UniqueId,
        reflector: &'a dyn MemberReflector,
        scanner: &'a dyn ClasspathScanner,
    ) -> Self {
        Self {
            engine_id,
            reflector,
            scanner,
        }
    }

    /// Resolves every selector of `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if a classpath root cannot be scanned.
    pub fn resolve(&self, request: &DiscoveryRequest) -> Result<ResolvedRequest, DiscoveryError> {
        let mut resolved = ResolvedRequest::default();
        let mut seen = Seen::default();

        for selector in request.selectors() {
            match selector {
                Selector::Class(class) => {
                    if let Some(metadata) = self.rule_class(class) {
                        let id = self.class_id(class);
                        resolved.add(metadata, id, &mut seen);
                    }
                }
                Selector::UniqueId(id) => {
                    if let Some(metadata) = self.root_of(id) {
                        resolved.add(metadata, id.clone(), &mut seen);
                    }
                }
                Selector::ClasspathRoot(root) => {
                    for metadata in self.scan(root, request.name_filter())? {
                        let id = self.class_id(&metadata.name);
                        resolved.add(metadata, id, &mut seen);
                    }
                }
            }
        }

        debug!(
            "Resolved {} root classes and {} requested ids",
            resolved.root_classes.len(),
            resolved.requested.len()
        );
        Ok(resolved)
    }

    fn class_id(&self, class: &ClassName) -> UniqueId {
        self.engine_id.append(SegmentType::Class, class.as_str())
    }

    fn rule_class(&self, class: &ClassName) -> Option<ClassMetadata> {
        match self.reflector.class_metadata(class) {
            Some(metadata) if metadata.is_rule_class() => Some(metadata),
            Some(_) => {
                debug!("Skipping {class}: no analysis marker");
                None
            }
            None => {
                debug!("Skipping unknown class {class}");
                None
            }
        }
    }

    /// Resolves the root class named by the second segment of `id`.
    fn root_of(&self, id: &UniqueId) -> Option<ClassMetadata> {
        let segments = id.segments();
        if segments.first() != self.engine_id.segments().first() {
            debug!("Skipping unique id {id}: belongs to another engine");
            return None;
        }
        match segments.get(1) {
            Some(segment) if segment.kind == SegmentType::Class => {
                self.rule_class(&ClassName::new(segment.value.as_str()))
            }
            _ => {
                debug!("Skipping unique id {id}: no class segment");
                None
            }
        }
    }

    fn scan(&self, root: &Path, filter: &NameFilter) -> Result<Vec<ClassMetadata>, DiscoveryError> {
        let classes = self.scanner.scan(root).map_err(|source| DiscoveryError::Scan {
            root: root.to_path_buf(),
            source,
        })?;

        Ok(classes
            .iter()
            .filter_map(|class| self.reflector.class_metadata(class))
            .filter(ClassMetadata::is_rule_class)
            .filter(|metadata| {
                let accepted = filter.accepts(&metadata.name);
                if !accepted {
                    debug!("Filtered out {}", metadata.name);
                }
                accepted
            })
            .collect())
    }
}
