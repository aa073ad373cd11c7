//! Structural build of the descriptor tree from reflected metadata.
//!
//! This pass ignores what was requested; [`crate::prune`] narrows the result.

use crate::collaborators::MemberReflector;
use crate::config::DiscoveryConfig;
use crate::descriptor::{DescriptorNode, DescriptorTree, NodeId, TestSource};
use crate::error::DiscoveryError;
use crate::model::{ClassMetadata, ClassName, DeclaredMember, MemberMarkers, RuleMember, RuleRef};
use crate::unique_id::{Segment, SegmentType, UniqueId};
use std::collections::HashSet;
use tracing::debug;

/// Builds full subtrees for root classes.
pub struct TreeBuilder<'a> {
    reflector: &'a dyn MemberReflector,
    config: &'a DiscoveryConfig,
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder.
    #[must_use]
    pub fn new(reflector: &'a dyn MemberReflector, config: &'a DiscoveryConfig) -> Self {
        Self { reflector, config }
    }

    /// Builds one subtree per root class below a fresh engine root.
    ///
    /// # Errors
    ///
    /// Returns the first invalid rule member, duplicate id or library cycle,
    /// or [`DiscoveryError::MissingAnalysis`] for a root without the
    /// analysis marker.
    pub fn build(
        &self,
        engine_id: &UniqueId,
        display_name: &str,
        roots: &[ClassMetadata],
    ) -> Result<DescriptorTree, DiscoveryError> {
        let mut tree = DescriptorTree::new(engine_id.clone(), display_name);
        for root in roots {
            self.add_root(&mut tree, engine_id, root)?;
        }
        tree.propagate_tags();
        Ok(tree)
    }

    fn add_root(
        &self,
        tree: &mut DescriptorTree,
        engine_id: &UniqueId,
        metadata: &ClassMetadata,
    ) -> Result<(), DiscoveryError> {
        let id = engine_id.append(SegmentType::Class, metadata.name.as_str());
        if tree.find(&id).is_some() {
            return Ok(());
        }
        if !metadata.is_rule_class() {
            return Err(DiscoveryError::MissingAnalysis {
                class: metadata.name.clone(),
            });
        }
        debug!("Building descriptors for {}", metadata.name);

        let mut node = class_container(id, metadata, &metadata.name);
        node.analysis.clone_from(&metadata.analysis);
        node.skip_reason = metadata
            .ignore
            .as_ref()
            .map(|i| i.describe(metadata.name.simple_name()));

        let container = tree.add_child(tree.root(), node);
        let mut chain = vec![metadata.name.clone()];
        self.add_members(tree, container, metadata, &metadata.name, &mut chain)
    }

    fn add_members(
        &self,
        tree: &mut DescriptorTree,
        container: NodeId,
        metadata: &ClassMetadata,
        root: &ClassName,
        chain: &mut Vec<ClassName>,
    ) -> Result<(), DiscoveryError> {
        let parent_id = tree.node(container).unique_id.clone();
        let mut siblings: HashSet<Segment> = HashSet::new();

        for member in &metadata.members {
            // A library member shares its first segment with a field of the same name.
            let segment = sibling_segment(member);
            if !siblings.insert(segment.clone()) {
                return Err(DiscoveryError::DuplicateRule {
                    id: parent_id.append(segment.kind, segment.value),
                });
            }

            let node = match member {
                DeclaredMember::Field { name, markers } => {
                    let id = parent_id.append(SegmentType::Field, name);
                    let source = TestSource::Field {
                        class_name: metadata.name.clone(),
                        field_name: name.clone(),
                    };
                    let rule = RuleRef {
                        declaring_class: metadata.name.clone(),
                        member: RuleMember::Field { name: name.clone() },
                    };
                    self.rule_node(id, name, source, rule, markers, &metadata.name, root)
                }
                DeclaredMember::Method {
                    name,
                    is_static,
                    parameter_types,
                    markers,
                } => {
                    self.validate_method(&metadata.name, name, *is_static, parameter_types)?;
                    let id = parent_id.append(SegmentType::Method, name);
                    let source = TestSource::Method {
                        class_name: metadata.name.clone(),
                        method_name: name.clone(),
                        parameter_type_names: parameter_types.join(", "),
                    };
                    let rule = RuleRef {
                        declaring_class: metadata.name.clone(),
                        member: RuleMember::Method { name: name.clone() },
                    };
                    self.rule_node(id, name, source, rule, markers, &metadata.name, root)
                }
                DeclaredMember::Library {
                    name,
                    class,
                    markers,
                } => {
                    self.add_library(tree, container, &parent_id, metadata, name, class, markers, root, chain)?;
                    continue;
                }
            };
            tree.add_child(container, node);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn rule_node(
        &self,
        id: UniqueId,
        name: &str,
        source: TestSource,
        rule: RuleRef,
        markers: &MemberMarkers,
        declaring: &ClassName,
        root: &ClassName,
    ) -> DescriptorNode {
        let mut node = DescriptorNode::test(id, self.config.display_name(name), source, rule);
        node.declared_tags.clone_from(&markers.tags);
        node.skip_reason = markers
            .ignore
            .as_ref()
            .map(|i| i.describe(&format!("{}.{name}", declaring.simple_name())));
        node.root_class = Some(root.clone());
        node
    }

    #[allow(clippy::too_many_arguments)]
    fn add_library(
        &self,
        tree: &mut DescriptorTree,
        container: NodeId,
        parent_id: &UniqueId,
        declaring: &ClassMetadata,
        member: &str,
        library: &ClassName,
        markers: &MemberMarkers,
        root: &ClassName,
        chain: &mut Vec<ClassName>,
    ) -> Result<(), DiscoveryError> {
        if chain.contains(library) {
            let mut names: Vec<&str> = chain.iter().map(ClassName::simple_name).collect();
            names.push(library.simple_name());
            return Err(DiscoveryError::CyclicLibrary {
                class: library.clone(),
                chain: names.join(" -> "),
            });
        }

        let metadata =
            self.reflector
                .class_metadata(library)
                .ok_or_else(|| DiscoveryError::UnknownLibrary {
                    class: declaring.name.simple_name().to_string(),
                    member: member.to_string(),
                    library: library.clone(),
                })?;

        let id = parent_id
            .append(SegmentType::Field, member)
            .append(SegmentType::Class, library.as_str());

        let mut node = class_container(id, &metadata, root);
        node.declared_tags.extend(markers.tags.iter().cloned());
        node.skip_reason = markers
            .ignore
            .as_ref()
            .map(|i| i.describe(&format!("{}.{member}", declaring.name.simple_name())))
            .or_else(|| {
                metadata
                    .ignore
                    .as_ref()
                    .map(|i| i.describe(metadata.name.simple_name()))
            });

        let nested = tree.add_child(container, node);
        chain.push(library.clone());
        let result = self.add_members(tree, nested, &metadata, root, chain);
        chain.pop();
        result
    }

    fn validate_method(
        &self,
        class: &ClassName,
        name: &str,
        is_static: bool,
        parameter_types: &[String],
    ) -> Result<(), DiscoveryError> {
        if !is_static {
            return Err(DiscoveryError::invalid_member(class, name, "must be static"));
        }
        let expected = self.config.classes_type_name.as_str();
        if parameter_types.len() != 1 || parameter_types[0] != expected {
            return Err(DiscoveryError::invalid_member(
                class,
                name,
                format!("must have exactly one parameter of type {expected}"),
            ));
        }
        Ok(())
    }
}

fn sibling_segment(member: &DeclaredMember) -> Segment {
    match member {
        DeclaredMember::Field { name, .. } | DeclaredMember::Library { name, .. } => {
            Segment::new(SegmentType::Field, name.as_str())
        }
        DeclaredMember::Method { name, .. } => Segment::new(SegmentType::Method, name.as_str()),
    }
}

fn class_container(id: UniqueId, metadata: &ClassMetadata, root: &ClassName) -> DescriptorNode {
    let mut node = DescriptorNode::container(id, metadata.name.simple_name());
    node.source = Some(TestSource::Class {
        class_name: metadata.name.clone(),
    });
    node.declared_tags.clone_from(&metadata.tags);
    node.root_class = Some(root.clone());
    node
}
