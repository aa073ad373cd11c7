//! The discovered descriptor tree.
//!
//! Nodes live in an arena owned by [`DescriptorTree`]; children and parents
//! are referenced by [`NodeId`], so the parent link never owns its target.

use crate::model::{AnalysisConfiguration, ClassName, RuleRef, Tag};
use crate::unique_id::UniqueId;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Index of a node inside its [`DescriptorTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

/// Whether a node groups other nodes or runs a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    /// Groups children; has no result of its own.
    Container,
    /// Evaluates one rule.
    Test,
}

/// Where a node was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestSource {
    /// A class, without position information.
    Class {
        /// Fully qualified class name.
        class_name: ClassName,
    },
    /// A field of a class.
    Field {
        /// Declaring class.
        class_name: ClassName,
        /// Field name.
        field_name: String,
    },
    /// A method of a class.
    Method {
        /// Declaring class.
        class_name: ClassName,
        /// Method name.
        method_name: String,
        /// Fully qualified parameter type names, comma separated.
        parameter_type_names: String,
    },
}

impl TestSource {
    /// Returns the declaring class of this source.
    #[must_use]
    pub fn class_name(&self) -> &ClassName {
        match self {
            Self::Class { class_name }
            | Self::Field { class_name, .. }
            | Self::Method { class_name, .. } => class_name,
        }
    }
}

/// A single node of the descriptor tree.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorNode {
    /// Hierarchical identifier.
    pub unique_id: UniqueId,
    /// Human readable name.
    pub display_name: String,
    /// Container or test.
    pub node_type: NodeType,
    /// Declaration site.
    pub source: Option<TestSource>,
    /// Tags declared on this node itself.
    pub declared_tags: BTreeSet<Tag>,
    /// Own tags plus all ancestor tags.
    pub effective_tags: BTreeSet<Tag>,
    /// Set for nodes marked as ignored.
    pub skip_reason: Option<String>,
    /// Analysis configuration, set on root class containers.
    #[serde(skip)]
    pub analysis: Option<AnalysisConfiguration>,
    /// Rule executed by a test node.
    #[serde(skip)]
    pub rule: Option<RuleRef>,
    /// Root class owning this node; `None` for the engine root.
    #[serde(skip)]
    pub root_class: Option<ClassName>,
    #[serde(skip)]
    parent: Option<NodeId>,
    #[serde(skip)]
    children: Vec<NodeId>,
}

impl DescriptorNode {
    /// Creates a container node.
    #[must_use]
    pub fn container(unique_id: UniqueId, display_name: impl Into<String>) -> Self {
        Self::new(unique_id, display_name, NodeType::Container)
    }

    /// Creates a test node executing `rule`.
    #[must_use]
    pub fn test(
        unique_id: UniqueId,
        display_name: impl Into<String>,
        source: TestSource,
        rule: RuleRef,
    ) -> Self {
        let mut node = Self::new(unique_id, display_name, NodeType::Test);
        node.source = Some(source);
        node.rule = Some(rule);
        node
    }

    fn new(unique_id: UniqueId, display_name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            unique_id,
            display_name: display_name.into(),
            node_type,
            source: None,
            declared_tags: BTreeSet::new(),
            effective_tags: BTreeSet::new(),
            skip_reason: None,
            analysis: None,
            rule: None,
            root_class: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the parent node id.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the child node ids in execution order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns true for container nodes.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.node_type == NodeType::Container
    }
}

/// An immutable-after-discovery tree of descriptor nodes.
#[derive(Debug, Clone)]
pub struct DescriptorTree {
    nodes: Vec<DescriptorNode>,
    index: HashMap<UniqueId, NodeId>,
}

impl DescriptorTree {
    /// Creates a tree with only the engine root.
    #[must_use]
    pub fn new(engine_id: UniqueId, display_name: impl Into<String>) -> Self {
        let mut index = HashMap::new();
        index.insert(engine_id.clone(), NodeId(0));
        Self {
            nodes: vec![DescriptorNode::container(engine_id, display_name)],
            index,
        }
    }

    /// Returns the engine root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &DescriptorNode {
        &self.nodes[id.0]
    }

    /// Looks a node up by its unique id.
    #[must_use]
    pub fn find(&self, unique_id: &UniqueId) -> Option<NodeId> {
        self.index.get(unique_id).copied()
    }

    /// Returns the number of nodes, including the engine root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if only the engine root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Returns the children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &DescriptorNode)> + '_ {
        self.node(id)
            .children
            .iter()
            .map(move |&child| (child, self.node(child)))
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<&DescriptorNode> {
        self.node(id).parent.map(|p| self.node(p))
    }

    /// Returns `id` and everything below it in depth-first pre-order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        out
    }

    /// Returns all test leaves below `id`.
    #[must_use]
    pub fn tests(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.node(n).node_type == NodeType::Test)
            .collect()
    }

    /// Returns the unique ids of the direct children of `id`.
    #[must_use]
    pub fn child_ids(&self, id: NodeId) -> Vec<&UniqueId> {
        self.children(id).map(|(_, n)| &n.unique_id).collect()
    }

    /// Adds `node` below `parent` and returns its id.
    ///
    /// Returns the existing node if one with the same unique id is present,
    /// so the tree never holds two nodes for one id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is a test node; tests are always leaves.
    pub fn add_child(&mut self, parent: NodeId, mut node: DescriptorNode) -> NodeId {
        assert!(
            self.nodes[parent.0].is_container(),
            "cannot add {} below test {}",
            node.unique_id,
            self.nodes[parent.0].unique_id
        );
        if let Some(&existing) = self.index.get(&node.unique_id) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.index.insert(node.unique_id.clone(), id);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Recomputes effective tags for every node.
    pub fn propagate_tags(&mut self) {
        for id in self.descendants(self.root()) {
            let inherited = self
                .node(id)
                .parent
                .map(|p| self.node(p).effective_tags.clone())
                .unwrap_or_default();
            let node = &mut self.nodes[id.0];
            node.effective_tags = inherited;
            node.effective_tags.extend(node.declared_tags.iter().cloned());
        }
    }

    /// Renders the tree as an indented outline, one node per line.
    #[must_use]
    pub fn render(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let marker = match node.node_type {
                NodeType::Container => "+",
                NodeType::Test => "-",
            };
            let _ = write!(out, "{}{marker} {}", "  ".repeat(depth), node.display_name);
            if !node.effective_tags.is_empty() {
                let tags: Vec<&str> = node.effective_tags.iter().map(Tag::as_str).collect();
                let _ = write!(out, " [{}]", tags.join(", "));
            }
            out.push('\n');
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleMember;
    use crate::unique_id::SegmentType;

    fn sample_tree() -> DescriptorTree {
        let engine = UniqueId::for_engine("archunit");
        let mut tree = DescriptorTree::new(engine.clone(), "ArchUnit JUnit 5");
        let class_id = engine.append(SegmentType::Class, "com.example.Rules");
        let mut class = DescriptorNode::container(class_id.clone(), "Rules");
        class.declared_tags.insert(Tag::new("t1"));
        let class = tree.add_child(tree.root(), class);

        let mut field = DescriptorNode::test(
            class_id.append(SegmentType::Field, "no_cycles"),
            "no_cycles",
            TestSource::Field {
                class_name: ClassName::new("com.example.Rules"),
                field_name: "no_cycles".into(),
            },
            RuleRef {
                declaring_class: ClassName::new("com.example.Rules"),
                member: RuleMember::Field {
                    name: "no_cycles".into(),
                },
            },
        );
        field.declared_tags.insert(Tag::new("t2"));
        tree.add_child(class, field);
        tree.propagate_tags();
        tree
    }

    #[test]
    #[should_panic(expected = "below test [engine:archunit]/[class:com.example.Rules]/[field:no_cycles]")]
    fn tests_cannot_have_children() {
        let mut tree = sample_tree();
        let leaf_id = UniqueId::for_engine("archunit")
            .append(SegmentType::Class, "com.example.Rules")
            .append(SegmentType::Field, "no_cycles");
        let leaf = tree.find(&leaf_id).expect("leaf node");
        tree.add_child(leaf, DescriptorNode::container(leaf_id.append(SegmentType::Class, "X"), "X"));
    }

    #[test]
    fn adding_an_existing_id_returns_the_existing_node() {
        let mut tree = sample_tree();
        let class_id = UniqueId::for_engine("archunit").append(SegmentType::Class, "com.example.Rules");
        let existing = tree.find(&class_id).expect("class node");
        let again = tree.add_child(tree.root(), DescriptorNode::container(class_id, "Rules"));
        assert_eq!(existing, again);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn parent_links_point_to_declaring_container() {
        let tree = sample_tree();
        let leaf = tree.tests(tree.root())[0];
        let parent = tree.parent(leaf).expect("leaf has parent");
        assert_eq!(parent.display_name, "Rules");
    }

    #[test]
    fn effective_tags_include_ancestors() {
        let tree = sample_tree();
        let leaf = tree.tests(tree.root())[0];
        let tags: Vec<&str> = tree
            .node(leaf)
            .effective_tags
            .iter()
            .map(Tag::as_str)
            .collect();
        assert_eq!(tags, vec!["t1", "t2"]);
    }

    #[test]
    fn render_outline() {
        let tree = sample_tree();
        insta::assert_snapshot!(tree.render(), @r"
        + ArchUnit JUnit 5
          + Rules [t1]
            - no_cycles [t1, t2]
        ");
    }
}
