//! Narrows a fully built tree to what was requested.

use crate::descriptor::{DescriptorTree, NodeId};
use crate::unique_id::UniqueId;
use tracing::warn;

/// Returns a tree holding only the requested nodes, their descendants and
/// their ancestors.
///
/// A node survives if some requested id is a prefix of its id (the node is
/// requested or below a requested node) or its id is a prefix of a
/// requested id (the node is a required ancestor). Requested ids matching no
/// node are dropped, so they never leave an empty ancestor chain behind.
#[must_use]
pub fn prune(tree: &DescriptorTree, requested: &[UniqueId]) -> DescriptorTree {
    let all = tree.descendants(tree.root());
    let resolvable: Vec<&UniqueId> = requested
        .iter()
        .filter(|r| {
            let found = all
                .iter()
                .any(|&n| r.is_prefix_of(&tree.node(n).unique_id));
            if !found {
                warn!("Requested id {r} does not match any discovered rule");
            }
            found
        })
        .collect();

    let root = tree.node(tree.root());
    let mut pruned = DescriptorTree::new(root.unique_id.clone(), root.display_name.clone());
    let target_root = pruned.root();
    copy_children(tree, tree.root(), &mut pruned, target_root, &resolvable);
    pruned.propagate_tags();
    pruned
}

fn copy_children(
    source: &DescriptorTree,
    from: NodeId,
    target: &mut DescriptorTree,
    to: NodeId,
    requested: &[&UniqueId],
) {
    for (child, node) in source.children(from) {
        let keep = requested
            .iter()
            .any(|r| r.is_prefix_of(&node.unique_id) || node.unique_id.is_prefix_of(r));
        if !keep {
            continue;
        }
        let copied = target.add_child(to, node.clone());
        copy_children(source, child, target, copied, requested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::catalog::StaticCatalog;
    use crate::config::{DiscoveryConfig, DEFAULT_CLASSES_TYPE};
    use crate::model::{AnalysisConfiguration, ClassMetadata, DeclaredMember};
    use crate::unique_id::SegmentType;

    const LIBRARY: &str = "com.example.SimpleRuleLibrary";
    const RULES: &str = "com.example.SimpleRules";

    fn rules() -> ClassMetadata {
        ClassMetadata::new(RULES)
            .analyze(AnalysisConfiguration::new())
            .tagged("rules")
            .member(DeclaredMember::field("ruleFieldOne"))
            .member(DeclaredMember::field("ruleFieldTwo"))
            .member(DeclaredMember::method("ruleMethodOne", true, [DEFAULT_CLASSES_TYPE]))
            .member(DeclaredMember::method("ruleMethodTwo", true, [DEFAULT_CLASSES_TYPE]))
    }

    fn library() -> ClassMetadata {
        ClassMetadata::new(LIBRARY)
            .analyze(AnalysisConfiguration::new())
            .member(DeclaredMember::library("rulesOne", RULES))
            .member(DeclaredMember::library("rulesTwo", RULES))
    }

    fn engine() -> UniqueId {
        UniqueId::for_engine("archunit")
    }

    fn full_tree() -> DescriptorTree {
        let catalog = StaticCatalog::new().with(rules()).with(library());
        let config = DiscoveryConfig::default();
        TreeBuilder::new(&catalog, &config)
            .build(&engine(), "engine", &[rules(), library()])
            .unwrap()
    }

    fn rules_id() -> UniqueId {
        engine().append(SegmentType::Class, RULES)
    }

    #[test]
    fn class_request_keeps_whole_subtree() {
        let tree = full_tree();
        let pruned = prune(&tree, &[rules_id()]);
        assert_eq!(pruned.child_ids(pruned.root()), vec![&rules_id()]);
        assert_eq!(pruned.tests(pruned.root()).len(), 4);
    }

    #[test]
    fn unique_id_request_keeps_only_path() {
        let tree = full_tree();
        let leaf = rules_id().append(SegmentType::Field, "ruleFieldOne");
        let pruned = prune(&tree, &[leaf.clone()]);

        let tests = pruned.tests(pruned.root());
        assert_eq!(tests.len(), 1);
        let node = pruned.node(tests[0]);
        assert_eq!(node.unique_id, leaf);
        assert!(node.children().is_empty());
        assert_eq!(pruned.parent(tests[0]).map(|p| &p.unique_id), Some(&rules_id()));
        assert_eq!(pruned.len(), 3);
    }

    #[test]
    fn overlapping_requests_do_not_duplicate_nodes() {
        let tree = full_tree();
        let leaf = rules_id().append(SegmentType::Field, "ruleFieldOne");
        let pruned = prune(&tree, &[rules_id(), leaf.clone(), leaf.clone()]);

        let class = pruned.find(&rules_id()).expect("class kept");
        let children = pruned.child_ids(class);
        assert_eq!(children.len(), 4);
        assert_eq!(children.iter().filter(|id| ***id == leaf).count(), 1);
    }

    #[test]
    fn library_container_request_keeps_its_rules() {
        let tree = full_tree();
        let nested = engine()
            .append(SegmentType::Class, LIBRARY)
            .append(SegmentType::Field, "rulesTwo")
            .append(SegmentType::Class, RULES);
        let pruned = prune(&tree, &[nested.clone()]);

        let tests = pruned.tests(pruned.root());
        assert_eq!(tests.len(), 4);
        assert!(tests
            .iter()
            .all(|&t| nested.is_prefix_of(&pruned.node(t).unique_id)));
    }

    #[test]
    fn two_rules_of_one_library_share_the_container() {
        let tree = full_tree();
        let nested = engine()
            .append(SegmentType::Class, LIBRARY)
            .append(SegmentType::Field, "rulesOne")
            .append(SegmentType::Class, RULES);
        let one = nested.append(SegmentType::Field, "ruleFieldOne");
        let two = nested.append(SegmentType::Field, "ruleFieldTwo");
        let pruned = prune(&tree, &[one.clone(), two.clone()]);

        let container = pruned.find(&nested).expect("library container kept");
        assert_eq!(pruned.child_ids(container), vec![&one, &two]);
    }

    #[test]
    fn unmatched_request_leaves_nothing_behind() {
        let tree = full_tree();
        let missing = rules_id().append(SegmentType::Field, "doesNotExist");
        let pruned = prune(&tree, &[missing]);
        assert!(pruned.is_empty());
    }

    #[test]
    fn pruned_tree_keeps_effective_tags() {
        let tree = full_tree();
        let leaf = rules_id().append(SegmentType::Method, "ruleMethodTwo");
        let pruned = prune(&tree, &[leaf.clone()]);
        let node = pruned.node(pruned.find(&leaf).expect("kept"));
        assert!(node.effective_tags.iter().any(|t| t.as_str() == "rules"));
    }
}
