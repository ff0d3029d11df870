//! Routing tree tests

use crate::membership::{MembershipList, Registration};
use crate::tree::TreeNode;
use crate::{AnalyzerHandle, AnalyzerId};

fn members(weights: &[(&str, f32)]) -> MembershipList {
    let mut list = MembershipList::new();
    for (id, weight) in weights {
        let (handle, _rx) = AnalyzerHandle::channel(AnalyzerId::new(*id), 1);
        list.insert(Registration {
            handle,
            weight: *weight,
        });
    }
    list
}

/// Sweep a deterministic grid of sample points and count selections per id
fn selection_counts(root: &TreeNode, total: f32, steps: usize) -> std::collections::HashMap<String, usize> {
    let mut counts = std::collections::HashMap::new();
    for i in 0..steps {
        let r = total * (i as f32 + 0.5) / steps as f32;
        let handle = root.sample(r).expect("sample fell off the tree");
        *counts.entry(handle.id().to_string()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_empty_membership_builds_no_tree() {
    assert!(TreeNode::build(&members(&[])).is_none());
}

#[test]
fn test_single_node_always_selected() {
    let list = members(&[("only", 0.5)]);
    let root = TreeNode::build(&list).unwrap();

    for r in [0.0, 0.1, 0.49] {
        assert_eq!(root.sample(r).unwrap().id().as_str(), "only");
    }
}

#[test]
fn test_cumulative_fields_match_subtree_sums() {
    let list = members(&[
        ("a", 0.75),
        ("b", 0.25),
        ("c", 1.5),
        ("d", 0.1),
        ("e", 0.6),
        ("f", 0.25),
    ]);
    let root = TreeNode::build(&list).unwrap();

    assert!(root.cumulative_fields_consistent());
    assert_eq!(root.node_count(), 6);
    assert!((root.traversal_weight_sum() - list.total_weight()).abs() < 1e-4);
}

#[test]
fn test_traversal_sum_matches_total_at_scale() {
    let weights: Vec<(String, f32)> = (0..200)
        .map(|i| (format!("a{i}"), 0.1 + (i % 7) as f32 * 0.3))
        .collect();
    let refs: Vec<(&str, f32)> = weights.iter().map(|(s, w)| (s.as_str(), *w)).collect();
    let list = members(&refs);
    let root = TreeNode::build(&list).unwrap();

    assert!(root.cumulative_fields_consistent());
    let total = list.total_weight();
    assert!((root.traversal_weight_sum() - total).abs() / total < 1e-4);
}

#[test]
fn test_tree_depth_is_logarithmic() {
    let weights: Vec<(String, f32)> = (0..1000).map(|i| (format!("a{i}"), 1.0)).collect();
    let refs: Vec<(&str, f32)> = weights.iter().map(|(s, w)| (s.as_str(), *w)).collect();
    let root = TreeNode::build(&members(&refs)).unwrap();

    assert_eq!(root.node_count(), 1000);
    // Equal weights balance by count; allow generous slack over log2(1000)
    assert!(root.depth() <= 16, "depth {} too deep", root.depth());
}

#[test]
fn test_selection_proportional_to_weight() {
    let list = members(&[("a", 0.75), ("b", 0.25)]);
    let root = TreeNode::build(&list).unwrap();

    let counts = selection_counts(&root, list.total_weight(), 10_000);
    assert_eq!(counts["a"], 7_500);
    assert_eq!(counts["b"], 2_500);
}

#[test]
fn test_selection_equal_thirds() {
    let list = members(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]);
    let root = TreeNode::build(&list).unwrap();

    let counts = selection_counts(&root, list.total_weight(), 9_000);
    for id in ["a", "b", "c"] {
        let n = counts[id];
        assert!(
            (2_900..=3_100).contains(&n),
            "{id} selected {n} times out of 9000"
        );
    }
}

#[test]
fn test_zero_weight_node_never_selected() {
    let list = members(&[("live", 1.0), ("idle", 0.0)]);
    let root = TreeNode::build(&list).unwrap();

    let counts = selection_counts(&root, list.total_weight(), 1_000);
    assert_eq!(counts.get("idle"), None);
    assert_eq!(counts["live"], 1_000);
}

#[test]
fn test_build_is_deterministic() {
    fn shape(node: &TreeNode, out: &mut Vec<String>) {
        out.push(node.handle.id().to_string());
        if let Some(left) = node.left.as_deref() {
            shape(left, out);
        }
        out.push("/".into());
        if let Some(right) = node.right.as_deref() {
            shape(right, out);
        }
    }

    let weights = [("a", 0.9), ("b", 0.5), ("c", 0.5), ("d", 0.1)];
    let first = TreeNode::build(&members(&weights)).unwrap();
    let second = TreeNode::build(&members(&weights)).unwrap();

    let (mut s1, mut s2) = (Vec::new(), Vec::new());
    shape(&first, &mut s1);
    shape(&second, &mut s2);
    assert_eq!(s1, s2);
}

#[test]
fn test_insert_ties_go_left() {
    // Three equal weights: second lands left of the root, third right
    let root = TreeNode::build(&members(&[("n1", 1.0), ("n2", 1.0), ("n3", 1.0)])).unwrap();

    assert_eq!(root.handle.id().as_str(), "n1");
    assert_eq!(root.left.as_deref().unwrap().handle.id().as_str(), "n2");
    assert_eq!(root.right.as_deref().unwrap().handle.id().as_str(), "n3");
    assert!((root.left_cum - 1.0).abs() < f32::EPSILON);
    assert!((root.right_cum - 1.0).abs() < f32::EPSILON);
}
