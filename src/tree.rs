use crate::params::ParamNode;
use log::warn;
use std::collections::{HashMap, HashSet};

/// Converts between flat parameter rows and their parent/child tree.
pub struct TreeReconstructor;

impl TreeReconstructor {
    /// Rebuild the tree of a flat row list.
    ///
    /// Rows with `parent_id == 0` become roots; every other row is attached under the
    /// row whose `id` matches its `parent_id`. Input order is kept among siblings and
    /// the input is left untouched. Rows whose parent is missing are dropped with a
    /// warning.
    pub fn to_tree(flat: &[ParamNode]) -> Vec<ParamNode> {
        let mut by_parent: HashMap<u32, Vec<usize>> = HashMap::new();
        for (index, node) in flat.iter().enumerate() {
            by_parent.entry(node.parent_id).or_default().push(index);
        }

        let mut attached = HashSet::new();
        let roots: Vec<ParamNode> = by_parent
            .get(&0)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| Self::attach(flat, i, &by_parent, &mut attached))
                    .collect()
            })
            .unwrap_or_default();

        if attached.len() != flat.len() {
            warn!(
                "{} parameter rows reference a parent that is not in the list",
                flat.len() - attached.len()
            );
        }
        roots
    }

    fn attach(
        flat: &[ParamNode],
        index: usize,
        by_parent: &HashMap<u32, Vec<usize>>,
        attached: &mut HashSet<usize>,
    ) -> ParamNode {
        attached.insert(index);
        let mut node = flat[index].clone();
        node.children = by_parent
            .get(&node.id)
            .map(|indices| {
                indices
                    .iter()
                    .filter(|&&child| child != index && !attached.contains(&child))
                    .copied()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
            .into_iter()
            .map(|child| Self::attach(flat, child, by_parent, attached))
            .collect();
        node
    }

    /// Pre-order flattening of a tree; children lists are emptied
    pub fn flatten(tree: &[ParamNode]) -> Vec<ParamNode> {
        let mut flat = Vec::new();
        for node in tree {
            Self::push_pre_order(node, &mut flat);
        }
        flat
    }

    fn push_pre_order(node: &ParamNode, flat: &mut Vec<ParamNode>) {
        let mut row = node.clone();
        row.children = Vec::new();
        flat.push(row);
        for child in &node.children {
            Self::push_pre_order(child, flat);
        }
    }

    /// Number of nodes in a tree
    pub fn count(tree: &[ParamNode]) -> usize {
        tree.iter().map(|n| 1 + Self::count(&n.children)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(id: u32, parent_id: u32, path: &str) -> ParamNode {
        ParamNode::new(id, parent_id, path, "string")
    }

    fn sample() -> Vec<ParamNode> {
        vec![
            row(1, 0, "id"),
            row(2, 0, "customer"),
            row(3, 2, "customer.name"),
            row(4, 2, "customer.address"),
            row(5, 4, "customer.address.city"),
            row(6, 0, "total"),
        ]
    }

    #[test]
    fn test_to_tree() {
        let tree = TreeReconstructor::to_tree(&sample());

        assert_eq!(tree.len(), 3);
        assert_eq!(tree[1].field_path, "customer");
        assert_eq!(tree[1].children.len(), 2);
        assert_eq!(tree[1].children[1].children[0].field_path, "customer.address.city");
        assert_eq!(TreeReconstructor::count(&tree), 6);
    }

    #[test]
    fn test_round_trip() {
        let flat = sample();
        let tree = TreeReconstructor::to_tree(&flat);
        assert_eq!(TreeReconstructor::flatten(&tree), flat);

        let rebuilt = TreeReconstructor::to_tree(&TreeReconstructor::flatten(&tree));
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn test_idempotent_on_input() {
        let flat = sample();
        let first = TreeReconstructor::to_tree(&flat);
        let second = TreeReconstructor::to_tree(&flat);
        assert_eq!(first, second);
        assert!(flat.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_orphans_and_self_loops_are_dropped() {
        let flat = vec![row(1, 0, "a"), row(2, 9, "orphan"), row(3, 3, "loop")];
        let tree = TreeReconstructor::to_tree(&flat);
        assert_eq!(TreeReconstructor::count(&tree), 1);
    }

    #[test]
    fn test_empty() {
        assert!(TreeReconstructor::to_tree(&[]).is_empty());
        assert!(TreeReconstructor::flatten(&[]).is_empty());
    }
}
