//! Tree builder: turns a flat document list into a forest.

use std::collections::HashSet;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::Forest;
use crate::domain::DocumentNode;

/// Constructs a [`Forest`] from documents that reference their parents by id.
///
/// Never fails: a parent reference that does not resolve makes the node a
/// root, and parent cycles are broken by promoting one member to a root.
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    #[instrument(level = "debug", skip(self, documents), fields(count = documents.len()))]
    pub fn build(&self, documents: Vec<DocumentNode>) -> Forest {
        let mut forest = Forest::new();
        let mut seen_ids = HashSet::new();

        let indices: Vec<Index> = documents
            .into_iter()
            .enumerate()
            .map(|(order, doc)| {
                if !seen_ids.insert(doc.id.clone()) {
                    warn!("duplicate document id {}, first occurrence owns it", doc.id);
                }
                forest.insert_detached(doc, order)
            })
            .collect();

        for &idx in &indices {
            let parent = forest
                .get_node(idx)
                .and_then(|node| node.document.parent_id.as_ref())
                .and_then(|parent_id| forest.index_of(parent_id))
                .filter(|&parent_idx| parent_idx != idx);

            match parent {
                Some(parent_idx) => forest.attach(idx, parent_idx),
                None => {
                    if let Some(node) = forest.get_node(idx) {
                        if let Some(parent_id) = &node.document.parent_id {
                            if !forest.contains(parent_id) {
                                debug!("orphan {} (parent {} missing), treated as root", node.document.id, parent_id);
                            }
                        }
                    }
                    forest.push_root(idx);
                }
            }
        }

        forest.sort_children();
        Self::break_cycles(&mut forest, &indices);

        debug!("built forest: {} nodes, {} roots", forest.len(), forest.roots().len());
        forest
    }

    /// Every node not reachable from a root sits on or below a parent cycle.
    /// Walk up from the first such node (input order) until a node repeats;
    /// that node is on the cycle. Promote it to a root, which cuts the cycle
    /// and keeps the tail hanging below it. Repeat until everything is
    /// reachable.
    fn break_cycles(forest: &mut Forest, indices: &[Index]) {
        let mut reachable: HashSet<Index> = forest.iter().map(|(idx, _)| idx).collect();
        if reachable.len() == indices.len() {
            return;
        }

        for &idx in indices {
            if reachable.contains(&idx) {
                continue;
            }
            let member = Self::cycle_member(forest, idx);
            if let Some(node) = forest.get_node(member) {
                warn!("parent cycle through {}, promoting it to root", node.document.id);
            }
            forest.detach(member);
            forest.push_root(member);
            reachable.extend(forest.iter_from(member).map(|(i, _)| i));
        }
    }

    /// First node seen twice when following parent links from `start`.
    fn cycle_member(forest: &Forest, start: Index) -> Index {
        let mut seen = HashSet::new();
        let mut cur = start;
        while seen.insert(cur) {
            match forest.get_node(cur).and_then(|n| n.parent) {
                Some(parent) => cur = parent,
                None => return start,
            }
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentId;

    fn ids(forest: &Forest) -> Vec<String> {
        forest
            .iter()
            .map(|(_, n)| n.document.id.to_string())
            .collect()
    }

    #[test]
    fn given_empty_list_when_building_then_forest_is_empty() {
        let forest = TreeBuilder::new().build(vec![]);
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert_eq!(forest.depth(), 0);
    }

    #[test]
    fn given_siblings_with_tree_order_when_building_then_sorted_stably() {
        let docs = vec![
            DocumentNode::new("root", "Root"),
            DocumentNode::new("c", "C").with_parent("root").with_order(2),
            DocumentNode::new("a", "A").with_parent("root").with_order(1),
            DocumentNode::new("b", "B").with_parent("root").with_order(1),
        ];

        let forest = TreeBuilder::new().build(docs);

        assert_eq!(ids(&forest), vec!["root", "a", "b", "c"]);
    }

    #[test]
    fn given_self_parent_when_building_then_node_is_root() {
        let docs = vec![DocumentNode::new("x", "X").with_parent("x")];

        let forest = TreeBuilder::new().build(docs);

        assert_eq!(forest.roots().len(), 1);
        assert!(!forest.has_children(&DocumentId::from("x")));
    }

    #[test]
    fn given_three_node_cycle_when_building_then_first_member_becomes_root() {
        let docs = vec![
            DocumentNode::new("a", "A").with_parent("c"),
            DocumentNode::new("b", "B").with_parent("a"),
            DocumentNode::new("c", "C").with_parent("b"),
        ];

        let forest = TreeBuilder::new().build(docs);

        assert_eq!(ids(&forest), vec!["a", "b", "c"]);
        assert_eq!(forest.depth(), 3);
    }

    #[test]
    fn given_tail_into_cycle_when_building_then_cycle_member_becomes_root() {
        let docs = vec![
            DocumentNode::new("t", "T").with_parent("a"),
            DocumentNode::new("a", "A").with_parent("b"),
            DocumentNode::new("b", "B").with_parent("a"),
        ];

        let forest = TreeBuilder::new().build(docs);

        let roots: Vec<String> = forest
            .roots()
            .iter()
            .filter_map(|&idx| forest.get_node(idx))
            .map(|n| n.document.id.to_string())
            .collect();
        assert_eq!(roots, vec!["a"]);
        let children = forest.children(&DocumentId::from("a")).unwrap();
        assert!(children.contains(&DocumentId::from("t")));
        assert!(children.contains(&DocumentId::from("b")));
        assert_eq!(forest.len(), 3);
    }
}
