//! Arena-backed document forest.

use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{DocumentId, DocumentNode, ExpandedSet};

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct TreeNode {
    /// Document record for this node
    pub document: DocumentNode,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes, sorted by tree order
    pub children: Vec<Index>,
    /// Position in the input sequence
    pub input_order: usize,
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.document.title.is_empty() {
            write!(f, "[{}]", self.document.id)
        } else {
            write!(f, "{} [{}]", self.document.title, self.document.id)
        }
    }
}

/// A set of document trees sharing one arena.
///
/// Children lists hold arena indices, so the structure has no ownership
/// cycles regardless of what the input parent references look like.
#[derive(Debug, Default)]
pub struct Forest {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
    by_id: HashMap<DocumentId, Index>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node. The first node inserted for an id owns that id.
    pub(crate) fn insert_detached(&mut self, document: DocumentNode, input_order: usize) -> Index {
        let id = document.id.clone();
        let idx = self.arena.insert(TreeNode {
            document,
            parent: None,
            children: Vec::new(),
            input_order,
        });
        self.by_id.entry(id).or_insert(idx);
        idx
    }

    pub(crate) fn attach(&mut self, child: Index, parent: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    pub(crate) fn detach(&mut self, child: Index) {
        let parent = self.arena.get_mut(child).and_then(|node| node.parent.take());
        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.retain(|&c| c != child);
            }
        }
    }

    pub(crate) fn push_root(&mut self, idx: Index) {
        self.roots.push(idx);
    }

    pub(crate) fn sort_children(&mut self) {
        let keys: HashMap<Index, (i64, usize)> = self
            .arena
            .iter()
            .map(|(idx, node)| (idx, (node.document.tree_order, node.input_order)))
            .collect();
        for (_, node) in self.arena.iter_mut() {
            node.children.sort_by_key(|c| keys.get(c).copied().unwrap_or((0, usize::MAX)));
        }
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: &DocumentId) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn document(&self, id: &DocumentId) -> Option<&DocumentNode> {
        self.index_of(id)
            .and_then(|idx| self.get_node(idx))
            .map(|node| &node.document)
    }

    fn require(&self, id: &DocumentId) -> DomainResult<Index> {
        self.index_of(id)
            .ok_or_else(|| DomainError::UnknownDocument(id.clone()))
    }

    /// Ids of the direct children, in tree order.
    pub fn children(&self, id: &DocumentId) -> DomainResult<Vec<DocumentId>> {
        let idx = self.require(id)?;
        Ok(self
            .get_node(idx)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| self.get_node(c))
                    .map(|c| c.document.id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn has_children(&self, id: &DocumentId) -> bool {
        self.index_of(id)
            .and_then(|idx| self.get_node(idx))
            .is_some_and(|node| !node.children.is_empty())
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    #[instrument(level = "trace", skip(self))]
    pub fn descendants(&self, id: &DocumentId) -> DomainResult<Vec<DocumentId>> {
        let idx = self.require(id)?;
        Ok(self
            .iter_from(idx)
            .skip(1)
            .map(|(_, node)| node.document.id.clone())
            .collect())
    }

    /// `id` followed by all of its descendants.
    pub fn subtree(&self, id: &DocumentId) -> DomainResult<Vec<DocumentId>> {
        let idx = self.require(id)?;
        Ok(self
            .iter_from(idx)
            .map(|(_, node)| node.document.id.clone())
            .collect())
    }

    /// Pre-order traversal over every tree, roots left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.roots.iter().rev().copied().collect())
    }

    /// Pre-order traversal of the subtree rooted at `idx`.
    pub fn iter_from(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, vec![idx])
    }

    /// Post-order traversal of the subtree rooted at `idx`, only descending
    /// into children for which `descend` holds.
    pub fn iter_postorder_from<F>(&self, idx: Index, descend: F) -> PostOrderIterator<'_, F>
    where
        F: Fn(&TreeNode) -> bool,
    {
        PostOrderIterator::new(self, idx, descend)
    }

    /// Number of levels of the deepest tree; 0 for an empty forest.
    pub fn depth(&self) -> usize {
        let mut depths: HashMap<Index, usize> = HashMap::new();
        let mut max_depth = 0;
        for &root in &self.roots {
            for (idx, node) in self.iter_postorder_from(root, |_| true) {
                let d = 1 + node
                    .children
                    .iter()
                    .filter_map(|c| depths.get(c))
                    .max()
                    .copied()
                    .unwrap_or(0);
                depths.insert(idx, d);
                max_depth = max_depth.max(d);
            }
        }
        max_depth
    }

    /// Ids of nodes without children, in pre-order.
    pub fn leaves(&self) -> Vec<DocumentId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.document.id.clone())
            .collect()
    }

    /// Text rendering of the forest; expanded nodes are marked with `-`,
    /// collapsed parents with `+`.
    pub fn to_tree_string(&self, expanded: &ExpandedSet) -> Tree<String> {
        fn build(forest: &Forest, idx: Index, expanded: &ExpandedSet) -> Tree<String> {
            let Some(node) = forest.get_node(idx) else {
                return Tree::new(String::new());
            };
            let marker = match (node.children.is_empty(), expanded.contains(&node.document.id)) {
                (true, _) => " ",
                (false, true) => "-",
                (false, false) => "+",
            };
            let leaves: Vec<_> = node
                .children
                .iter()
                .map(|&c| build(forest, c, expanded))
                .collect();
            Tree::new(format!("{marker} {node}")).with_leaves(leaves)
        }

        let roots: Vec<_> = self
            .roots
            .iter()
            .map(|&r| build(self, r, expanded))
            .collect();
        if roots.is_empty() {
            Tree::new("No documents".to_string())
        } else {
            Tree::new("documents".to_string()).with_leaves(roots)
        }
    }
}

pub struct TreeIterator<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(forest: &'a Forest, stack: Vec<Index>) -> Self {
        Self { forest, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, F> {
    forest: &'a Forest,
    stack: Vec<(Index, bool)>,
    descend: F,
}

impl<'a, F> PostOrderIterator<'a, F>
where
    F: Fn(&TreeNode) -> bool,
{
    fn new(forest: &'a Forest, root: Index, descend: F) -> Self {
        Self {
            forest,
            stack: vec![(root, false)],
            descend,
        }
    }
}

impl<'a, F> Iterator for PostOrderIterator<'a, F>
where
    F: Fn(&TreeNode) -> bool,
{
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    if (self.descend)(node) {
                        for &child in node.children.iter().rev() {
                            self.stack.push((child, false));
                        }
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
