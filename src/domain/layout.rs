//! Tidy top-down layout of the visible part of the forest.

use std::collections::HashMap;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::domain::arena::Forest;
use crate::domain::error::DomainResult;
use crate::domain::{DocumentId, ExpandedSet, Position, PositionMap};

/// Spacing constants of the layout, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal space reserved for a collapsed node or a leaf
    pub min_node_spacing: f64,
    /// Vertical distance between levels
    pub level_height: f64,
    /// Distance from a node anchor to its connector endpoint
    pub connector_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_node_spacing: 280.0,
            level_height: 180.0,
            connector_offset: 50.0,
        }
    }
}

/// One entry of the render list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleNode {
    pub id: DocumentId,
    pub title: String,
    pub level: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    pub word_count: u64,
}

/// Connector curve from a parent's bottom to a child's top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connection {
    pub from: Position,
    pub to: Position,
}

impl Connection {
    /// SVG path data: a cubic Bézier whose control points share the vertical
    /// midpoint, giving the usual S-shaped org-chart edge.
    pub fn path(&self) -> String {
        let mid_y = (self.from.y + self.to.y) / 2.0;
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.from.x, self.from.y, self.from.x, mid_y, self.to.x, mid_y, self.to.x, self.to.y
        )
    }
}

/// Computes world positions for every visible node.
///
/// Output depends only on (forest, expanded set, config).
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn is_open(node_id: &DocumentId, expanded: &ExpandedSet) -> bool {
        expanded.contains(node_id)
    }

    /// Subtree widths for `root` and every node below it that is reached
    /// through expanded parents. Computed bottom-up without recursion.
    fn subtree_widths(&self, forest: &Forest, root: Index, expanded: &ExpandedSet, widths: &mut HashMap<Index, f64>) {
        let min = self.config.min_node_spacing;
        for (idx, node) in forest.iter_postorder_from(root, |n| Self::is_open(&n.document.id, expanded)) {
            let width = if Self::is_open(&node.document.id, expanded) && !node.children.is_empty() {
                let children: f64 = node
                    .children
                    .iter()
                    .map(|c| widths.get(c).copied().unwrap_or(min))
                    .sum();
                children.max(min)
            } else {
                min
            };
            widths.insert(idx, width);
        }
    }

    /// Positions of all visible nodes.
    #[instrument(level = "debug", skip_all, fields(nodes = forest.len(), expanded = expanded.len()))]
    pub fn compute(&self, forest: &Forest, expanded: &ExpandedSet) -> PositionMap {
        let mut positions = PositionMap::new();
        if forest.is_empty() {
            return positions;
        }

        let mut widths = HashMap::new();
        for &root in forest.roots() {
            self.subtree_widths(forest, root, expanded, &mut widths);
        }
        let width_of = |idx: &Index| widths.get(idx).copied().unwrap_or(self.config.min_node_spacing);

        let total: f64 = forest.roots().iter().map(width_of).sum();

        // (node, center x, level, allotted width)
        let mut stack: Vec<(Index, f64, usize, f64)> = Vec::new();
        let mut current_x = -total / 2.0;
        for root in forest.roots() {
            let w = width_of(root);
            stack.push((*root, current_x + w / 2.0, 0, w));
            current_x += w;
        }
        stack.reverse();

        while let Some((idx, x, level, allotted)) = stack.pop() {
            let Some(node) = forest.get_node(idx) else {
                continue;
            };
            let y = level as f64 * self.config.level_height;
            positions
                .entry(node.document.id.clone())
                .or_insert(Position::new(x, y));

            if !Self::is_open(&node.document.id, expanded) || node.children.is_empty() {
                continue;
            }

            let children_total: f64 = node.children.iter().map(width_of).sum();
            let mut start = x - allotted / 2.0;
            let mut placed = Vec::with_capacity(node.children.len());
            for child in &node.children {
                let share = allotted * width_of(child) / children_total;
                placed.push((*child, start + share / 2.0, level + 1, share));
                start += share;
            }
            // Reverse so the leftmost child is laid out first.
            stack.extend(placed.into_iter().rev());
        }

        trace!("layout produced {} positions", positions.len());
        positions
    }

    /// Pre-order render list of visible nodes with their depth.
    pub fn visible_nodes(&self, forest: &Forest, expanded: &ExpandedSet) -> Vec<VisibleNode> {
        let mut result = Vec::new();
        let mut stack: Vec<(Index, usize)> = forest.roots().iter().rev().map(|&r| (r, 0)).collect();

        while let Some((idx, level)) = stack.pop() {
            let Some(node) = forest.get_node(idx) else {
                continue;
            };
            let is_expanded = Self::is_open(&node.document.id, expanded);
            result.push(VisibleNode {
                id: node.document.id.clone(),
                title: node.document.title.clone(),
                level,
                has_children: !node.children.is_empty(),
                is_expanded,
                word_count: node.document.word_count,
            });
            if is_expanded {
                stack.extend(node.children.iter().rev().map(|&c| (c, level + 1)));
            }
        }
        result
    }

    /// Connector curves between every visible child and its parent, using
    /// whatever positions the caller considers effective.
    pub fn connections(&self, forest: &Forest, expanded: &ExpandedSet, positions: &PositionMap) -> Vec<Connection> {
        let offset = self.config.connector_offset;
        let mut result = Vec::new();
        for visible in self.visible_nodes(forest, expanded) {
            let Some(node) = forest.index_of(&visible.id).and_then(|i| forest.get_node(i)) else {
                continue;
            };
            let Some(parent) = node.parent.and_then(|p| forest.get_node(p)) else {
                continue;
            };
            if let (Some(from), Some(to)) = (
                positions.get(&parent.document.id),
                positions.get(&visible.id),
            ) {
                result.push(Connection {
                    from: from.offset(0.0, offset),
                    to: to.offset(0.0, -offset),
                });
            }
        }
        result
    }
}

/// Expand or collapse `id` with downward cascade.
///
/// Expanding adds `id` and every descendant, collapsing removes the same set.
/// Returns a new set; the input is left untouched.
pub fn toggle_expanded(forest: &Forest, expanded: &ExpandedSet, id: &DocumentId) -> DomainResult<ExpandedSet> {
    let subtree = forest.subtree(id)?;
    let mut next = expanded.clone();
    if expanded.contains(id) {
        for member in &subtree {
            next.remove(member);
        }
    } else {
        next.extend(subtree);
    }
    Ok(next)
}
