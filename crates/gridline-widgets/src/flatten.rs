#![forbid(unsafe_code)]

//! Row-tree flattening.
//!
//! [`flatten`] projects a [`RowForest`] plus an [`ExpandedState`] into the
//! ordered sequence of rows the grid displays: depth-first pre-order,
//! descending only into expanded rows. Collapsed subtrees are skipped
//! without being visited, so cost tracks the visible rows rather than the
//! whole forest.
//!
//! # Invariants
//!
//! 1. `flat_index` is dense, zero-based, and increasing.
//! 2. A node is emitted iff it is a root or every ancestor is expanded.
//! 3. Identical inputs produce identical output.

use std::collections::HashMap;

use crate::tree::{ExpandedState, RowForest};

/// One displayed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenedEntry {
    /// Arena index into the forest.
    pub node: usize,
    pub flat_index: usize,
    pub depth: usize,
    /// Last among its siblings.
    pub is_last_visible_child: bool,
    pub expandable: bool,
    pub expanded: bool,
    pub has_error_descendant: bool,
}

/// Flatten `forest` under `expanded`.
#[must_use]
pub fn flatten(forest: &RowForest, expanded: &ExpandedState) -> Vec<FlattenedEntry> {
    let mut out = Vec::with_capacity(forest.roots().len());
    // (node, is_last_sibling)
    let mut stack: Vec<(usize, bool)> = sibling_frames(forest.roots());

    while let Some((idx, is_last)) = stack.pop() {
        let Some(node) = forest.node(idx) else {
            continue;
        };
        let expandable = node.is_expandable();
        let open = expandable && expanded.is_expanded(node.id.as_str());
        out.push(FlattenedEntry {
            node: idx,
            flat_index: out.len(),
            depth: node.depth,
            is_last_visible_child: is_last,
            expandable,
            expanded: open,
            has_error_descendant: node.has_error_descendant,
        });
        if open {
            stack.extend(sibling_frames(&node.children));
        }
    }

    gridline_core::debug!(
        nodes = forest.len(),
        visible = out.len(),
        expanded = expanded.len(),
        "flattened rows"
    );
    out
}

/// Stack frames for a sibling list, reversed so the first sibling pops first.
fn sibling_frames(siblings: &[usize]) -> Vec<(usize, bool)> {
    let last = siblings.len().saturating_sub(1);
    siblings
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &idx)| (idx, i == last))
        .collect()
}

/// Top-level group → palette slot, assigned cyclically in root order.
///
/// Every row inherits the slot of its top-level ancestor, so a whole
/// session tree shares one color bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupColors {
    slots: HashMap<String, usize>,
    palette_len: usize,
}

impl GroupColors {
    /// Assign slots for `forest`'s roots. Roots without a group key get no
    /// slot, and neither do their descendants.
    #[must_use]
    pub fn build(forest: &RowForest, palette_len: usize) -> Self {
        let mut slots = HashMap::new();
        if palette_len == 0 {
            return Self { slots, palette_len };
        }
        for &root in forest.roots() {
            let Some(node) = forest.node(root) else {
                continue;
            };
            let Some(key) = &node.group_key else {
                continue;
            };
            let next = slots.len() % palette_len;
            slots.entry(key.clone()).or_insert(next);
        }
        Self { slots, palette_len }
    }

    /// Palette slot for the row at arena index `idx`.
    #[must_use]
    pub fn slot_for(&self, forest: &RowForest, idx: usize) -> Option<usize> {
        let node = forest.node(idx)?;
        let root = forest.node(node.root)?;
        let key = root.group_key.as_deref()?;
        self.slots.get(key).copied()
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
