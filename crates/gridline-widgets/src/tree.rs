#![forbid(unsafe_code)]

//! Row forest arena and expansion state.
//!
//! Callers hand the grid a nested [`Row`] tree. [`RowForest::build`] moves it
//! into a flat arena of [`RowNode`]s addressed by index, with parent links
//! stored as indices rather than references. Nodes are laid out in
//! depth-first pre-order, so every parent precedes its descendants.
//!
//! # Invariants
//!
//! 1. `nodes[i].parent == Some(p)` implies `p < i`.
//! 2. `nodes[i].depth == nodes[parent].depth + 1` for every non-root node.
//! 3. `has_error_descendant` is true iff some descendant has a 4xx status.
//! 4. Ids map to the first node carrying them; later duplicates are reported
//!    by [`RowForest::validate`] and never indexed.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Duplicate id | First occurrence wins, duplicate logged at warn |
//! | Unknown id in a lookup | `None` |
//! | Toggle of an unknown or leaf id | No-op |

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use gridline_core::kind::RowKind;

/// Row identifier. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(Arc<str>);

impl RowId {
    /// Create an id.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Borrow<str> for RowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

/// Caller-supplied row, possibly with children.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub id: RowId,
    pub kind: RowKind,
    /// Response status, when the record has one.
    pub status: Option<u16>,
    /// Grouping key for top-level color bars. Rows without one get no bar.
    pub group_key: Option<String>,
    pub fields: HashMap<String, CellValue>,
    pub custom_properties: HashMap<String, String>,
    pub children: Vec<Row>,
}

impl Default for RowId {
    fn default() -> Self {
        Self::new("")
    }
}

impl Row {
    /// Leaf row with the given id.
    #[must_use]
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: RowKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_group(mut self, key: impl Into<String>) -> Self {
        self.group_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Row>) -> Self {
        self.children = children;
        self
    }

    /// Append one child.
    #[must_use]
    pub fn child(mut self, row: Row) -> Self {
        self.children.push(row);
        self
    }
}

/// Whether `status` is a client error.
#[inline]
#[must_use]
pub fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status)
}

/// Arena node.
#[derive(Debug, Clone)]
pub struct RowNode {
    pub id: RowId,
    pub kind: RowKind,
    pub status: Option<u16>,
    pub group_key: Option<String>,
    pub fields: HashMap<String, CellValue>,
    pub custom_properties: HashMap<String, String>,
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Index of the top-level ancestor (self for roots).
    pub root: usize,
    /// Some descendant carries a 4xx status.
    pub has_error_descendant: bool,
}

impl RowNode {
    /// Whether the node has children.
    #[inline]
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        !self.children.is_empty()
    }

    /// Field lookup.
    #[must_use]
    pub fn field(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }
}

/// Contract violations found by [`RowForest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestError {
    /// The same id appears more than once.
    DuplicateId(RowId),
}

impl fmt::Display for ForestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestError::DuplicateId(id) => write!(f, "duplicate row id: {id}"),
        }
    }
}

impl std::error::Error for ForestError {}

/// Arena of rows in pre-order.
#[derive(Debug, Clone, Default)]
pub struct RowForest {
    nodes: Vec<RowNode>,
    roots: Vec<usize>,
    index: HashMap<RowId, usize>,
    duplicates: Vec<RowId>,
}

impl RowForest {
    /// Move `rows` into an arena. O(total nodes).
    #[must_use]
    pub fn build(rows: Vec<Row>) -> Self {
        let mut forest = Self::default();
        // (row, parent, depth)
        let mut stack: Vec<(Row, Option<usize>, usize)> =
            rows.into_iter().rev().map(|r| (r, None, 0)).collect();

        while let Some((row, parent, depth)) = stack.pop() {
            let idx = forest.nodes.len();
            let root = match parent {
                Some(p) => forest.nodes[p].root,
                None => idx,
            };
            let Row {
                id,
                kind,
                status,
                group_key,
                fields,
                custom_properties,
                children,
            } = row;

            if forest.index.contains_key(&id) {
                gridline_core::warn!(id = %id, "duplicate row id, keeping first occurrence");
                forest.duplicates.push(id.clone());
            } else {
                forest.index.insert(id.clone(), idx);
            }

            match parent {
                Some(p) => forest.nodes[p].children.push(idx),
                None => forest.roots.push(idx),
            }
            forest.nodes.push(RowNode {
                id,
                kind,
                status,
                group_key,
                fields,
                custom_properties,
                depth,
                parent,
                children: Vec::new(),
                root,
                has_error_descendant: false,
            });

            stack.extend(children.into_iter().rev().map(|c| (c, Some(idx), depth + 1)));
        }

        forest.propagate_errors();
        forest
    }

    /// Post-order pass: children sit at higher indices than their parents, so
    /// a reverse scan sees every subtree before its root.
    fn propagate_errors(&mut self) {
        for i in (0..self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let contributes =
                node.has_error_descendant || node.status.is_some_and(is_client_error);
            if contributes && let Some(p) = node.parent {
                self.nodes[p].has_error_descendant = true;
            }
        }
    }

    /// Total node count.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by arena index.
    #[inline]
    #[must_use]
    pub fn node(&self, idx: usize) -> Option<&RowNode> {
        self.nodes.get(idx)
    }

    /// Arena index of `id`.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Node by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RowNode> {
        self.index_of(id).and_then(|i| self.nodes.get(i))
    }

    /// Top-level node indices in input order.
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &RowNode> {
        self.nodes.iter()
    }

    /// Parent id of `id`.
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<&RowId> {
        let node = self.get(id)?;
        node.parent.map(|p| &self.nodes[p].id)
    }

    /// Ancestor indices of `idx`, nearest first.
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes.get(idx).and_then(|n| n.parent), |&p| {
            self.nodes[p].parent
        })
    }

    /// Ids of every expandable node.
    pub fn expandable_ids(&self) -> impl Iterator<Item = &RowId> {
        self.nodes
            .iter()
            .filter(|n| n.is_expandable())
            .map(|n| &n.id)
    }

    /// Report caller contract violations.
    pub fn validate(&self) -> Result<(), ForestError> {
        match self.duplicates.first() {
            Some(id) => Err(ForestError::DuplicateId(id.clone())),
            None => Ok(()),
        }
    }
}

/// Initial expansion for a fresh dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DefaultExpansion {
    /// Everything collapsed.
    #[default]
    Collapsed,
    /// Every expandable row expanded.
    Expanded,
}

/// Set of expanded row ids. Absence means collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedState {
    ids: HashSet<RowId>,
}

impl ExpandedState {
    /// Nothing expanded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every expandable row in `forest` expanded.
    #[must_use]
    pub fn all(forest: &RowForest) -> Self {
        Self {
            ids: forest.expandable_ids().cloned().collect(),
        }
    }

    /// Initial state for `forest` under `default`.
    #[must_use]
    pub fn initial(forest: &RowForest, default: DefaultExpansion) -> Self {
        match default {
            DefaultExpansion::Collapsed => Self::new(),
            DefaultExpansion::Expanded => Self::all(forest),
        }
    }

    #[must_use]
    pub fn is_expanded(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of expanded ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flip `id`. Returns `false` (and does nothing) when `id` is not an
    /// expandable row of `forest`.
    pub fn toggle(&mut self, forest: &RowForest, id: &str) -> bool {
        let Some(node) = forest.get(id) else {
            return false;
        };
        if !node.is_expandable() {
            return false;
        }
        if !self.ids.remove(id) {
            self.ids.insert(node.id.clone());
        }
        true
    }

    /// Expand every ancestor of `id` so the row becomes visible.
    pub fn expand_path_to(&mut self, forest: &RowForest, id: &str) {
        let Some(idx) = forest.index_of(id) else {
            return;
        };
        for a in forest.ancestors(idx) {
            self.ids.insert(forest.nodes[a].id.clone());
        }
    }

    /// Collapse everything if anything is expanded, else expand everything.
    pub fn toggle_all(&mut self, forest: &RowForest) {
        if self.ids.is_empty() {
            *self = Self::all(forest);
        } else {
            self.ids.clear();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
