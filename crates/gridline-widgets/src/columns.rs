#![forbid(unsafe_code)]

//! Column schema, layout reconciliation, and the column registry.
//!
//! The host declares columns as [`ColumnDef`]s. The user's layout (order and
//! visibility) is an [`ActiveColumnItem`] list, persisted per table. On load
//! the two are merged by [`reconcile`]; afterwards the [`ColumnRegistry`] is
//! the single source of truth for column order, visibility, and width.
//!
//! # Reconciliation rules
//!
//! 1. No stored layout, or an empty one: schema order, all shown.
//! 2. Every stored id is the empty string (legacy layout): reset as in 1.
//! 3. Otherwise keep stored entries whose id is in the schema, in stored
//!    order, first occurrence only, with names refreshed from the schema.
//! 4. Append schema columns missing from the stored layout, shown.
//! 5. Stored entries for unknown ids are dropped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::stateful::{LayoutStore, StateKey};
use crate::tree::{CellValue, RowNode};

/// Category assigned to columns derived from custom properties.
pub const CUSTOM_PROPERTY_CATEGORY: &str = "Custom Property";

/// Default rendered width for columns without a size hint.
pub const DEFAULT_COLUMN_WIDTH: u16 = 16;
/// Narrowest width a resize may produce.
pub const MIN_COLUMN_WIDTH: u16 = 4;

/// Extracts a cell value from a row.
pub type Accessor = Arc<dyn Fn(&RowNode) -> CellValue + Send + Sync>;

/// A schema column.
#[derive(Clone)]
pub struct ColumnDef {
    pub id: String,
    /// Header label.
    pub header: String,
    accessor: Accessor,
    /// Key sent with sort intents. `None` means the column is not sortable.
    pub sort_key: Option<String>,
    /// Preferred width in cells.
    pub size_hint: Option<u16>,
    pub category: Option<String>,
    pub is_custom_property: bool,
    /// Render a placeholder instead of the value while row details load.
    pub placeholder_while_loading: bool,
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("sort_key", &self.sort_key)
            .field("size_hint", &self.size_hint)
            .field("category", &self.category)
            .field("is_custom_property", &self.is_custom_property)
            .finish_non_exhaustive()
    }
}

impl ColumnDef {
    /// Column reading the row field named `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        let id = id.into();
        let field = id.clone();
        Self {
            header: header.into(),
            accessor: Arc::new(move |row: &RowNode| row.field(&field).cloned().unwrap_or_default()),
            id,
            sort_key: None,
            size_hint: None,
            category: None,
            is_custom_property: false,
            placeholder_while_loading: false,
        }
    }

    /// Column for custom property `name`. The id is `name` unless an
    /// existing column already uses it, in which case it is
    /// `property-<name>`.
    #[must_use]
    pub fn custom_property(name: &str, existing: &[ColumnDef]) -> Self {
        let id = if existing.iter().any(|c| c.id == name) {
            format!("property-{name}")
        } else {
            name.to_string()
        };
        let prop = name.to_string();
        Self {
            id,
            header: name.to_string(),
            accessor: Arc::new(move |row: &RowNode| {
                row.custom_properties
                    .get(&prop)
                    .map(|v| CellValue::Text(v.clone()))
                    .unwrap_or_default()
            }),
            sort_key: Some(name.to_string()),
            size_hint: None,
            category: Some(CUSTOM_PROPERTY_CATEGORY.to_string()),
            is_custom_property: true,
            placeholder_while_loading: false,
        }
    }

    #[must_use]
    pub fn with_accessor(
        mut self,
        accessor: impl Fn(&RowNode) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        self.accessor = Arc::new(accessor);
        self
    }

    #[must_use]
    pub fn with_sort_key(mut self, key: impl Into<String>) -> Self {
        self.sort_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_size_hint(mut self, width: u16) -> Self {
        self.size_hint = Some(width);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn placeholder_while_loading(mut self) -> Self {
        self.placeholder_while_loading = true;
        self
    }

    /// Value of this column for `row`.
    #[must_use]
    pub fn value(&self, row: &RowNode) -> CellValue {
        (self.accessor)(row)
    }
}

/// One entry of a user layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveColumnItem {
    pub id: String,
    pub name: String,
    pub shown: bool,
}

impl ActiveColumnItem {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, shown: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shown,
        }
    }

    fn from_def(def: &ColumnDef) -> Self {
        Self::new(def.id.clone(), def.header.clone(), true)
    }
}

/// Merge a stored layout with the schema.
#[must_use]
pub fn reconcile(schema: &[ColumnDef], persisted: Option<&[ActiveColumnItem]>) -> Vec<ActiveColumnItem> {
    let fresh = || schema.iter().map(ActiveColumnItem::from_def).collect();
    let Some(persisted) = persisted.filter(|p| !p.is_empty()) else {
        return fresh();
    };
    if persisted.iter().all(|item| item.id.is_empty()) {
        gridline_core::debug!(entries = persisted.len(), "resetting legacy column layout");
        return fresh();
    }

    let by_id: HashMap<&str, &ColumnDef> = schema.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(schema.len());
    let mut out = Vec::with_capacity(schema.len());

    for item in persisted {
        let Some(def) = by_id.get(item.id.as_str()) else {
            continue;
        };
        if seen.insert(def.id.as_str()) {
            out.push(ActiveColumnItem::new(def.id.clone(), def.header.clone(), item.shown));
        }
    }
    let dropped = persisted.len() - out.len();
    if dropped > 0 {
        gridline_core::debug!(dropped, "dropped unknown or duplicate layout entries");
    }

    for def in schema {
        if seen.insert(def.id.as_str()) {
            out.push(ActiveColumnItem::from_def(def));
        }
    }
    out
}

/// In-memory column state for one grid instance.
pub struct ColumnRegistry {
    schema: Vec<ColumnDef>,
    active: Vec<ActiveColumnItem>,
    /// Mirror of `active[..].shown` keyed by id, refreshed on every change.
    visibility: HashMap<String, bool>,
    widths: HashMap<String, u16>,
    default_width: u16,
    min_width: u16,
    store: Option<(StateKey, Arc<dyn LayoutStore>)>,
}

impl fmt::Debug for ColumnRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRegistry")
            .field("schema", &self.schema.len())
            .field("active", &self.active)
            .field("widths", &self.widths)
            .field("store", &self.store.as_ref().map(|(k, _)| k))
            .finish()
    }
}

impl ColumnRegistry {
    /// Registry without persistence.
    #[must_use]
    pub fn new(schema: Vec<ColumnDef>) -> Self {
        let active = reconcile(&schema, None);
        let mut registry = Self {
            schema,
            active,
            visibility: HashMap::new(),
            widths: HashMap::new(),
            default_width: DEFAULT_COLUMN_WIDTH,
            min_width: MIN_COLUMN_WIDTH,
            store: None,
        };
        registry.mirror_visibility();
        registry
    }

    /// Registry backed by `store`. The stored layout for `key` is loaded and
    /// reconciled immediately; the reconciled result is not written back
    /// until the first mutation.
    #[must_use]
    pub fn with_store(schema: Vec<ColumnDef>, key: StateKey, store: Arc<dyn LayoutStore>) -> Self {
        let persisted = store.load(&key);
        let mut registry = Self::new(schema);
        registry.active = reconcile(&registry.schema, persisted.as_deref());
        registry.mirror_visibility();
        registry.store = Some((key, store));
        registry
    }

    #[must_use]
    pub fn with_default_width(mut self, width: u16) -> Self {
        self.default_width = width.max(self.min_width);
        self
    }

    #[must_use]
    pub fn with_min_width(mut self, width: u16) -> Self {
        self.min_width = width;
        self.default_width = self.default_width.max(width);
        self
    }

    /// Declared columns.
    #[must_use]
    pub fn schema(&self) -> &[ColumnDef] {
        &self.schema
    }

    /// Current layout.
    #[must_use]
    pub fn active(&self) -> &[ActiveColumnItem] {
        &self.active
    }

    /// Schema column by id.
    #[must_use]
    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        self.schema.iter().find(|c| c.id == id)
    }

    /// Shown columns in layout order, read through the visibility mirror.
    #[must_use]
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.active
            .iter()
            .filter(|item| self.is_visible(&item.id))
            .filter_map(|item| self.column(&item.id))
            .collect()
    }

    /// Layout index of the `n`th visible column.
    #[must_use]
    pub fn active_index_of_visible(&self, n: usize) -> Option<usize> {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, item)| self.is_visible(&item.id))
            .nth(n)
            .map(|(i, _)| i)
    }

    /// Visibility as mirrored into the table layer. Unknown ids read as
    /// visible.
    #[must_use]
    pub fn is_visible(&self, id: &str) -> bool {
        self.visibility.get(id).copied().unwrap_or(true)
    }

    /// Rendered width of column `id`.
    #[must_use]
    pub fn width(&self, id: &str) -> u16 {
        self.widths
            .get(id)
            .copied()
            .or_else(|| self.column(id).and_then(|c| c.size_hint))
            .unwrap_or(self.default_width)
            .max(self.min_width)
    }

    #[must_use]
    pub fn min_width(&self) -> u16 {
        self.min_width
    }

    /// Move the entry at `from` to `to` (remove then insert). `to` is
    /// clamped to the last position. Returns whether the layout changed.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        if from >= self.active.len() {
            return false;
        }
        let to = to.min(self.active.len() - 1);
        if from == to {
            return false;
        }
        let item = self.active.remove(from);
        self.active.insert(to, item);
        self.commit();
        true
    }

    /// Remove the entry at `index` from the layout. It stays out until
    /// re-added with [`add_column`](Self::add_column) or a schema change.
    pub fn remove_column(&mut self, index: usize) -> Option<ActiveColumnItem> {
        if index >= self.active.len() {
            return None;
        }
        let removed = self.active.remove(index);
        self.commit();
        Some(removed)
    }

    /// Re-add (or re-show) schema column `id` at the end of the layout.
    pub fn add_column(&mut self, id: &str) -> bool {
        if let Some(item) = self.active.iter_mut().find(|i| i.id == id) {
            if item.shown {
                return false;
            }
            item.shown = true;
        } else {
            let Some(def) = self.column(id) else {
                return false;
            };
            let item = ActiveColumnItem::from_def(def);
            self.active.push(item);
        }
        self.commit();
        true
    }

    /// Show or hide column `id`. Returns whether anything changed.
    pub fn set_shown(&mut self, id: &str, shown: bool) -> bool {
        let Some(item) = self.active.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        if item.shown == shown {
            return false;
        }
        item.shown = shown;
        self.commit();
        true
    }

    /// Show every column in the layout.
    pub fn show_all(&mut self) {
        if self.active.iter().all(|i| i.shown) {
            return;
        }
        for item in &mut self.active {
            item.shown = true;
        }
        self.commit();
    }

    /// Set the width of column `id`, clamped to the minimum. Widths are
    /// session-local and not persisted.
    pub fn set_width(&mut self, id: &str, width: u16) -> u16 {
        let width = width.max(self.min_width);
        self.widths.insert(id.to_string(), width);
        width
    }

    /// Add columns to the schema (e.g. custom properties discovered in the
    /// data). Ids already declared are skipped. New columns are appended to
    /// the layout, shown.
    pub fn append_schema_columns(&mut self, columns: Vec<ColumnDef>) -> usize {
        let before = self.schema.len();
        for col in columns {
            if self.column(&col.id).is_none() {
                self.schema.push(col);
            }
        }
        let added = self.schema.len() - before;
        if added > 0 {
            self.rereconcile();
        }
        added
    }

    /// Replace the schema, keeping the user's order and visibility for
    /// columns that still exist. Removed columns that are still declared
    /// come back, shown.
    pub fn replace_schema(&mut self, schema: Vec<ColumnDef>) {
        self.schema = schema;
        self.widths.retain(|id, _| self.schema.iter().any(|c| &c.id == id));
        self.rereconcile();
    }

    fn rereconcile(&mut self) {
        let current = std::mem::take(&mut self.active);
        self.active = reconcile(&self.schema, Some(current.as_slice()));
        self.commit();
    }

    fn mirror_visibility(&mut self) {
        self.visibility = self
            .active
            .iter()
            .map(|item| (item.id.clone(), item.shown))
            .collect();
    }

    /// Refresh the mirror and persist.
    fn commit(&mut self) {
        self.mirror_visibility();
        if let Some((key, store)) = &self.store {
            gridline_core::debug!(key = %key, columns = self.active.len(), "saving column layout");
            store.save(key, &self.active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn schema() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("A", "Alpha"),
            ColumnDef::new("B", "Beta"),
            ColumnDef::new("C", "Gamma"),
        ]
    }

    fn ids(items: &[ActiveColumnItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[derive(Default)]
    struct RecordingStore {
        stored: Mutex<Option<Vec<ActiveColumnItem>>>,
        saves: Mutex<usize>,
    }

    impl LayoutStore for RecordingStore {
        fn load(&self, _key: &StateKey) -> Option<Vec<ActiveColumnItem>> {
            self.stored.lock().ok()?.clone()
        }

        fn save(&self, _key: &StateKey, columns: &[ActiveColumnItem]) {
            if let Ok(mut s) = self.stored.lock() {
                *s = Some(columns.to_vec());
            }
            if let Ok(mut n) = self.saves.lock() {
                *n += 1;
            }
        }
    }

    // ─── reconcile ────────────────────────────────────────────────

    #[test]
    fn no_layout_uses_schema_order() {
        let out = reconcile(&schema(), None);
        assert_eq!(ids(&out), ["A", "B", "C"]);
        assert!(out.iter().all(|i| i.shown));
        assert_eq!(reconcile(&schema(), Some(&[][..])), out);
    }

    #[test]
    fn stored_order_kept_and_missing_appended() {
        let persisted = [
            ActiveColumnItem::new("B", "B", false),
            ActiveColumnItem::new("A", "A", true),
        ];
        let out = reconcile(&schema(), Some(&persisted[..]));
        assert_eq!(
            out,
            vec![
                ActiveColumnItem::new("B", "Beta", false),
                ActiveColumnItem::new("A", "Alpha", true),
                ActiveColumnItem::new("C", "Gamma", true),
            ]
        );
    }

    #[test]
    fn unknown_ids_dropped_and_duplicates_collapsed() {
        let persisted = [
            ActiveColumnItem::new("Z", "gone", true),
            ActiveColumnItem::new("C", "C", false),
            ActiveColumnItem::new("C", "C", true),
        ];
        let out = reconcile(&schema(), Some(&persisted[..]));
        assert_eq!(ids(&out), ["C", "A", "B"]);
        assert!(!out[0].shown);
    }

    #[test]
    fn legacy_blank_ids_reset() {
        let persisted = [
            ActiveColumnItem::new("", "x", false),
            ActiveColumnItem::new("", "y", false),
        ];
        assert_eq!(reconcile(&schema(), Some(&persisted[..])), reconcile(&schema(), None));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let persisted = [
            ActiveColumnItem::new("C", "C", false),
            ActiveColumnItem::new("Q", "Q", true),
        ];
        let once = reconcile(&schema(), Some(&persisted[..]));
        assert_eq!(reconcile(&schema(), Some(once.as_slice())), once);
    }

    // ─── custom properties ────────────────────────────────────────

    #[test]
    fn custom_property_id_avoids_conflicts() {
        let existing = vec![ColumnDef::new("model", "Model")];
        let clash = ColumnDef::custom_property("model", &existing);
        assert_eq!(clash.id, "property-model");
        assert_eq!(clash.sort_key.as_deref(), Some("model"));
        assert_eq!(clash.category.as_deref(), Some(CUSTOM_PROPERTY_CATEGORY));
        assert!(clash.is_custom_property);

        let free = ColumnDef::custom_property("env", &existing);
        assert_eq!(free.id, "env");
    }

    #[test]
    fn custom_property_reads_properties() {
        let forest = crate::tree::RowForest::build(vec![
            crate::tree::Row::new("r").with_property("env", "prod"),
        ]);
        let col = ColumnDef::custom_property("env", &[]);
        let node = forest.get("r").map(|n| col.value(n));
        assert_eq!(node, Some(CellValue::Text("prod".into())));
    }

    // ─── registry ─────────────────────────────────────────────────

    #[test]
    fn move_column_uses_splice_semantics() {
        let mut reg = ColumnRegistry::new(schema());
        assert!(reg.move_column(0, 2));
        assert_eq!(ids(reg.active()), ["B", "C", "A"]);
        assert!(reg.move_column(2, 0));
        assert_eq!(ids(reg.active()), ["A", "B", "C"]);
        assert!(!reg.move_column(1, 1));
        assert!(!reg.move_column(9, 0));
        assert!(reg.move_column(0, 99));
        assert_eq!(ids(reg.active()), ["B", "C", "A"]);
    }

    #[test]
    fn visibility_mirror_tracks_layout() {
        let mut reg = ColumnRegistry::new(schema());
        assert!(reg.set_shown("B", false));
        assert!(!reg.is_visible("B"));
        assert!(!reg.set_shown("B", false));
        let visible: Vec<&str> = reg.visible_columns().into_iter().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, ["A", "C"]);
        assert_eq!(reg.active_index_of_visible(1), Some(2));
        reg.show_all();
        assert!(reg.is_visible("B"));
        assert!(reg.is_visible("never-declared"));
    }

    #[test]
    fn removed_column_returns_via_add_or_schema_change() {
        let mut reg = ColumnRegistry::new(schema());
        let removed = reg.remove_column(1);
        assert_eq!(removed.map(|r| r.id), Some("B".to_string()));
        assert_eq!(ids(reg.active()), ["A", "C"]);
        assert!(reg.add_column("B"));
        assert_eq!(ids(reg.active()), ["A", "C", "B"]);

        reg.remove_column(0);
        reg.replace_schema(schema());
        assert_eq!(ids(reg.active()), ["C", "B", "A"]);
        assert!(!reg.add_column("nope"));
    }

    #[test]
    fn widths_clamp_to_minimum() {
        let mut reg = ColumnRegistry::new(schema()).with_min_width(3);
        assert_eq!(reg.set_width("A", 1), 3);
        assert_eq!(reg.width("A"), 3);
        assert_eq!(reg.width("B"), DEFAULT_COLUMN_WIDTH);
    }

    #[test]
    fn append_schema_columns_skips_known_ids() {
        let mut reg = ColumnRegistry::new(schema());
        let added = reg.append_schema_columns(vec![
            ColumnDef::new("A", "dup"),
            ColumnDef::custom_property("env", &[]),
        ]);
        assert_eq!(added, 1);
        assert_eq!(ids(reg.active()), ["A", "B", "C", "env"]);
    }

    #[test]
    fn store_loaded_on_create_and_saved_on_mutation() {
        let store = Arc::new(RecordingStore::default());
        if let Ok(mut s) = store.stored.lock() {
            *s = Some(vec![
                ActiveColumnItem::new("B", "B", false),
                ActiveColumnItem::new("A", "A", true),
            ]);
        }
        let key = StateKey::new("requests", "org");
        let mut reg = ColumnRegistry::with_store(schema(), key, store.clone());
        assert_eq!(ids(reg.active()), ["B", "A", "C"]);
        assert_eq!(*store.saves.lock().unwrap(), 0);

        reg.move_column(2, 0);
        reg.set_shown("B", true);
        assert_eq!(*store.saves.lock().unwrap(), 2);
        let saved = store.stored.lock().unwrap().clone().unwrap();
        assert_eq!(ids(&saved), ["C", "B", "A"]);
        assert!(saved.iter().all(|i| i.shown));
    }

    #[test]
    fn restored_layout_is_mirrored_before_first_render() {
        let store = Arc::new(RecordingStore::default());
        if let Ok(mut s) = store.stored.lock() {
            *s = Some(vec![
                ActiveColumnItem::new("C", "C", true),
                ActiveColumnItem::new("A", "A", false),
            ]);
        }
        let mut reg = ColumnRegistry::with_store(schema(), StateKey::new("t", "s"), store);
        assert!(!reg.is_visible("A"));
        let visible: Vec<&str> = reg.visible_columns().into_iter().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, ["C", "B"]);
        assert_eq!(reg.active_index_of_visible(1), Some(2));

        reg.replace_schema(vec![ColumnDef::new("A", "Alpha"), ColumnDef::new("D", "Delta")]);
        let visible: Vec<&str> = reg.visible_columns().into_iter().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, ["D"]);
        assert!(reg.is_visible("C"));
    }
}
