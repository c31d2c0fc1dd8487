#![forbid(unsafe_code)]

//! The hierarchical grid widget.
//!
//! [`GridState`] owns everything that changes between frames: the row
//! arena, expansion and selection state, the column registry, the
//! virtualizer, loading flags, and in-progress pointer gestures. [`Grid`] is
//! the stateless painter holding the theme.
//!
//! # Event flow
//!
//! 1. The host renders `Grid` into a [`Frame`] with a hit grid.
//! 2. On a pointer event it calls [`GridState::handle_mouse`] with the
//!    event and `frame.hit_test(x, y)`.
//! 3. The returned [`GridOutcome`]s are the grid's outputs: row activation,
//!    selection changes, sort intents, layout changes. The grid never sorts
//!    or filters rows itself.
//!
//! # Layout
//!
//! ```text
//!  ☐ ▾ Name    ↕│Status │
//! ▌☐ ▸ ● sess-1  │200    │
//! ▌☐     LLM call│404    │
//! ```
//!
//! Left to right: group color bar (blank when the row's top-level ancestor
//! has no group key), checkbox column (unless
//! [`CheckboxMode::Never`]), then the visible data columns in layout order,
//! each followed by a one-cell divider that doubles as its resize handle.
//! The first data column carries the tree indent, the expander, the error
//! dot, and (for leaf rows in tree mode) the row-kind badge.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use gridline_core::event::{MouseButton, MouseEvent, MouseEventKind};
use gridline_core::geometry::Rect;
use gridline_render::frame::{Frame, HitData, HitId, HitRegion};
use gridline_style::theme::{GROUP_PALETTE_LEN, GridTheme};
use gridline_style::Style;

use crate::columns::{ActiveColumnItem, ColumnDef, ColumnRegistry};
use crate::drag::{ColumnDrag, DragAxis, DragConfig};
use crate::flatten::{FlattenedEntry, GroupColors, flatten};
use crate::resize::{ColumnResize, total_width};
use crate::selection::{CheckboxMode, SelectAllState, SelectionState};
use crate::sort::{self, SortDescriptor, SortDirection, SortIntent, SortMenu};
use crate::tree::{DefaultExpansion, ExpandedState, Row, RowForest, RowId, RowNode};
use crate::virtualized::{ViewportWindow, Virtualizer};
use crate::{
    StatefulWidget, draw_text_span, set_style_area, stamp_link, styled_blank, truncate_to_width,
};

const GROUP_BAR_WIDTH: u16 = 1;
const CHECKBOX_WIDTH: u16 = 2;
const EXPANDER_WIDTH: u16 = 2;
/// Rows scrolled per wheel notch.
const SCROLL_STEP_ROWS: i64 = 3;
const SORT_MENU_WIDTH: u16 = 13;

const GROUP_BAR: &str = "▌";
const EXPANDED_GLYPH: &str = "▾";
const COLLAPSED_GLYPH: &str = "▸";
const ERROR_DOT: &str = "●";
const DIVIDER: &str = "│";
const UNSORTED_GLYPH: char = '↕';
const CHECKED: &str = "☑";
const UNCHECKED: &str = "☐";
const LOADING_PLACEHOLDER: &str = "···";

pub const LOADING_MESSAGE: &str = "Loading Data...";
pub const NO_COLUMNS_MESSAGE: &str = "No Columns Selected";
pub const NO_DATA_MESSAGE: &str = "No Data Found";
pub const CLEAR_FILTERS_LABEL: &str = "Clear Filters";

/// Builds the navigable URL for a row.
pub type RowLink = Arc<dyn Fn(&RowNode) -> Option<String> + Send + Sync>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Grid behavior settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    pub checkbox_mode: CheckboxMode,
    /// Rows rendered beyond each viewport edge (default: 5).
    pub overscan: usize,
    /// Row height in cells (default: 1).
    pub row_height: u16,
    /// Indent per tree level in cells (default: 2).
    pub indent: u16,
    /// Stretch the last column so the grid spans the container.
    pub full_width: bool,
    pub default_expansion: DefaultExpansion,
    /// Show the expand/collapse-all affordance in the header (tree mode).
    pub toggle_all_rows: bool,
    pub default_column_width: u16,
    pub min_column_width: u16,
    pub drag: DragConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            checkbox_mode: CheckboxMode::default(),
            overscan: crate::virtualized::DEFAULT_OVERSCAN,
            row_height: 1,
            indent: 2,
            full_width: false,
            default_expansion: DefaultExpansion::default(),
            toggle_all_rows: true,
            default_column_width: crate::columns::DEFAULT_COLUMN_WIDTH,
            min_column_width: crate::columns::MIN_COLUMN_WIDTH,
            drag: DragConfig::default(),
        }
    }
}

impl GridConfig {
    #[must_use]
    pub fn with_checkbox_mode(mut self, mode: CheckboxMode) -> Self {
        self.checkbox_mode = mode;
        self
    }

    #[must_use]
    pub fn with_overscan(mut self, rows: usize) -> Self {
        self.overscan = rows;
        self
    }

    /// Row height in cells, at least 1.
    #[must_use]
    pub fn with_row_height(mut self, cells: u16) -> Self {
        self.row_height = cells.max(1);
        self
    }

    #[must_use]
    pub fn with_indent(mut self, cells: u16) -> Self {
        self.indent = cells;
        self
    }

    #[must_use]
    pub fn with_full_width(mut self, full_width: bool) -> Self {
        self.full_width = full_width;
        self
    }

    #[must_use]
    pub fn with_default_expansion(mut self, default: DefaultExpansion) -> Self {
        self.default_expansion = default;
        self
    }

    #[must_use]
    pub fn with_toggle_all_rows(mut self, enabled: bool) -> Self {
        self.toggle_all_rows = enabled;
        self
    }

    #[must_use]
    pub fn with_default_column_width(mut self, width: u16) -> Self {
        self.default_column_width = width;
        self
    }

    #[must_use]
    pub fn with_min_column_width(mut self, width: u16) -> Self {
        self.min_column_width = width;
        self
    }

    #[must_use]
    pub fn with_drag(mut self, drag: DragConfig) -> Self {
        self.drag = drag;
        self
    }
}

// ---------------------------------------------------------------------------
// Outputs and hit tags
// ---------------------------------------------------------------------------

/// Something the host should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum GridOutcome {
    /// A leaf row was plain-clicked.
    Activate {
        row_id: RowId,
        /// Position in the rendered sequence.
        index: usize,
        event: MouseEvent,
    },
    /// A row (or, with `row_id: None`, every row) was expanded or collapsed.
    ExpansionToggled {
        row_id: Option<RowId>,
        expanded: bool,
    },
    /// Selected ids, rendered order first.
    SelectionChanged(Vec<RowId>),
    /// The select-all control was used; `true` when everything is selected.
    SelectAll(bool),
    Sort(SortIntent),
    /// The column layout changed and was handed to the layout store.
    LayoutChanged(Vec<ActiveColumnItem>),
    ClearFilters,
}

/// Decoded hit region of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridHit {
    /// Row body; payload is the flat index.
    Row(usize),
    Checkbox(usize),
    Expander(usize),
    /// Header cell of the n-th visible column.
    Header(usize),
    /// Sort indicator of the n-th visible column.
    Sort(usize),
    SelectAll,
    ToggleAll,
    SortOption {
        column: usize,
        direction: SortDirection,
    },
    ClearFilters,
    /// Trailing-edge handle of the n-th visible column.
    ResizeHandle(usize),
}

mod tag {
    pub const ROW: u8 = 1;
    pub const CHECKBOX: u8 = 2;
    pub const EXPANDER: u8 = 3;
    pub const HEADER: u8 = 4;
    pub const SORT: u8 = 5;
    pub const SELECT_ALL: u8 = 6;
    pub const TOGGLE_ALL: u8 = 7;
    pub const SORT_OPTION: u8 = 8;
    pub const CLEAR_FILTERS: u8 = 9;
}

impl GridHit {
    /// Region tag and payload to register.
    #[must_use]
    pub fn encode(self) -> (HitRegion, HitData) {
        match self {
            GridHit::Row(i) => (HitRegion::Custom(tag::ROW), i as HitData),
            GridHit::Checkbox(i) => (HitRegion::Custom(tag::CHECKBOX), i as HitData),
            GridHit::Expander(i) => (HitRegion::Custom(tag::EXPANDER), i as HitData),
            GridHit::Header(c) => (HitRegion::Custom(tag::HEADER), c as HitData),
            GridHit::Sort(c) => (HitRegion::Custom(tag::SORT), c as HitData),
            GridHit::SelectAll => (HitRegion::Custom(tag::SELECT_ALL), 0),
            GridHit::ToggleAll => (HitRegion::Custom(tag::TOGGLE_ALL), 0),
            GridHit::SortOption { column, direction } => {
                let dir = match direction {
                    SortDirection::Ascending => 0,
                    SortDirection::Descending => 1,
                };
                (
                    HitRegion::Custom(tag::SORT_OPTION),
                    ((column as HitData) << 1) | dir,
                )
            }
            GridHit::ClearFilters => (HitRegion::Custom(tag::CLEAR_FILTERS), 0),
            GridHit::ResizeHandle(c) => (HitRegion::Handle, c as HitData),
        }
    }

    /// Inverse of [`encode`](Self::encode). `None` for foreign regions.
    #[must_use]
    pub fn decode(region: HitRegion, data: HitData) -> Option<Self> {
        let idx = usize::try_from(data).ok()?;
        let hit = match region {
            HitRegion::Handle => GridHit::ResizeHandle(idx),
            HitRegion::Custom(tag::ROW) => GridHit::Row(idx),
            HitRegion::Custom(tag::CHECKBOX) => GridHit::Checkbox(idx),
            HitRegion::Custom(tag::EXPANDER) => GridHit::Expander(idx),
            HitRegion::Custom(tag::HEADER) => GridHit::Header(idx),
            HitRegion::Custom(tag::SORT) => GridHit::Sort(idx),
            HitRegion::Custom(tag::SELECT_ALL) => GridHit::SelectAll,
            HitRegion::Custom(tag::TOGGLE_ALL) => GridHit::ToggleAll,
            HitRegion::Custom(tag::SORT_OPTION) => GridHit::SortOption {
                column: idx >> 1,
                direction: if idx & 1 == 0 {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
            },
            HitRegion::Custom(tag::CLEAR_FILTERS) => GridHit::ClearFilters,
            _ => return None,
        };
        Some(hit)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Horizontal extent of one rendered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnSlot {
    x: u16,
    width: u16,
}

/// Mutable grid state.
pub struct GridState {
    config: GridConfig,
    forest: RowForest,
    expanded: ExpandedState,
    flattened: Vec<FlattenedEntry>,
    rendered_ids: Vec<RowId>,
    group_colors: GroupColors,
    tree_mode: bool,
    virtualizer: Virtualizer,
    selection: SelectionState,
    columns: ColumnRegistry,
    active_row: Option<RowId>,
    highlighted: HashSet<RowId>,
    skeleton_loading: bool,
    data_loading: bool,
    sort: Option<SortDescriptor>,
    sort_menu: Option<SortMenu>,
    hovered: Option<usize>,
    column_drag: Option<ColumnDrag>,
    resize: Option<ColumnResize>,
    row_link: Option<RowLink>,
    empty_cta: Option<String>,
    show_clear_filters: bool,
    // Geometry of the last render, for routing drags.
    hit_id: Option<HitId>,
    header_slots: Vec<ColumnSlot>,
    last_window: ViewportWindow,
}

impl fmt::Debug for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridState")
            .field("rows", &self.forest.len())
            .field("rendered", &self.flattened.len())
            .field("expanded", &self.expanded.len())
            .field("selected", &self.selection.len())
            .field("columns", &self.columns)
            .field("sort", &self.sort)
            .field("skeleton_loading", &self.skeleton_loading)
            .field("data_loading", &self.data_loading)
            .finish_non_exhaustive()
    }
}

impl GridState {
    /// Empty grid over `columns`. The registry's default and minimum widths
    /// are taken from `config`.
    #[must_use]
    pub fn new(config: GridConfig, columns: ColumnRegistry) -> Self {
        let columns = columns
            .with_min_width(config.min_column_width)
            .with_default_width(config.default_column_width);
        let virtualizer = Virtualizer::new()
            .with_fixed_height(u32::from(config.row_height.max(1)))
            .with_overscan(config.overscan);
        Self {
            config,
            forest: RowForest::default(),
            expanded: ExpandedState::new(),
            flattened: Vec::new(),
            rendered_ids: Vec::new(),
            group_colors: GroupColors::default(),
            tree_mode: false,
            virtualizer,
            selection: SelectionState::new(),
            columns,
            active_row: None,
            highlighted: HashSet::new(),
            skeleton_loading: false,
            data_loading: false,
            sort: None,
            sort_menu: None,
            hovered: None,
            column_drag: None,
            resize: None,
            row_link: None,
            empty_cta: None,
            show_clear_filters: false,
            hit_id: None,
            header_slots: Vec::new(),
            last_window: ViewportWindow::default(),
        }
    }

    /// Attach a row-link builder. Each rendered row's cells carry the URL.
    #[must_use]
    pub fn with_row_link(
        mut self,
        link: impl Fn(&RowNode) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.row_link = Some(Arc::new(link));
        self
    }

    // --- data ------------------------------------------------------------

    /// Replace the dataset. Expansion resets to the configured default and
    /// highlighting is dropped. Selection is left alone: ids missing from the
    /// new rows stay selected but inert until the host clears them.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.forest = RowForest::build(rows);
        self.expanded = ExpandedState::initial(&self.forest, self.config.default_expansion);
        self.group_colors = GroupColors::build(&self.forest, GROUP_PALETTE_LEN);
        self.tree_mode = self.forest.iter().any(RowNode::is_expandable);
        self.highlighted.clear();
        self.reflatten();
    }

    /// Append custom-property columns for every property name present in the
    /// rows and not yet declared. Returns how many were added.
    pub fn add_custom_property_columns(&mut self) -> usize {
        let mut names: Vec<&str> = self
            .forest
            .iter()
            .flat_map(|n| n.custom_properties.keys().map(String::as_str))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        names.sort_unstable();
        let known: HashSet<&str> = self
            .columns
            .schema()
            .iter()
            .filter(|c| c.is_custom_property)
            .filter_map(|c| c.sort_key.as_deref())
            .collect();
        let mut new_cols: Vec<ColumnDef> = Vec::new();
        for name in names.into_iter().filter(|n| !known.contains(n)) {
            let existing: Vec<ColumnDef> = self
                .columns
                .schema()
                .iter()
                .chain(new_cols.iter())
                .cloned()
                .collect();
            new_cols.push(ColumnDef::custom_property(name, &existing));
        }
        self.columns.append_schema_columns(new_cols)
    }

    #[must_use]
    pub fn forest(&self) -> &RowForest {
        &self.forest
    }

    /// The rendered row sequence.
    #[must_use]
    pub fn flattened(&self) -> &[FlattenedEntry] {
        &self.flattened
    }

    /// Ids of the rendered row sequence, in order.
    #[must_use]
    pub fn rendered_ids(&self) -> &[RowId] {
        &self.rendered_ids
    }

    /// Arena node behind rendered row `index`.
    #[must_use]
    pub fn row_at(&self, index: usize) -> Option<&RowNode> {
        let entry = self.flattened.get(index)?;
        self.forest.node(entry.node)
    }

    /// Whether any row has children.
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.tree_mode
    }

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    // --- expansion -------------------------------------------------------

    #[must_use]
    pub fn expanded(&self) -> &ExpandedState {
        &self.expanded
    }

    /// Toggle expansion of `id`. Rows that are not currently rendered (or not
    /// expandable) are left alone. Returns the new expansion state.
    pub fn toggle_expansion(&mut self, id: &str) -> Option<bool> {
        if !self.rendered_ids.iter().any(|r| r.as_str() == id) {
            return None;
        }
        if !self.expanded.toggle(&self.forest, id) {
            return None;
        }
        self.reflatten();
        Some(self.expanded.is_expanded(id))
    }

    /// Expand every expandable row, or collapse all if any is expanded.
    /// Returns whether rows are now expanded.
    pub fn toggle_all_rows(&mut self) -> bool {
        self.expanded.toggle_all(&self.forest);
        self.reflatten();
        !self.expanded.is_empty()
    }

    /// Highlight `ids`, expanding their ancestors so they are rendered, and
    /// scroll the first of them into view.
    pub fn set_highlighted(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.highlighted = ids.into_iter().collect();
        for id in &self.highlighted {
            self.expanded.expand_path_to(&self.forest, id.as_str());
        }
        self.reflatten();
        let first = self
            .rendered_ids
            .iter()
            .position(|id| self.highlighted.contains(id));
        if let Some(i) = first {
            self.virtualizer.scroll_into_view(i);
        }
    }

    #[must_use]
    pub fn is_highlighted(&self, id: &str) -> bool {
        self.highlighted.contains(id)
    }

    // --- selection -------------------------------------------------------

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Selected ids, rendered order first.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<RowId> {
        self.selection.ordered_ids(&self.rendered_ids)
    }

    #[must_use]
    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.select_all_state(self.rendered_ids.len())
    }

    /// Programmatic select-all, same rules as the header control.
    pub fn select_all(&mut self) -> bool {
        self.selection.select_all(&self.rendered_ids)
    }

    /// Replace the selection.
    pub fn set_selected(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.selection.set_selected(ids);
    }

    /// Clear selection and anchor. Call when the query or page changes.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- display inputs --------------------------------------------------

    /// The row shown in the host's detail panel.
    pub fn set_active_row(&mut self, id: Option<RowId>) {
        self.active_row = id;
    }

    #[must_use]
    pub fn active_row(&self) -> Option<&RowId> {
        self.active_row.as_ref()
    }

    /// Show the loading state instead of the table.
    pub fn set_skeleton_loading(&mut self, loading: bool) {
        self.skeleton_loading = loading;
    }

    /// Row details are refetching: placeholder-flagged columns show a
    /// placeholder while the previous rows stay on screen.
    pub fn set_data_loading(&mut self, loading: bool) {
        self.data_loading = loading;
    }

    /// The host's active sort, for header indicators.
    pub fn set_sort(&mut self, sort: Option<SortDescriptor>) {
        self.sort = sort;
    }

    #[must_use]
    pub fn sort(&self) -> Option<&SortDescriptor> {
        self.sort.as_ref()
    }

    /// Call-to-action line under "No Data Found".
    pub fn set_empty_cta(&mut self, cta: Option<String>) {
        self.empty_cta = cta;
    }

    /// Offer "Clear Filters" in the empty state.
    pub fn set_show_clear_filters(&mut self, show: bool) {
        self.show_clear_filters = show;
    }

    #[must_use]
    pub fn sort_menu(&self) -> Option<SortMenu> {
        self.sort_menu
    }

    // --- columns ---------------------------------------------------------

    #[must_use]
    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    /// Mutable registry access for column-chooser collaborators.
    pub fn columns_mut(&mut self) -> &mut ColumnRegistry {
        &mut self.columns
    }

    // --- viewport --------------------------------------------------------

    #[must_use]
    pub fn virtualizer(&self) -> &Virtualizer {
        &self.virtualizer
    }

    /// Scroll by `rows` rows (negative = up).
    pub fn scroll_rows(&mut self, rows: i64) {
        let step = i64::from(self.config.row_height.max(1));
        self.virtualizer.scroll_by(rows.saturating_mul(step));
    }

    /// Bring rendered row `index` into view.
    pub fn scroll_into_view(&mut self, index: usize) {
        self.virtualizer.scroll_into_view(index);
    }

    /// Window computed by the last render.
    #[must_use]
    pub fn last_window(&self) -> ViewportWindow {
        self.last_window
    }

    #[must_use]
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    fn reflatten(&mut self) {
        self.flattened = flatten(&self.forest, &self.expanded);
        self.rendered_ids = self
            .flattened
            .iter()
            .filter_map(|e| self.forest.node(e.node).map(|n| n.id.clone()))
            .collect();
        self.virtualizer.rebuild(self.flattened.len());
        if self.hovered.is_some_and(|h| h >= self.flattened.len()) {
            self.hovered = None;
        }
    }

    // --- interaction -----------------------------------------------------

    /// Route a pointer event. `hit` is the frame's hit test at the event
    /// position; hits owned by other widgets are ignored.
    pub fn handle_mouse(
        &mut self,
        event: &MouseEvent,
        hit: Option<(HitId, HitRegion, HitData)>,
    ) -> Vec<GridOutcome> {
        let hit = hit
            .filter(|(id, _, _)| self.hit_id.is_none_or(|own| own == *id))
            .and_then(|(_, region, data)| GridHit::decode(region, data));

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.on_press(event, hit),
            MouseEventKind::Drag(MouseButton::Left) => self.on_drag(event, hit),
            MouseEventKind::Up(MouseButton::Left) => self.on_release(),
            MouseEventKind::Moved => {
                self.hovered = match hit {
                    Some(GridHit::Row(i) | GridHit::Checkbox(i) | GridHit::Expander(i)) => Some(i),
                    _ => None,
                };
                Vec::new()
            }
            MouseEventKind::ScrollUp => {
                self.scroll_rows(-SCROLL_STEP_ROWS);
                Vec::new()
            }
            MouseEventKind::ScrollDown => {
                self.scroll_rows(SCROLL_STEP_ROWS);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Apply a decoded hit as a primary click.
    pub fn handle_hit(&mut self, hit: GridHit, event: &MouseEvent) -> Vec<GridOutcome> {
        self.on_press(event, Some(hit))
    }

    /// Abandon any in-progress drag or resize and close the sort menu
    /// (Escape). A reordered column returns to where the drag started.
    pub fn cancel_interaction(&mut self) -> Vec<GridOutcome> {
        self.sort_menu = None;
        if let Some(resize) = self.resize.take() {
            self.columns.set_width(resize.column_id(), resize.start_width());
        }
        let Some(drag) = self.column_drag.take() else {
            return Vec::new();
        };
        match drag.cancel() {
            Some((from, to)) if self.move_visible_column(from, to) => {
                vec![GridOutcome::LayoutChanged(self.columns.active().to_vec())]
            }
            _ => Vec::new(),
        }
    }

    fn on_press(&mut self, event: &MouseEvent, hit: Option<GridHit>) -> Vec<GridOutcome> {
        let menu = self.sort_menu.take();
        let Some(hit) = hit else {
            return Vec::new();
        };
        match hit {
            GridHit::Row(i) => self.click_row(i, event),
            GridHit::Checkbox(i) => {
                let Some(id) = self.rendered_ids.get(i).cloned() else {
                    return Vec::new();
                };
                self.selection.toggle(&id);
                vec![self.selection_changed()]
            }
            GridHit::Expander(i) => self.toggle_at(i),
            GridHit::SelectAll => {
                let all = self.selection.select_all(&self.rendered_ids);
                vec![GridOutcome::SelectAll(all), self.selection_changed()]
            }
            GridHit::ToggleAll => {
                let expanded = self.toggle_all_rows();
                vec![GridOutcome::ExpansionToggled {
                    row_id: None,
                    expanded,
                }]
            }
            GridHit::Sort(c) => {
                let intent = self
                    .visible_column(c)
                    .and_then(|col| sort::header_click_intent(col, self.sort.as_ref()));
                intent.map(GridOutcome::Sort).into_iter().collect()
            }
            GridHit::SortOption { column, direction } => {
                let intent = self
                    .visible_column(column)
                    .and_then(|col| sort::menu_intent(col, direction));
                intent.map(GridOutcome::Sort).into_iter().collect()
            }
            GridHit::Header(c) => {
                // Releasing without dragging toggles the menu; remember
                // whether it was open for this column.
                self.sort_menu = menu.filter(|m| m.column == c);
                self.column_drag = Some(ColumnDrag::begin(
                    DragAxis::Horizontal,
                    c,
                    event.x,
                    self.config.drag.clone(),
                ));
                Vec::new()
            }
            GridHit::ResizeHandle(c) => {
                if let Some(col) = self.visible_column(c) {
                    let id = col.id.clone();
                    let width = self.columns.width(&id);
                    self.resize = Some(ColumnResize::begin(id, event.x, width));
                }
                Vec::new()
            }
            GridHit::ClearFilters => vec![GridOutcome::ClearFilters],
        }
    }

    fn on_drag(&mut self, event: &MouseEvent, hit: Option<GridHit>) -> Vec<GridOutcome> {
        if let Some(resize) = &self.resize {
            let width = resize.width_at(event.x, self.columns.min_width());
            let id = resize.column_id().to_string();
            self.columns.set_width(&id, width);
            return Vec::new();
        }
        let hovered = match hit {
            Some(GridHit::Header(c) | GridHit::Sort(c) | GridHit::ResizeHandle(c)) => c,
            _ => return Vec::new(),
        };
        let Some(slot) = self.header_slots.get(hovered).copied() else {
            return Vec::new();
        };
        let Some(drag) = self.column_drag.as_mut() else {
            return Vec::new();
        };
        let Some((from, to)) = drag.update(event.x, hovered, slot.x, slot.width) else {
            return Vec::new();
        };
        self.sort_menu = None;
        if self.move_visible_column(from, to) {
            vec![GridOutcome::LayoutChanged(self.columns.active().to_vec())]
        } else {
            Vec::new()
        }
    }

    fn on_release(&mut self) -> Vec<GridOutcome> {
        self.resize = None;
        if let Some(drag) = self.column_drag.take() {
            if !drag.is_active() {
                let column = drag.origin_index();
                let sortable = self
                    .visible_column(column)
                    .is_some_and(|c| c.sort_key.is_some());
                self.sort_menu = match self.sort_menu {
                    Some(open) if open.column == column => None,
                    _ if sortable => Some(SortMenu { column }),
                    _ => None,
                };
            }
        }
        Vec::new()
    }

    fn click_row(&mut self, index: usize, event: &MouseEvent) -> Vec<GridOutcome> {
        let (Some(entry), Some(id)) = (
            self.flattened.get(index).copied(),
            self.rendered_ids.get(index).cloned(),
        ) else {
            return Vec::new();
        };
        if event.modifiers.is_range() {
            self.selection.extend_range(&self.rendered_ids, index);
            return vec![self.selection_changed()];
        }
        if event.modifiers.is_toggle() {
            self.selection.toggle(&id);
            return vec![self.selection_changed()];
        }
        if entry.expandable {
            return self.toggle_at(index);
        }
        self.highlighted.clear();
        self.selection.set_anchor(id.clone());
        vec![GridOutcome::Activate {
            row_id: id,
            index,
            event: *event,
        }]
    }

    fn toggle_at(&mut self, index: usize) -> Vec<GridOutcome> {
        let Some(id) = self.rendered_ids.get(index).cloned() else {
            return Vec::new();
        };
        match self.toggle_expansion(id.as_str()) {
            Some(expanded) => vec![GridOutcome::ExpansionToggled {
                row_id: Some(id),
                expanded,
            }],
            None => Vec::new(),
        }
    }

    fn selection_changed(&self) -> GridOutcome {
        GridOutcome::SelectionChanged(self.selected_ids())
    }

    fn visible_column(&self, n: usize) -> Option<&ColumnDef> {
        self.columns.visible_columns().get(n).copied()
    }

    /// Move between visible positions, translated to layout positions so
    /// hidden columns keep their place.
    fn move_visible_column(&mut self, from: usize, to: usize) -> bool {
        let (Some(from), Some(to)) = (
            self.columns.active_index_of_visible(from),
            self.columns.active_index_of_visible(to),
        ) else {
            return false;
        };
        self.columns.move_column(from, to)
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// Grid painter.
#[derive(Debug, Clone)]
pub struct Grid {
    theme: GridTheme,
    hit_id: HitId,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    #[must_use]
    pub fn new() -> Self {
        Self {
            theme: GridTheme::default(),
            hit_id: HitId::new(1),
        }
    }

    #[must_use]
    pub fn theme(mut self, theme: GridTheme) -> Self {
        self.theme = theme;
        self
    }

    /// Hit id for this grid's regions; set distinct ids when several grids
    /// share a frame.
    #[must_use]
    pub fn hit_id(mut self, id: HitId) -> Self {
        self.hit_id = id;
        self
    }

    fn hit(&self, frame: &mut Frame, rect: Rect, hit: GridHit) {
        let (region, data) = hit.encode();
        frame.register_hit(rect, self.hit_id, region, data);
    }

    /// Centered message lines, used for every empty state. Returns the rect
    /// of each drawn line.
    fn render_message(
        &self,
        area: Rect,
        frame: &mut Frame,
        lines: &[(&str, Style)],
    ) -> Vec<Rect> {
        let n = lines.len() as u16;
        let top = area.y + area.height.saturating_sub(n) / 2;
        let mut rects = Vec::with_capacity(lines.len());
        for (i, (text, style)) in lines.iter().enumerate() {
            let y = top.saturating_add(i as u16);
            if y >= area.bottom() {
                break;
            }
            let text = truncate_to_width(text, area.width as usize);
            let w = gridline_render::display_width(&text) as u16;
            let x = area.x + area.width.saturating_sub(w) / 2;
            draw_text_span(&mut frame.buffer, x, y, &text, *style, area.right(), 0);
            rects.push(Rect::new(x, y, w, 1));
        }
        rects
    }

    fn render_empty_data(&self, area: Rect, frame: &mut Frame, state: &GridState) {
        let mut lines = vec![(NO_DATA_MESSAGE, self.theme.empty_state)];
        if state.show_clear_filters {
            lines.push((CLEAR_FILTERS_LABEL, self.theme.empty_cta));
        }
        if let Some(cta) = &state.empty_cta {
            lines.push((cta.as_str(), self.theme.empty_state));
        }
        let rects = self.render_message(area, frame, &lines);
        if state.show_clear_filters {
            if let Some(rect) = rects.get(1) {
                self.hit(frame, *rect, GridHit::ClearFilters);
            }
        }
    }

    fn layout(&self, area: Rect, state: &GridState, columns: &[&ColumnDef]) -> GridLayout {
        let mut x = area.x.saturating_add(GROUP_BAR_WIDTH);
        let checkbox_x = state.config.checkbox_mode.has_column().then(|| {
            let at = x;
            x = x.saturating_add(CHECKBOX_WIDTH);
            at
        });
        let fixed = x - area.x;
        let mut widths: Vec<u16> = columns.iter().map(|c| state.columns.width(&c.id)).collect();
        let dividers = widths.len() as u16;
        let available = area.width.saturating_sub(fixed).saturating_sub(dividers);
        let target = total_width(&widths, available, state.config.full_width);
        let natural = total_width(&widths, available, false);
        if let Some(last) = widths.last_mut() {
            if target > natural {
                *last = last.saturating_add(target - natural);
            }
        }
        let mut slots = Vec::with_capacity(widths.len());
        for width in widths {
            slots.push(ColumnSlot { x, width });
            x = x.saturating_add(width).saturating_add(1);
        }
        GridLayout { checkbox_x, slots }
    }

    fn render_header(
        &self,
        area: Rect,
        frame: &mut Frame,
        state: &GridState,
        columns: &[&ColumnDef],
        layout: &GridLayout,
    ) {
        let y = area.y;
        let right = area.right();
        frame.buffer.fill(area.row(0, 1), styled_blank(self.theme.header));

        if let Some(cx) = layout.checkbox_x.filter(|&cx| cx < right) {
            let glyph = state.select_all_state().glyph();
            draw_text_span(&mut frame.buffer, cx, y, glyph, self.theme.checkbox, right, 0);
            self.hit(frame, Rect::new(cx, y, 1, 1), GridHit::SelectAll);
        }

        for (c, (col, slot)) in columns.iter().zip(&layout.slots).enumerate() {
            if slot.x >= right {
                break;
            }
            let end = slot.x.saturating_add(slot.width).min(right);
            let indicator = sort::indicator(col, state.sort.as_ref());
            let style = if indicator.is_some() {
                self.theme.header_sorted
            } else {
                self.theme.header
            };
            self.hit(frame, Rect::new(slot.x, y, end - slot.x, 1), GridHit::Header(c));

            let mut x = slot.x;
            if c == 0 && state.config.toggle_all_rows && state.tree_mode {
                let glyph = if state.expanded.is_empty() {
                    COLLAPSED_GLYPH
                } else {
                    EXPANDED_GLYPH
                };
                draw_text_span(&mut frame.buffer, x, y, glyph, self.theme.expander, end, 0);
                self.hit(frame, Rect::new(x, y, 1, 1), GridHit::ToggleAll);
                x = x.saturating_add(EXPANDER_WIDTH).min(end);
            }

            let sortable = col.sort_key.is_some();
            let label_end = if sortable { end.saturating_sub(2).max(x) } else { end };
            let label = truncate_to_width(&col.header, usize::from(label_end - x));
            draw_text_span(&mut frame.buffer, x, y, &label, style, label_end, 0);

            if sortable && end > slot.x && end - 1 >= x {
                let glyph = indicator.map_or(UNSORTED_GLYPH, SortDirection::glyph);
                let mut buf = [0u8; 4];
                let at = end - 1;
                draw_text_span(
                    &mut frame.buffer,
                    at,
                    y,
                    glyph.encode_utf8(&mut buf),
                    style,
                    end,
                    0,
                );
                self.hit(frame, Rect::new(at, y, 1, 1), GridHit::Sort(c));
            }

            let divider_x = slot.x.saturating_add(slot.width);
            if divider_x < right {
                draw_text_span(
                    &mut frame.buffer,
                    divider_x,
                    y,
                    DIVIDER,
                    self.theme.resize_handle,
                    right,
                    0,
                );
                self.hit(frame, Rect::new(divider_x, y, 1, 1), GridHit::ResizeHandle(c));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_row(
        &self,
        frame: &mut Frame,
        state: &GridState,
        columns: &[&ColumnDef],
        layout: &GridLayout,
        row_rect: Rect,
        index: usize,
        entry: FlattenedEntry,
    ) {
        let Some(node) = state.forest.node(entry.node) else {
            return;
        };
        let y = row_rect.y;
        let right = row_rect.right();
        let selected = state.selection.contains(node.id.as_str());
        let hovered = state.hovered == Some(index);
        let is_active = state.active_row.as_ref() == Some(&node.id);

        let mut style = if entry.depth > 0 {
            self.theme.row.patch(self.theme.row_nested)
        } else {
            self.theme.row
        };
        if hovered || state.highlighted.contains(&node.id) {
            style = style.patch(self.theme.row_hover);
        }
        if selected {
            style = style.patch(self.theme.row_selected);
        }
        if is_active {
            style = style.patch(self.theme.row_active);
        }
        frame.buffer.fill(row_rect, styled_blank(style));
        self.hit(frame, row_rect, GridHit::Row(index));

        if let Some(slot) = state.group_colors.slot_for(&state.forest, entry.node) {
            let bar = Style::new().fg(self.theme.group_color(slot));
            for dy in 0..row_rect.height {
                draw_text_span(&mut frame.buffer, row_rect.x, y + dy, GROUP_BAR, bar, right, 0);
            }
        }

        if let Some(cx) = layout.checkbox_x.filter(|&cx| cx < right) {
            if state.config.checkbox_mode.shows_for(hovered, selected) {
                let glyph = if selected { CHECKED } else { UNCHECKED };
                draw_text_span(&mut frame.buffer, cx, y, glyph, self.theme.checkbox, right, 0);
                self.hit(frame, Rect::new(cx, y, 1, 1), GridHit::Checkbox(index));
            }
        }

        for (c, (col, slot)) in columns.iter().zip(&layout.slots).enumerate() {
            if slot.x >= right {
                break;
            }
            let end = slot.x.saturating_add(slot.width).min(right);
            let mut x = slot.x;
            if c == 0 {
                x = x
                    .saturating_add((entry.depth as u16).saturating_mul(state.config.indent))
                    .min(end);
                if entry.expandable {
                    let glyph = if entry.expanded {
                        EXPANDED_GLYPH
                    } else {
                        COLLAPSED_GLYPH
                    };
                    if x < end {
                        draw_text_span(&mut frame.buffer, x, y, glyph, self.theme.expander, end, 0);
                        self.hit(frame, Rect::new(x, y, 1, 1), GridHit::Expander(index));
                    }
                    x = x.saturating_add(EXPANDER_WIDTH).min(end);
                } else if state.tree_mode {
                    x = x.saturating_add(EXPANDER_WIDTH).min(end);
                }
                if entry.has_error_descendant {
                    x = draw_text_span(&mut frame.buffer, x, y, ERROR_DOT, self.theme.error_dot, end, 0);
                    x = x.saturating_add(1).min(end);
                }
                if state.tree_mode && !entry.expandable {
                    let badge = format!(" {} ", node.kind.label());
                    let badge_style = self.theme.kind_badge(node.kind);
                    x = draw_text_span(&mut frame.buffer, x, y, &badge, badge_style, end, 0);
                    x = x.saturating_add(1).min(end);
                }
            }

            let (text, cell_style) = if state.data_loading && col.placeholder_while_loading {
                (LOADING_PLACEHOLDER.to_string(), self.theme.loading_placeholder)
            } else {
                (col.value(node).to_string(), Style::new())
            };
            let text = truncate_to_width(&text, usize::from(end - x));
            draw_text_span(&mut frame.buffer, x, y, &text, cell_style, end, 0);
        }

        if let Some(url) = state.row_link.as_ref().and_then(|f| f(node)) {
            let link = frame.register_link(&url);
            stamp_link(&mut frame.buffer, row_rect, link);
        }
    }

    fn render_sort_menu(
        &self,
        body: Rect,
        frame: &mut Frame,
        state: &GridState,
        layout: &GridLayout,
    ) {
        let Some(menu) = state.sort_menu else {
            return;
        };
        let Some(slot) = layout.slots.get(menu.column) else {
            return;
        };
        let active = state
            .visible_column(menu.column)
            .and_then(|col| sort::indicator(col, state.sort.as_ref()));
        let right = slot.x.saturating_add(SORT_MENU_WIDTH).min(body.right());
        for (i, direction) in SortMenu::OPTIONS.into_iter().enumerate() {
            let y = body.y.saturating_add(i as u16);
            if y >= body.bottom() || slot.x >= right {
                break;
            }
            let style = if active == Some(direction) {
                self.theme.header_sorted
            } else {
                self.theme.header
            };
            let rect = Rect::new(slot.x, y, right - slot.x, 1);
            frame.buffer.fill(rect, styled_blank(style));
            let label = format!("{} {}", direction.glyph(), direction.label());
            draw_text_span(&mut frame.buffer, slot.x, y, &label, style, right, 0);
            self.hit(
                frame,
                rect,
                GridHit::SortOption {
                    column: menu.column,
                    direction,
                },
            );
        }
    }
}

/// Column geometry for one render.
struct GridLayout {
    checkbox_x: Option<u16>,
    slots: Vec<ColumnSlot>,
}

impl StatefulWidget for Grid {
    type State = GridState;

    fn render(&self, area: Rect, frame: &mut Frame, state: &mut Self::State) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "widget_render",
            widget = "Grid",
            x = area.x,
            y = area.y,
            w = area.width,
            h = area.height,
            rows = state.flattened.len()
        )
        .entered();

        let area = area.intersection(&frame.bounds());
        if area.is_empty() {
            return;
        }
        state.hit_id = Some(self.hit_id);
        state.header_slots.clear();
        set_style_area(&mut frame.buffer, area, self.theme.row);

        if state.skeleton_loading || (state.data_loading && state.flattened.is_empty()) {
            self.render_message(area, frame, &[(LOADING_MESSAGE, self.theme.empty_state)]);
            return;
        }
        let columns = state.columns.visible_columns();
        if columns.is_empty() {
            self.render_message(area, frame, &[(NO_COLUMNS_MESSAGE, self.theme.empty_state)]);
            return;
        }
        if state.flattened.is_empty() {
            self.render_empty_data(area, frame, state);
            return;
        }

        let layout = self.layout(area, state, &columns);
        self.render_header(area, frame, state, &columns, &layout);

        let (_, body) = area.split_top(1);
        let row_height = state.config.row_height.max(1);
        state.virtualizer.set_viewport(u32::from(body.height));
        let window = state.virtualizer.window();
        let scroll_top = window.scroll_top;

        for index in window.render_range() {
            let Some(entry) = state.flattened.get(index).copied() else {
                break;
            };
            let offset = state.virtualizer.offset_of(index);
            // Overscan rows above or below the viewport are laid out but
            // have no cells to paint in a terminal.
            let Some(rel) = offset.checked_sub(scroll_top) else {
                continue;
            };
            let Ok(rel) = u16::try_from(rel) else {
                break;
            };
            if rel >= body.height {
                break;
            }
            let row_rect = body.row(rel, row_height);
            self.render_row(frame, state, &columns, &layout, row_rect, index, entry);
        }

        self.render_sort_menu(body, frame, state, &layout);
        state.header_slots = layout.slots;
        state.last_window = window;
    }
}
