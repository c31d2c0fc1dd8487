#![forbid(unsafe_code)]

//! Grid engine: row-tree flattening, viewport virtualization, column
//! registry, selection, column interaction, and the grid widget that
//! composes them.

pub mod columns;
pub mod drag;
pub mod fenwick;
pub mod flatten;
pub mod grid;
pub mod resize;
pub mod selection;
pub mod sort;
pub mod stateful;
pub mod tree;
pub mod virtualized;

pub use columns::{ActiveColumnItem, ColumnDef, ColumnRegistry, reconcile};
pub use flatten::{FlattenedEntry, GroupColors, flatten};
pub use grid::{Grid, GridConfig, GridHit, GridOutcome, GridState};
pub use selection::{CheckboxMode, SelectAllState, SelectionState, SelectionStatus};
pub use sort::{SortDescriptor, SortDirection, SortIntent};
pub use stateful::{LayoutStore, StateKey};
pub use tree::{CellValue, DefaultExpansion, ExpandedState, Row, RowForest, RowId, RowNode};
pub use virtualized::{ViewportWindow, Virtualizer};

use gridline_core::geometry::Rect;
use gridline_render::buffer::Buffer;
use gridline_render::cell::Cell;
use gridline_render::frame::Frame;
use gridline_style::Style;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A widget that renders from, and updates, external mutable state.
pub trait StatefulWidget {
    type State;

    /// Render into `frame` within `area`.
    fn render(&self, area: Rect, frame: &mut Frame, state: &mut Self::State);
}

/// Apply a style to every cell in `area`, keeping content.
pub(crate) fn set_style_area(buf: &mut Buffer, area: Rect, style: Style) {
    if style.is_empty() {
        return;
    }
    for y in area.y..area.bottom() {
        for x in area.x..area.right() {
            if let Some(cell) = buf.get_mut(x, y) {
                style.apply_to(cell);
            }
        }
    }
}

/// Draw `content` at `(x, y)`, stopping before `max_x`. `link` is a frame
/// link id (0 = none). Returns the column after the last drawn grapheme.
pub(crate) fn draw_text_span(
    buf: &mut Buffer,
    x: u16,
    y: u16,
    content: &str,
    style: Style,
    max_x: u16,
    link: u32,
) -> u16 {
    let mut template = buf.get(x, y).copied().unwrap_or_default();
    style.apply_to(&mut template);
    template.link = link;
    buf.put_str(x, y, content, template, max_x)
}

/// Fit `text` into `width` cells, replacing the tail with `…` when it does
/// not fit.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = UnicodeWidthStr::width(grapheme);
        if used + w + 1 > width {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    out
}

/// Stamp `link` onto every cell in `area`, leaving content and colors.
pub(crate) fn stamp_link(buf: &mut Buffer, area: Rect, link: u32) {
    for y in area.y..area.bottom() {
        for x in area.x..area.right() {
            if let Some(cell) = buf.get_mut(x, y) {
                cell.link = link;
            }
        }
    }
}

/// Blank cell carrying `style`.
pub(crate) fn styled_blank(style: Style) -> Cell {
    let mut cell = Cell::default();
    style.apply_to(&mut cell);
    cell
}
