#![forbid(unsafe_code)]

//! Live column resizing.
//!
//! Dragging a column's trailing-edge handle resizes it on every pointer
//! move. The grid's total width is either the sum of its column widths or,
//! in full-width mode, the container width regardless of columns.

/// An in-progress resize of one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnResize {
    column_id: String,
    start_x: u16,
    start_width: u16,
}

impl ColumnResize {
    /// Start resizing `column_id`, currently `width` cells wide, from
    /// pointer column `x`.
    #[must_use]
    pub fn begin(column_id: impl Into<String>, x: u16, width: u16) -> Self {
        Self {
            column_id: column_id.into(),
            start_x: x,
            start_width: width,
        }
    }

    #[must_use]
    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    /// Width when the resize began.
    #[must_use]
    pub fn start_width(&self) -> u16 {
        self.start_width
    }

    /// Width for pointer column `x`, never below `min_width`.
    #[must_use]
    pub fn width_at(&self, x: u16, min_width: u16) -> u16 {
        let delta = i32::from(x) - i32::from(self.start_x);
        let width = (i32::from(self.start_width) + delta).clamp(0, i32::from(u16::MAX)) as u16;
        width.max(min_width)
    }
}

/// Total rendered width.
#[must_use]
pub fn total_width(widths: &[u16], container: u16, full_width: bool) -> u16 {
    if full_width {
        container
    } else {
        widths.iter().fold(0u16, |acc, &w| acc.saturating_add(w))
    }
}
