#![forbid(unsafe_code)]

//! Drag-to-reorder for columns.
//!
//! A [`ColumnDrag`] tracks one pointer drag of a column handle, either along
//! the header (horizontal) or down a column-chooser list (vertical). While
//! the pointer hovers another item, the drag only commits a move once the
//! pointer crosses that item's midpoint in the direction of travel. Hovering
//! near an item boundary therefore cannot make two items swap back and forth.
//!
//! # Invariants
//!
//! 1. No move is reported before the pointer travels `threshold_cells`.
//! 2. Each reported move `(from, to)` has `from == current_index()` before
//!    the call and `to == current_index()` after it.
//! 3. Moving forward commits at or past the hovered item's midpoint; moving
//!    backward commits before it.

/// Axis the drag runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DragAxis {
    /// Items stacked top to bottom (column chooser list).
    Vertical,
    /// Items laid out left to right (grid header).
    Horizontal,
}

/// Drag gesture configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragConfig {
    /// Minimum travel in cells before a press becomes a drag (default: 1).
    pub threshold_cells: u16,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { threshold_cells: 1 }
    }
}

impl DragConfig {
    #[must_use]
    pub fn with_threshold(mut self, cells: u16) -> Self {
        self.threshold_cells = cells;
        self
    }
}

/// Where a pointer sits relative to a hovered item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropPosition {
    /// Leading half of item `n`.
    Before(usize),
    /// Trailing half of item `n`.
    After(usize),
}

impl DropPosition {
    /// Classify `pos` against item `index` spanning `[start, start + len)`.
    #[must_use]
    pub fn classify(pos: u16, index: usize, start: u16, len: u16) -> Self {
        let within = pos.saturating_sub(start);
        if within < len / 2 {
            Self::Before(index)
        } else {
            Self::After(index)
        }
    }
}

/// An in-progress column drag.
#[derive(Clone, Debug)]
pub struct ColumnDrag {
    config: DragConfig,
    axis: DragAxis,
    origin_index: usize,
    current_index: usize,
    start_pos: u16,
    active: bool,
}

impl ColumnDrag {
    /// Start tracking a press on item `index` at pointer coordinate `pos`
    /// (x for horizontal drags, y for vertical).
    #[must_use]
    pub fn begin(axis: DragAxis, index: usize, pos: u16, config: DragConfig) -> Self {
        Self {
            active: config.threshold_cells == 0,
            config,
            axis,
            origin_index: index,
            current_index: index,
            start_pos: pos,
        }
    }

    #[must_use]
    pub fn axis(&self) -> DragAxis {
        self.axis
    }

    /// Index the dragged item started at.
    #[must_use]
    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    /// Index the dragged item currently occupies.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Whether the threshold has been crossed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pointer moved to `pos` over item `hovered` spanning
    /// `[item_start, item_start + item_len)`. Returns `(from, to)` when the
    /// dragged item should move.
    pub fn update(
        &mut self,
        pos: u16,
        hovered: usize,
        item_start: u16,
        item_len: u16,
    ) -> Option<(usize, usize)> {
        if !self.active {
            if pos.abs_diff(self.start_pos) < self.config.threshold_cells {
                return None;
            }
            self.active = true;
        }
        if hovered == self.current_index {
            return None;
        }
        // Single-cell items have no midpoint to cross.
        let crossed = item_len <= 1
            || match DropPosition::classify(pos, hovered, item_start, item_len) {
                DropPosition::After(_) => hovered > self.current_index,
                DropPosition::Before(_) => hovered < self.current_index,
            };
        if !crossed {
            return None;
        }
        let from = self.current_index;
        self.current_index = hovered;
        Some((from, hovered))
    }

    /// Whether the drag moved the item at all.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.current_index != self.origin_index
    }

    /// Abandon the drag (Escape). Returns the move that puts the item back
    /// where it started, if it moved.
    #[must_use]
    pub fn cancel(self) -> Option<(usize, usize)> {
        self.moved().then_some((self.current_index, self.origin_index))
    }
}
