#![forbid(unsafe_code)]

//! Viewport virtualization for the flattened row sequence.
//!
//! The [`Virtualizer`] keeps a [`FenwickTree`] of per-row heights and, for
//! the current scroll offset and viewport height, computes which rows are
//! visible and which must be instantiated (visible plus `overscan` rows on
//! each side). Rows outside that range contribute only to the leading and
//! trailing spacer extents.
//!
//! # Costs
//!
//! | Operation | Time |
//! |-----------|------|
//! | [`Virtualizer::rebuild`] | O(n) |
//! | [`Virtualizer::measure`] | O(log n) |
//! | [`Virtualizer::window`] | O(log n) |
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Scroll offset past the end (e.g. after the list shrank) | Clamped to the last page |
//! | Index out of range in `scroll_to_index` / `measure` | Clamped / ignored |
//! | Wrong height estimate | Spacer extents drift; never panics |
//! | Total extent beyond `u32::MAX` | Extents saturate at `u32::MAX`; rows past that offset cannot be scrolled to |
//!
//! # Example
//!
//! ```
//! use gridline_widgets::virtualized::Virtualizer;
//!
//! let mut v = Virtualizer::new(); // 52-unit estimate, overscan 5
//! v.rebuild(10_000);
//! v.set_viewport(800);
//! v.set_scroll_top(52_000);
//! let w = v.window();
//! assert_eq!(w.visible_range(), 1000..1016);
//! assert_eq!(w.render_range(), 995..1021);
//! ```

use std::ops::Range;

use crate::fenwick::FenwickTree;

/// Default height estimate for unmeasured rows.
pub const DEFAULT_ESTIMATED_HEIGHT: u32 = 52;
/// Default rows rendered beyond each edge of the viewport.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Row height strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowHeight {
    /// Every row has this height. `measure` is ignored.
    Fixed(u32),
    /// Rows start at `estimate` and may be corrected with `measure`.
    /// Measurements are positional and reset on `rebuild`.
    Measured { estimate: u32 },
}

impl Default for RowHeight {
    fn default() -> Self {
        RowHeight::Measured {
            estimate: DEFAULT_ESTIMATED_HEIGHT,
        }
    }
}

impl RowHeight {
    fn initial(self) -> u32 {
        match self {
            RowHeight::Fixed(h) => h,
            RowHeight::Measured { estimate } => estimate,
        }
    }
}

/// Result of a window computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportWindow {
    /// First visible row.
    pub start_index: usize,
    /// One past the last visible row.
    pub end_index: usize,
    /// First instantiated row (visible start minus overscan).
    pub render_start: usize,
    /// One past the last instantiated row.
    pub render_end: usize,
    /// Extent of the spacer before `render_start`.
    pub leading_space: u32,
    /// Extent of the spacer after `render_end`.
    pub trailing_space: u32,
    /// Total scrollable extent.
    pub total_extent: u32,
    /// Scroll offset the window was computed for, after clamping.
    pub scroll_top: u32,
}

impl ViewportWindow {
    #[inline]
    #[must_use]
    pub fn visible_range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    #[inline]
    #[must_use]
    pub fn render_range(&self) -> Range<usize> {
        self.render_start..self.render_end
    }

    /// Number of instantiated rows.
    #[inline]
    #[must_use]
    pub fn rendered_len(&self) -> usize {
        self.render_end - self.render_start
    }
}

/// Scroll and height bookkeeping for a virtualized row sequence.
#[derive(Debug, Clone)]
pub struct Virtualizer {
    heights: FenwickTree,
    row_height: RowHeight,
    overscan: usize,
    scroll_top: u32,
    viewport: u32,
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Virtualizer {
    /// Empty virtualizer with estimated heights of 52 and overscan 5.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heights: FenwickTree::default(),
            row_height: RowHeight::default(),
            overscan: DEFAULT_OVERSCAN,
            scroll_top: 0,
            viewport: 0,
        }
    }

    #[must_use]
    pub fn with_fixed_height(mut self, height: u32) -> Self {
        self.row_height = RowHeight::Fixed(height);
        self
    }

    #[must_use]
    pub fn with_estimated_height(mut self, estimate: u32) -> Self {
        self.row_height = RowHeight::Measured { estimate };
        self
    }

    #[must_use]
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn overscan(&self) -> usize {
        self.overscan
    }

    #[inline]
    #[must_use]
    pub fn row_height(&self) -> RowHeight {
        self.row_height
    }

    #[inline]
    #[must_use]
    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> u32 {
        self.viewport
    }

    /// Total scrollable extent.
    #[inline]
    #[must_use]
    pub fn total_extent(&self) -> u32 {
        saturate(self.heights.total())
    }

    /// Start offset of row `i`.
    #[inline]
    #[must_use]
    pub fn offset_of(&self, i: usize) -> u32 {
        saturate(self.heights.offset_of(i))
    }

    /// Largest valid scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> u32 {
        self.total_extent().saturating_sub(self.viewport)
    }

    /// Reset heights for a sequence of `len` rows. Call whenever the
    /// flattened sequence changes. The scroll offset is re-clamped.
    pub fn rebuild(&mut self, len: usize) {
        self.heights = FenwickTree::uniform(len, self.row_height.initial());
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    /// Record the measured height of row `i`. Ignored for fixed heights and
    /// out-of-range rows.
    pub fn measure(&mut self, i: usize, height: u32) {
        if matches!(self.row_height, RowHeight::Measured { .. }) {
            self.heights.set(i, height);
        }
    }

    /// Set the viewport extent.
    pub fn set_viewport(&mut self, extent: u32) {
        self.viewport = extent;
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    /// Set the scroll offset, clamped to `[0, max_scroll]`.
    pub fn set_scroll_top(&mut self, offset: u32) {
        self.scroll_top = offset.min(self.max_scroll());
    }

    /// Scroll by `delta` (positive = down).
    pub fn scroll_by(&mut self, delta: i64) {
        let target = (self.scroll_top as i64)
            .saturating_add(delta)
            .clamp(0, u32::MAX as i64) as u32;
        self.set_scroll_top(target);
    }

    /// Scroll so row `i` (clamped to the last row) is at the top.
    pub fn scroll_to_index(&mut self, i: usize) {
        if self.is_empty() {
            self.scroll_top = 0;
            return;
        }
        let i = i.min(self.len() - 1);
        self.set_scroll_top(self.offset_of(i));
    }

    /// Scroll the minimum distance that brings row `i` fully into view.
    pub fn scroll_into_view(&mut self, i: usize) {
        if self.is_empty() {
            return;
        }
        let i = i.min(self.len() - 1);
        let top = self.offset_of(i);
        let bottom = self.offset_of(i + 1);
        if top < self.scroll_top {
            self.set_scroll_top(top);
        } else if bottom > self.scroll_top.saturating_add(self.viewport) {
            self.set_scroll_top(bottom.saturating_sub(self.viewport));
        }
    }

    /// Visible and render ranges for the current scroll state.
    #[must_use]
    pub fn window(&self) -> ViewportWindow {
        let len = self.len();
        let total = self.heights.total();
        let scroll_top = self.scroll_top.min(self.max_scroll());
        if len == 0 || self.viewport == 0 || total == 0 {
            return ViewportWindow {
                total_extent: saturate(total),
                trailing_space: saturate(total),
                scroll_top,
                ..ViewportWindow::default()
            };
        }

        let last = len - 1;
        let start = self.heights.index_at(u64::from(scroll_top)).unwrap_or(last);
        let bottom = (u64::from(scroll_top) + u64::from(self.viewport)).min(total);
        let end = self
            .heights
            .index_at(bottom.saturating_sub(1))
            .map_or(len, |i| i + 1)
            .max(start + 1);

        let render_start = start.saturating_sub(self.overscan);
        let render_end = end.saturating_add(self.overscan).min(len);

        gridline_core::trace!(
            start,
            end,
            render_start,
            render_end,
            scroll_top,
            "viewport window"
        );

        ViewportWindow {
            start_index: start,
            end_index: end,
            render_start,
            render_end,
            leading_space: self.offset_of(render_start),
            trailing_space: saturate(total.saturating_sub(self.heights.offset_of(render_end))),
            total_extent: saturate(total),
            scroll_top,
        }
    }
}

#[inline]
fn saturate(extent: u64) -> u32 {
    u32::try_from(extent).unwrap_or(u32::MAX)
}
