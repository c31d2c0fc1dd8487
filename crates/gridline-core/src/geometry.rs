#![forbid(unsafe_code)]

//! Cell-space rectangles used for layout, clipping, and hit testing.

/// A rectangle in cell coordinates (origin top-left, 0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Whether the rectangle covers no cells.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `(x, y)` lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap with `other`, or `None` when they are disjoint.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (x < right && y < bottom).then(|| Rect::new(x, y, right - x, bottom - y))
    }

    /// Overlap with `other`; empty when disjoint.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Split off the top `height` rows. The second half holds the remainder.
    #[must_use]
    pub fn split_top(&self, height: u16) -> (Rect, Rect) {
        let top = height.min(self.height);
        (
            Rect::new(self.x, self.y, self.width, top),
            Rect::new(self.x, self.y.saturating_add(top), self.width, self.height - top),
        )
    }

    /// A single-row strip `offset` rows below the top edge, clipped to `self`.
    #[must_use]
    pub fn row(&self, offset: u16, height: u16) -> Rect {
        if offset >= self.height {
            return Rect::new(self.x, self.bottom(), self.width, 0);
        }
        let h = height.min(self.height - offset);
        Rect::new(self.x, self.y.saturating_add(offset), self.width, h)
    }

    /// A vertical slice starting `offset` columns right of the left edge,
    /// clipped to `self`.
    #[must_use]
    pub fn column(&self, offset: u16, width: u16) -> Rect {
        if offset >= self.width {
            return Rect::new(self.right(), self.y, 0, self.height);
        }
        let w = width.min(self.width - offset);
        Rect::new(self.x.saturating_add(offset), self.y, w, self.height)
    }
}
