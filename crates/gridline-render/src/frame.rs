#![forbid(unsafe_code)]

//! Frame = Buffer + hit grid + link registry for one render pass.
//!
//! Widgets register clickable regions while drawing. The host later calls
//! [`Frame::hit_test`] with a pointer position and feeds the result back to
//! the widget's state, which decodes the region tag and payload.

use crate::buffer::Buffer;
use crate::link_registry::LinkRegistry;
use gridline_core::geometry::Rect;

/// Identifier for a widget that owns hit regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HitId(pub u32);

impl HitId {
    /// Create a hit id from a raw value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw value.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Opaque payload attached to a hit cell (row index, column index, ...).
pub type HitData = u64;

/// Region tag within a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HitRegion {
    /// No interactive region.
    #[default]
    None,
    /// Main content area.
    Content,
    /// Resize handle or drag target.
    Handle,
    /// Clickable button.
    Button,
    /// Hyperlink.
    Link,
    /// Widget-defined region tag.
    Custom(u8),
}

/// One cell of the hit grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitCell {
    /// Owning widget, if any.
    pub widget_id: Option<HitId>,
    /// Region tag.
    pub region: HitRegion,
    /// Payload.
    pub data: HitData,
}

/// Screen-position → hit cell map.
#[derive(Debug, Clone)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<HitCell>,
}

impl HitGrid {
    /// Empty grid.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![HitCell::default(); width as usize * height as usize],
        }
    }

    /// Register `rect`. Later registrations overwrite earlier ones, so
    /// widgets register broad regions first and small affordances last.
    pub fn register(&mut self, rect: Rect, widget_id: HitId, region: HitRegion, data: HitData) {
        let Some(clip) = rect.intersection_opt(&Rect::from_size(self.width, self.height)) else {
            return;
        };
        let cell = HitCell {
            widget_id: Some(widget_id),
            region,
            data,
        };
        for y in clip.y..clip.bottom() {
            let row = y as usize * self.width as usize;
            self.cells[row + clip.x as usize..row + clip.right() as usize].fill(cell);
        }
    }

    /// Hit at `(x, y)`.
    #[must_use]
    pub fn hit_test(&self, x: u16, y: u16) -> Option<(HitId, HitRegion, HitData)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let cell = self.cells[y as usize * self.width as usize + x as usize];
        cell.widget_id.map(|id| (id, cell.region, cell.data))
    }

    /// Drop all regions.
    pub fn clear(&mut self) {
        self.cells.fill(HitCell::default());
    }
}

/// Render target for one pass.
#[derive(Debug)]
pub struct Frame {
    /// The cell grid.
    pub buffer: Buffer,
    /// Hit grid; `None` disables hit registration.
    pub hit_grid: Option<HitGrid>,
    /// Row link table.
    pub links: LinkRegistry,
}

impl Frame {
    /// Frame without hit testing.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::new(width, height),
            hit_grid: None,
            links: LinkRegistry::new(),
        }
    }

    /// Frame with hit testing enabled.
    #[must_use]
    pub fn with_hit_grid(width: u16, height: u16) -> Self {
        Self {
            hit_grid: Some(HitGrid::new(width, height)),
            ..Self::new(width, height)
        }
    }

    /// Buffer bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.buffer.area()
    }

    /// Register a hit region. Returns `false` when hit testing is disabled.
    pub fn register_hit(
        &mut self,
        rect: Rect,
        id: HitId,
        region: HitRegion,
        data: HitData,
    ) -> bool {
        match self.hit_grid.as_mut() {
            Some(grid) => {
                grid.register(rect, id, region, data);
                true
            }
            None => false,
        }
    }

    /// Hit test at `(x, y)`.
    #[must_use]
    pub fn hit_test(&self, x: u16, y: u16) -> Option<(HitId, HitRegion, HitData)> {
        self.hit_grid.as_ref().and_then(|g| g.hit_test(x, y))
    }

    /// Register a URL; returns the link id to stamp on cells.
    pub fn register_link(&mut self, url: &str) -> u32 {
        self.links.register(url)
    }

    /// URL behind the cell at `(x, y)`, if it carries a link.
    #[must_use]
    pub fn link_at(&self, x: u16, y: u16) -> Option<&str> {
        let id = self.buffer.get(x, y)?.link;
        self.links.get(id)
    }

    /// Clear cells, hit regions, and links for the next pass.
    pub fn clear(&mut self) {
        self.buffer.clear();
        if let Some(grid) = self.hit_grid.as_mut() {
            grid.clear();
        }
        self.links.clear();
    }
}
