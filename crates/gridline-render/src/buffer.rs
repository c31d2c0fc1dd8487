#![forbid(unsafe_code)]

//! Row-major cell grid.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`.
//! 2. Writes outside the grid are ignored, never panic.
//! 3. A wide character is never split: if its tail would fall outside the
//!    write limit, nothing is written.

use crate::cell::Cell;
use gridline_core::geometry::Rect;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A fixed-size grid of [`Cell`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Buffer {
    /// Blank buffer of the given size.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    /// Width in cells.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Full buffer bounds.
    #[inline]
    pub const fn area(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Cell at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell at `(x, y)`.
    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        self.index(x, y).map(|i| &mut self.cells[i])
    }

    /// Write a cell. A wide head (`width == 2`) also claims `(x + 1, y)` as a
    /// continuation carrying the same colors.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        self.cells[i] = cell;
        if cell.width == 2
            && let Some(j) = self.index(x.saturating_add(1), y)
        {
            self.cells[j] = Cell {
                ch: ' ',
                width: 0,
                ..cell
            };
        }
    }

    /// Fill `rect` (clipped to the buffer) with `cell`.
    pub fn fill(&mut self, rect: Rect, cell: Cell) {
        let Some(clip) = rect.intersection_opt(&self.area()) else {
            return;
        };
        for y in clip.y..clip.bottom() {
            let start = y as usize * self.width as usize;
            self.cells[start + clip.x as usize..start + clip.right() as usize].fill(cell);
        }
    }

    /// Write `text` starting at `(x, y)` using `template` for colors, flags,
    /// and link. Stops before `max_x`. Returns the column after the last
    /// written grapheme.
    pub fn put_str(&mut self, mut x: u16, y: u16, text: &str, template: Cell, max_x: u16) -> u16 {
        let limit = max_x.min(self.width);
        for grapheme in text.graphemes(true) {
            if x >= limit {
                break;
            }
            let w = UnicodeWidthStr::width(grapheme).min(2) as u16;
            if w == 0 {
                continue;
            }
            if x.saturating_add(w) > limit {
                break;
            }
            let ch = grapheme.chars().next().unwrap_or(' ');
            self.set(
                x,
                y,
                Cell {
                    ch,
                    width: w as u8,
                    ..template
                },
            );
            x = x.saturating_add(w);
        }
        x
    }

    /// Reset every cell to the default blank.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Characters of row `y`, continuation cells skipped, trailing spaces
    /// trimmed. Empty for rows outside the buffer.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = y as usize * self.width as usize;
        let row: String = self.cells[start..start + self.width as usize]
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect();
        row.trim_end().to_string()
    }

    /// All rows joined with `\n`. Used for snapshot assertions.
    #[must_use]
    pub fn to_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
