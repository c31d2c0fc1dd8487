#![forbid(unsafe_code)]

//! Render kernel: cells, the cell buffer, hit testing, and row links.
//!
//! Widgets draw into a [`frame::Frame`], which bundles the [`buffer::Buffer`]
//! with an optional [`frame::HitGrid`] for pointer routing and a
//! [`link_registry::LinkRegistry`] for row hyperlinks.

pub mod buffer;
pub mod cell;
pub mod frame;
pub mod link_registry;

use unicode_width::UnicodeWidthStr;

/// Display width of `text` in cells.
#[inline]
#[must_use]
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}
