#![forbid(unsafe_code)]

//! Styles and grid themes.

pub mod style;
pub mod theme;

pub use style::Style;
pub use theme::{GridTheme, GridThemePreset};
