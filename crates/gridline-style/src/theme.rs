#![forbid(unsafe_code)]

//! Grid themes.
//!
//! A [`GridTheme`] holds every style the grid renderer consults: header,
//! row states, selection affordances, indicators, empty states, the group
//! palette used for top-level color bars, and the row-kind badge table.

use crate::style::Style;
use gridline_core::kind::RowKind;
use gridline_render::cell::PackedRgba;

/// Number of colors in the group palette.
pub const GROUP_PALETTE_LEN: usize = 5;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridThemePreset {
    /// Dark background, light text.
    #[default]
    Dark,
    /// Light background, dark text.
    Light,
}

/// Styles for the grid renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTheme {
    pub header: Style,
    /// Header cell of the column currently driving the sort.
    pub header_sorted: Style,
    pub row: Style,
    /// Rows below the top level.
    pub row_nested: Style,
    pub row_hover: Style,
    pub row_selected: Style,
    /// The row shown in the host's detail panel.
    pub row_active: Style,
    pub checkbox: Style,
    pub expander: Style,
    pub error_dot: Style,
    pub loading_placeholder: Style,
    pub empty_state: Style,
    pub empty_cta: Style,
    pub divider: Style,
    pub resize_handle: Style,
    /// Colors assigned cyclically to top-level groups.
    pub group_palette: [PackedRgba; GROUP_PALETTE_LEN],
    pub preset: GridThemePreset,
}

struct ThemeStyles {
    header: Style,
    row: Style,
    row_nested: Style,
    row_hover: Style,
    row_selected: Style,
    accent: PackedRgba,
    muted: PackedRgba,
    palette: [PackedRgba; GROUP_PALETTE_LEN],
}

impl Default for GridTheme {
    fn default() -> Self {
        Self::preset(GridThemePreset::default())
    }
}

impl GridTheme {
    /// Build a theme from a preset.
    #[must_use]
    pub fn preset(preset: GridThemePreset) -> Self {
        match preset {
            GridThemePreset::Dark => Self::dark(),
            GridThemePreset::Light => Self::light(),
        }
    }

    /// Dark background preset.
    #[must_use]
    pub fn dark() -> Self {
        Self::build(
            GridThemePreset::Dark,
            ThemeStyles {
                header: Style::new()
                    .fg(PackedRgba::rgb(200, 205, 215))
                    .bg(PackedRgba::rgb(30, 34, 42))
                    .bold(),
                row: Style::new().fg(PackedRgba::rgb(225, 228, 235)),
                row_nested: Style::new().fg(PackedRgba::rgb(180, 185, 195)),
                row_hover: Style::new().bg(PackedRgba::rgb(38, 44, 56)),
                row_selected: Style::new()
                    .fg(PackedRgba::rgb(255, 255, 255))
                    .bg(PackedRgba::rgb(45, 70, 110)),
                accent: PackedRgba::rgb(110, 160, 255),
                muted: PackedRgba::rgb(120, 125, 135),
                palette: [
                    PackedRgba::rgb(231, 111, 81),
                    PackedRgba::rgb(42, 157, 143),
                    PackedRgba::rgb(38, 70, 83),
                    PackedRgba::rgb(233, 196, 106),
                    PackedRgba::rgb(244, 162, 97),
                ],
            },
        )
    }

    /// Light background preset.
    #[must_use]
    pub fn light() -> Self {
        Self::build(
            GridThemePreset::Light,
            ThemeStyles {
                header: Style::new()
                    .fg(PackedRgba::rgb(60, 64, 72))
                    .bg(PackedRgba::rgb(240, 242, 245))
                    .bold(),
                row: Style::new().fg(PackedRgba::rgb(20, 22, 28)),
                row_nested: Style::new().fg(PackedRgba::rgb(70, 74, 82)),
                row_hover: Style::new().bg(PackedRgba::rgb(245, 247, 250)),
                row_selected: Style::new()
                    .fg(PackedRgba::rgb(10, 20, 40))
                    .bg(PackedRgba::rgb(220, 232, 252)),
                accent: PackedRgba::rgb(37, 99, 235),
                muted: PackedRgba::rgb(140, 145, 155),
                palette: [
                    PackedRgba::rgb(220, 90, 60),
                    PackedRgba::rgb(30, 140, 125),
                    PackedRgba::rgb(40, 80, 100),
                    PackedRgba::rgb(200, 160, 60),
                    PackedRgba::rgb(230, 140, 70),
                ],
            },
        )
    }

    fn build(preset: GridThemePreset, s: ThemeStyles) -> Self {
        Self {
            header: s.header,
            header_sorted: s.header.fg(s.accent),
            row: s.row,
            row_nested: s.row_nested,
            row_hover: s.row_hover,
            row_selected: s.row_selected,
            row_active: s.row_selected.bold(),
            checkbox: Style::new().fg(s.accent),
            expander: Style::new().fg(s.muted),
            error_dot: Style::new().fg(PackedRgba::rgb(220, 38, 38)),
            loading_placeholder: Style::new().fg(s.muted).dim(),
            empty_state: Style::new().fg(s.muted),
            empty_cta: Style::new().fg(s.accent).bold(),
            divider: Style::new().fg(s.muted),
            resize_handle: Style::new().fg(s.muted).dim(),
            group_palette: s.palette,
            preset,
        }
    }

    /// Palette color for group slot `slot` (wraps around).
    #[must_use]
    pub fn group_color(&self, slot: usize) -> PackedRgba {
        self.group_palette[slot % GROUP_PALETTE_LEN]
    }

    /// Badge style for a row kind.
    #[must_use]
    pub fn kind_badge(&self, kind: RowKind) -> Style {
        let (fg, bg) = match kind {
            RowKind::Llm => (PackedRgba::rgb(30, 64, 175), PackedRgba::rgb(219, 234, 254)),
            RowKind::Tool => (PackedRgba::rgb(107, 33, 168), PackedRgba::rgb(243, 232, 255)),
            RowKind::VectorDb => (PackedRgba::rgb(22, 101, 52), PackedRgba::rgb(220, 252, 231)),
            RowKind::Data => (PackedRgba::rgb(154, 52, 18), PackedRgba::rgb(255, 237, 213)),
            RowKind::Custom => (PackedRgba::rgb(55, 65, 81), PackedRgba::rgb(243, 244, 246)),
        };
        Style::new().fg(fg).bg(bg)
    }
}
