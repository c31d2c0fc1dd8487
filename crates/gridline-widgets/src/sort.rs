#![forbid(unsafe_code)]

//! Sort indicators and sort intents.
//!
//! The grid never reorders rows. A header's sort menu (or a click on its
//! indicator) produces a [`SortIntent`] for the host's query layer; the host
//! passes the active [`SortDescriptor`] back in so the header can show the
//! matching indicator once the re-sorted rows arrive.

use crate::columns::ColumnDef;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The other direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header indicator glyph.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            SortDirection::Ascending => '▲',
            SortDirection::Descending => '▼',
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "Ascending",
            SortDirection::Descending => "Descending",
        }
    }
}

/// The host's current sort, passed in for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortDescriptor {
    pub sort_key: String,
    pub direction: SortDirection,
    pub is_custom_property: bool,
}

impl SortDescriptor {
    #[must_use]
    pub fn new(sort_key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            sort_key: sort_key.into(),
            direction,
            is_custom_property: false,
        }
    }

    #[must_use]
    pub fn custom_property(mut self, yes: bool) -> Self {
        self.is_custom_property = yes;
        self
    }
}

/// A request for the host to re-query with a new sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortIntent {
    pub sort_key: String,
    pub direction: SortDirection,
    pub is_custom_property: bool,
}

/// Intent for picking `direction` from `column`'s sort menu. `None` for
/// unsortable columns.
#[must_use]
pub fn menu_intent(column: &ColumnDef, direction: SortDirection) -> Option<SortIntent> {
    let sort_key = column.sort_key.clone()?;
    Some(SortIntent {
        sort_key,
        direction,
        is_custom_property: column.is_custom_property,
    })
}

/// Intent for clicking `column`'s indicator: flips the direction when the
/// column already drives the sort, otherwise asks for ascending.
#[must_use]
pub fn header_click_intent(
    column: &ColumnDef,
    current: Option<&SortDescriptor>,
) -> Option<SortIntent> {
    let direction = match indicator(column, current) {
        Some(active) => active.flipped(),
        None => SortDirection::Ascending,
    };
    menu_intent(column, direction)
}

/// Direction to show on `column`'s header, if it drives the current sort.
#[must_use]
pub fn indicator(column: &ColumnDef, current: Option<&SortDescriptor>) -> Option<SortDirection> {
    let current = current?;
    let key = column.sort_key.as_deref()?;
    (key == current.sort_key && column.is_custom_property == current.is_custom_property)
        .then_some(current.direction)
}

/// Open sort menu for one visible column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortMenu {
    /// Visible column index the menu belongs to.
    pub column: usize,
}

impl SortMenu {
    /// Menu entries, top to bottom.
    pub const OPTIONS: [SortDirection; 2] = [SortDirection::Ascending, SortDirection::Descending];
}
