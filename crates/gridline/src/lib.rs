#![forbid(unsafe_code)]

//! gridline public facade crate.
//!
//! Re-exports the grid engine's common types from the internal crates and
//! offers a prelude for day-to-day use.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use gridline_core::event::{Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use gridline_core::geometry::Rect;
pub use gridline_core::kind::RowKind;

// --- Render re-exports -----------------------------------------------------

pub use gridline_render::buffer::Buffer;
pub use gridline_render::cell::{Cell, PackedRgba};
pub use gridline_render::frame::{Frame, HitId};

// --- Style re-exports ------------------------------------------------------

pub use gridline_style::{GridTheme, GridThemePreset, Style};

// --- Widget re-exports -----------------------------------------------------

pub use gridline_widgets::{
    ActiveColumnItem, CellValue, CheckboxMode, ColumnDef, ColumnRegistry, DefaultExpansion,
    Grid, GridConfig, GridOutcome, GridState, LayoutStore, Row, RowId, SelectAllState,
    SortDescriptor, SortDirection, SortIntent, StateKey, StatefulWidget,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "state-persistence")]
pub use gridline_runtime::FileStorage;
pub use gridline_runtime::{
    GridHandler, LayoutRegistry, MemoryStorage, PersistentLayoutStore, StorageError, dispatch,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for gridline hosts.
#[derive(Debug)]
pub enum Error {
    /// Layout storage failure.
    Storage(StorageError),
    /// Caller data broke a contract (duplicate row ids).
    InvalidRows(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidRows(msg) => write!(f, "invalid rows: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::InvalidRows(_) => None,
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<gridline_widgets::tree::ForestError> for Error {
    fn from(err: gridline_widgets::tree::ForestError) -> Self {
        Self::InvalidRows(err.to_string())
    }
}

/// Standard result type for gridline APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ColumnDef, ColumnRegistry, Error, Frame, Grid, GridConfig, GridHandler, GridOutcome,
        GridState, GridTheme, Modifiers, MouseEvent, Rect, Result, Row, RowId, StateKey,
        StatefulWidget, dispatch,
    };

    pub use crate::{core, render, runtime, style, widgets};
}

pub use gridline_core as core;
pub use gridline_render as render;
pub use gridline_runtime as runtime;
pub use gridline_style as style;
pub use gridline_widgets as widgets;
