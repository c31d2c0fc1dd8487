#![forbid(unsafe_code)]

//! Grid runtime services.
//!
//! # Key Components
//!
//! - [`LayoutRegistry`] - cache of persisted column layouts over a
//!   [`StorageBackend`]
//! - [`PersistentLayoutStore`] - the grid's [`LayoutStore`] backed by a
//!   shared registry
//! - [`GridHandler`] and [`dispatch`] - route grid outcomes to host callbacks
//!
//! # Role in gridline
//! `gridline-widgets` holds all grid state and decides what happened;
//! this crate connects those decisions to the world outside the grid:
//! layout storage and the host's sort, selection, and activation handlers.
//!
//! [`LayoutStore`]: gridline_widgets::stateful::LayoutStore

pub mod dispatch;
pub mod layout_persistence;

pub use dispatch::{GridHandler, dispatch};
#[cfg(feature = "state-persistence")]
pub use layout_persistence::FileStorage;
pub use layout_persistence::{
    LayoutRegistry, MemoryStorage, PersistentLayoutStore, RegistryStats, StorageBackend,
    StorageError, StorageResult, StoredLayout,
};
