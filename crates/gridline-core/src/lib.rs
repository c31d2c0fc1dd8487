#![forbid(unsafe_code)]

//! Core: geometry, pointer events, row kinds, and the logging facade shared
//! by every gridline crate.

pub mod event;
pub mod geometry;
pub mod kind;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, trace_span, warn};
