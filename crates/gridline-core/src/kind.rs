#![forbid(unsafe_code)]

//! Row kinds.
//!
//! A closed set of record categories. Rendering code maps each kind to a
//! label and a badge style through exhaustive `match`es, so adding a kind is
//! a compile error everywhere it needs handling.

use std::fmt;

/// Category of a record row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowKind {
    /// Language-model request.
    #[default]
    Llm,
    /// Tool invocation.
    Tool,
    /// Vector database query.
    VectorDb,
    /// Generic data operation.
    Data,
    /// Caller-defined step.
    Custom,
}

impl RowKind {
    /// All kinds, in display order.
    pub const ALL: [RowKind; 5] = [
        RowKind::Llm,
        RowKind::Tool,
        RowKind::VectorDb,
        RowKind::Data,
        RowKind::Custom,
    ];

    /// Short label shown in badges.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RowKind::Llm => "LLM",
            RowKind::Tool => "Tool",
            RowKind::VectorDb => "VectorDB",
            RowKind::Data => "Data",
            RowKind::Custom => "Custom",
        }
    }

    /// Parse a label case-insensitively. Unknown labels map to `Custom`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(label))
            .unwrap_or(RowKind::Custom)
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
