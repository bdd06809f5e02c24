use std::collections::BTreeSet;

use serde::Serialize;

use crate::driver::element::ScreenElement;

/// A text node that survived window and block-list filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawNode {
    /// Trimmed text of the element
    pub text: String,
    pub element: ScreenElement,
}

impl RawNode {
    pub fn new(element: ScreenElement) -> Option<Self> {
        let text = element.trimmed_text()?.to_string();
        Some(RawNode { text, element })
    }

    pub fn y(&self) -> i32 {
        self.element.y
    }
}

/// One logical, selectable row reconstructed from one or more text nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub index: usize,

    /// First node of the cluster; the one that gets clicked
    pub anchor: RawNode,

    pub label: String,

    /// Continuation lines (subtitle, type) of the same row
    pub details: Vec<String>,
}

impl Entry {
    pub fn y(&self) -> i32 {
        self.anchor.y()
    }
}

/// Indices and names a random selection must avoid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    pub indices: BTreeSet<usize>,
    pub names: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_index(mut self, index: usize) -> Self {
        self.indices.insert(index);
        self
    }

    pub fn exclude_name(mut self, name: &str) -> Self {
        let name = name.trim();
        if !name.is_empty() {
            self.names.insert(name.to_string());
        }
        self
    }

    /// Whether the entry at `position` in the current list is excluded.
    pub fn excludes(&self, position: usize, entry: &Entry) -> bool {
        self.indices.contains(&position) || self.names.contains(entry.label.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub index: usize,
    pub label: String,

    /// Set when the requested index was out of range and another entry was
    /// clicked instead
    pub fallback_from: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionFailure {
    /// Reconstruction produced nothing to select
    NoEntries,

    /// Requested index beyond the list and no visible entry to fall back to
    IndexOutOfRange { requested: usize, available: usize },

    /// Exclusion rules removed every candidate
    NoValidCandidate,

    /// The target refused the click even after scrolling it into view
    ClickRejected { index: usize, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionResult {
    Selected(Selection),
    Failed(SelectionFailure),
}

impl SelectionResult {
    /// Index of the chosen entry, or `-1` when the selection failed.
    pub fn chosen_index(&self) -> i64 {
        match self {
            SelectionResult::Selected(s) => s.index as i64,
            SelectionResult::Failed(_) => -1,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            SelectionResult::Selected(s) => Some(&s.label),
            SelectionResult::Failed(_) => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionResult::Selected(_))
    }
}
