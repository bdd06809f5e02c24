use tracing::debug;

use crate::driver::element::{ElementPredicate, ScreenElement};
use crate::driver::error::DriverError;
use crate::driver::query::ElementQuery;
use crate::picker::filter::{BlockList, CoordinateWindow};
use crate::picker::model::{Entry, RawNode};

/// Vertical gap separating two rows.
///
/// Lines within one row sit about 27 units apart and consecutive rows about
/// 37 units apart; 32 is the midpoint of the two populations.
pub const DEFAULT_CLUSTER_THRESHOLD: i32 = 32;

/// Groups a flat set of text nodes into an ordered list of entries.
#[derive(Debug, Clone)]
pub struct ListReconstructor {
    pub window: CoordinateWindow,
    pub block_list: BlockList,
    pub threshold: i32,
}

impl ListReconstructor {
    pub fn new(window: CoordinateWindow, block_list: BlockList) -> Self {
        ListReconstructor {
            window,
            block_list,
            threshold: DEFAULT_CLUSTER_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Query the current screen and rebuild the entry list.
    ///
    /// Hidden text is kept, so an open `y_max` admits rows below the fold.
    pub fn reconstruct(&self, query: &mut dyn ElementQuery) -> Result<Vec<Entry>, DriverError> {
        let elements = query.query(&ElementPredicate::static_text())?;
        let nodes = self.candidate_nodes(&elements);
        let entries = cluster_entries(nodes, self.threshold);

        debug!(
            elements = elements.len(),
            entries = entries.len(),
            labels = ?entries.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(),
            "reconstructed list"
        );

        Ok(entries)
    }

    /// Keep elements with text, inside the window, and not blocked.
    pub fn candidate_nodes(&self, elements: &[ScreenElement]) -> Vec<RawNode> {
        elements
            .iter()
            .filter(|el| self.window.contains(el))
            .filter_map(|el| RawNode::new(el.clone()))
            .filter(|node| !self.block_list.blocks(&node.text))
            .collect()
    }
}

/// Greedy single-pass vertical clustering.
///
/// Nodes are stable-sorted by `y`; a node more than `threshold` below its
/// predecessor starts a new entry, otherwise it continues the current one.
pub fn cluster_entries(mut nodes: Vec<RawNode>, threshold: i32) -> Vec<Entry> {
    nodes.sort_by_key(RawNode::y);

    let mut entries: Vec<Entry> = Vec::new();
    let mut previous_y: Option<i32> = None;

    for node in nodes {
        let y = node.y();
        let starts_entry = previous_y.is_none_or(|prev| y.saturating_sub(prev) > threshold);
        previous_y = Some(y);

        if starts_entry {
            entries.push(Entry {
                index: entries.len(),
                label: node.text.clone(),
                anchor: node,
                details: Vec::new(),
            });
        } else if let Some(current) = entries.last_mut() {
            current.details.push(node.text);
        }
    }

    entries
}
