use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::driver::element::{ElementPredicate, ScreenElement};
use crate::driver::error::DriverError;
use crate::driver::query::{ClickOutcome, ElementQuery};

/// Snapshot file layout: either a bare array of elements or an object
/// with an `elements` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Bare(Vec<ScreenElement>),
    Wrapped { elements: Vec<ScreenElement> },
}

/// An accessibility tree frozen in memory.
///
/// Used for offline runs against a captured snapshot. Elements marked not
/// visible reject clicks until they are scrolled into view. Settles are
/// accumulated instead of slept.
#[derive(Debug, Clone, Default)]
pub struct ReplayScreen {
    elements: Vec<ScreenElement>,
    clicks: Vec<ScreenElement>,
    scrolls: usize,
    settled: Duration,
}

impl ReplayScreen {
    pub fn new(elements: Vec<ScreenElement>) -> Self {
        ReplayScreen {
            elements,
            ..Self::default()
        }
    }

    /// Parse a snapshot from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, DriverError> {
        let file: SnapshotFile =
            serde_json::from_str(json).map_err(|e| DriverError::JsonParse {
                context: "screen snapshot".into(),
                source: e,
            })?;

        let elements = match file {
            SnapshotFile::Bare(elements) => elements,
            SnapshotFile::Wrapped { elements } => elements,
        };

        Ok(Self::new(elements))
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &str) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path).map_err(|e| DriverError::SnapshotIo {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    pub fn elements(&self) -> &[ScreenElement] {
        &self.elements
    }

    /// Elements clicked so far, in order.
    pub fn clicks(&self) -> &[ScreenElement] {
        &self.clicks
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Total time callers asked the screen to settle.
    pub fn settled(&self) -> Duration {
        self.settled
    }
}

impl ElementQuery for ReplayScreen {
    fn query(&mut self, predicate: &ElementPredicate) -> Result<Vec<ScreenElement>, DriverError> {
        Ok(self
            .elements
            .iter()
            .filter(|el| predicate.matches(el))
            .cloned()
            .collect())
    }

    fn click(&mut self, element: &ScreenElement) -> Result<ClickOutcome, DriverError> {
        let current = self
            .elements
            .iter()
            .find(|el| el.text == element.text && el.x == element.x && el.y == element.y);

        match current {
            Some(el) if el.visible && el.enabled => {
                self.clicks.push(el.clone());
                Ok(ClickOutcome::Clicked)
            }
            _ => Ok(ClickOutcome::NotInteractable),
        }
    }

    fn scroll_into_view(
        &mut self,
        predicate: &ElementPredicate,
    ) -> Result<Option<ScreenElement>, DriverError> {
        self.scrolls += 1;
        // Match regardless of visibility.
        let mut loose = predicate.clone();
        loose.visible_only = false;
        let target = self.elements.iter_mut().find(|el| loose.matches(el));

        Ok(target.map(|el| {
            debug!(text = ?el.text, "replay: revealing element");
            el.visible = true;
            el.clone()
        }))
    }

    fn settle(&mut self, duration: Duration) {
        self.settled += duration;
    }
}
