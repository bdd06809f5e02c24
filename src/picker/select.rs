use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::driver::element::ElementPredicate;
use crate::driver::error::DriverError;
use crate::driver::query::{ClickOutcome, ElementQuery};
use crate::picker::model::{Entry, ExclusionSet, Selection, SelectionFailure, SelectionResult};

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);

/// Positions in `entries` eligible for sibling selection.
///
/// Position 0 is the parent/self row and is never eligible. Names are
/// compared against the trimmed label, so an item excluded in one list stays
/// excluded when another list places it at a different position.
pub fn candidate_indices(entries: &[Entry], exclusions: &ExclusionSet) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(position, entry)| !exclusions.excludes(*position, entry))
        .map(|(position, _)| position)
        .collect()
}

/// Turns a selection decision into a click on the right entry.
pub struct SelectionEngine {
    settle: Duration,
    rng: StdRng,
    last_selected: Option<String>,
}

impl SelectionEngine {
    pub fn new(settle: Duration) -> Self {
        SelectionEngine {
            settle,
            rng: StdRng::from_entropy(),
            last_selected: None,
        }
    }

    /// Engine with a fixed random sequence.
    pub fn with_seed(settle: Duration, seed: u64) -> Self {
        SelectionEngine {
            settle,
            rng: StdRng::seed_from_u64(seed),
            last_selected: None,
        }
    }

    /// Label of the last successful random selection made by this engine.
    pub fn last_selected_label(&self) -> Option<&str> {
        self.last_selected.as_deref()
    }

    /// Click the entry at `target`.
    ///
    /// An out-of-range target falls back to the first visible entry; the
    /// returned `fallback_from` records that the caller did not get what it
    /// asked for.
    pub fn select_by_index(
        &mut self,
        query: &mut dyn ElementQuery,
        entries: &[Entry],
        target: usize,
    ) -> Result<SelectionResult, DriverError> {
        if entries.is_empty() {
            return Ok(SelectionResult::Failed(SelectionFailure::NoEntries));
        }

        let (position, entry, fallback_from) = match entries.get(target) {
            Some(entry) => (target, entry, None),
            None => match entries
                .iter()
                .enumerate()
                .find(|(_, e)| e.anchor.element.visible)
            {
                Some((position, entry)) => {
                    warn!(
                        requested = target,
                        available = entries.len(),
                        fallback = %entry.label,
                        "index out of range, selecting first visible entry"
                    );
                    (position, entry, Some(target))
                }
                None => {
                    return Ok(SelectionResult::Failed(SelectionFailure::IndexOutOfRange {
                        requested: target,
                        available: entries.len(),
                    }));
                }
            },
        };

        if !click_with_scroll_retry(query, entry)? {
            return Ok(rejected(position, entry));
        }
        query.settle(self.settle);

        info!(index = position, label = %entry.label, "selected by index");
        Ok(SelectionResult::Selected(Selection {
            index: position,
            label: entry.label.clone(),
            fallback_from,
        }))
    }

    /// Click a uniformly random sibling entry that survives `exclusions`.
    pub fn select_random_sibling(
        &mut self,
        query: &mut dyn ElementQuery,
        entries: &[Entry],
        exclusions: &ExclusionSet,
    ) -> Result<SelectionResult, DriverError> {
        let candidates = candidate_indices(entries, exclusions);
        let Some(&chosen) = candidates.choose(&mut self.rng) else {
            debug!(entries = entries.len(), ?exclusions, "no valid candidate");
            return Ok(SelectionResult::Failed(SelectionFailure::NoValidCandidate));
        };

        let entry = &entries[chosen];
        if !click_with_scroll_retry(query, entry)? {
            return Ok(rejected(chosen, entry));
        }
        query.settle(self.settle);

        info!(
            index = chosen,
            label = %entry.label,
            candidates = candidates.len(),
            "selected random sibling"
        );
        self.last_selected = Some(entry.label.trim().to_string());

        Ok(SelectionResult::Selected(Selection {
            index: chosen,
            label: entry.label.clone(),
            fallback_from: None,
        }))
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

fn rejected(position: usize, entry: &Entry) -> SelectionResult {
    SelectionResult::Failed(SelectionFailure::ClickRejected {
        index: position,
        label: entry.label.clone(),
    })
}

/// Click the entry's anchor; on rejection scroll it into view by label and
/// try exactly once more.
fn click_with_scroll_retry(
    query: &mut dyn ElementQuery,
    entry: &Entry,
) -> Result<bool, DriverError> {
    if query.click(&entry.anchor.element)? == ClickOutcome::Clicked {
        return Ok(true);
    }

    warn!(label = %entry.label, "click rejected, scrolling into view");
    let predicate = ElementPredicate::static_text().with_text_exact(&entry.label);
    let target = query
        .scroll_into_view(&predicate)?
        .unwrap_or_else(|| entry.anchor.element.clone());

    Ok(query.click(&target)? == ClickOutcome::Clicked)
}
