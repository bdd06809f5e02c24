use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::picker::{
    model::{Entry, SelectionFailure, SelectionResult},
    verify::Verification,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePhase {
    Open,
    Reconstruct,
    Select,
    Verify,
}

/// One line of the JSONL decision trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub phase: String,
    pub field: Option<String>,

    pub opened: Option<bool>,
    pub entries: Vec<String>,

    pub chosen_index: Option<i64>,
    pub label: Option<String>,
    pub fallback_from: Option<usize>,
    pub failure: Option<String>,

    pub verified_name: Option<String>,
    pub attempts: Option<u32>,
}

impl TraceEvent {
    pub fn now(step: u64, phase: TracePhase) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            step,
            phase: format!("{:?}", phase),
            field: None,
            opened: None,
            entries: vec![],
            chosen_index: None,
            label: None,
            fallback_from: None,
            failure: None,
            verified_name: None,
            attempts: None,
        }
    }

    pub fn with_field(mut self, field: impl ToString) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_opened(mut self, opened: bool) -> Self {
        self.opened = Some(opened);
        self
    }

    pub fn with_entries(mut self, entries: &[Entry]) -> Self {
        self.entries = entries.iter().map(|e| e.label.clone()).collect();
        self
    }

    pub fn with_selection(mut self, result: &SelectionResult) -> Self {
        self.chosen_index = Some(result.chosen_index());
        match result {
            SelectionResult::Selected(selection) => {
                self.label = Some(selection.label.clone());
                self.fallback_from = selection.fallback_from;
            }
            SelectionResult::Failed(failure) => {
                self.failure = Some(failure_kind(failure).to_string());
            }
        }
        self
    }

    pub fn with_verification(mut self, verification: &Verification) -> Self {
        match verification {
            Verification::Verified { name, attempt, .. } => {
                self.verified_name = Some(name.clone());
                self.attempts = Some(*attempt);
            }
            Verification::Unconfirmed { attempts } => {
                self.failure = Some("verification_inconclusive".to_string());
                self.attempts = Some(*attempts);
            }
        }
        self
    }
}

fn failure_kind(failure: &SelectionFailure) -> &'static str {
    match failure {
        SelectionFailure::NoEntries => "structural_empty",
        SelectionFailure::IndexOutOfRange { .. } => "index_out_of_range",
        SelectionFailure::NoValidCandidate => "no_valid_candidate",
        SelectionFailure::ClickRejected { .. } => "click_rejected",
    }
}
