use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::driver::element::ElementPredicate;
use crate::driver::error::DriverError;
use crate::driver::query::{ClickOutcome, ElementQuery};
use crate::picker::filter::TextRules;
use crate::picker::model::{ExclusionSet, SelectionResult};
use crate::picker::reconstruct::ListReconstructor;
use crate::picker::select::SelectionEngine;
use crate::picker::verify::{SectionBounds, SelectionVerifier, Verification};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TracePhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickMode {
    Index(usize),
    RandomSibling,
}

/// One field to fill through its dropdown.
#[derive(Debug, Clone)]
pub struct PickRequest {
    /// Title text of the field, used as the read-back anchor
    pub field_label: String,

    /// Text of the button that opens the dropdown; `None` if already open
    pub open_label: Option<String>,

    pub mode: PickMode,
    pub exclusions: ExclusionSet,
    pub section: SectionBounds,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickOutcome {
    pub field: String,
    pub entries: Vec<String>,
    pub selection: SelectionResult,
    pub verification: Option<Verification>,
}

impl PickOutcome {
    /// Verified name when available, otherwise the clicked label.
    pub fn selected_name(&self) -> Option<&str> {
        self.verification
            .as_ref()
            .and_then(Verification::name)
            .or_else(|| self.selection.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub source: PickOutcome,
    pub target: PickOutcome,
}

/// Open, reconstruct, select, verify.
pub struct PickerFlow {
    pub reconstructor: ListReconstructor,
    pub engine: SelectionEngine,
    pub rules: TextRules,
    pub verify_attempts: u32,
    pub verify_backoff: Duration,
    pub open_settle: Duration,
    step: u64,
}

impl PickerFlow {
    pub fn new(reconstructor: ListReconstructor, engine: SelectionEngine, rules: TextRules) -> Self {
        PickerFlow {
            reconstructor,
            engine,
            rules,
            verify_attempts: crate::picker::verify::DEFAULT_ATTEMPTS,
            verify_backoff: crate::picker::verify::DEFAULT_BACKOFF,
            open_settle: Duration::from_millis(1000),
            step: 0,
        }
    }

    fn trace(&mut self, phase: TracePhase, field: &str) -> TraceEvent {
        let event = TraceEvent::now(self.step, phase).with_field(field);
        self.step += 1;
        event
    }

    pub fn pick(
        &mut self,
        query: &mut dyn ElementQuery,
        request: &PickRequest,
        tracer: &TraceLogger,
    ) -> Result<PickOutcome, DriverError> {
        let field = request.field_label.as_str();

        if let Some(open_label) = &request.open_label {
            let opened = self.open_dropdown(query, open_label)?;
            tracer.log(&self.trace(TracePhase::Open, field).with_opened(opened));
            query.settle(self.open_settle);
        }

        let entries = self.reconstructor.reconstruct(query)?;
        tracer.log(&self.trace(TracePhase::Reconstruct, field).with_entries(&entries));

        let selection = match request.mode {
            PickMode::Index(index) => self.engine.select_by_index(query, &entries, index)?,
            PickMode::RandomSibling => {
                self.engine
                    .select_random_sibling(query, &entries, &request.exclusions)?
            }
        };
        tracer.log(&self.trace(TracePhase::Select, field).with_selection(&selection));

        let verification = if selection.is_selected() {
            let verifier =
                SelectionVerifier::for_field(field, request.section.clone(), &self.rules)
                    .with_attempts(self.verify_attempts)
                    .with_backoff(self.verify_backoff);
            let verification = verifier.verify(query)?;
            tracer.log(&self.trace(TracePhase::Verify, field).with_verification(&verification));
            Some(verification)
        } else {
            None
        };

        Ok(PickOutcome {
            field: field.to_string(),
            entries: entries.iter().map(|e| e.label.clone()).collect(),
            selection,
            verification,
        })
    }

    /// Pick a source, then a target that is not the same item.
    ///
    /// The source's clicked label and verified name are both added to the
    /// target's name exclusions, since the two lists may index the same item
    /// differently.
    pub fn pick_distinct_pair(
        &mut self,
        query: &mut dyn ElementQuery,
        source: &PickRequest,
        target: &PickRequest,
        tracer: &TraceLogger,
    ) -> Result<PairOutcome, DriverError> {
        let source_outcome = self.pick(query, source, tracer)?;

        let mut target = target.clone();
        for name in [
            source_outcome.selection.label(),
            source_outcome.verification.as_ref().and_then(Verification::name),
        ]
        .into_iter()
        .flatten()
        {
            target.exclusions = target.exclusions.exclude_name(name);
        }
        info!(excluded = ?target.exclusions.names, "picking target");

        let target_outcome = self.pick(query, &target, tracer)?;
        Ok(PairOutcome {
            source: source_outcome,
            target: target_outcome,
        })
    }

    fn open_dropdown(
        &mut self,
        query: &mut dyn ElementQuery,
        open_label: &str,
    ) -> Result<bool, DriverError> {
        let buttons = query.query(&ElementPredicate::buttons().with_text_exact(open_label))?;
        let Some(button) = buttons.first() else {
            warn!(label = open_label, "dropdown button not found");
            return Ok(false);
        };

        let outcome = query.click(button)?;
        if outcome == ClickOutcome::NotInteractable {
            warn!(label = open_label, "dropdown button rejected the tap");
        }
        Ok(outcome == ClickOutcome::Clicked)
    }
}
