use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::driver::element::ElementPredicate;
use crate::driver::error::DriverError;
use crate::driver::query::ElementQuery;
use crate::picker::filter::TextRules;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Vertical offsets below the field label in which the value button sits.
pub const DEFAULT_ANCHOR_WINDOW: (i32, i32) = (0, 80);

/// One way of reading back the selected value from the screen.
pub trait ReadBackStrategy {
    fn name(&self) -> &'static str;

    /// The selected name, or `None` when this strategy finds nothing.
    fn read(&self, query: &mut dyn ElementQuery) -> Result<Option<String>, DriverError>;
}

// ============================================================================
// Anchor-relative scan
// ============================================================================

/// Finds the field's title text, then the first meaningful button just
/// below it.
#[derive(Debug, Clone)]
pub struct AnchorRelativeScan {
    pub field_label: String,
    pub min_offset: i32,
    pub max_offset: i32,
    pub rules: TextRules,
}

impl AnchorRelativeScan {
    pub fn new(field_label: &str, rules: TextRules) -> Self {
        AnchorRelativeScan {
            field_label: field_label.to_string(),
            min_offset: DEFAULT_ANCHOR_WINDOW.0,
            max_offset: DEFAULT_ANCHOR_WINDOW.1,
            rules,
        }
    }

    pub fn with_window(mut self, min_offset: i32, max_offset: i32) -> Self {
        self.min_offset = min_offset;
        self.max_offset = max_offset;
        self
    }

    fn is_value_text(&self, text: &str) -> bool {
        text.chars().count() > 1
            && !self.rules.is_placeholder(text)
            && !self.rules.is_action_label(text)
            && !text.eq_ignore_ascii_case(&self.field_label)
    }
}

impl ReadBackStrategy for AnchorRelativeScan {
    fn name(&self) -> &'static str {
        "anchor_relative"
    }

    fn read(&self, query: &mut dyn ElementQuery) -> Result<Option<String>, DriverError> {
        let anchors =
            query.query(&ElementPredicate::static_text().with_text_exact(&self.field_label))?;
        let Some(anchor) = anchors.first() else {
            debug!(field = %self.field_label, "field label not on screen");
            return Ok(None);
        };
        let anchor_y = anchor.y;

        let buttons = query.query(&ElementPredicate::buttons())?;
        let value = buttons
            .iter()
            .filter(|b| {
                let offset = b.y - anchor_y;
                offset >= self.min_offset && offset <= self.max_offset
            })
            .filter_map(|b| b.trimmed_text())
            .find(|text| self.is_value_text(text));

        Ok(value
            .map(|text| self.rules.display_name(text).to_string())
            .filter(|name| !name.is_empty()))
    }
}

// ============================================================================
// Section scan
// ============================================================================

/// Labels delimiting the screen region that shows the selected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub enter: String,
    pub exit: String,
}

impl SectionBounds {
    pub fn new(enter: &str, exit: &str) -> Self {
        SectionBounds {
            enter: enter.to_string(),
            exit: exit.to_string(),
        }
    }
}

/// Walks static text in document order and returns the first value-like
/// text between the enter and exit labels.
#[derive(Debug, Clone)]
pub struct SectionScan {
    pub bounds: SectionBounds,
    /// Other known labels inside the section that are never values
    pub labels: Vec<String>,
    pub rules: TextRules,
}

impl SectionScan {
    pub fn new(bounds: SectionBounds, rules: TextRules) -> Self {
        SectionScan {
            bounds,
            labels: Vec::new(),
            rules,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    fn is_label(&self, text: &str) -> bool {
        text.eq_ignore_ascii_case(&self.bounds.enter)
            || text.eq_ignore_ascii_case(&self.bounds.exit)
            || self.labels.iter().any(|l| text.eq_ignore_ascii_case(l))
    }
}

impl ReadBackStrategy for SectionScan {
    fn name(&self) -> &'static str {
        "section_scan"
    }

    fn read(&self, query: &mut dyn ElementQuery) -> Result<Option<String>, DriverError> {
        let texts = query.query(&ElementPredicate::static_text())?;

        let mut inside = false;
        for text in texts.iter().filter_map(|el| el.trimmed_text()) {
            if !inside {
                inside = text.eq_ignore_ascii_case(&self.bounds.enter);
                continue;
            }
            if text.eq_ignore_ascii_case(&self.bounds.exit) {
                break;
            }
            if self.is_label(text) || self.rules.is_placeholder(text) || self.rules.has_path(text)
            {
                continue;
            }
            return Ok(Some(text.to_string()));
        }

        Ok(None)
    }
}

// ============================================================================
// Verifier
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Verified {
        name: String,
        strategy: String,
        attempt: u32,
    },
    /// Nothing parseable after every attempt. This is "inconclusive", not
    /// "nothing selected".
    Unconfirmed { attempts: u32 },
}

impl Verification {
    pub fn name(&self) -> Option<&str> {
        match self {
            Verification::Verified { name, .. } => Some(name),
            Verification::Unconfirmed { .. } => None,
        }
    }
}

/// Reads back what ended up selected once a dropdown has closed.
///
/// Each attempt runs the strategies in order and the first hit wins. A miss
/// settles for `backoff` before the next attempt, giving the close animation
/// time to finish.
pub struct SelectionVerifier {
    attempts: u32,
    backoff: Duration,
    strategies: Vec<Box<dyn ReadBackStrategy>>,
}

impl SelectionVerifier {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        SelectionVerifier {
            attempts,
            backoff,
            strategies: Vec::new(),
        }
    }

    /// Anchor-relative scan first, section scan as the fallback.
    pub fn for_field(field_label: &str, section: SectionBounds, rules: &TextRules) -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BACKOFF)
            .with_strategy(Box::new(AnchorRelativeScan::new(field_label, rules.clone())))
            .with_strategy(Box::new(
                SectionScan::new(section, rules.clone()).with_label(field_label),
            ))
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ReadBackStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn verify(&self, query: &mut dyn ElementQuery) -> Result<Verification, DriverError> {
        for attempt in 1..=self.attempts {
            for strategy in &self.strategies {
                if let Some(name) = strategy.read(query)? {
                    info!(attempt, strategy = strategy.name(), %name, "selection verified");
                    return Ok(Verification::Verified {
                        name,
                        strategy: strategy.name().to_string(),
                        attempt,
                    });
                }
            }

            debug!(attempt, "read-back found nothing");
            if attempt < self.attempts {
                query.settle(self.backoff);
            }
        }

        warn!(attempts = self.attempts, "selection could not be confirmed");
        Ok(Verification::Unconfirmed {
            attempts: self.attempts,
        })
    }
}
