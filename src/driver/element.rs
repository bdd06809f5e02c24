use serde::{Deserialize, Serialize};

/// A node of the accessibility tree as reported by the automation driver.
///
/// Elements are ephemeral: they are re-fetched on every query and never
/// cached across UI transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenElement {
    /// Driver-side handle, absent for elements loaded from a snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default)]
    pub element_type: ElementType,

    #[serde(default)]
    pub text: Option<String>,

    pub x: i32,
    pub y: i32,

    #[serde(default)]
    pub width: i32,

    #[serde(default)]
    pub height: i32,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ScreenElement {
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text with surrounding whitespace removed; `None` when empty.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    StaticText,
    Button,
    TextField,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Exact(String),
    Contains(String),
}

impl TextMatch {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatch::Exact(expected) => text.trim() == expected,
            TextMatch::Contains(needle) => text.contains(needle.as_str()),
        }
    }
}

/// Type, text and visibility constraints for an accessibility-tree query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementPredicate {
    pub element_type: Option<ElementType>,
    pub text: Option<TextMatch>,
    pub visible_only: bool,
}

impl ElementPredicate {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn static_text() -> Self {
        Self::of_type(ElementType::StaticText)
    }

    pub fn buttons() -> Self {
        Self::of_type(ElementType::Button)
    }

    pub fn of_type(element_type: ElementType) -> Self {
        ElementPredicate {
            element_type: Some(element_type),
            ..Self::default()
        }
    }

    pub fn with_text_exact(mut self, text: &str) -> Self {
        self.text = Some(TextMatch::Exact(text.to_string()));
        self
    }

    pub fn with_text_containing(mut self, text: &str) -> Self {
        self.text = Some(TextMatch::Contains(text.to_string()));
        self
    }

    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    /// Evaluate the predicate locally against an already fetched element.
    pub fn matches(&self, element: &ScreenElement) -> bool {
        if let Some(element_type) = self.element_type {
            if element.element_type != element_type {
                return false;
            }
        }

        if self.visible_only && !element.visible {
            return false;
        }

        match &self.text {
            Some(text_match) => element.text().is_some_and(|t| text_match.matches(t)),
            None => true,
        }
    }
}
