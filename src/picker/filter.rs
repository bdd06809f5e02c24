use serde::{Deserialize, Serialize};

use crate::driver::element::ScreenElement;

/// Rectangular region in which list rows are expected. Bounds are inclusive.
///
/// `y_max` is optional: leaving it open admits rows below the visible fold
/// when the list content has been scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateWindow {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    #[serde(default)]
    pub y_max: Option<i32>,
}

impl CoordinateWindow {
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: Option<i32>) -> Self {
        CoordinateWindow {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// A window that admits every element.
    pub fn unbounded() -> Self {
        Self::new(i32::MIN, i32::MAX, i32::MIN, None)
    }

    pub fn contains(&self, element: &ScreenElement) -> bool {
        let (x, y) = element.position();
        x >= self.x_min
            && x <= self.x_max
            && y >= self.y_min
            && self.y_max.is_none_or(|max| y <= max)
    }
}

impl Default for CoordinateWindow {
    fn default() -> Self {
        Self::unbounded()
    }
}

pub const DEFAULT_PATH_DELIMITER: &str = " > ";

fn default_path_delimiter() -> String {
    DEFAULT_PATH_DELIMITER.to_string()
}

/// Labels that are never list rows: headers, field placeholders, action
/// buttons. Breadcrumb strings containing the path delimiter are rejected too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockList {
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default = "default_path_delimiter")]
    pub path_delimiter: String,
}

impl BlockList {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BlockList {
            labels: labels.into_iter().map(Into::into).collect(),
            path_delimiter: default_path_delimiter(),
        }
    }

    pub fn with_path_delimiter(mut self, delimiter: &str) -> Self {
        self.path_delimiter = delimiter.to_string();
        self
    }

    /// True when `text` equals, or is a case-insensitive prefix of, a blocked
    /// label, or carries the path delimiter.
    pub fn blocks(&self, text: &str) -> bool {
        let text = text.trim();
        if !self.path_delimiter.is_empty() && text.contains(self.path_delimiter.as_str()) {
            return true;
        }

        let lower = text.to_lowercase();
        self.labels
            .iter()
            .any(|label| label.trim().to_lowercase().starts_with(&lower))
    }
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

fn default_placeholders() -> Vec<String> {
    vec!["Select".to_string()]
}

fn default_action_labels() -> Vec<String> {
    ["Cancel", "Done", "Clear", "Search", "Back"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_field_delimiter() -> char {
    ','
}

/// Text rules for telling a selected value apart from field chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRules {
    /// Placeholder prefixes shown while nothing is selected ("Select…")
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,

    /// Labels of action buttons that sit next to the field
    #[serde(default = "default_action_labels")]
    pub action_labels: Vec<String>,

    #[serde(default = "default_path_delimiter")]
    pub path_delimiter: String,

    /// Separates the display name from extra detail in field text
    #[serde(default = "default_field_delimiter")]
    pub field_delimiter: char,
}

impl Default for TextRules {
    fn default() -> Self {
        Self {
            placeholders: default_placeholders(),
            action_labels: default_action_labels(),
            path_delimiter: default_path_delimiter(),
            field_delimiter: default_field_delimiter(),
        }
    }
}

impl TextRules {
    /// True when `text` is a placeholder word, alone or followed by more
    /// words ("Select", "Select source", "Select…"). "Selector" is not.
    pub fn is_placeholder(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        self.placeholders.iter().any(|p| {
            let p = p.trim().to_lowercase();
            !p.is_empty()
                && lower
                    .strip_prefix(p.as_str())
                    .is_some_and(|rest| !rest.starts_with(char::is_alphanumeric))
        })
    }

    pub fn is_action_label(&self, text: &str) -> bool {
        let text = text.trim();
        self.action_labels
            .iter()
            .any(|a| a.eq_ignore_ascii_case(text))
    }

    pub fn has_path(&self, text: &str) -> bool {
        !self.path_delimiter.is_empty() && text.contains(self.path_delimiter.as_str())
    }

    /// Display name portion of formatted field text.
    pub fn display_name<'a>(&self, text: &'a str) -> &'a str {
        text.split(self.field_delimiter)
            .next()
            .unwrap_or(text)
            .trim()
    }
}
