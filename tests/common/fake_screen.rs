use std::time::Duration;

use picker_select::driver::{
    element::{ElementPredicate, ElementType, ScreenElement},
    error::DriverError,
    query::{ClickOutcome, ElementQuery},
};

pub fn text(label: &str, x: i32, y: i32) -> ScreenElement {
    element(ElementType::StaticText, label, x, y)
}

pub fn button(label: &str, x: i32, y: i32) -> ScreenElement {
    element(ElementType::Button, label, x, y)
}

pub fn hidden_text(label: &str, x: i32, y: i32) -> ScreenElement {
    ScreenElement {
        visible: false,
        ..text(label, x, y)
    }
}

fn element(element_type: ElementType, label: &str, x: i32, y: i32) -> ScreenElement {
    ScreenElement {
        id: None,
        element_type,
        text: Some(label.to_string()),
        x,
        y,
        width: 200,
        height: 20,
        visible: true,
        enabled: true,
    }
}

/// Scripted screen that records every call made against it.
#[derive(Debug, Default)]
pub struct FakeScreen {
    pub elements: Vec<ScreenElement>,
    pub queries: usize,
    pub click_attempts: usize,
    pub clicks: Vec<ScreenElement>,
    pub scrolls: Vec<ElementPredicate>,
    pub settles: Vec<Duration>,

    /// Reject this many upcoming clicks
    pub reject_next: usize,
    pub reject_all: bool,
}

impl FakeScreen {
    pub fn new(elements: Vec<ScreenElement>) -> Self {
        FakeScreen {
            elements,
            ..Self::default()
        }
    }

    pub fn clicked_labels(&self) -> Vec<&str> {
        self.clicks.iter().filter_map(|c| c.text()).collect()
    }
}

impl ElementQuery for FakeScreen {
    fn query(&mut self, predicate: &ElementPredicate) -> Result<Vec<ScreenElement>, DriverError> {
        self.queries += 1;
        Ok(self
            .elements
            .iter()
            .filter(|el| predicate.matches(el))
            .cloned()
            .collect())
    }

    fn click(&mut self, element: &ScreenElement) -> Result<ClickOutcome, DriverError> {
        self.click_attempts += 1;
        if self.reject_all {
            return Ok(ClickOutcome::NotInteractable);
        }
        if self.reject_next > 0 {
            self.reject_next -= 1;
            return Ok(ClickOutcome::NotInteractable);
        }
        self.clicks.push(element.clone());
        Ok(ClickOutcome::Clicked)
    }

    fn scroll_into_view(
        &mut self,
        predicate: &ElementPredicate,
    ) -> Result<Option<ScreenElement>, DriverError> {
        self.scrolls.push(predicate.clone());
        Ok(self.elements.iter().find(|el| predicate.matches(el)).cloned())
    }

    fn settle(&mut self, duration: Duration) {
        self.settles.push(duration);
    }
}
