use std::thread;
use std::time::Duration;

use crate::driver::element::{ElementPredicate, ScreenElement};
use crate::driver::error::DriverError;

/// Result of a click on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    /// The element exists but could not receive the tap (typically off-screen)
    NotInteractable,
}

/// Query and action capability of one accessibility-tree session.
///
/// One session, one caller: implementations are driven from a single thread
/// and take `&mut self` for every call.
pub trait ElementQuery {
    /// All elements matching `predicate`, in document order.
    fn query(&mut self, predicate: &ElementPredicate) -> Result<Vec<ScreenElement>, DriverError>;

    fn click(&mut self, element: &ScreenElement) -> Result<ClickOutcome, DriverError>;

    /// Scroll until an element matching `predicate` is on screen and return it
    /// with refreshed geometry. `None` when nothing matches.
    fn scroll_into_view(
        &mut self,
        predicate: &ElementPredicate,
    ) -> Result<Option<ScreenElement>, DriverError>;

    /// Fixed-duration wait for the UI to settle.
    fn settle(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
