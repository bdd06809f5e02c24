//! Dropdown entry reconstruction, selection and read-back verification over
//! a mobile accessibility tree.
//!
//! The flow is one-way: an [`driver::query::ElementQuery`] session feeds
//! [`picker::reconstruct::ListReconstructor`], whose entries are clicked by
//! [`picker::select::SelectionEngine`] and confirmed by
//! [`picker::verify::SelectionVerifier`].

pub mod cli;
pub mod driver;
pub mod picker;
pub mod trace;
