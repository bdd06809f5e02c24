pub mod appium;
pub mod element;
pub mod error;
pub mod query;
pub mod replay;
