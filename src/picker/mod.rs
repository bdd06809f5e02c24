pub mod filter;
pub mod flow;
pub mod model;
pub mod reconstruct;
pub mod select;
pub mod verify;
