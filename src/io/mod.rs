//! CSV input tables and output chronics.

pub mod export;
pub mod import;
