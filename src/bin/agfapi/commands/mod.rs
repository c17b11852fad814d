//! Command implementations

pub mod cache;
pub mod completions;
pub mod install;
pub mod passthrough;
pub mod path;
pub mod worklist;
