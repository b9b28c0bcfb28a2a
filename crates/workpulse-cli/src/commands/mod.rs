pub mod completions;
pub mod config;
pub mod report;
pub mod sweep;
