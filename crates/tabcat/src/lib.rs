//! CLI shell around the categorization pipeline.
//!
//! The core is UI-agnostic; this crate supplies the file I/O and terminal
//! surface: read a CSV, run the suggestion or assignment pipeline, write
//! the categorized file back out.

pub mod commands;
