//! Pipeline orchestration for bookpipe.
//!
//! This crate lays out a book's work directories and runs the external stage
//! programs in order (e.g., [`pipeline::run_pipeline`]).

pub mod layout;
pub mod pipeline;
pub mod runner;
