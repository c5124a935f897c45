//! Shared helpers for the seglog benchmarks.

pub mod utils;
