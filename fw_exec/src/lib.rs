//! # Fixed-wing library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to
//! access items defined inside the fixed-wing executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Horizontal control - converts course and attitude demands into aileron and elevator commands
pub mod h_ctl;

/// Replay source - reads recorded estimator, vertical control and navigation inputs from CSV
pub mod replay;
