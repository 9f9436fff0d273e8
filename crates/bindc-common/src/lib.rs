//! Common types and utilities for the bindc lowering core.
//!
//! This crate provides the pieces every other bindc crate agrees on:
//! - Compiler limits and thresholds (`limits`)
//! - The synthetic-name registry used for generated members (`names`)
//! - The catalog of runtime-library classes and methods the emitted code calls (`runtime`)
//! - Lowering options (`options`)

// Centralized limits and thresholds
pub mod limits;

// Generated identifier conventions
pub mod names;

// Runtime library catalog
pub mod runtime;
pub use runtime::{RuntimeClass, RuntimeMethod};

// Lowering options
pub mod options;
pub use options::LowerOptions;

#[cfg(test)]
#[path = "tests/names_tests.rs"]
mod names_tests;
