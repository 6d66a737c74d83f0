//! # Workflows Module
//!
//! Top-level entry points that run a complete procedure from a resolved configuration.
//!
//! - **Rescoring Workflow** ([`rescore`]) - Input preparation, MS²PIP prediction, feature
//!   generation, temporary file cleanup and Percolator rescoring per feature set.

pub mod rescore;
