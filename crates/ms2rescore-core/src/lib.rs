//! # MS²Rescore Core Library
//!
//! Configuration handling and orchestration for rescoring peptide-spectrum matches (PSMs)
//! with predicted MS² peak intensities.
//!
//! The heavy lifting (intensity prediction, feature calculation, semi-supervised
//! rescoring) is done by external tools. This library takes care of everything around
//! them: building a validated configuration, preparing inputs, invoking the tools in the
//! right order and keeping track of the files they produce.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless domain types: search-engine pipelines,
//!   PEPREC header checks, modifications, output file naming and the MS²PIP
//!   configuration writer.
//!
//! - **[`engine`]: Configuration and Plumbing.** The layered configuration cascade, the
//!   fully resolved [`engine::config::RescoreConfig`], external command execution,
//!   progress reporting and the error model.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie `engine` and `core`
//!   together, such as the complete rescoring run.

pub mod core;
pub mod engine;
pub mod workflows;
