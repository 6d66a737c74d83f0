//! # Engine Module
//!
//! Configuration resolution and external tool plumbing for MS²Rescore.
//!
//! - **Cascade** ([`cascade`]) - Merges built-in defaults, configuration files, maps and
//!   command-line arguments into one configuration value
//! - **Configuration** ([`config`]) - The typed configuration and its resolved form
//! - **Commands** ([`command`]) - External command construction, templating and execution
//! - **Progress Monitoring** ([`progress`]) - Progress reporting for long-running steps
//! - **Error Handling** ([`error`]) - Engine and workflow error types

pub mod cascade;
pub mod command;
pub mod config;
pub mod error;
pub mod progress;
pub(crate) mod validation;
