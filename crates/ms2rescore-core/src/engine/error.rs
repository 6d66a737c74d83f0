use super::command::{ExternalCommand, TemplateError, Tool};
use super::config::ConfigError;
use crate::core::peprec::PeprecError;
use crate::core::pipeline::Pipeline;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RescoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Peprec(#[from] PeprecError),

    #[error("Could not call {tool}. {hint}")]
    ToolUnavailable { tool: Tool, hint: &'static str },

    #[error(
        "No converter for the '{0}' pipeline. Configure `commands.convert` or provide a PEPREC file."
    )]
    ConversionUnavailable(Pipeline),

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: ExternalCommand,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {status}: {stderr}")]
    CommandFailed {
        command: ExternalCommand,
        status: String,
        stderr: String,
    },

    #[error("Input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Expected `{step}` to produce '{}', but it does not exist", path.display())]
    MissingOutput { step: &'static str, path: PathBuf },

    #[error("Invalid `commands.{name}` template: {source}")]
    Template {
        name: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("I/O error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
