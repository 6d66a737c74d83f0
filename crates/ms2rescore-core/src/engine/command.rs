use super::config::{PercolatorOptions, RescoreConfig};
use super::error::RescoreError;
use crate::core::files::FeatureSetFiles;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// A program invocation with its arguments. Arguments are passed as-is, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The argument directly following `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn status_description(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "no exit code (terminated by signal)".to_string(),
        }
    }
}

/// Executes external programs. Implemented for the real system by [`SystemRunner`].
pub trait CommandRunner {
    fn run(&self, command: &ExternalCommand) -> std::io::Result<CommandOutput>;

    /// Whether `program probe_arg` can be started and exits successfully.
    fn is_available(&self, program: &str, probe_arg: &str) -> bool {
        match self.run(&ExternalCommand::new(program).arg(probe_arg)) {
            Ok(output) => output.success,
            Err(e) => {
                debug!("Probing `{} {}` failed: {}", program, probe_arg, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ExternalCommand) -> std::io::Result<CommandOutput> {
        debug!("Spawning `{}`", command);
        let output = Command::new(command.program())
            .args(command.arguments())
            .output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// External executables the workflow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ms2pip,
    Percolator,
}

impl Tool {
    pub fn program(&self) -> &'static str {
        match self {
            Tool::Ms2pip => "ms2pip",
            Tool::Percolator => "percolator",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Tool::Ms2pip => "Check that MS²PIP is set up correctly and on the PATH.",
            Tool::Percolator => {
                "Install Percolator or remove `percolator` from `rescoring_engine`."
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Ms2pip => f.write_str("MS²PIP"),
            Tool::Percolator => f.write_str("Percolator"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    pub tool: Tool,
    pub required: bool,
    pub available: bool,
}

const PROBE_ARG: &str = "-h";

/// Probes every known tool. MS²PIP is always required, Percolator only when rescoring.
pub fn probe_tools(runner: &dyn CommandRunner, percolator_required: bool) -> Vec<ToolStatus> {
    [(Tool::Ms2pip, true), (Tool::Percolator, percolator_required)]
        .into_iter()
        .map(|(tool, required)| ToolStatus {
            tool,
            required,
            available: runner.is_available(tool.program(), PROBE_ARG),
        })
        .collect()
}

/// Fails on the first required tool that cannot be called.
pub fn check_tools(
    config: &RescoreConfig,
    runner: &dyn CommandRunner,
) -> Result<(), RescoreError> {
    let percolator_required = config.percolator.is_some();
    for status in probe_tools(runner, percolator_required) {
        match (status.required, status.available) {
            (true, false) => {
                return Err(RescoreError::ToolUnavailable {
                    tool: status.tool,
                    hint: status.tool.hint(),
                });
            }
            (false, false) => debug!("{} is not available (not required).", status.tool),
            _ => debug!("{} is available.", status.tool),
        }
    }
    Ok(())
}

pub fn ms2pip_command(
    peprec: &Path,
    config: &Path,
    mgf: &Path,
    processes: usize,
) -> ExternalCommand {
    ExternalCommand::new(Tool::Ms2pip.program())
        .path_arg(peprec)
        .arg("-c")
        .path_arg(config)
        .arg("-s")
        .path_arg(mgf)
        .arg("-m")
        .arg(processes.to_string())
}

pub fn percolator_command(options: &PercolatorOptions, files: &FeatureSetFiles) -> ExternalCommand {
    let mut command = ExternalCommand::new(Tool::Percolator.program());
    for (key, value) in &options.options {
        let flag = if key.starts_with('-') {
            key.clone()
        } else {
            format!("--{key}")
        };
        command = command.arg(flag).arg(value.as_str());
    }
    command
        .path_arg(&files.pin)
        .arg("-m")
        .path_arg(&files.pout)
        .arg("-M")
        .path_arg(&files.pout_dec)
        .arg("-w")
        .path_arg(&files.weights)
        .args(["-v", "0", "-U", "--post-processing-tdc"])
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TemplateError {
    #[error("template has no program")]
    Empty,

    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("unbalanced braces in '{0}'")]
    Malformed(String),
}

/// A user-supplied command line with `{placeholder}` arguments. `{{` and `}}` produce
/// literal braces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate(Vec<String>);

impl CommandTemplate {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn render(
        &self,
        values: &BTreeMap<&str, String>,
    ) -> Result<ExternalCommand, TemplateError> {
        let mut rendered = self
            .0
            .iter()
            .map(|part| expand(part, values))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();

        let program = rendered
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or(TemplateError::Empty)?;
        Ok(ExternalCommand::new(program).args(rendered))
    }
}

fn expand(part: &str, values: &BTreeMap<&str, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(TemplateError::Malformed(part.to_string()));
                        }
                        Some(c) => name.push(c),
                    }
                }
                let value = values
                    .get(name.as_str())
                    .ok_or(TemplateError::UnknownPlaceholder(name))?;
                out.push_str(value);
            }
            '}' => return Err(TemplateError::Malformed(part.to_string())),
            c => out.push(c),
        }
    }

    if out.is_empty() && !part.is_empty() {
        warn!("Template argument '{}' expanded to an empty string.", part);
    }
    Ok(out)
}
