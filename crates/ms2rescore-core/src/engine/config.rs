use super::command::CommandTemplate;
use super::validation;
use crate::core::feature_set::FeatureSet;
use crate::core::io::ms2pip_config::Ms2pipParameters;
use crate::core::modification::Modification;
use crate::core::pipeline::{Pipeline, PipelineError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error(
        "Unknown file extension for configuration file '{}'. Should be `json` or `toml`.",
        .0.display()
    )]
    UnknownFileExtension(PathBuf),

    #[error("Invalid configuration layer: {0}")]
    InvalidLayer(String),

    #[error("Could not read configuration file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse JSON configuration '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not parse TOML configuration '{}': {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration does not match the expected schema: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not create output directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Argument templates for the steps performed by user-supplied programs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandTemplates {
    #[serde(default)]
    pub convert: Option<CommandTemplate>,
    #[serde(default)]
    pub features: Option<CommandTemplate>,
}

/// The `ms2rescore` section as written by users, after cascading but before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ms2RescoreSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psm_file: Option<PathBuf>,
    pub psm_file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectrum_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub log_level: String,
    pub processes: i64,
    pub feature_sets: Vec<String>,
    pub keep_tmp_files: bool,
    pub show_progress_bar: bool,
    #[serde(default)]
    pub modifications: Vec<Modification>,
    pub feature_generators: BTreeMap<String, Value>,
    pub rescoring_engine: BTreeMap<String, Value>,
    #[serde(default)]
    pub commands: CommandTemplates,
}

/// The complete, cascaded configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    pub ms2rescore: Ms2RescoreSection,
}

/// Command-line options for Percolator, rendered as `--key value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PercolatorOptions {
    pub options: BTreeMap<String, String>,
}

/// A fully resolved configuration: paths checked, names normalized, counts clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct RescoreConfig {
    pub psm_file: PathBuf,
    pub pipeline: Pipeline,
    pub spectrum_path: Option<PathBuf>,
    pub output_path: PathBuf,
    pub log_level: String,
    pub processes: usize,
    pub feature_sets: Vec<FeatureSet>,
    pub keep_tmp_files: bool,
    pub show_progress_bar: bool,
    pub modifications: Vec<Modification>,
    pub ms2pip: Ms2pipParameters,
    pub percolator: Option<PercolatorOptions>,
    pub feature_generators: BTreeMap<String, Value>,
    pub rescoring_engine: BTreeMap<String, Value>,
    pub commands: CommandTemplates,
}

impl RescoreConfig {
    /// Validates a cascaded configuration, creating the output directory if needed.
    pub fn from_configuration(configuration: Configuration) -> Result<Self, ConfigError> {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::from_configuration_with_cpus(configuration, available)
    }

    pub fn from_configuration_with_cpus(
        configuration: Configuration,
        available_cpus: usize,
    ) -> Result<Self, ConfigError> {
        let section = configuration.ms2rescore;

        let filenames = validation::validate_filenames(
            section.psm_file.as_deref(),
            section.spectrum_path.as_deref(),
            section.output_path.as_deref(),
        )?;
        let processes = validation::validate_processes(section.processes, available_cpus)?;
        let feature_generators = validation::lowercase_keys(section.feature_generators);
        let rescoring_engine = validation::lowercase_keys(section.rescoring_engine);
        let pipeline = Pipeline::resolve(&section.psm_file_type, &filenames.psm_file)?;
        let feature_sets = validation::validate_feature_sets(&section.feature_sets)?;
        let ms2pip = validation::ms2pip_parameters(&feature_generators)?;
        let percolator = validation::percolator_options(&rescoring_engine)?;
        validation::validate_modifications(&section.modifications)?;

        RescoreConfigBuilder::new()
            .psm_file(filenames.psm_file)
            .pipeline(pipeline)
            .spectrum_path(filenames.spectrum_path)
            .output_path(filenames.output_path)
            .log_level(section.log_level)
            .processes(processes)
            .feature_sets(feature_sets)
            .keep_tmp_files(section.keep_tmp_files)
            .show_progress_bar(section.show_progress_bar)
            .modifications(section.modifications)
            .ms2pip(ms2pip)
            .percolator(percolator)
            .feature_generators(feature_generators)
            .rescoring_engine(rescoring_engine)
            .commands(section.commands)
            .build()
    }
}

#[derive(Default)]
pub struct RescoreConfigBuilder {
    psm_file: Option<PathBuf>,
    pipeline: Option<Pipeline>,
    spectrum_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    log_level: Option<String>,
    processes: Option<usize>,
    feature_sets: Option<Vec<FeatureSet>>,
    keep_tmp_files: bool,
    show_progress_bar: bool,
    modifications: Vec<Modification>,
    ms2pip: Option<Ms2pipParameters>,
    percolator: Option<PercolatorOptions>,
    feature_generators: BTreeMap<String, Value>,
    rescoring_engine: BTreeMap<String, Value>,
    commands: CommandTemplates,
}

impl RescoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn psm_file(mut self, path: PathBuf) -> Self {
        self.psm_file = Some(path);
        self
    }
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }
    pub fn spectrum_path(mut self, path: Option<PathBuf>) -> Self {
        self.spectrum_path = path;
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn log_level(mut self, level: String) -> Self {
        self.log_level = Some(level);
        self
    }
    pub fn processes(mut self, n: usize) -> Self {
        self.processes = Some(n);
        self
    }
    pub fn feature_sets(mut self, sets: Vec<FeatureSet>) -> Self {
        self.feature_sets = Some(sets);
        self
    }
    pub fn keep_tmp_files(mut self, keep: bool) -> Self {
        self.keep_tmp_files = keep;
        self
    }
    pub fn show_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }
    pub fn modifications(mut self, modifications: Vec<Modification>) -> Self {
        self.modifications = modifications;
        self
    }
    pub fn ms2pip(mut self, parameters: Ms2pipParameters) -> Self {
        self.ms2pip = Some(parameters);
        self
    }
    pub fn percolator(mut self, options: Option<PercolatorOptions>) -> Self {
        self.percolator = options;
        self
    }
    pub fn feature_generators(mut self, generators: BTreeMap<String, Value>) -> Self {
        self.feature_generators = generators;
        self
    }
    pub fn rescoring_engine(mut self, engines: BTreeMap<String, Value>) -> Self {
        self.rescoring_engine = engines;
        self
    }
    pub fn commands(mut self, commands: CommandTemplates) -> Self {
        self.commands = commands;
        self
    }

    pub fn build(self) -> Result<RescoreConfig, ConfigError> {
        Ok(RescoreConfig {
            psm_file: self
                .psm_file
                .ok_or(ConfigError::MissingParameter("psm_file"))?,
            pipeline: self
                .pipeline
                .ok_or(ConfigError::MissingParameter("psm_file_type"))?,
            spectrum_path: self.spectrum_path,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            processes: self
                .processes
                .ok_or(ConfigError::MissingParameter("processes"))?,
            feature_sets: self
                .feature_sets
                .ok_or(ConfigError::MissingParameter("feature_sets"))?,
            keep_tmp_files: self.keep_tmp_files,
            show_progress_bar: self.show_progress_bar,
            modifications: self.modifications,
            ms2pip: self
                .ms2pip
                .ok_or(ConfigError::MissingParameter("feature_generators.ms2pip"))?,
            percolator: self.percolator,
            feature_generators: self.feature_generators,
            rescoring_engine: self.rescoring_engine,
            commands: self.commands,
        })
    }
}
