use crate::core::feature_set::FeatureSet;
use crate::core::files::{self, FeatureSetFiles, OutputFiles};
use crate::core::io::ms2pip_config::write_ms2pip_config_file;
use crate::core::peprec::PeprecHeader;
use crate::core::pipeline::Pipeline;
use crate::engine::command::{
    self, CommandOutput, CommandRunner, CommandTemplate, ExternalCommand,
};
use crate::engine::config::{PercolatorOptions, RescoreConfig};
use crate::engine::error::RescoreError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// What happened to one feature set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSetOutcome {
    pub feature_set: FeatureSet,
    pub files: FeatureSetFiles,
    /// Whether Percolator ran and left its `.pout` behind.
    pub rescored: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescoreSummary {
    pub pipeline: Pipeline,
    pub peprec: PathBuf,
    pub spectrum_file: PathBuf,
    pub predictions: PathBuf,
    /// Empty when no feature command is configured.
    pub feature_sets: Vec<FeatureSetOutcome>,
    pub removed_files: usize,
}

impl RescoreSummary {
    pub fn failed_feature_sets(&self) -> impl Iterator<Item = &FeatureSetOutcome> {
        self.feature_sets.iter().filter(|o| !o.rescored)
    }
}

/// PEPREC and spectrum file handed to MS²PIP.
#[derive(Debug, Clone)]
struct PreparedInput {
    peprec: PathBuf,
    spectrum_file: PathBuf,
}

#[instrument(skip_all, name = "rescore_workflow")]
pub fn run(
    config: &RescoreConfig,
    runner: &dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Result<RescoreSummary, RescoreError> {
    info!(
        "Rescoring {:?} with the {} pipeline.",
        config.psm_file, config.pipeline
    );
    let files = OutputFiles::new(&config.output_path, &config.psm_file);

    // === Phase 1: External tools ===
    reporter.phase("Checking external tools", || {
        command::check_tools(config, runner)
    })?;

    // === Phase 2: PEPREC and spectra ===
    let prepared = reporter.phase("Preparing input", || {
        prepare_input(config, &files, runner)
    })?;

    // === Phase 3: MS²PIP predictions ===
    let predictions = reporter.phase("Predicting spectra with MS²PIP", || {
        run_ms2pip(config, &files, &prepared, runner)
    })?;

    // === Phase 4: Features and PIN files ===
    let has_features = reporter.phase("Generating features", || {
        generate_features(config, &files, &prepared, &predictions, runner)
    })?;

    // === Phase 5: Cleanup ===
    let removed_files = if config.keep_tmp_files {
        debug!("Keeping temporary files.");
        0
    } else if !has_features {
        info!(
            "No PIN files were generated; keeping MS²PIP output at {:?}.",
            predictions
        );
        0
    } else {
        reporter.phase("Removing temporary files", || {
            remove_temporary_files(config, &files, &predictions)
        })?
    };

    // === Phase 6: Rescoring ===
    let feature_sets = if has_features {
        rescore_feature_sets(config, &files, runner, reporter)
    } else {
        Vec::new()
    };

    info!("MS²Rescore finished!");
    Ok(RescoreSummary {
        pipeline: config.pipeline,
        peprec: prepared.peprec,
        spectrum_file: prepared.spectrum_file,
        predictions,
        feature_sets,
        removed_files,
    })
}

fn prepare_input(
    config: &RescoreConfig,
    files: &OutputFiles,
    runner: &dyn CommandRunner,
) -> Result<PreparedInput, RescoreError> {
    let spectrum_file =
        files::default_spectrum_file(&config.psm_file, config.spectrum_path.as_deref());

    if !config.pipeline.requires_conversion() {
        let header = PeprecHeader::read(&config.psm_file)?;
        if !header.has_label() {
            warn!("PEPREC file has no `label` column; target/decoy information is missing.");
        }
        if !spectrum_file.is_file() {
            return Err(RescoreError::MissingInput(spectrum_file));
        }
        return Ok(PreparedInput {
            peprec: config.psm_file.clone(),
            spectrum_file,
        });
    }

    let template = config
        .commands
        .convert
        .as_ref()
        .ok_or(RescoreError::ConversionUnavailable(config.pipeline))?;

    let values = BTreeMap::from([
        ("psm_file", path_value(&config.psm_file)),
        ("spectrum_path", path_value(&spectrum_file)),
        ("output_stem", path_value(files.stem())),
        ("pipeline", config.pipeline.name().to_string()),
        ("processes", config.processes.to_string()),
    ]);
    let convert = render("convert", template, &values)?;
    info!("Converting {} PSMs: {}", config.pipeline, convert);
    run_checked(runner, &convert)?;

    let peprec = files.peprec();
    let mgf = files.mgf();
    for path in [&peprec, &mgf] {
        if !path.is_file() {
            return Err(RescoreError::MissingOutput {
                step: "commands.convert",
                path: path.clone(),
            });
        }
    }
    PeprecHeader::read(&peprec)?;

    Ok(PreparedInput {
        peprec,
        spectrum_file: mgf,
    })
}

fn run_ms2pip(
    config: &RescoreConfig,
    files: &OutputFiles,
    prepared: &PreparedInput,
    runner: &dyn CommandRunner,
) -> Result<PathBuf, RescoreError> {
    let config_path = files.ms2pip_config();
    write_ms2pip_config_file(&config_path, &config.ms2pip, &config.modifications).map_err(
        |e| RescoreError::Io {
            path: config_path.clone(),
            source: e,
        },
    )?;

    let ms2pip = command::ms2pip_command(
        &prepared.peprec,
        &config_path,
        &prepared.spectrum_file,
        config.processes,
    );
    info!("Running MS²PIP: {}", ms2pip);
    run_checked(runner, &ms2pip)?;

    Ok(files::predictions_file(&prepared.peprec, &config.ms2pip.model))
}

/// Returns whether PIN files are available for rescoring.
fn generate_features(
    config: &RescoreConfig,
    files: &OutputFiles,
    prepared: &PreparedInput,
    predictions: &Path,
    runner: &dyn CommandRunner,
) -> Result<bool, RescoreError> {
    let Some(template) = config.commands.features.as_ref() else {
        warn!("No `commands.features` configured; skipping PIN generation and rescoring.");
        return Ok(false);
    };

    let feature_sets = config
        .feature_sets
        .iter()
        .map(FeatureSet::as_str)
        .collect::<Vec<_>>()
        .join(",");
    let values = BTreeMap::from([
        ("predictions", path_value(predictions)),
        ("peprec", path_value(&prepared.peprec)),
        ("output_stem", path_value(files.stem())),
        ("feature_sets", feature_sets),
        ("processes", config.processes.to_string()),
    ]);
    let features = render("features", template, &values)?;
    info!("Calculating features from predicted spectra: {}", features);
    run_checked(runner, &features)?;

    info!("Checking PIN files");
    for &feature_set in &config.feature_sets {
        let pin = files.feature_set(feature_set).pin;
        if !pin.is_file() {
            return Err(RescoreError::MissingOutput {
                step: "commands.features",
                path: pin,
            });
        }
    }
    Ok(true)
}

fn remove_temporary_files(
    config: &RescoreConfig,
    files: &OutputFiles,
    predictions: &Path,
) -> Result<usize, RescoreError> {
    debug!("Removing temporary files");
    let mut removed = 0;
    for path in files.temporary(&config.ms2pip.model, predictions) {
        if is_user_input(config, &path) {
            debug!("Not removing input file {:?}", path);
            continue;
        }
        if files::remove_if_exists(&path).map_err(|e| RescoreError::Io {
            path: path.clone(),
            source: e,
        })? {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Intermediate files can share a name with the files the user supplied.
fn is_user_input(config: &RescoreConfig, path: &Path) -> bool {
    let user_spectrum =
        files::default_spectrum_file(&config.psm_file, config.spectrum_path.as_deref());
    same_file(path, &config.psm_file) || same_file(path, &user_spectrum)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn rescore_feature_sets(
    config: &RescoreConfig,
    files: &OutputFiles,
    runner: &dyn CommandRunner,
    reporter: &ProgressReporter,
) -> Vec<FeatureSetOutcome> {
    let Some(options) = config.percolator.as_ref() else {
        info!("No rescoring engine configured; PIN files are ready for manual rescoring.");
        return config
            .feature_sets
            .iter()
            .map(|&feature_set| FeatureSetOutcome {
                feature_set,
                files: files.feature_set(feature_set),
                rescored: false,
            })
            .collect();
    };

    reporter.report(Progress::PhaseStart {
        name: "Rescoring with Percolator",
    });
    reporter.report(Progress::TaskStart {
        total_steps: config.feature_sets.len() as u64,
    });

    let outcomes = config
        .feature_sets
        .iter()
        .map(|&feature_set| {
            let outcome = run_percolator(options, feature_set, files, runner);
            reporter.report(Progress::TaskIncrement);
            outcome
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    outcomes
}

/// Percolator failures are logged and recorded; the remaining feature sets still run.
fn run_percolator(
    options: &PercolatorOptions,
    feature_set: FeatureSet,
    files: &OutputFiles,
    runner: &dyn CommandRunner,
) -> FeatureSetOutcome {
    let set_files = files.feature_set(feature_set);
    let percolator = command::percolator_command(options, &set_files);
    info!("Running Percolator: {}", percolator);

    match runner.run(&percolator) {
        Ok(output) if !output.success => {
            error!(
                "Percolator failed for the {} feature set ({}): {}",
                feature_set,
                output.status_description(),
                output.stderr.trim()
            );
        }
        Ok(_) => {}
        Err(e) => error!("Could not start Percolator: {}", e),
    }

    let rescored = set_files.pout.is_file();
    if !rescored {
        error!("Error running Percolator: {:?} was not written.", set_files.pout);
    }
    FeatureSetOutcome {
        feature_set,
        files: set_files,
        rescored,
    }
}

fn run_checked(
    runner: &dyn CommandRunner,
    command: &ExternalCommand,
) -> Result<CommandOutput, RescoreError> {
    let output = runner.run(command).map_err(|e| RescoreError::Spawn {
        command: command.clone(),
        source: e,
    })?;
    if !output.success {
        return Err(RescoreError::CommandFailed {
            command: command.clone(),
            status: output.status_description(),
            stderr: output.stderr.trim().to_string(),
        });
    }
    if !output.stdout.trim().is_empty() {
        debug!("{} output:\n{}", command.program(), output.stdout.trim_end());
    }
    Ok(output)
}

fn render(
    name: &'static str,
    template: &CommandTemplate,
    values: &BTreeMap<&str, String>,
) -> Result<ExternalCommand, RescoreError> {
    template
        .render(values)
        .map_err(|e| RescoreError::Template { name, source: e })
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
