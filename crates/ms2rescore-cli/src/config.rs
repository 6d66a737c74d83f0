use crate::cli::{Commands, ConfigArgs, RunArgs};
use crate::error::Result;
use ms2rescore::engine::cascade::{Assignment, ConfigCascade};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Builds the configuration cascade for a subcommand: defaults, then every
/// `--config-file` in order, then `run` arguments, then `--set` values.
pub fn build_cascade(command: &Commands) -> Result<ConfigCascade> {
    let config_args = command.config_args();
    let mut cascade = ConfigCascade::new()?;
    add_config_files(&mut cascade, config_args)?;

    if let Commands::Run(args) = command {
        cascade.add_arguments(run_arguments(args));
    }

    for raw in &config_args.set_values {
        let assignment = Assignment::parse(raw)?;
        debug!("Overriding `{}` from the command line.", assignment.key());
        cascade.set(assignment);
    }

    Ok(cascade)
}

fn add_config_files(cascade: &mut ConfigCascade, args: &ConfigArgs) -> Result<()> {
    for path in &args.config_files {
        cascade.add_file(path)?;
    }
    Ok(())
}

/// Values for the `ms2rescore` section taken from `run` arguments. Flags that were not
/// given are left out so they do not mask configuration files.
pub fn run_arguments(args: &RunArgs) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("psm_file".to_string(), path_value(&args.psm_file));
    if let Some(path) = &args.spectrum_path {
        map.insert("spectrum_path".to_string(), path_value(path));
    }
    if let Some(path) = &args.output_path {
        map.insert("output_path".to_string(), path_value(path));
    }
    if let Some(kind) = &args.psm_file_type {
        map.insert("psm_file_type".to_string(), Value::from(kind.as_str()));
    }
    if let Some(processes) = args.processes {
        map.insert("processes".to_string(), Value::from(processes));
    }
    if args.keep_tmp_files {
        map.insert("keep_tmp_files".to_string(), Value::Bool(true));
    }
    if args.no_progress {
        map.insert("show_progress_bar".to_string(), Value::Bool(false));
    }
    map
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::error::CliError;
    use clap::Parser;
    use ms2rescore::engine::config::ConfigError;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Commands {
        let mut full = vec!["ms2rescore"];
        full.extend_from_slice(args);
        Cli::parse_from(full).command
    }

    fn section(cascade: &ConfigCascade) -> Value {
        cascade.merged().unwrap()["ms2rescore"].clone()
    }

    #[test]
    fn defaults_are_used_without_other_sources() {
        let cascade = build_cascade(&parse(&["config"])).unwrap();
        let section = section(&cascade);

        assert_eq!(section["psm_file_type"], "infer");
        assert_eq!(section["processes"], -1);
        assert_eq!(section["feature_generators"]["ms2pip"]["model"], "HCD");
    }

    #[test]
    fn cli_arguments_override_config_files() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[ms2rescore]\nprocesses = 8\nkeep_tmp_files = true\npsm_file_type = \"maxquant\"\n",
        )
        .unwrap();

        let cascade = build_cascade(&parse(&[
            "run",
            "msms.txt",
            "-c",
            config_path.to_str().unwrap(),
            "-n",
            "2",
        ]))
        .unwrap();
        let section = section(&cascade);

        assert_eq!(section["psm_file"], "msms.txt");
        assert_eq!(section["processes"], 2);
        assert_eq!(section["keep_tmp_files"], true);
        assert_eq!(section["psm_file_type"], "maxquant");
        assert_eq!(section["show_progress_bar"], true);
    }

    #[test]
    fn later_config_files_take_priority() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.toml");
        fs::write(&first, r#"{"ms2rescore": {"processes": 4, "log_level": "debug"}}"#).unwrap();
        fs::write(&second, "[ms2rescore]\nprocesses = 6\n").unwrap();

        let cascade = build_cascade(&parse(&[
            "config",
            "-c",
            first.to_str().unwrap(),
            "-c",
            second.to_str().unwrap(),
        ]))
        .unwrap();
        let section = section(&cascade);

        assert_eq!(section["processes"], 6);
        assert_eq!(section["log_level"], "debug");
    }

    #[test]
    fn set_values_override_everything() {
        let cascade = build_cascade(&parse(&[
            "run",
            "in.peprec",
            "-n",
            "2",
            "-S",
            "processes=3",
            "-S",
            "feature_generators.ms2pip.model=CID",
        ]))
        .unwrap();
        let section = section(&cascade);

        assert_eq!(section["processes"], 3);
        assert_eq!(section["feature_generators"]["ms2pip"]["model"], "CID");
        assert_eq!(section["feature_generators"]["ms2pip"]["frag_error"], 0.02);
    }

    #[test]
    fn no_progress_disables_progress_bar() {
        let Commands::Run(args) = parse(&["run", "in.peprec", "--no-progress"]) else {
            panic!("Expected 'run' subcommand");
        };
        let map = run_arguments(&args);
        assert_eq!(map.get("show_progress_bar"), Some(&Value::Bool(false)));
        assert!(!map.contains_key("keep_tmp_files"));
        assert!(!map.contains_key("processes"));
    }

    #[test]
    fn unknown_config_extension_is_rejected() {
        let result = build_cascade(&parse(&["config", "-c", "settings.yaml"]));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::UnknownFileExtension(_)))
        ));
    }
}
