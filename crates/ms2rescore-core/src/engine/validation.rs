use super::config::{ConfigError, PercolatorOptions};
use crate::core::feature_set::FeatureSet;
use crate::core::io::ms2pip_config::Ms2pipParameters;
use crate::core::modification::Modification;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub(crate) struct ValidatedFilenames {
    pub psm_file: PathBuf,
    pub spectrum_path: Option<PathBuf>,
    pub output_path: PathBuf,
}

pub(crate) fn validate_filenames(
    psm_file: Option<&Path>,
    spectrum_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<ValidatedFilenames, ConfigError> {
    let psm_file = psm_file
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(ConfigError::MissingParameter("psm_file"))?;
    if !psm_file.is_file() {
        return Err(ConfigError::NotFound(psm_file.to_path_buf()));
    }

    if let Some(spectrum_path) = spectrum_path {
        if !spectrum_path.exists() {
            return Err(ConfigError::NotFound(spectrum_path.to_path_buf()));
        }
    }

    let output_path = match output_path {
        Some(path) => {
            if !path.is_dir() {
                info!("Creating output directory {:?}", path);
                std::fs::create_dir_all(path).map_err(|e| ConfigError::CreateDir {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
            path.to_path_buf()
        }
        None => match psm_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };

    Ok(ValidatedFilenames {
        psm_file: psm_file.to_path_buf(),
        spectrum_path: spectrum_path.map(Path::to_path_buf),
        output_path,
    })
}

pub(crate) fn validate_processes(requested: i64, available: usize) -> Result<usize, ConfigError> {
    match requested {
        -1 => Ok(available),
        n if n >= 1 => {
            let n = usize::try_from(n).unwrap_or(usize::MAX);
            if n > available {
                debug!(
                    "Requested {} processes but only {} CPUs are available.",
                    n, available
                );
                Ok(available)
            } else {
                Ok(n)
            }
        }
        n => Err(ConfigError::invalid(
            "processes",
            format!("expected -1 or a positive number, got {n}"),
        )),
    }
}

pub(crate) fn lowercase_keys(map: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    map.into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect()
}

pub(crate) fn validate_feature_sets(names: &[String]) -> Result<Vec<FeatureSet>, ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::invalid(
            "feature_sets",
            "at least one feature set is required",
        ));
    }

    let mut sets = Vec::with_capacity(names.len());
    for name in names {
        let set: FeatureSet = name
            .parse()
            .map_err(|e: crate::core::feature_set::UnknownFeatureSet| {
                ConfigError::invalid("feature_sets", e.to_string())
            })?;
        if !sets.contains(&set) {
            sets.push(set);
        }
    }
    Ok(sets)
}

/// Renders a JSON scalar the way it should appear on a command line.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn ms2pip_parameters(
    feature_generators: &BTreeMap<String, Value>,
) -> Result<Ms2pipParameters, ConfigError> {
    const KEY: &str = "feature_generators.ms2pip";

    let options = feature_generators
        .get("ms2pip")
        .ok_or(ConfigError::MissingParameter("feature_generators.ms2pip"))?
        .as_object()
        .ok_or_else(|| ConfigError::invalid(KEY, "expected a table of options"))?;

    let model = match options.get("model") {
        Some(Value::String(model)) if !model.trim().is_empty() => model.clone(),
        Some(_) => return Err(ConfigError::invalid(KEY, "`model` should be a string")),
        None => return Err(ConfigError::MissingParameter("feature_generators.ms2pip.model")),
    };

    let mut parameters = Ms2pipParameters::new(model);
    match options.get("frag_error") {
        None | Some(Value::Null) => {}
        Some(value) => {
            parameters.frag_error = value
                .as_f64()
                .filter(|e| e.is_finite() && *e > 0.0)
                .ok_or_else(|| {
                    ConfigError::invalid(KEY, "`frag_error` should be a positive number")
                })?;
        }
    }

    for (key, value) in options {
        if key == "model" || key == "frag_error" || value.is_null() {
            continue;
        }
        let rendered = scalar_to_string(value).ok_or_else(|| {
            ConfigError::invalid(KEY, format!("option `{key}` should be a scalar value"))
        })?;
        parameters.extra.insert(key.clone(), rendered);
    }

    Ok(parameters)
}

pub(crate) fn percolator_options(
    rescoring_engine: &BTreeMap<String, Value>,
) -> Result<Option<PercolatorOptions>, ConfigError> {
    const KEY: &str = "rescoring_engine.percolator";

    let Some(value) = rescoring_engine.get("percolator") else {
        return Ok(None);
    };
    let table = match value {
        Value::Null => return Ok(Some(PercolatorOptions::default())),
        Value::Object(table) => table,
        _ => return Err(ConfigError::invalid(KEY, "expected a table of options")),
    };

    let mut options = BTreeMap::new();
    for (key, value) in table {
        if value.is_null() {
            continue;
        }
        let rendered = scalar_to_string(value).ok_or_else(|| {
            ConfigError::invalid(KEY, format!("option `{key}` should be a scalar value"))
        })?;
        options.insert(key.clone(), rendered);
    }
    Ok(Some(PercolatorOptions { options }))
}

pub(crate) fn validate_modifications(modifications: &[Modification]) -> Result<(), ConfigError> {
    modifications
        .iter()
        .try_for_each(|m| m.validate().map_err(|e| ConfigError::invalid("modifications", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn map(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn processes_are_clamped_to_available_cpus() {
        assert_eq!(validate_processes(-1, 6).unwrap(), 6);
        assert_eq!(validate_processes(4, 6).unwrap(), 4);
        assert_eq!(validate_processes(64, 6).unwrap(), 6);
    }

    #[test]
    fn zero_and_negative_processes_are_rejected() {
        assert!(validate_processes(0, 6).is_err());
        assert!(validate_processes(-2, 6).is_err());
    }

    #[test]
    fn psm_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.peprec");

        let err = validate_filenames(Some(missing.as_path()), None, None).err().unwrap();
        assert!(matches!(err, ConfigError::NotFound(p) if p == missing));

        let err = validate_filenames(None, None, None).err().unwrap();
        assert!(matches!(err, ConfigError::MissingParameter("psm_file")));
    }

    #[test]
    fn spectrum_path_must_exist_when_given() {
        let dir = tempfile::tempdir().unwrap();
        let psm = dir.path().join("run.peprec");
        fs::write(&psm, "").unwrap();

        let err = validate_filenames(Some(psm.as_path()), Some(dir.path().join("x.mgf").as_path()), None)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::NotFound(_)));

        let ok = validate_filenames(Some(psm.as_path()), Some(dir.path()), None).unwrap();
        assert_eq!(ok.spectrum_path.as_deref(), Some(dir.path()));
    }

    #[test]
    fn output_path_is_created_or_inferred() {
        let dir = tempfile::tempdir().unwrap();
        let psm = dir.path().join("run.peprec");
        fs::write(&psm, "").unwrap();

        let inferred = validate_filenames(Some(psm.as_path()), None, None).unwrap();
        assert_eq!(inferred.output_path, dir.path());

        let nested = dir.path().join("results/deeper");
        let created = validate_filenames(Some(psm.as_path()), None, Some(nested.as_path())).unwrap();
        assert!(nested.is_dir());
        assert_eq!(created.output_path, nested);
    }

    #[test]
    fn feature_sets_are_parsed_and_deduplicated() {
        let names = vec![
            "ms2pip".to_string(),
            "ALL".to_string(),
            "ms2pip".to_string(),
        ];
        assert_eq!(
            validate_feature_sets(&names).unwrap(),
            vec![FeatureSet::Ms2pip, FeatureSet::All]
        );
        assert!(validate_feature_sets(&[]).is_err());
        assert!(validate_feature_sets(&["deeplc".to_string()]).is_err());
    }

    #[test]
    fn ms2pip_parameters_collect_extra_options() {
        let generators = map(json!({"ms2pip": {
            "model": "TMT",
            "frag_error": 0.05,
            "out": "csv",
            "ignored": null
        }}));
        let parameters = ms2pip_parameters(&generators).unwrap();

        assert_eq!(parameters.model, "TMT");
        assert_eq!(parameters.frag_error, 0.05);
        assert_eq!(parameters.extra.len(), 1);
        assert_eq!(parameters.extra.get("out"), Some(&"csv".to_string()));
    }

    #[test]
    fn ms2pip_parameters_require_model() {
        let err = ms2pip_parameters(&map(json!({"ms2pip": {}}))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingParameter("feature_generators.ms2pip.model")
        ));
        assert!(ms2pip_parameters(&map(json!({}))).is_err());
        assert!(ms2pip_parameters(&map(json!({"ms2pip": {"model": 3}}))).is_err());
        assert!(
            ms2pip_parameters(&map(json!({"ms2pip": {"model": "HCD", "frag_error": -1}})))
                .is_err()
        );
    }

    #[test]
    fn percolator_options_accept_scalars_only() {
        let options = percolator_options(&map(json!({"percolator": {
            "trainFDR": 0.01,
            "maxiter": 10,
            "quick-validation": true
        }})))
        .unwrap()
        .unwrap();
        assert_eq!(options.options.get("trainFDR"), Some(&"0.01".to_string()));
        assert_eq!(options.options.get("maxiter"), Some(&"10".to_string()));
        assert_eq!(
            options.options.get("quick-validation"),
            Some(&"true".to_string())
        );

        assert!(percolator_options(&map(json!({}))).unwrap().is_none());
        assert!(percolator_options(&map(json!({"percolator": {"a": [1]}}))).is_err());
        assert!(percolator_options(&map(json!({"percolator": 3}))).is_err());
    }
}
