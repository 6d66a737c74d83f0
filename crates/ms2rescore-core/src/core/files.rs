use crate::core::feature_set::FeatureSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Percolator input and outputs for one feature set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSetFiles {
    pub pin: PathBuf,
    pub pout: PathBuf,
    pub pout_dec: PathBuf,
    pub weights: PathBuf,
}

/// Names of every file a rescoring run reads or writes, derived from one output stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    stem: PathBuf,
}

impl OutputFiles {
    /// The stem is `<output_path>/<psm file name without extension>`.
    pub fn new(output_path: &Path, psm_file: &Path) -> Self {
        let name = psm_file
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "ms2rescore".into());
        Self {
            stem: output_path.join(name),
        }
    }

    pub fn stem(&self) -> &Path {
        &self.stem
    }

    pub fn peprec(&self) -> PathBuf {
        self.with_suffix(".peprec")
    }

    pub fn mgf(&self) -> PathBuf {
        self.with_suffix(".mgf")
    }

    pub fn ms2pip_config(&self) -> PathBuf {
        self.with_suffix("_ms2pip_config.txt")
    }

    pub fn features(&self) -> PathBuf {
        self.with_suffix("_ms2pipfeatures.csv")
    }

    pub fn correlations(&self, model: &str) -> PathBuf {
        self.with_suffix(&format!("_{model}_correlations.csv"))
    }

    pub fn feature_set(&self, subset: FeatureSet) -> FeatureSetFiles {
        let base = format!("_{}features", subset.as_str());
        FeatureSetFiles {
            pin: self.with_suffix(&format!("{base}.pin")),
            pout: self.with_suffix(&format!("{base}.pout")),
            pout_dec: self.with_suffix(&format!("{base}.pout_dec")),
            weights: self.with_suffix(&format!("{base}.weights")),
        }
    }

    /// Intermediate files that are removed after the features have been written.
    pub fn temporary(&self, model: &str, predictions: &Path) -> Vec<PathBuf> {
        vec![
            self.ms2pip_config(),
            predictions.to_path_buf(),
            self.features(),
            self.correlations(model),
            self.mgf(),
            self.peprec(),
        ]
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut s = self.stem.clone().into_os_string();
        s.push(suffix);
        PathBuf::from(s)
    }
}

/// Spectrum file to use when none, or only a directory, was configured.
pub fn default_spectrum_file(psm_file: &Path, spectrum_path: Option<&Path>) -> PathBuf {
    match spectrum_path {
        Some(path) if path.is_dir() => {
            let stem = psm_file.file_stem().unwrap_or_default();
            path.join(format!("{}.mgf", stem.to_string_lossy()))
        }
        Some(path) => path.to_path_buf(),
        None => psm_file.with_extension("mgf"),
    }
}

/// MS²PIP writes its predictions next to the PEPREC it was given.
pub fn predictions_file(peprec: &Path, model: &str) -> PathBuf {
    let peprec = peprec.to_string_lossy();
    let base = peprec.strip_suffix(".peprec").unwrap_or(&peprec);
    PathBuf::from(format!("{base}_{model}_pred_and_emp.csv"))
}

/// Removes a file, treating an already missing file as success. Returns whether a file
/// was actually deleted.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Temporary file {:?} was already gone: {}", path, e);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn files() -> OutputFiles {
        OutputFiles::new(Path::new("/out"), Path::new("/in/run1.mzid"))
    }

    #[test]
    fn stem_combines_output_dir_and_psm_name() {
        assert_eq!(files().stem(), Path::new("/out/run1"));
        assert_eq!(files().peprec(), PathBuf::from("/out/run1.peprec"));
        assert_eq!(files().mgf(), PathBuf::from("/out/run1.mgf"));
        assert_eq!(
            files().ms2pip_config(),
            PathBuf::from("/out/run1_ms2pip_config.txt")
        );
        assert_eq!(
            files().features(),
            PathBuf::from("/out/run1_ms2pipfeatures.csv")
        );
        assert_eq!(
            files().correlations("HCD"),
            PathBuf::from("/out/run1_HCD_correlations.csv")
        );
    }

    #[test]
    fn predictions_strip_peprec_extension() {
        assert_eq!(
            predictions_file(Path::new("/out/run1.peprec"), "HCD"),
            PathBuf::from("/out/run1_HCD_pred_and_emp.csv")
        );
        assert_eq!(
            predictions_file(Path::new("/data/list.txt"), "CID"),
            PathBuf::from("/data/list.txt_CID_pred_and_emp.csv")
        );
    }

    #[test]
    fn feature_set_files_share_a_base_name() {
        let set = files().feature_set(FeatureSet::SearchEngine);
        assert_eq!(set.pin, PathBuf::from("/out/run1_searchenginefeatures.pin"));
        assert_eq!(set.pout, PathBuf::from("/out/run1_searchenginefeatures.pout"));
        assert_eq!(
            set.pout_dec,
            PathBuf::from("/out/run1_searchenginefeatures.pout_dec")
        );
        assert_eq!(
            set.weights,
            PathBuf::from("/out/run1_searchenginefeatures.weights")
        );
    }

    #[test]
    fn temporary_files_cover_intermediates() {
        let predictions = PathBuf::from("/out/run1_HCD_pred_and_emp.csv");
        let tmp = files().temporary("HCD", &predictions);
        assert_eq!(tmp.len(), 6);
        assert!(tmp.contains(&predictions));
        assert!(tmp.contains(&PathBuf::from("/out/run1.peprec")));
        assert!(tmp.contains(&PathBuf::from("/out/run1_HCD_correlations.csv")));
    }

    #[test]
    fn default_spectrum_file_follows_psm_file() {
        assert_eq!(
            default_spectrum_file(Path::new("/in/run1.peprec"), None),
            PathBuf::from("/in/run1.mgf")
        );
        assert_eq!(
            default_spectrum_file(Path::new("/in/run1.peprec"), Some(Path::new("/x/a.mgf"))),
            PathBuf::from("/x/a.mgf")
        );

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            default_spectrum_file(Path::new("/in/run1.peprec"), Some(dir.path())),
            dir.path().join("run1.mgf")
        );
    }

    #[test]
    fn remove_if_exists_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp.csv");
        fs::write(&path, "x").unwrap();

        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
        assert!(!remove_if_exists(&path).unwrap());
    }
}
