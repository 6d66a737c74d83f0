use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const REQUIRED_COLUMNS: [&str; 4] = ["spec_id", "modifications", "peptide", "charge"];

#[derive(Debug, Error)]
pub enum PeprecError {
    #[error("Failed to read PEPREC header from '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("PEPREC file '{}' is missing required column(s): {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
}

/// Column layout of a space-separated PEPREC file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeprecHeader {
    columns: Vec<String>,
}

impl PeprecHeader {
    pub fn read(path: &Path) -> Result<Self, PeprecError> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .from_path(path)
            .map_err(|e| PeprecError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_csv_reader(reader, path)
    }

    pub fn from_reader(reader: impl Read, source_name: &Path) -> Result<Self, PeprecError> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .from_reader(reader);
        Self::from_csv_reader(reader, source_name)
    }

    fn from_csv_reader<R: Read>(
        mut reader: csv::Reader<R>,
        path: &Path,
    ) -> Result<Self, PeprecError> {
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| PeprecError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?
            .iter()
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !columns.iter().any(|c| c == *required))
            .map(|c| c.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(PeprecError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_label(&self) -> bool {
        self.has_column("label")
    }

    pub fn has_score(&self) -> bool {
        self.has_column("psm_score")
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_full_header_with_optional_columns() {
        let content = "spec_id modifications peptide charge label psm_score\n\
                       scan=1 - PEPTIDEK 2 1 12.3\n";
        let header = PeprecHeader::from_reader(Cursor::new(content), Path::new("in.peprec"))
            .expect("valid header");

        assert_eq!(header.columns().len(), 6);
        assert!(header.has_label());
        assert!(header.has_score());
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let content = "spec_id modifications peptide charge\n";
        let header = PeprecHeader::from_reader(Cursor::new(content), Path::new("in.peprec"))
            .expect("valid header");

        assert!(!header.has_label());
        assert!(!header.has_score());
    }

    #[test]
    fn missing_columns_are_listed() {
        let content = "spec_id peptide\n";
        let err = PeprecHeader::from_reader(Cursor::new(content), Path::new("in.peprec"))
            .unwrap_err();

        match err {
            PeprecError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["modifications", "charge"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn read_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PeprecHeader::read(&dir.path().join("absent.peprec")).unwrap_err();
        assert!(matches!(err, PeprecError::Csv { .. }));
    }
}
