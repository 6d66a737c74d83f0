use phf::{Map, phf_map};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Search-engine output formats that can be rescored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    /// A PEPREC peptide list, usable without conversion.
    Peprec,
    /// MaxQuant `msms.txt`.
    MaxQuant,
    /// MS-GF+ mzIdentML.
    MsgfPlus,
    /// X!Tandem XML.
    XTandem,
}

#[rustfmt::skip]
static PIPELINE_ALIASES: Map<&'static str, Pipeline> = phf_map! {
    "peprec" => Pipeline::Peprec,
    "maxquant" => Pipeline::MaxQuant,
    "msgfplus" => Pipeline::MsgfPlus, "msgf+" => Pipeline::MsgfPlus, "ms-gf+" => Pipeline::MsgfPlus,
    "tandem" => Pipeline::XTandem, "xtandem" => Pipeline::XTandem, "x!tandem" => Pipeline::XTandem,
};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PipelineError {
    #[error("Could not recognize the requested pipeline: '{0}'.")]
    UnknownPipeline(String),

    #[error(
        "Could not infer the pipeline from '{}'. Set `psm_file_type` explicitly.",
        .0.display()
    )]
    CannotInfer(PathBuf),
}

impl Pipeline {
    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::Peprec => "peprec",
            Pipeline::MaxQuant => "maxquant",
            Pipeline::MsgfPlus => "msgfplus",
            Pipeline::XTandem => "xtandem",
        }
    }

    /// Whether PSMs must be converted to PEPREC before prediction.
    pub fn requires_conversion(&self) -> bool {
        !matches!(self, Pipeline::Peprec)
    }

    /// Guesses the pipeline from the name of a PSM file.
    pub fn infer(path: &Path) -> Result<Self, PipelineError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if file_name.ends_with(".peprec") {
            Ok(Pipeline::Peprec)
        } else if file_name.ends_with("msms.txt") {
            Ok(Pipeline::MaxQuant)
        } else if file_name.ends_with(".mzid") {
            Ok(Pipeline::MsgfPlus)
        } else if file_name.ends_with(".xml") {
            Ok(Pipeline::XTandem)
        } else {
            Err(PipelineError::CannotInfer(path.to_path_buf()))
        }
    }

    /// Resolves a configured `psm_file_type`, where `"infer"` defers to [`Pipeline::infer`].
    pub fn resolve(psm_file_type: &str, psm_file: &Path) -> Result<Self, PipelineError> {
        if psm_file_type.trim().eq_ignore_ascii_case("infer") {
            Self::infer(psm_file)
        } else {
            psm_file_type.parse()
        }
    }
}

impl FromStr for Pipeline {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        PIPELINE_ALIASES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| PipelineError::UnknownPipeline(s.to_string()))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_parse_case_insensitively() {
        assert_eq!("MaxQuant".parse::<Pipeline>(), Ok(Pipeline::MaxQuant));
        assert_eq!("MS-GF+".parse::<Pipeline>(), Ok(Pipeline::MsgfPlus));
        assert_eq!("msgf+".parse::<Pipeline>(), Ok(Pipeline::MsgfPlus));
        assert_eq!(" X!Tandem ".parse::<Pipeline>(), Ok(Pipeline::XTandem));
        assert_eq!("tandem".parse::<Pipeline>(), Ok(Pipeline::XTandem));
        assert_eq!("PEPREC".parse::<Pipeline>(), Ok(Pipeline::Peprec));
    }

    #[test]
    fn unknown_pipeline_is_rejected() {
        assert_eq!(
            "mascot".parse::<Pipeline>(),
            Err(PipelineError::UnknownPipeline("mascot".to_string()))
        );
    }

    #[test]
    fn infer_uses_file_name() {
        assert_eq!(
            Pipeline::infer(Path::new("/data/run1.peprec")),
            Ok(Pipeline::Peprec)
        );
        assert_eq!(
            Pipeline::infer(Path::new("combined/txt/msms.txt")),
            Ok(Pipeline::MaxQuant)
        );
        assert_eq!(
            Pipeline::infer(Path::new("sample.MZID")),
            Ok(Pipeline::MsgfPlus)
        );
        assert_eq!(
            Pipeline::infer(Path::new("sample.t.xml")),
            Ok(Pipeline::XTandem)
        );
        assert!(matches!(
            Pipeline::infer(Path::new("sample.csv")),
            Err(PipelineError::CannotInfer(_))
        ));
    }

    #[test]
    fn resolve_prefers_explicit_type() {
        let psm_file = Path::new("run.peprec");
        assert_eq!(Pipeline::resolve("infer", psm_file), Ok(Pipeline::Peprec));
        assert_eq!(
            Pipeline::resolve("maxquant", psm_file),
            Ok(Pipeline::MaxQuant)
        );
    }

    #[test]
    fn only_peprec_skips_conversion() {
        assert!(!Pipeline::Peprec.requires_conversion());
        assert!(Pipeline::MaxQuant.requires_conversion());
        assert!(Pipeline::MsgfPlus.requires_conversion());
        assert!(Pipeline::XTandem.requires_conversion());
    }
}
