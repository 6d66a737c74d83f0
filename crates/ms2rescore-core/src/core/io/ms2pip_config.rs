use crate::core::modification::Modification;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Prediction settings passed to MS²PIP.
#[derive(Debug, Clone, PartialEq)]
pub struct Ms2pipParameters {
    pub model: String,
    pub frag_error: f64,
    /// Additional `key=value` options, written verbatim.
    pub extra: BTreeMap<String, String>,
}

impl Ms2pipParameters {
    pub const DEFAULT_FRAG_ERROR: f64 = 0.02;

    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            frag_error: Self::DEFAULT_FRAG_ERROR,
            extra: BTreeMap::new(),
        }
    }
}

/// Writes an MS²PIP configuration: model and fragment error first, then one `ptm` line per
/// modification, then any extra options in key order.
pub fn write_ms2pip_config(
    parameters: &Ms2pipParameters,
    modifications: &[Modification],
    writer: &mut impl Write,
) -> io::Result<()> {
    writeln!(writer, "model={}", parameters.model)?;
    writeln!(writer, "frag_error={}", parameters.frag_error)?;

    for modification in modifications {
        writeln!(
            writer,
            "ptm={},{},opt,{}",
            modification.name,
            modification.mass_shift,
            modification.target()
        )?;
    }

    for (key, value) in &parameters.extra {
        writeln!(writer, "{key}={value}")?;
    }

    Ok(())
}

pub fn write_ms2pip_config_file(
    path: &Path,
    parameters: &Ms2pipParameters,
    modifications: &[Modification],
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ms2pip_config(parameters, modifications, &mut writer)?;
    writer.flush()
}
