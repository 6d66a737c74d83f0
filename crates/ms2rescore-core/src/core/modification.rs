use serde::{Deserialize, Serialize};

/// A post-translational modification that MS²PIP should consider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Modification {
    pub name: String,
    pub mass_shift: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amino_acid: Option<char>,
    #[serde(default)]
    pub n_term: bool,
    #[serde(default)]
    pub c_term: bool,
}

impl Modification {
    /// The residue or terminus the modification applies to, in MS²PIP notation.
    pub fn target(&self) -> String {
        if self.n_term {
            "N-term".to_string()
        } else if self.c_term {
            "C-term".to_string()
        } else {
            self.amino_acid.map(String::from).unwrap_or_default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("modification name cannot be empty".to_string());
        }
        if self.name.contains([',', '=']) {
            return Err(format!(
                "modification name '{}' cannot contain ',' or '='",
                self.name
            ));
        }
        if !self.mass_shift.is_finite() {
            return Err(format!("mass shift of '{}' is not a finite number", self.name));
        }
        if self.n_term && self.c_term {
            return Err(format!(
                "modification '{}' cannot be both N- and C-terminal",
                self.name
            ));
        }
        match self.amino_acid {
            Some(aa) if !aa.is_ascii_uppercase() => Err(format!(
                "amino acid of '{}' should be a one-letter uppercase code, got '{}'",
                self.name, aa
            )),
            None if !self.n_term && !self.c_term => Err(format!(
                "non-terminal modification '{}' requires an amino acid",
                self.name
            )),
            _ => Ok(()),
        }
    }
}
