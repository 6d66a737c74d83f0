use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Subset of features a Percolator run is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    /// MS²PIP features together with the search-engine features.
    All,
    /// MS²PIP features only.
    Ms2pip,
    /// Search-engine features only.
    #[serde(rename = "searchengine")]
    SearchEngine,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown feature set '{0}'. Expected one of 'all', 'ms2pip' or 'searchengine'.")]
pub struct UnknownFeatureSet(pub String);

impl FeatureSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSet::All => "all",
            FeatureSet::Ms2pip => "ms2pip",
            FeatureSet::SearchEngine => "searchengine",
        }
    }
}

impl FromStr for FeatureSet {
    type Err = UnknownFeatureSet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(FeatureSet::All),
            "ms2pip" => Ok(FeatureSet::Ms2pip),
            "searchengine" => Ok(FeatureSet::SearchEngine),
            _ => Err(UnknownFeatureSet(s.to_string())),
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
