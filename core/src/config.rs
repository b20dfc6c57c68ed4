//! BM25 hyperparameters.
//!
//! `k1`, `b` and `epsilon` are fixed when an index is created and apply to
//! every score it computes. Hosts may override the defaults from CLI flags
//! or from a JSON file (see [`Bm25Params::from_json_file`]).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Term frequency saturation. Higher values let repeated terms keep adding score.
pub const DEFAULT_K1: f32 = 1.5;

/// Document length normalization. 0.0 disables it, 1.0 normalizes fully.
pub const DEFAULT_B: f32 = 0.75;

/// Fraction of the average idf substituted for terms whose raw idf is not positive.
pub const DEFAULT_EPSILON: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
    pub epsilon: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B, epsilon: DEFAULT_EPSILON }
    }
}

impl Bm25Params {
    pub fn new(k1: f32, b: f32, epsilon: f32) -> Self {
        Self { k1, b, epsilon }
    }

    /// Reject negative or non-finite parameters.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("k1", self.k1), ("b", self.b), ("epsilon", self.epsilon)] {
            if !value.is_finite() {
                return Err(Error::invalid_configuration(format!("{name} must be finite, got {value}")));
            }
            if value < 0.0 {
                return Err(Error::invalid_configuration(format!("{name} must be non-negative, got {value}")));
            }
        }
        Ok(())
    }

    /// Load parameters from a JSON object. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let params: Bm25Params = serde_json::from_reader(reader)
            .map_err(|e| Error::invalid_configuration(format!("malformed parameter file: {e}")))?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_okapi_convention() {
        let p = Bm25Params::default();
        assert_eq!(p.k1, 1.5);
        assert_eq!(p.b, 0.75);
        assert_eq!(p.epsilon, 0.25);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert!(matches!(Bm25Params::new(-0.1, 0.75, 0.25).validate(), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(Bm25Params::new(1.5, -1.0, 0.25).validate(), Err(Error::InvalidConfiguration(_))));
        assert!(matches!(Bm25Params::new(1.5, 0.75, f32::NAN).validate(), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn json_file_overrides_only_present_fields() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"k1": 1.2}}"#).unwrap();
        let p = Bm25Params::from_json_file(f.path()).unwrap();
        assert_eq!(p.k1, 1.2);
        assert_eq!(p.b, DEFAULT_B);
        assert_eq!(p.epsilon, DEFAULT_EPSILON);
    }
}
