//! Detector configuration.
//!
//! Defaults reproduce the catalog's production behaviour: all three strict
//! similarity scores must be exactly 1.0 and phonetic codes are cut to four
//! characters, the same length PostgreSQL's `dmetaphone` produces.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::phonetic::DoubleMetaphone;

/// Minimum strict similarity for title, notes and original_name.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 1.0;

/// Length of the phonetic code used for clustering.
pub const DEFAULT_PHONETIC_CODE_LEN: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    pub similarity_threshold: f64,
    pub phonetic_code_len: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            phonetic_code_len: DEFAULT_PHONETIC_CODE_LEN,
        }
    }
}

impl DetectorConfig {
    /// Load a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DetectorConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.similarity_threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    /// Encoder the bundled stores should index titles with.
    pub fn encoder(&self) -> DoubleMetaphone {
        DoubleMetaphone::new(self.phonetic_code_len)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.similarity_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be in (0, 1], got {}",
                t
            )));
        }
        if self.phonetic_code_len == 0 {
            return Err(ConfigError::Invalid(
                "phonetic_code_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_strict() {
        let config = DetectorConfig::default();
        assert_eq!(config.similarity_threshold, 1.0);
        assert_eq!(config.phonetic_code_len, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "similarity_threshold = 0.9").unwrap();

        let config = DetectorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.phonetic_code_len, DEFAULT_PHONETIC_CODE_LEN);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold = 0.9").unwrap();

        let err = DetectorConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(DetectorConfig::default().with_threshold(0.0).is_err());
        assert!(DetectorConfig::default().with_threshold(1.5).is_err());
        assert!(DetectorConfig::default().with_threshold(f64::NAN).is_err());
        assert!(DetectorConfig::default().with_threshold(0.5).is_ok());
    }

    #[test]
    fn test_zero_code_len_rejected() {
        let config = DetectorConfig {
            phonetic_code_len: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = DetectorConfig::from_file(Path::new("/nonexistent/dedup.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
