// ⚠️ Error types for the conversion pipeline
// Row-level problems are never errors: they are filtered and counted in the report

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoflowError {
    /// Reference table missing, empty, or malformed. Nothing is partially loaded.
    #[error("Reference table {} could not be loaded: {reason}", path.display())]
    ReferenceLoad { path: PathBuf, reason: String },

    /// Required input columns are absent from the header row
    #[error("Input {} is missing required columns: {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    /// Transaction file is not readable as delimited text
    #[error("Input {} could not be read: {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeoflowError {
    pub(crate) fn reference(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GeoflowError::ReferenceLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GeoflowError::Input {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_columns() {
        let err = GeoflowError::Schema {
            path: PathBuf::from("txns.csv"),
            missing: vec!["payer_zip".to_string(), "payee_country".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Input txns.csv is missing required columns: payer_zip, payee_country"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: GeoflowError = io.into();
        assert!(matches!(err, GeoflowError::Io(_)));
    }
}
