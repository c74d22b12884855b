//! Error types for the export engine

use std::path::PathBuf;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Failures that stop a stage of the export
///
/// Per-record data-quality problems are not errors: converters return `None`
/// and the exporter counts the skip.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Invalid or contradictory configuration, raised before any sink opens
    #[error("Configuration error: {0}")]
    Config(String),

    /// The interaction source could not be read; fatal for the whole run
    #[error("Interaction source error: {0}")]
    Source(String),

    /// One output sink failed; the other formats keep going
    #[error("Output sink {path} failed: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ExportError {
    pub fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Sink {
            path: path.into(),
            source,
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Parse(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_names_the_file() {
        let err = ExportError::sink(
            "/out/uniprotlinks.cc",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ExportError::Sink { .. }));
        assert_eq!(err.to_string(), "Output sink /out/uniprotlinks.cc failed: denied");
    }

    #[test]
    fn test_json_error_is_a_parse_error() {
        let err: ExportError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, ExportError::Parse(_)));
    }
}
