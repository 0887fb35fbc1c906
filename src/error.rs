// ⚠️ Error taxonomy for the study pipeline
//
// Only structural problems are errors. Absent historical data (lookup
// misses, sentinel scores) is filtered and counted, never raised.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    /// Malformed or unexpected-shape input. Fatal for the stage.
    #[error("format error in {file} (line {line}): {message}")]
    Format {
        file: String,
        line: usize,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StudyError {
    pub fn format(file: &str, line: usize, message: impl Into<String>) -> Self {
        StudyError::Format {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StudyError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, StudyError::Format { .. })
    }
}

pub type Result<T> = std::result::Result<T, StudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_message() {
        let err = StudyError::format("war.txt", 7, "expected 20 fields, found 19");
        assert!(err.is_format());
        assert_eq!(
            err.to_string(),
            "format error in war.txt (line 7): expected 20 fields, found 19"
        );
    }

    #[test]
    fn test_io_error_is_not_format() {
        let err = StudyError::io(
            "missing.tsv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(!err.is_format());
        assert!(err.to_string().contains("missing.tsv"));
    }
}
