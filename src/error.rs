//! Error types for the test262 harness

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the harness
///
/// These are harness-level errors: the corpus or the engine did not look the
/// way the harness expects. Conformance failures of the engine itself are
/// reported through [`Verdict`](crate::validator::Verdict), never through
/// this type.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The `/*--- ... ---*/` metadata block is missing or malformed
    #[error("FormatError: {0}")]
    Format(String),

    /// The metadata block parsed but is internally inconsistent
    #[error("ConfigError: {0}")]
    Config(String),

    /// A failure value that fits none of the known error shapes
    #[error("UnexpectedFailureShape: {0}")]
    UnexpectedFailureShape(String),

    /// Reading a corpus file failed
    #[error("IOError: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        HarnessError::Format(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        HarnessError::Config(message.into())
    }

    /// Wrap an I/O error with the path that produced it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for the harness
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        assert_eq!(
            HarnessError::format("missing metadata").to_string(),
            "FormatError: missing metadata"
        );
        assert_eq!(
            HarnessError::config("negative type is set, but phase isn't").to_string(),
            "ConfigError: negative type is set, but phase isn't"
        );
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = HarnessError::io(
            "harness/assert.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("IOError: harness/assert.js"));
        assert!(msg.contains("no such file"));
    }
}
