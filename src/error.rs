//! Error types for pipeline construction, pulls and terminal actions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the pipeline [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by pipelines.
///
/// Configuration errors are raised at call time. Resource errors are raised by
/// the operation that touched the file. Transform errors are raised lazily by
/// the pull that first hits them.
#[derive(Error, Debug)]
pub enum Error {
    /// A source file could not be opened.
    #[error("cannot open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while reading, writing or releasing a resource.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A field index was outside the tuple it was applied to.
    #[error("field index {index} out of range for tuple of {arity} fields")]
    FieldIndex { index: usize, arity: usize },

    /// Conflicting or invalid arguments to a stage.
    #[error("configuration error: {0}")]
    Config(String),

    /// In-place write requested on a pipeline that does not read from a file.
    #[error("pipeline has no source path to write back to")]
    NoSourcePath,

    /// The temporary output could not be renamed over its destination.
    #[error("cannot replace '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Build an [`Error::Open`] for `path`.
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Open {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_index_message() {
        let err = Error::FieldIndex { index: 3, arity: 2 };
        assert_eq!(
            err.to_string(),
            "field index 3 out of range for tuple of 2 fields"
        );
    }

    #[test]
    fn test_open_message_names_path() {
        let err = Error::open(
            "/no/such/file",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/no/such/file"));
    }

    #[test]
    fn test_io_from() {
        let err: Error = io::Error::other("boom").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
