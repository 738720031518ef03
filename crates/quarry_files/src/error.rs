//! Error types for project file operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing project files.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// An I/O error occurred while reading or writing a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A path escaped the project root.
    #[error("path {path} is outside the project root")]
    OutsideRoot {
        /// The offending path.
        path: PathBuf,
    },
}
