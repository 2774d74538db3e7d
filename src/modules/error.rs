//! Error types shared by backends, the namespace and the bootstrap policy.

use std::io;
use thiserror::Error;

/// Errors produced while resolving or reading assets.
#[derive(Debug, Error)]
pub enum Error {
    /// No layer at the resolved mount point contains the path.
    #[error("not found: {0}")]
    NotFound(String),

    /// A directory operation was applied to a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A file operation was applied to a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// The path is malformed or escapes the logical root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// An underlying failure, tagged with the label of the layer that hit it.
    #[error("{label}: {source}")]
    Backend {
        /// Label of the offending layer.
        label: String,
        /// The backend error.
        #[source]
        source: Box<Error>,
    },

    /// I/O error from a backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Archive decoding error.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The location of the running program could not be determined.
    #[error("cannot locate program: {0}")]
    ProgramLocation(#[source] io::Error),

    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Returns true if this error means "the path does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Attach a layer label to failures coming out of storage.
    ///
    /// Path-kind errors pass through untouched; only I/O and archive
    /// failures are wrapped.
    pub fn with_label(self, label: &str) -> Self {
        match self {
            Error::Io(_) | Error::Archive(_) => Error::Backend {
                label: label.to_string(),
                source: Box::new(self),
            },
            other => other,
        }
    }

    /// Point a path-kind error at `path` instead of the path the backend saw.
    pub fn at_path(self, path: &str) -> Self {
        match self {
            Error::NotFound(_) => Error::not_found(path),
            Error::NotADirectory(_) => Error::not_a_directory(path),
            Error::IsADirectory(_) => Error::is_a_directory(path),
            other => other,
        }
    }

    /// Map an `io::Error` from a filesystem call, keeping `NotFound` typed.
    ///
    /// A file used as an intermediate directory (`ENOTDIR`) also means the
    /// path does not exist.
    pub(crate) fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Error::not_found(path),
            _ => Error::Io(err),
        }
    }
}

/// Convert Error to std::io::Error for callers living in std-io land.
impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            Error::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            Error::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            Error::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            Error::Io(e) => e,
            other => io::Error::other(other.to_string()),
        }
    }
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
