//! Errors raised by the content layer

use std::path::PathBuf;
use thiserror::Error;

/// Content loading and compilation errors.
///
/// None of these are recovered locally: a single failing document aborts
/// the listing, the compilation or the whole build.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to parse front-matter in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to compile {}: {message}", path.display())]
    Compile { path: PathBuf, message: String },

    #[error("Unknown id '{id}' in collection '{collection}'")]
    UnknownId { collection: String, id: String },

    #[error("Document '{id}' is missing required field '{field}'")]
    MissingField { id: String, field: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Map an IO error, turning `ErrorKind::NotFound` into [`ContentError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            ContentError::NotFound { path }
        } else {
            ContentError::Io { path, source: err }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}
