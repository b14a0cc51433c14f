use std::path::PathBuf;

use git_utils::ErrorKind;

use crate::RefCategory;

/// Error types for reference operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("ref not found: {category}/{name}")]
    NotFound { category: RefCategory, name: String },

    #[error("HEAD not found in {0}")]
    MissingHead(PathBuf),

    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::MissingHead(_) => ErrorKind::NotFound,
            Self::Parse { .. } => ErrorKind::Decode,
            Self::Io { source, .. } => ErrorKind::from_io(source),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
