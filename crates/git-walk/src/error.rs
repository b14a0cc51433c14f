use std::path::PathBuf;

use git_hash::ObjectId;
use git_object::ObjectType;
use git_utils::ErrorKind;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a git repository (or any of the parent directories): {0}")]
    StoreNotFound(PathBuf),

    #[error("invalid git directory: {path}: {reason}")]
    InvalidGitDir { path: PathBuf, reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("tag chain starting at {oid} is deeper than {max}")]
    TagDepth { oid: ObjectId, max: usize },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Odb(#[from] git_odb::OdbError),

    #[error(transparent)]
    Ref(#[from] git_ref::RefError),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreNotFound(_) | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidGitDir { .. } => ErrorKind::InvalidInput,
            Self::TypeMismatch { .. } => ErrorKind::InvalidInput,
            Self::TagDepth { .. } => ErrorKind::Decode,
            Self::Io { source, .. } => ErrorKind::from_io(source),
            Self::Odb(e) => e.kind(),
            Self::Ref(e) => e.kind(),
            Self::Object(e) => e.kind(),
            Self::Task(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
