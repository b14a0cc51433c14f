use std::io;

/// Base error type for git-utils operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("date parse error: {0}")]
    DateParse(String),

    #[error("signature parse error: {0}")]
    SignatureParse(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl UtilError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DateParse(_) | Self::SignatureParse(_) => ErrorKind::Decode,
            Self::Io(err) => ErrorKind::from_io(err),
        }
    }
}

/// Coarse classification shared by every error type in the workspace.
///
/// Callers branch on this rather than on concrete variants: `NotFound` is an
/// expected outcome (a missing ref, an object absent from a pack index),
/// while the others terminate the resolution that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A hash, ref, or file that was asked for does not exist.
    NotFound,
    /// The store uses a format revision this reader does not handle.
    UnsupportedFormat,
    /// Bytes on disk are malformed: bad delta, bad header, failed inflate.
    Decode,
    /// The filesystem failed underneath us.
    Io,
    /// The caller asked for something that cannot be satisfied, such as
    /// resolving a tree as a commit.
    InvalidInput,
}

impl ErrorKind {
    /// Classify an I/O error: a missing file is `NotFound`, anything else is `Io`.
    pub fn from_io(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::UnsupportedFormat => "unsupported format",
            Self::Decode => "decode error",
            Self::Io => "I/O error",
            Self::InvalidInput => "invalid input",
        };
        f.write_str(s)
    }
}
