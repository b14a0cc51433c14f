//! Object model for the object store readers.
//!
//! Objects come out of storage as a [`RawObject`]: a type tag plus the body
//! bytes. Only commits and annotated tags are ever interpreted further
//! ([`Commit`], [`Tag`]); trees and blobs stay opaque.

mod commit;
pub mod header;
mod tag;

pub use commit::Commit;
pub use tag::Tag;

use bstr::BString;
use git_hash::hasher::Hasher;
use git_hash::{HashError, ObjectId};
use git_utils::ErrorKind;

/// Errors produced by object operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object type: {0}")]
    InvalidType(BString),

    #[error("invalid object header: {0}")]
    InvalidHeader(String),

    #[error("truncated object: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid commit: missing '{field}' header")]
    MissingCommitField { field: &'static str },

    #[error("invalid tag: missing '{field}' header")]
    MissingTagField { field: &'static str },

    #[error("invalid {field} signature: {reason}")]
    InvalidSignature { field: &'static str, reason: String },

    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ObjectError {
    /// Every object error means the stored bytes are malformed.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Decode
    }
}

/// The four types of git objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    /// Parse from the type string in object headers.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        match s {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            b"tag" => Ok(Self::Tag),
            _ => Err(ObjectError::InvalidType(BString::from(s))),
        }
    }

    /// Map the 3-bit type code of a packed object header (1..=4).
    pub fn from_pack_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            _ => None,
        }
    }

    /// The 3-bit type code used in packed object headers.
    pub fn pack_code(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
        }
    }

    /// The canonical name as it appears in headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = ObjectError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// An object as read from storage: its type and its body, header stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub kind: ObjectType,
    pub data: Vec<u8>,
}

impl RawObject {
    pub fn new(kind: ObjectType, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Split inflated loose-object bytes (`"<type> <size>\0<body>"`).
    ///
    /// The declared size must match the body exactly.
    pub fn from_loose_bytes(mut bytes: Vec<u8>) -> Result<Self, ObjectError> {
        let header::Header { kind, size, len: header_len } = header::Header::parse(&bytes)?;
        let actual = bytes.len() - header_len;
        if actual != size {
            return Err(ObjectError::Truncated {
                expected: size,
                actual,
            });
        }
        bytes.drain(..header_len);
        Ok(Self { kind, data: bytes })
    }

    /// Compute the object id this object is stored under.
    pub fn compute_id(&self) -> Result<ObjectId, HashError> {
        Hasher::hash_object(self.kind.as_str(), &self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
