//! Packfile reading: index parsing, delta resolution, and caching.
//!
//! A [`PackStore`] indexes every `*.idx` under `objects/pack` of one store
//! directory and resolves packed objects by hash, following OFS_DELTA and
//! REF_DELTA chains. Resolved bytes are kept in a bounded LRU keyed by
//! `(pack, offset)`. [`PackStoreRegistry`] builds each store at most once
//! per directory.

pub mod cache;
pub mod delta;
pub mod entry;
pub mod index;
pub mod registry;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod test_support;

pub use registry::PackStoreRegistry;
pub use store::{PackIndexEntry, PackStore, PackStoreOptions};

use std::path::PathBuf;

use git_hash::ObjectId;
use git_object::ObjectType;
use git_utils::ErrorKind;

/// Errors that can occur during pack operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack index {path}: {reason}")]
    InvalidIndex { path: PathBuf, reason: String },

    #[error("unsupported pack index {path}: {reason}")]
    UnsupportedIndex { path: PathBuf, reason: String },

    #[error("invalid delta at offset {offset}: {reason}")]
    InvalidDelta { offset: u64, reason: String },

    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("failed to inflate pack entry at offset {offset}: {source}")]
    Inflate {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("delta base not found: {0}")]
    MissingBase(ObjectId),

    #[error("delta chain loops back to offset {offset}")]
    DeltaCycle { offset: u64 },

    #[error("delta chain too deep (>{max_depth} levels) at offset {offset}")]
    DeltaChainTooDeep { offset: u64, max_depth: usize },

    #[error("resolving delta base {oid}: {source}")]
    Base {
        oid: ObjectId,
        kind: ErrorKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("pack I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] git_hash::HashError),
}

impl PackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedIndex { .. } => ErrorKind::UnsupportedFormat,
            Self::Io { .. } => ErrorKind::Io,
            Self::Base { kind, .. } => *kind,
            Self::InvalidIndex { .. }
            | Self::InvalidDelta { .. }
            | Self::CorruptEntry { .. }
            | Self::Inflate { .. }
            | Self::MissingBase(_)
            | Self::DeltaCycle { .. }
            | Self::DeltaChainTooDeep { .. }
            | Self::Object(_)
            | Self::Hash(_) => ErrorKind::Decode,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Type of a packed object entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEntryType {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta against the entry at this absolute offset in the same pack.
    OfsDelta { base_offset: u64 },
    /// Delta against the object with this id, wherever it is stored.
    RefDelta { base_oid: ObjectId },
}

impl PackEntryType {
    /// Convert a non-delta pack entry type to an ObjectType.
    pub fn to_object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag => Some(ObjectType::Tag),
            Self::OfsDelta { .. } | Self::RefDelta { .. } => None,
        }
    }

    /// Type number as used in pack entry headers.
    pub fn type_number(&self) -> u8 {
        match self {
            Self::OfsDelta { .. } => OBJ_OFS_DELTA,
            Self::RefDelta { .. } => OBJ_REF_DELTA,
            base => base.to_object_type().map_or(0, |t| t.pack_code()),
        }
    }
}

pub const OBJ_OFS_DELTA: u8 = 6;
pub const OBJ_REF_DELTA: u8 = 7;

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Pack index v2 constants.
pub const IDX_SIGNATURE: [u8; 4] = [0xff, 0x74, 0x4f, 0x63]; // "\377tOc"
pub const IDX_VERSION: u32 = 2;

/// Default limit on delta chain length before resolution bails out.
pub const MAX_DELTA_CHAIN_DEPTH: usize = 512;
