//! Loose object storage.
//!
//! Each loose object lives at `objects/XX/YYYY...` where `XX` is the first
//! byte of the OID in hex and `YYYY...` is the rest. The file content is
//! zlib-compressed `"<type> <size>\0<content>"`.

mod read;
#[cfg(any(test, feature = "testing"))]
pub mod test_support;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git_hash::ObjectId;
use git_utils::io::StoreIo;
use git_utils::ErrorKind;

/// Read access to one `objects/` directory.
#[derive(Debug, Clone)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    io: Arc<dyn StoreIo>,
}

impl LooseObjectStore {
    /// Open the loose object store at `objects_dir`. Nothing is read until
    /// the first lookup.
    pub fn open(io: Arc<dyn StoreIo>, objects_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            io,
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Get the file path for a given OID.
    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.loose_path())
    }
}

/// Errors from loose object operations.
#[derive(Debug, thiserror::Error)]
pub enum LooseError {
    #[error("corrupt loose object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: ObjectId,
        #[source]
        source: std::io::Error,
    },

    #[error("hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: ObjectId,
        actual: ObjectId,
    },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("object parse error: {0}")]
    Object(#[from] git_object::ObjectError),

    #[error("hash error: {0}")]
    Hash(#[from] git_hash::HashError),
}

impl LooseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { source, .. } => ErrorKind::from_io(source),
            _ => ErrorKind::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_utils::io::FsIo;

    #[test]
    fn object_path_fans_out_on_first_byte() {
        let store = LooseObjectStore::open(Arc::new(FsIo), "/tmp/objects");
        let oid = ObjectId::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
        assert_eq!(
            store.object_path(&oid),
            PathBuf::from("/tmp/objects/da/39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }
}
