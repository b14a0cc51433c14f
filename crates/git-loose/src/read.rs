use std::io::Read;

use flate2::read::ZlibDecoder;
use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::{header, ObjectType, RawObject};
use git_utils::io::FileKind;
use tracing::trace;

use crate::{LooseError, LooseObjectStore};

/// Inflated prefix large enough to hold any object header.
const HEADER_PROBE: usize = 64;

impl LooseObjectStore {
    /// Check if a loose object file exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.io.kind_of(&self.object_path(oid)) == Some(FileKind::File)
    }

    /// Read a loose object by OID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` if the object exists but is corrupt.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<RawObject>, LooseError> {
        let Some(inflated) = self.read_inflated(oid)? else {
            return Ok(None);
        };
        let obj = RawObject::from_loose_bytes(inflated)?;
        trace!(%oid, kind = %obj.kind, size = obj.len(), "read loose object");
        Ok(Some(obj))
    }

    /// Read just the header (type + size) without inflating the full content.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_header(&self, oid: &ObjectId) -> Result<Option<(ObjectType, usize)>, LooseError> {
        let path = self.object_path(oid);
        let Some(compressed) = self
            .io
            .read_optional(&path)
            .map_err(|source| LooseError::Io { path, source })?
        else {
            return Ok(None);
        };

        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut buf = [0u8; HEADER_PROBE];
        let mut filled = 0;
        while !buf[..filled].contains(&0) {
            if filled == buf.len() {
                return Err(LooseError::Corrupt {
                    oid: *oid,
                    reason: format!("header exceeds {HEADER_PROBE} bytes"),
                });
            }
            let n = decoder
                .read(&mut buf[filled..])
                .map_err(|source| LooseError::Decompress { oid: *oid, source })?;
            if n == 0 {
                return Err(LooseError::Corrupt {
                    oid: *oid,
                    reason: "unexpected EOF before header null terminator".into(),
                });
            }
            filled += n;
        }

        let header = header::Header::parse(&buf[..filled])?;
        Ok(Some((header.kind, header.size)))
    }

    /// Read a loose object and verify its hash matches the expected OID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    pub fn read_verified(&self, oid: &ObjectId) -> Result<Option<RawObject>, LooseError> {
        let Some(inflated) = self.read_inflated(oid)? else {
            return Ok(None);
        };

        // The id covers header and content together.
        let mut hasher = Hasher::new();
        hasher.update(&inflated);
        let actual = hasher.finalize()?;
        if actual != *oid {
            return Err(LooseError::HashMismatch {
                path: self.object_path(oid),
                expected: *oid,
                actual,
            });
        }

        Ok(Some(RawObject::from_loose_bytes(inflated)?))
    }

    fn read_inflated(&self, oid: &ObjectId) -> Result<Option<Vec<u8>>, LooseError> {
        let path = self.object_path(oid);
        let compressed = match self.io.read_optional(&path) {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(None),
            Err(source) => return Err(LooseError::Io { path, source }),
        };

        let mut inflated = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut inflated)
            .map_err(|source| LooseError::Decompress { oid: *oid, source })?;
        Ok(Some(inflated))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use git_utils::io::FsIo;
    use git_utils::ErrorKind;

    use crate::test_support::{write_loose, write_loose_raw};
    use crate::*;
    use git_object::ObjectType;

    fn store(dir: &tempfile::TempDir) -> LooseObjectStore {
        LooseObjectStore::open(Arc::new(FsIo), dir.path())
    }

    #[test]
    fn read_written_blob() {
        let dir = tempfile::tempdir().unwrap();
        let oid = write_loose(dir.path(), ObjectType::Blob, b"hello world\n").unwrap();
        assert_eq!(oid.to_hex(), "3b18e512dba79e4c8300dd08aeb37f8e728b8dad");

        let store = store(&dir);
        assert!(store.contains(&oid));
        let obj = store.read(&oid).unwrap().unwrap();
        assert_eq!(obj.kind, ObjectType::Blob);
        assert_eq!(obj.data, b"hello world\n");
        assert_eq!(
            store.read_header(&oid).unwrap(),
            Some((ObjectType::Blob, 12))
        );
    }

    #[test]
    fn missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let oid = ObjectId::from([0x12; 20]);
        assert!(!store.contains(&oid));
        assert!(store.read(&oid).unwrap().is_none());
        assert!(store.read_header(&oid).unwrap().is_none());
        assert!(store.read_verified(&oid).unwrap().is_none());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let oid = ObjectId::from([0x34; 20]);
        write_loose_raw(dir.path(), &oid, b"not zlib at all").unwrap();
        let err = store(&dir).read(&oid).unwrap_err();
        assert!(matches!(err, LooseError::Decompress { .. }));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let oid = ObjectId::from([0x56; 20]);
        let body = crate::test_support::deflate(b"blob 10\0short");
        write_loose_raw(dir.path(), &oid, &body).unwrap();
        let err = store(&dir).read(&oid).unwrap_err();
        assert!(matches!(err, LooseError::Object(_)));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn verified_read_detects_wrong_name() {
        let dir = tempfile::tempdir().unwrap();
        let real = write_loose(dir.path(), ObjectType::Blob, b"content").unwrap();
        let store = store(&dir);
        assert!(store.read_verified(&real).unwrap().is_some());

        let wrong = ObjectId::from([0x78; 20]);
        let bytes = std::fs::read(store.object_path(&real)).unwrap();
        write_loose_raw(dir.path(), &wrong, &bytes).unwrap();
        assert!(store.read(&wrong).unwrap().is_some());
        assert!(matches!(
            store.read_verified(&wrong),
            Err(LooseError::HashMismatch { .. })
        ));
    }

    #[test]
    fn directory_in_place_of_object_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let oid = ObjectId::from([0x9a; 20]);
        std::fs::create_dir_all(dir.path().join(oid.loose_path())).unwrap();
        let err = store(&dir).read(&oid).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
