//! Loose object writer for test fixtures.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::{header, ObjectType};

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).expect("write to Vec");
    enc.finish().expect("finish zlib stream")
}

/// Store `body` as a loose object under `objects_dir`. Returns its id.
pub fn write_loose(objects_dir: &Path, kind: ObjectType, body: &[u8]) -> io::Result<ObjectId> {
    let mut raw = header::Header::encode(kind, body.len());
    raw.extend_from_slice(body);
    let mut hasher = Hasher::new();
    hasher.update(&raw);
    let oid = hasher
        .finalize()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    write_loose_raw(objects_dir, &oid, &deflate(&raw))?;
    Ok(oid)
}

/// Write `bytes` verbatim as the file for `oid`.
pub fn write_loose_raw(objects_dir: &Path, oid: &ObjectId, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = objects_dir.join(oid.loose_path());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;
    Ok(path)
}
