//! Pack and index writer for test fixtures.
//!
//! Produces byte-exact v2 packs and indexes (real CRCs, real checksums) so
//! tests in this workspace can exercise the reader against stores built on
//! the fly, including deltas and deliberately broken entries.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use git_hash::fanout::FanoutTable;
use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::ObjectType;

use crate::delta::{encode_backward_offset, encode_copy, encode_insert, encode_size};
use crate::entry::encode_entry_header;
use crate::{IDX_SIGNATURE, IDX_VERSION, OBJ_OFS_DELTA, OBJ_REF_DELTA, PACK_SIGNATURE, PACK_VERSION};

/// zlib-compress `data`.
pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).expect("write to Vec");
    enc.finish().expect("finish zlib stream")
}

/// Build a delta turning `base` into `target`: copy the common prefix and
/// suffix from the base, insert the middle literally.
pub fn make_delta(base: &[u8], target: &[u8]) -> Vec<u8> {
    let prefix = base
        .iter()
        .zip(target)
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = base.len().min(target.len()) - prefix;
    let suffix = base
        .iter()
        .rev()
        .zip(target.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let mut delta = encode_size(base.len() as u64);
    delta.extend_from_slice(&encode_size(target.len() as u64));
    push_copies(&mut delta, 0, prefix);
    for chunk in target[prefix..target.len() - suffix].chunks(127) {
        delta.extend_from_slice(&encode_insert(chunk));
    }
    push_copies(&mut delta, base.len() - suffix, suffix);
    delta
}

fn push_copies(delta: &mut Vec<u8>, mut offset: usize, mut len: usize) {
    while len > 0 {
        let n = len.min(0x10000);
        delta.extend_from_slice(&encode_copy(offset as u32, n as u32));
        offset += n;
        len -= n;
    }
}

/// Build a v2 `.idx` from `(oid, offset, crc32)` entries, with a zero pack checksum.
pub fn build_index(entries: &[(ObjectId, u64, u32)]) -> Vec<u8> {
    build_index_with_checksum(entries, &[0u8; 20])
}

fn build_index_with_checksum(entries: &[(ObjectId, u64, u32)], pack_checksum: &[u8]) -> Vec<u8> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let oids: Vec<ObjectId> = sorted.iter().map(|e| e.0).collect();

    let mut buf = Vec::new();
    buf.extend_from_slice(&IDX_SIGNATURE);
    buf.extend_from_slice(&IDX_VERSION.to_be_bytes());
    buf.extend_from_slice(&FanoutTable::build(&oids).to_bytes());
    for oid in &oids {
        buf.extend_from_slice(oid.as_bytes());
    }
    for (_, _, crc) in &sorted {
        buf.extend_from_slice(&crc.to_be_bytes());
    }
    for (_, offset, _) in &sorted {
        buf.extend_from_slice(&(*offset as u32).to_be_bytes());
    }
    buf.extend_from_slice(pack_checksum);
    let mut h = Hasher::new();
    h.update(&buf);
    let idx_checksum = h.finalize().expect("hash index");
    buf.extend_from_slice(idx_checksum.as_bytes());
    buf
}

/// Incrementally written packfile.
#[derive(Default)]
pub struct PackBuilder {
    data: Vec<u8>,
    count: u32,
    entries: Vec<(ObjectId, u64, u32)>,
    objects: HashMap<ObjectId, (u64, ObjectType, Vec<u8>)>,
}

impl PackBuilder {
    pub fn new() -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(PACK_SIGNATURE);
        data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        Self {
            data,
            ..Self::default()
        }
    }

    /// Offset the next entry will be written at.
    pub fn next_offset(&self) -> u64 {
        self.data.len() as u64
    }

    /// Append an entry with arbitrary header bytes and an uncompressed
    /// payload, indexed under `oid`. Returns the entry offset.
    pub fn add_raw(&mut self, oid: ObjectId, header: &[u8], payload: &[u8]) -> u64 {
        self.add_raw_compressed(oid, header, &zlib(payload))
    }

    /// Like [`add_raw`](Self::add_raw) but the payload is written as given.
    pub fn add_raw_compressed(&mut self, oid: ObjectId, header: &[u8], payload: &[u8]) -> u64 {
        let offset = self.next_offset();
        let mut crc = crc32fast::Hasher::new();
        crc.update(header);
        crc.update(payload);
        self.data.extend_from_slice(header);
        self.data.extend_from_slice(payload);
        self.entries.push((oid, offset, crc.finalize()));
        self.count += 1;
        offset
    }

    /// Append a whole (non-delta) object.
    pub fn add(&mut self, kind: ObjectType, body: &[u8]) -> ObjectId {
        let oid = Hasher::hash_object(kind.as_str(), body).expect("hash fixture object");
        let header = encode_entry_header(kind.pack_code(), body.len() as u64);
        let offset = self.add_raw(oid, &header, body);
        self.objects.insert(oid, (offset, kind, body.to_vec()));
        oid
    }

    /// Append `body` as an OFS_DELTA against `base`, which must already be in this pack.
    pub fn add_ofs_delta(&mut self, base: &ObjectId, body: &[u8]) -> ObjectId {
        let (base_offset, kind, base_body) = self.objects[base].clone();
        let delta = make_delta(&base_body, body);
        let oid = Hasher::hash_object(kind.as_str(), body).expect("hash fixture object");
        let offset = self.next_offset();
        let mut header = encode_entry_header(OBJ_OFS_DELTA, delta.len() as u64);
        header.extend_from_slice(&encode_backward_offset(offset - base_offset));
        self.add_raw(oid, &header, &delta);
        self.objects.insert(oid, (offset, kind, body.to_vec()));
        oid
    }

    /// Append `body` as a REF_DELTA against a base that may live anywhere.
    pub fn add_ref_delta(
        &mut self,
        base_oid: &ObjectId,
        base_kind: ObjectType,
        base_body: &[u8],
        body: &[u8],
    ) -> ObjectId {
        let delta = make_delta(base_body, body);
        let oid = Hasher::hash_object(base_kind.as_str(), body).expect("hash fixture object");
        let mut header = encode_entry_header(OBJ_REF_DELTA, delta.len() as u64);
        header.extend_from_slice(base_oid.as_bytes());
        let offset = self.add_raw(oid, &header, &delta);
        self.objects.insert(oid, (offset, base_kind, body.to_vec()));
        oid
    }

    /// Offset of an object added through the typed helpers.
    pub fn offset_of(&self, oid: &ObjectId) -> Option<u64> {
        self.objects.get(oid).map(|(offset, _, _)| *offset)
    }

    /// Finish the pack. Returns `(pack bytes, idx bytes)`.
    pub fn finish(mut self) -> (Vec<u8>, Vec<u8>) {
        self.data[8..12].copy_from_slice(&self.count.to_be_bytes());
        let mut h = Hasher::new();
        h.update(&self.data);
        let checksum = h.finalize().expect("hash pack");
        self.data.extend_from_slice(checksum.as_bytes());
        let idx = build_index_with_checksum(&self.entries, checksum.as_bytes());
        (self.data, idx)
    }

    /// Write `pack-<name>.pack` and `pack-<name>.idx` under `objects_dir/pack`.
    pub fn write(self, objects_dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let pack_dir = objects_dir.join("pack");
        std::fs::create_dir_all(&pack_dir)?;
        let (pack, idx) = self.finish();
        let pack_path = pack_dir.join(format!("pack-{name}.pack"));
        std::fs::write(&pack_path, pack)?;
        std::fs::write(pack_dir.join(format!("pack-{name}.idx")), idx)?;
        Ok(pack_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::apply::apply_delta;

    #[test]
    fn make_delta_reproduces_target() {
        let cases: &[(&[u8], &[u8])] = &[
            (b"Hello, base world!", b"Hello, target world!"),
            (b"abc", b"abc"),
            (b"", b"new content"),
            (b"old content", b""),
            (b"aaaa", b"aa"),
        ];
        for (base, target) in cases {
            let delta = make_delta(base, target);
            assert_eq!(&apply_delta(base, &delta).unwrap(), target);
        }
    }

    #[test]
    fn long_insert_is_chunked() {
        let target = vec![b'x'; 300];
        let delta = make_delta(b"", &target);
        assert_eq!(apply_delta(b"", &delta).unwrap(), target);
    }
}
