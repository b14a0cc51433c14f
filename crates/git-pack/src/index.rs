//! Pack index (v2) parsing.
//!
//! ```text
//! Header:  \xff tOc (4 bytes) | version (4 bytes = 2)
//! Fanout:  256 × 4-byte big-endian cumulative counts
//! OIDs:    N × 20-byte sorted OIDs
//! CRC32:   N × 4-byte CRC32 values
//! Offsets: N × 4-byte offsets (high bit = 1 → use 64-bit table)
//! 64-bit:  M × 8-byte offsets (for packs > 2GB)
//! Trailer: 20-byte pack checksum | 20-byte index checksum
//! ```
//!
//! The fan-out table is only used for the object count; lookups go through
//! the hash map built by [`PackStore`](crate::PackStore). Entries that need
//! the 64-bit table are rejected as unsupported.

use std::path::Path;

use git_hash::fanout::{FanoutTable, FANOUT_BYTES};
use git_hash::{ObjectId, OID_LEN};

use crate::{PackError, IDX_SIGNATURE, IDX_VERSION};

const HEADER_LEN: usize = 8;
const LARGE_OFFSET_FLAG: u32 = 0x8000_0000;

/// The `(oid, offset)` pairs of one `.idx` file, in index (hash) order.
#[derive(Debug, Clone, Default)]
pub struct PackIndex {
    entries: Vec<(ObjectId, u64)>,
}

impl PackIndex {
    /// Parse the bytes of a v2 `.idx` file. `path` is used in errors only.
    pub fn parse(data: &[u8], path: &Path) -> Result<Self, PackError> {
        let invalid = |reason: String| PackError::InvalidIndex {
            path: path.to_path_buf(),
            reason,
        };
        let unsupported = |reason: String| PackError::UnsupportedIndex {
            path: path.to_path_buf(),
            reason,
        };

        if data.len() < HEADER_LEN {
            return Err(invalid(format!("file too small: {} bytes", data.len())));
        }
        if data[..4] != IDX_SIGNATURE {
            return Err(unsupported("missing v2 signature (version 1 index?)".into()));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != IDX_VERSION {
            return Err(unsupported(format!(
                "version {version}, expected {IDX_VERSION}"
            )));
        }
        if data.len() < HEADER_LEN + FANOUT_BYTES {
            return Err(invalid("truncated fan-out table".into()));
        }

        let fanout = FanoutTable::from_bytes(&data[HEADER_LEN..HEADER_LEN + FANOUT_BYTES])
            .map_err(|e| invalid(e.to_string()))?;
        let n = fanout.object_count() as usize;

        let oid_start = HEADER_LEN + FANOUT_BYTES;
        let crc_start = oid_start + n * OID_LEN;
        let offset_start = crc_start + n * 4;
        let offset_end = offset_start + n * 4;
        if data.len() < offset_end {
            return Err(invalid(format!(
                "truncated: {n} objects need {offset_end} bytes, file has {}",
                data.len()
            )));
        }

        let oids = data[oid_start..crc_start].chunks_exact(OID_LEN);
        let offsets = data[offset_start..offset_end].chunks_exact(4);
        let mut entries = Vec::with_capacity(n);
        for (raw_oid, raw_offset) in oids.zip(offsets) {
            let oid = ObjectId::from_bytes(raw_oid)?;
            let offset = u32::from_be_bytes([raw_offset[0], raw_offset[1], raw_offset[2], raw_offset[3]]);
            if offset & LARGE_OFFSET_FLAG != 0 {
                return Err(unsupported(format!(
                    "object {oid} needs the 64-bit offset table"
                )));
            }
            entries.push((oid, u64::from(offset)));
        }

        Ok(Self { entries })
    }

    /// Number of objects in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(oid, pack offset)` pairs in hash order.
    pub fn entries(&self) -> &[(ObjectId, u64)] {
        &self.entries
    }
}
