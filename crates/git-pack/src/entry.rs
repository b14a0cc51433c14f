//! Packed object header parsing.

use git_hash::{ObjectId, OID_LEN};
use git_object::ObjectType;

use crate::delta::decode_backward_offset;
use crate::{PackEntryType, PackError, OBJ_OFS_DELTA, OBJ_REF_DELTA};

/// Bytes to read at an entry offset to be sure the whole header is present:
/// up to 10 size bytes plus a 20-byte base hash or a 10-byte base offset.
pub const MAX_HEADER_LEN: usize = 32;

/// The header of one packed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub entry_type: PackEntryType,
    /// Inflated size of the entry's zlib payload (the delta stream, for deltas).
    pub declared_size: u64,
    /// Bytes from the entry offset to the start of the zlib payload,
    /// including any base offset or base hash.
    pub header_len: usize,
}

impl EntryHeader {
    /// Absolute offset of the zlib payload.
    pub fn data_offset(&self, entry_offset: u64) -> u64 {
        entry_offset + self.header_len as u64
    }
}

fn corrupt(offset: u64, reason: impl Into<String>) -> PackError {
    PackError::CorruptEntry {
        offset,
        reason: reason.into(),
    }
}

/// Parse the header of the entry at `entry_offset`; `data` starts at that offset.
///
/// Type is bits 4-6 of the first byte; the size starts with its low 4 bits
/// and continues in 7-bit groups while the high bit is set.
pub fn parse_entry_header(data: &[u8], entry_offset: u64) -> Result<EntryHeader, PackError> {
    let first = *data
        .first()
        .ok_or_else(|| corrupt(entry_offset, "entry header past end of pack"))?;
    let type_num = (first >> 4) & 0x07;
    let mut size = u64::from(first & 0x0f);
    let mut shift = 4u32;
    let mut pos = 1;
    let mut byte = first;
    while byte & 0x80 != 0 {
        byte = *data
            .get(pos)
            .ok_or_else(|| corrupt(entry_offset, "truncated size"))?;
        pos += 1;
        if shift >= 64 {
            return Err(corrupt(entry_offset, "size overflows 64 bits"));
        }
        size |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }

    let entry_type = match type_num {
        OBJ_OFS_DELTA => {
            let (distance, next) = decode_backward_offset(data, pos)
                .map_err(|_| corrupt(entry_offset, "truncated base offset"))?;
            pos = next;
            if distance > entry_offset {
                return Err(corrupt(
                    entry_offset,
                    format!("base offset {distance} points before start of pack"),
                ));
            }
            PackEntryType::OfsDelta {
                base_offset: entry_offset - distance,
            }
        }
        OBJ_REF_DELTA => {
            let raw = data
                .get(pos..pos + OID_LEN)
                .ok_or_else(|| corrupt(entry_offset, "truncated base hash"))?;
            pos += OID_LEN;
            PackEntryType::RefDelta {
                base_oid: ObjectId::from_bytes(raw)?,
            }
        }
        code => match ObjectType::from_pack_code(code) {
            Some(ObjectType::Commit) => PackEntryType::Commit,
            Some(ObjectType::Tree) => PackEntryType::Tree,
            Some(ObjectType::Blob) => PackEntryType::Blob,
            Some(ObjectType::Tag) => PackEntryType::Tag,
            None => return Err(corrupt(entry_offset, format!("invalid object type {code}"))),
        },
    };

    Ok(EntryHeader {
        entry_type,
        declared_size: size,
        header_len: pos,
    })
}

/// Encode the type/size prefix of an entry header.
///
/// For deltas the caller appends the base offset or base hash.
pub fn encode_entry_header(type_num: u8, size: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    let mut c = (type_num << 4) | (size & 0x0f) as u8;
    let mut rest = size >> 4;
    while rest > 0 {
        buf.push(c | 0x80);
        c = (rest & 0x7f) as u8;
        rest >>= 7;
    }
    buf.push(c);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::encode_backward_offset;

    #[test]
    fn small_blob_header() {
        // type 3, size 10: single byte 0b0011_1010.
        let hdr = parse_entry_header(&[0x3a, 0xff], 12).unwrap();
        assert_eq!(hdr.entry_type, PackEntryType::Blob);
        assert_eq!(hdr.declared_size, 10);
        assert_eq!(hdr.header_len, 1);
        assert_eq!(hdr.data_offset(12), 13);
    }

    #[test]
    fn size_continuation_scales_by_16_then_128() {
        // 0x95 = cont | commit | low nibble 5; 0x83 = cont | 3; 0x01.
        // size = 5 + 3 * 16 + 1 * 16 * 128.
        let hdr = parse_entry_header(&[0x95, 0x83, 0x01], 0).unwrap();
        assert_eq!(hdr.entry_type, PackEntryType::Commit);
        assert_eq!(hdr.declared_size, 5 + 3 * 16 + 16 * 128);
        assert_eq!(hdr.header_len, 3);
    }

    #[test]
    fn encoded_header_parses_back() {
        for size in [0u64, 15, 16, 2047, 2048, 1 << 30] {
            let bytes = encode_entry_header(2, size);
            let hdr = parse_entry_header(&bytes, 0).unwrap();
            assert_eq!(hdr.entry_type, PackEntryType::Tree);
            assert_eq!(hdr.declared_size, size);
            assert_eq!(hdr.header_len, bytes.len());
        }
    }

    #[test]
    fn ofs_delta_base_is_absolute() {
        let mut bytes = encode_entry_header(OBJ_OFS_DELTA, 7);
        bytes.extend_from_slice(&encode_backward_offset(200));
        let hdr = parse_entry_header(&bytes, 1000).unwrap();
        assert_eq!(hdr.entry_type, PackEntryType::OfsDelta { base_offset: 800 });
        assert_eq!(hdr.header_len, bytes.len());
    }

    #[test]
    fn ofs_delta_before_pack_start() {
        let mut bytes = encode_entry_header(OBJ_OFS_DELTA, 7);
        bytes.extend_from_slice(&encode_backward_offset(50));
        assert!(parse_entry_header(&bytes, 20).is_err());
    }

    #[test]
    fn ref_delta_reads_base_hash() {
        let base = ObjectId::from([0xab; 20]);
        let mut bytes = encode_entry_header(OBJ_REF_DELTA, 9);
        bytes.extend_from_slice(base.as_bytes());
        let hdr = parse_entry_header(&bytes, 12).unwrap();
        assert_eq!(hdr.entry_type, PackEntryType::RefDelta { base_oid: base });
        assert_eq!(hdr.header_len, 21);
    }

    #[test]
    fn invalid_and_truncated_headers() {
        assert!(parse_entry_header(&[], 0).is_err());
        // Type 5 is reserved.
        assert!(parse_entry_header(&[0x50], 0).is_err());
        // Continuation bit with no following byte.
        assert!(parse_entry_header(&[0xb0], 0).is_err());
        // REF_DELTA with a short hash.
        assert!(parse_entry_header(&[0x70, 1, 2, 3], 0).is_err());
    }
}
