//! Delta instruction streams and the varints used around them.
//!
//! Delta format:
//! ```text
//! [source_size: varint] [target_size: varint]
//! [instruction]*
//! ```
//!
//! Instructions:
//! - Copy:   `[1SSSOOOO] [offset_bytes] [size_bytes]`
//! - Insert: `[0NNNNNNN] [N literal bytes]`
//!
//! OFS_DELTA entries carry a second, different varint: the backward distance
//! to their base, where every continuation adds one before shifting
//! ([`decode_backward_offset`]).

pub mod apply;

use crate::PackError;

/// Decode a little-endian base-128 size: `size += (byte & 0x7f) << (7 * i)`.
///
/// Returns `(size, new_pos)`.
pub fn decode_size(buf: &[u8], pos: usize) -> Result<(u64, usize), PackError> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    let mut pos = pos;
    loop {
        let byte = *buf.get(pos).ok_or_else(|| PackError::InvalidDelta {
            offset: pos as u64,
            reason: "truncated size varint".into(),
        })?;
        pos += 1;
        if shift >= 64 {
            return Err(PackError::InvalidDelta {
                offset: pos as u64,
                reason: "size varint overflows 64 bits".into(),
            });
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, pos));
        }
    }
}

/// Decode an OFS_DELTA backward offset.
///
/// Each continuation byte contributes `offset = (offset + 1) * 128 + (byte & 0x7f)`,
/// so two-byte encodings start at 128 rather than repeating one-byte values.
/// Returns `(offset, new_pos)`.
pub fn decode_backward_offset(buf: &[u8], pos: usize) -> Result<(u64, usize), PackError> {
    let truncated = |at: usize| PackError::CorruptEntry {
        offset: at as u64,
        reason: "truncated base offset".into(),
    };
    let mut pos = pos;
    let mut byte = *buf.get(pos).ok_or_else(|| truncated(pos))?;
    pos += 1;
    let mut offset = u64::from(byte & 0x7f);
    while byte & 0x80 != 0 {
        byte = *buf.get(pos).ok_or_else(|| truncated(pos))?;
        pos += 1;
        offset = offset
            .checked_add(1)
            .and_then(|o| o.checked_mul(128))
            .map(|o| o | u64::from(byte & 0x7f))
            .ok_or_else(|| PackError::CorruptEntry {
                offset: pos as u64,
                reason: "base offset overflows 64 bits".into(),
            })?;
    }
    Ok((offset, pos))
}

/// Encode a size varint (inverse of [`decode_size`]).
pub fn encode_size(mut value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return buf;
        }
        buf.push(byte | 0x80);
    }
}

/// Encode an OFS_DELTA backward offset (inverse of [`decode_backward_offset`]).
pub fn encode_backward_offset(offset: u64) -> Vec<u8> {
    let mut buf = vec![(offset & 0x7f) as u8];
    let mut off = offset >> 7;
    while off > 0 {
        off -= 1;
        buf.push(0x80 | (off & 0x7f) as u8);
        off >>= 7;
    }
    buf.reverse();
    buf
}

/// Encode a copy instruction. `size` must be in `1..=0xffffff`.
pub fn encode_copy(offset: u32, size: u32) -> Vec<u8> {
    let mut out = vec![0x80u8];
    for (i, b) in offset.to_le_bytes().iter().enumerate() {
        if *b != 0 {
            out[0] |= 1 << i;
            out.push(*b);
        }
    }
    // A zero size field means 0x10000.
    let size = if size == 0x10000 { 0 } else { size };
    for (i, b) in size.to_le_bytes()[..3].iter().enumerate() {
        if *b != 0 {
            out[0] |= 0x10 << i;
            out.push(*b);
        }
    }
    out
}

/// Encode an insert instruction. `data` must be 1..=127 bytes.
pub fn encode_insert(data: &[u8]) -> Vec<u8> {
    debug_assert!(!data.is_empty() && data.len() <= 127);
    let mut out = Vec::with_capacity(1 + data.len());
    out.push(data.len() as u8);
    out.extend_from_slice(data);
    out
}
