//! Apply delta instructions to reconstruct objects.

use super::decode_size;
use crate::PackError;

/// Upper bound on the output buffer reserved up front; the declared target
/// size comes from untrusted bytes.
const MAX_PREALLOC: usize = 16 << 20;

fn invalid(offset: usize, reason: impl Into<String>) -> PackError {
    PackError::InvalidDelta {
        offset: offset as u64,
        reason: reason.into(),
    }
}

/// Assemble a little-endian value from the bytes whose gate bit is set in `cmd`.
fn gated(cmd: u8, masks: &[u8], delta: &[u8], pos: &mut usize) -> Result<usize, PackError> {
    let mut value = 0usize;
    for (i, &mask) in masks.iter().enumerate() {
        if cmd & mask != 0 {
            let b = *delta
                .get(*pos)
                .ok_or_else(|| invalid(*pos, "truncated copy instruction"))?;
            value |= usize::from(b) << (8 * i);
            *pos += 1;
        }
    }
    Ok(value)
}

/// Apply a delta instruction stream to a base object, producing the target.
///
/// The declared source size must equal `base.len()`, every copy must stay
/// inside `base`, and the produced length must equal the declared target
/// size; any violation is an [`PackError::InvalidDelta`].
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PackError> {
    let (source_size, pos) = decode_size(delta, 0)?;
    let (target_size, mut pos) = decode_size(delta, pos)?;

    if source_size != base.len() as u64 {
        return Err(invalid(
            0,
            format!(
                "source size mismatch: delta says {source_size}, base is {}",
                base.len()
            ),
        ));
    }
    let target_size = usize::try_from(target_size)
        .map_err(|_| invalid(0, format!("target size {target_size} does not fit in memory")))?;

    let mut output = Vec::with_capacity(target_size.min(MAX_PREALLOC));

    while pos < delta.len() {
        let cmd = delta[pos];
        pos += 1;

        if cmd & 0x80 != 0 {
            let offset = gated(cmd, &[0x01, 0x02, 0x04, 0x08], delta, &mut pos)?;
            let size = match gated(cmd, &[0x10, 0x20, 0x40], delta, &mut pos)? {
                0 => 0x10000,
                n => n,
            };
            let end = offset
                .checked_add(size)
                .filter(|&end| end <= base.len())
                .ok_or_else(|| {
                    invalid(
                        pos,
                        format!(
                            "copy out of bounds: offset={offset}, size={size}, base_len={}",
                            base.len()
                        ),
                    )
                })?;
            if output.len() + size > target_size {
                return Err(invalid(pos, "copy overflows declared target size"));
            }
            output.extend_from_slice(&base[offset..end]);
        } else if cmd != 0 {
            let n = usize::from(cmd);
            let literal = delta
                .get(pos..pos + n)
                .ok_or_else(|| invalid(pos, "truncated insert data"))?;
            if output.len() + n > target_size {
                return Err(invalid(pos, "insert overflows declared target size"));
            }
            output.extend_from_slice(literal);
            pos += n;
        } else {
            return Err(invalid(pos - 1, "unexpected delta opcode 0"));
        }
    }

    if output.len() != target_size {
        return Err(invalid(
            pos,
            format!(
                "target size mismatch: delta says {target_size}, got {}",
                output.len()
            ),
        ));
    }

    Ok(output)
}
