use crate::{HashError, ObjectId};

/// Size in bytes of the on-disk fan-out table.
pub const FANOUT_BYTES: usize = 256 * 4;

/// The cumulative first-byte counts at the head of a pack index.
///
/// Slot `b` counts the ids whose first byte is `<= b`; the last slot is the
/// number of objects in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutTable([u32; 256]);

impl FanoutTable {
    /// Count `oids` by first byte. Order does not matter.
    pub fn build(oids: &[ObjectId]) -> Self {
        let mut slots = [0u32; 256];
        for oid in oids {
            slots[usize::from(oid.first_byte())] += 1;
        }
        let mut running = 0;
        for slot in &mut slots {
            running += *slot;
            *slot = running;
        }
        Self(slots)
    }

    /// Parse the first [`FANOUT_BYTES`] of `data` as big-endian counts.
    ///
    /// Counts must never decrease from one slot to the next.
    pub fn from_bytes(data: &[u8]) -> Result<Self, HashError> {
        let raw = data
            .get(..FANOUT_BYTES)
            .ok_or(HashError::InvalidHashLength {
                expected: FANOUT_BYTES,
                actual: data.len(),
            })?;
        let mut slots = [0u32; 256];
        let mut previous = 0;
        for (bucket, (slot, be)) in slots.iter_mut().zip(raw.chunks_exact(4)).enumerate() {
            *slot = u32::from_be_bytes([be[0], be[1], be[2], be[3]]);
            if *slot < previous {
                return Err(HashError::NonMonotonicFanout { bucket });
            }
            previous = *slot;
        }
        Ok(Self(slots))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|n| n.to_be_bytes()).collect()
    }

    /// Number of objects the owning index lists.
    pub fn object_count(&self) -> u32 {
        self.0[255]
    }
}
