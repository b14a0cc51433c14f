//! The `"<type> <size>\0"` prefix of loose objects and of hashed content.

use crate::{ObjectError, ObjectType};

/// A decoded object header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: ObjectType,
    /// Declared body length.
    pub size: usize,
    /// Bytes taken by the header itself, NUL included.
    pub len: usize,
}

impl Header {
    /// Decode the header at the start of `data`. The body need not be present.
    pub fn parse(data: &[u8]) -> Result<Self, ObjectError> {
        let nul = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ObjectError::InvalidHeader("no NUL after header".into()))?;
        let mut fields = data[..nul].splitn(2, |&b| b == b' ');
        let (Some(kind), Some(size)) = (fields.next(), fields.next()) else {
            return Err(ObjectError::InvalidHeader("expected `<type> <size>`".into()));
        };

        let kind = ObjectType::from_bytes(kind)?;
        let size = parse_decimal(size).ok_or_else(|| {
            ObjectError::InvalidHeader(format!(
                "bad size {:?}",
                String::from_utf8_lossy(size)
            ))
        })?;
        Ok(Self {
            kind,
            size,
            len: nul + 1,
        })
    }

    pub fn encode(kind: ObjectType, size: usize) -> Vec<u8> {
        format!("{kind} {size}\0").into_bytes()
    }
}

/// Plain ASCII digits only; no sign, no whitespace.
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0usize, |acc, &d| {
        if !d.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(usize::from(d - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_follows_header() {
        let data = b"blob 12\0hello world!";
        let header = Header::parse(data).unwrap();
        assert_eq!(
            header,
            Header {
                kind: ObjectType::Blob,
                size: 12,
                len: 8
            }
        );
        assert_eq!(&data[header.len..], b"hello world!");
    }

    #[test]
    fn header_alone_is_enough() {
        let header = Header::parse(b"commit 256\0").unwrap();
        assert_eq!(header.kind, ObjectType::Commit);
        assert_eq!(header.size, 256);
    }

    #[test]
    fn encoded_header_parses() {
        let encoded = Header::encode(ObjectType::Tag, 0);
        assert_eq!(encoded, b"tag 0\0");
        assert_eq!(Header::parse(&encoded).unwrap().len, encoded.len());
    }

    #[test]
    fn malformed_headers() {
        for bad in [
            &b"blob 12"[..],
            b"blob12\0",
            b"blob 1 2\0",
            b"bolb 12\0",
            b"blob abc\0",
            b"blob +5\0hello",
            b"blob \0",
            b"blob 99999999999999999999999\0",
        ] {
            assert!(Header::parse(bad).is_err(), "{:?}", bad);
        }
    }
}
