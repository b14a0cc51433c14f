use std::path::Path;

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_utils::io::StoreIo;

use super::packed_refs_path;
use crate::error::RefError;

/// A single entry in the packed-refs file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRef {
    /// Full ref name, e.g. `refs/tags/v1.0`.
    pub name: String,
    pub oid: ObjectId,
    pub peeled: Option<ObjectId>,
}

/// Parsed packed-refs file.
///
/// ```text
/// # pack-refs with: peeled fully-peeled sorted
/// <hex-oid> <refname>
/// ^<hex-oid>   (peeled value of annotated tag above)
/// ```
///
/// Lines that do not match either form are ignored. A `^{}` suffix on a
/// ref name marks the line as the peeled value of that ref.
#[derive(Debug, Clone, Default)]
pub struct PackedRefs {
    refs: Vec<PackedRef>,
}

impl PackedRefs {
    /// Parse a packed-refs file.
    pub fn parse(data: &[u8]) -> Self {
        let mut refs: Vec<PackedRef> = Vec::new();

        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(b"#") {
                continue;
            }

            if let Some(hex) = line.strip_prefix(b"^") {
                if let (Ok(peeled), Some(last)) = (ObjectId::from_hex(hex.trim()), refs.last_mut()) {
                    last.peeled = Some(peeled);
                }
                continue;
            }

            let Some((hex, name)) = line.split_once_str(" ") else {
                continue;
            };
            let (Ok(oid), Ok(name)) = (ObjectId::from_hex(hex), name.trim().to_str()) else {
                continue;
            };

            if let Some(base) = name.strip_suffix("^{}") {
                if let Some(target) = refs.iter_mut().rev().find(|r| r.name == base) {
                    target.peeled = Some(oid);
                }
                continue;
            }

            refs.push(PackedRef {
                name: name.to_owned(),
                oid,
                peeled: None,
            });
        }

        Self { refs }
    }

    /// Load packed-refs from disk. Returns empty if the file doesn't exist.
    pub fn load(io: &dyn StoreIo, git_dir: &Path) -> Result<Self, RefError> {
        let path = packed_refs_path(git_dir);
        match io.read_optional(&path) {
            Ok(Some(data)) => Ok(Self::parse(&data)),
            Ok(None) => Ok(Self::default()),
            Err(e) => Err(RefError::io(path, e)),
        }
    }

    /// Look up a ref by full name.
    pub fn find(&self, name: &str) -> Option<&PackedRef> {
        self.refs.iter().find(|pr| pr.name == name)
    }

    /// All entries, in file order.
    pub fn iter(&self) -> impl Iterator<Item = &PackedRef> {
        self.refs.iter()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
