//! `info/refs`: one `<hash>\t<refname>` line per ref.

use std::path::Path;

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_utils::io::StoreIo;

use super::info_refs_path;
use crate::error::RefError;
use crate::files::packed::PackedRef;

/// Parsed `info/refs` file. `<name>^{}` lines become the peeled value of `<name>`.
#[derive(Debug, Clone, Default)]
pub struct InfoRefs {
    refs: Vec<PackedRef>,
}

impl InfoRefs {
    pub fn parse(data: &[u8]) -> Self {
        let mut refs: Vec<PackedRef> = Vec::new();
        for line in data.lines() {
            let Some((hex, name)) = line.split_once_str("\t") else {
                continue;
            };
            let (Ok(oid), Ok(name)) = (ObjectId::from_hex(hex.trim()), name.trim().to_str()) else {
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

    /// Load `info/refs`. Returns empty if the file doesn't exist.
    pub fn load(io: &dyn StoreIo, git_dir: &Path) -> Result<Self, RefError> {
        let path = info_refs_path(git_dir);
        match io.read_optional(&path) {
            Ok(Some(data)) => Ok(Self::parse(&data)),
            Ok(None) => Ok(Self::default()),
            Err(e) => Err(RefError::io(path, e)),
        }
    }

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
