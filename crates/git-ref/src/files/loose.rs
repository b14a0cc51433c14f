//! Loose ref files.

use std::collections::BTreeMap;
use std::path::Path;

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_utils::io::{FileKind, StoreIo};
use tracing::warn;

use super::category_dir;
use crate::error::RefError;
use crate::{RefCategory, RefTarget};

/// Nesting limit for ref directories; guards against symlink loops.
const MAX_NESTING: usize = 32;

/// Read every loose ref of `category`, keyed by its name inside the category.
///
/// Remote-tracking refs are named `<remote>/<branch>`. A top-level `HEAD`
/// entry is skipped in every category, and so is each remote's. Files whose content is not a hash (symbolic refs,
/// stray files) are skipped with a warning.
pub fn scan(
    io: &dyn StoreIo,
    git_dir: &Path,
    category: RefCategory,
) -> Result<BTreeMap<String, RefTarget>, RefError> {
    let dir = category_dir(git_dir, category);
    let mut refs = BTreeMap::new();
    match category {
        RefCategory::Heads | RefCategory::Tags => {
            scan_dir(io, &dir, "", 0, &mut refs)?;
            refs.remove("HEAD");
        }
        RefCategory::Remotes => {
            let remotes = io.read_dir_optional(&dir).map_err(|e| RefError::io(&dir, e))?;
            for remote in remotes.into_iter().filter(|e| e.kind == FileKind::Dir) {
                let mut found = BTreeMap::new();
                scan_dir(io, &dir.join(&remote.name), "", 0, &mut found)?;
                found.remove("HEAD");
                for (name, target) in found {
                    refs.insert(format!("{}/{name}", remote.name), target);
                }
            }
        }
    }
    Ok(refs)
}

fn scan_dir(
    io: &dyn StoreIo,
    dir: &Path,
    prefix: &str,
    nesting: usize,
    refs: &mut BTreeMap<String, RefTarget>,
) -> Result<(), RefError> {
    if nesting > MAX_NESTING {
        warn!(dir = %dir.display(), "ref directories nested too deeply, skipping");
        return Ok(());
    }
    let entries = io.read_dir_optional(dir).map_err(|e| RefError::io(dir, e))?;
    for entry in entries {
        let name = format!("{prefix}{}", entry.name);
        let path = dir.join(&entry.name);
        match entry.kind {
            FileKind::Dir => scan_dir(io, &path, &format!("{name}/"), nesting + 1, refs)?,
            FileKind::File => {
                let Some(contents) = io.read_optional(&path).map_err(|e| RefError::io(&path, e))?
                else {
                    continue;
                };
                match ObjectId::from_hex(contents.trim()) {
                    Ok(oid) => {
                        refs.insert(name, RefTarget::new(oid));
                    }
                    Err(_) => warn!(path = %path.display(), "loose ref is not a hash, skipping"),
                }
            }
            FileKind::Other => {}
        }
    }
    Ok(())
}
