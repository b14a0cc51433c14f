use std::path::Path;

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_utils::io::StoreIo;

use crate::error::RefError;

/// Where `HEAD` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// Symbolic HEAD: a branch name inside `refs/heads/` (may contain `/`).
    Branch(String),
    /// Detached HEAD: a commit id.
    Detached(ObjectId),
}

/// Read and parse `<git_dir>/HEAD`.
pub fn read_head(io: &dyn StoreIo, git_dir: &Path) -> Result<Head, RefError> {
    let path = git_dir.join("HEAD");
    let contents = io
        .read_optional(&path)
        .map_err(|e| RefError::io(&path, e))?
        .ok_or_else(|| RefError::MissingHead(git_dir.to_path_buf()))?;
    parse_head(&contents).ok_or_else(|| RefError::Parse {
        path,
        reason: format!("unrecognized HEAD: {:?}", contents.trim().as_bstr()),
    })
}

/// Parse the contents of a `HEAD` file.
///
/// `ref: refs/heads/<name>` keeps the whole branch name; any other symbolic
/// target is reduced to its last path component.
pub fn parse_head(contents: &[u8]) -> Option<Head> {
    let trimmed = contents.trim();
    if let Some(target) = trimmed.strip_prefix(b"ref:") {
        let target = target.trim().to_str().ok()?;
        let name = match target.strip_prefix("refs/heads/") {
            Some(branch) => branch,
            None => target.rsplit('/').next()?,
        };
        return (!name.is_empty()).then(|| Head::Branch(name.to_owned()));
    }
    ObjectId::from_hex(trimmed).ok().map(Head::Detached)
}
