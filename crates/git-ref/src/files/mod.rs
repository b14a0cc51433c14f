//! The on-disk ref sources of a git directory.
//!
//! ```text
//! <git-dir>/refs/heads/<name>            loose branch
//! <git-dir>/refs/tags/<name>             loose tag
//! <git-dir>/refs/remotes/<remote>/<name> loose remote-tracking branch
//! <git-dir>/packed-refs                  consolidated refs
//! <git-dir>/info/refs                    refs advertised for dumb transports
//! ```

pub mod info;
pub mod loose;
pub mod packed;

use std::path::{Path, PathBuf};

/// Path to the packed-refs file.
pub fn packed_refs_path(git_dir: &Path) -> PathBuf {
    git_dir.join("packed-refs")
}

/// Path to the info/refs file.
pub fn info_refs_path(git_dir: &Path) -> PathBuf {
    git_dir.join("info").join("refs")
}

/// Directory holding the loose refs of a category.
pub fn category_dir(git_dir: &Path, category: crate::RefCategory) -> PathBuf {
    git_dir.join("refs").join(category.as_str())
}
