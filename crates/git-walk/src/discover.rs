use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use git_utils::io::{FileKind, StoreIo};
use git_utils::ByteSlice;
use tracing::trace;

use crate::error::{Error, Result};

/// Where a repository's files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    /// The directory holding `HEAD`.
    pub git_dir: PathBuf,
    /// The directory holding `objects/` and `refs/`. Differs from `git_dir`
    /// only for linked worktrees.
    pub common_dir: PathBuf,
    pub work_dir: Option<PathBuf>,
}

/// Find the git directory governing `start`.
///
/// Walks from `start` up through its parents looking for a `.git` entry.
/// A `.git` directory is returned as is; a `.git` file (worktrees,
/// submodules) is followed through its `gitdir:` line, relative targets
/// being resolved against the directory holding the file. Returns
/// `Ok(None)` once the filesystem root is passed without a match.
pub fn find_store_dir(io: &dyn StoreIo, start: &Path) -> Result<Option<PathBuf>> {
    let start = absolute(start)?;
    let mut current = start.as_path();
    loop {
        if let Some(git_dir) = resolve_dot_git(io, current)? {
            trace!(start = %start.display(), git_dir = %git_dir.display(), "found store dir");
            return Ok(Some(git_dir));
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

/// The git directory named by `dir/.git`, if there is one.
pub(crate) fn resolve_dot_git(io: &dyn StoreIo, dir: &Path) -> Result<Option<PathBuf>> {
    let dot_git = dir.join(".git");
    match io.kind_of(&dot_git) {
        Some(FileKind::Dir) => Ok(Some(dot_git)),
        Some(FileKind::File) => {
            let content = io.read(&dot_git).map_err(|e| Error::io(&dot_git, e))?;
            let target = parse_gitdir_file(&content).ok_or_else(|| Error::InvalidGitDir {
                path: dot_git.clone(),
                reason: format!(
                    "expected 'gitdir: <path>', got: {:?}",
                    content.trim().as_bstr()
                ),
            })?;
            Ok(Some(normalize(&dir.join(target))))
        }
        _ => Ok(None),
    }
}

/// Parse the contents of a `.git` file (`gitdir: <path>`).
pub fn parse_gitdir_file(content: &[u8]) -> Option<PathBuf> {
    let target = content.trim().strip_prefix(b"gitdir:")?.trim();
    let target = target.to_str().ok()?;
    (!target.is_empty()).then(|| PathBuf::from(target))
}

/// Check if a directory looks like a git dir: a `HEAD` file plus either
/// `objects/` or a `commondir` pointer.
pub(crate) fn is_git_dir(io: &dyn StoreIo, path: &Path) -> bool {
    io.kind_of(&path.join("HEAD")) == Some(FileKind::File)
        && (io.kind_of(&path.join("objects")) == Some(FileKind::Dir)
            || io.kind_of(&path.join("commondir")) == Some(FileKind::File))
}

/// Work out the layout for `path`, which is either a git directory or a
/// directory containing `.git`.
pub(crate) fn open_layout(io: &dyn StoreIo, path: &Path) -> Result<Layout> {
    let path = absolute(path)?;
    let (git_dir, work_dir) = if is_git_dir(io, &path) {
        let work_dir = match path.parent() {
            Some(parent) if path.file_name() == Some(OsStr::new(".git")) => {
                Some(parent.to_path_buf())
            }
            _ => None,
        };
        (path, work_dir)
    } else if let Some(git_dir) = resolve_dot_git(io, &path)? {
        (git_dir, Some(path))
    } else {
        return Err(Error::StoreNotFound(path));
    };

    let common_dir = resolve_common_dir(io, &git_dir)?;
    if io.kind_of(&common_dir.join("objects")) != Some(FileKind::Dir)
        || io.kind_of(&git_dir.join("HEAD")) != Some(FileKind::File)
    {
        return Err(Error::InvalidGitDir {
            path: git_dir,
            reason: "missing HEAD or objects/".to_string(),
        });
    }
    Ok(Layout {
        git_dir,
        common_dir,
        work_dir,
    })
}

/// Resolve the common dir for a git directory.
///
/// A linked worktree's git dir has a `commondir` file naming the shared
/// directory; otherwise the common dir is the git dir itself.
fn resolve_common_dir(io: &dyn StoreIo, git_dir: &Path) -> Result<PathBuf> {
    let file = git_dir.join("commondir");
    let content = io.read_optional(&file).map_err(|e| Error::io(&file, e))?;
    Ok(match content {
        Some(content) => match content.trim().to_str() {
            Ok(relative) if !relative.is_empty() => normalize(&git_dir.join(relative)),
            _ => {
                return Err(Error::InvalidGitDir {
                    path: file,
                    reason: "unreadable commondir".to_string(),
                })
            }
        },
        None => git_dir.to_path_buf(),
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexically resolve `.` and `..` components without touching the disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
