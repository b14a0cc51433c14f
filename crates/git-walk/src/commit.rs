use std::fmt;
use std::sync::Arc;

use git_hash::ObjectId;
use git_object::{ObjectType, Tag};
use git_odb::ObjectDatabase;
use git_utils::date::Signature;
use git_utils::BStr;
use tracing::trace;

use crate::error::{Error, Result};

/// A commit read from the object store.
///
/// Cloning is cheap: the parsed body and the object database are shared.
/// Author, committer, and message are decoded on first access, so a
/// malformed signature surfaces from [`author`](Self::author) or
/// [`committer`](Self::committer), not from the read that produced the
/// commit.
#[derive(Clone)]
pub struct Commit {
    hash: ObjectId,
    data: Arc<git_object::Commit>,
    odb: Arc<ObjectDatabase>,
    max_tag_depth: usize,
}

impl Commit {
    pub fn hash(&self) -> &ObjectId {
        &self.hash
    }

    pub fn tree_hash(&self) -> &ObjectId {
        self.data.tree()
    }

    /// Parents in body order. The first is the mainline parent.
    pub fn parent_hashes(&self) -> &[ObjectId] {
        self.data.parents()
    }

    pub fn base_parent_hash(&self) -> Option<&ObjectId> {
        self.data.first_parent()
    }

    /// Every parent but the first.
    pub fn merged_parent_hashes(&self) -> &[ObjectId] {
        self.parent_hashes().get(1..).unwrap_or_default()
    }

    pub fn has_parents(&self) -> bool {
        !self.parent_hashes().is_empty()
    }

    pub fn is_merge_commit(&self) -> bool {
        self.data.is_merge()
    }

    pub fn author(&self) -> Result<&Signature> {
        Ok(self.data.author()?)
    }

    pub fn committer(&self) -> Result<&Signature> {
        Ok(self.data.committer()?)
    }

    /// The message, trimmed of surrounding whitespace.
    pub fn message(&self) -> &BStr {
        self.data.message()
    }

    /// The commit body exactly as stored.
    pub fn raw_body(&self) -> &[u8] {
        self.data.raw()
    }

    /// Step to the mainline parent.
    ///
    /// A root commit has nowhere to go; that is a `NotFound` error.
    pub fn walk(&self) -> Result<Commit> {
        let parent = self.base_parent_hash().ok_or_else(|| Error::NotFound {
            what: format!("parent of root commit {}", self.hash),
        })?;
        self.walk_to(parent)
    }

    /// Read another commit through the same object store, usually one of
    /// [`parent_hashes`](Self::parent_hashes).
    pub fn walk_to(&self, hash: &ObjectId) -> Result<Commit> {
        resolve_commit(&self.odb, hash, self.max_tag_depth)
    }

    /// This commit followed by its first-parent ancestors, root last.
    ///
    /// Iteration ends after the root commit or after the first error.
    pub fn first_parents(&self) -> FirstParents {
        FirstParents {
            next: Some(Ok(self.clone())),
        }
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.data == other.data
    }
}

impl Eq for Commit {}

impl fmt::Debug for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commit")
            .field("hash", &self.hash)
            .field("tree", self.tree_hash())
            .field("parents", &self.parent_hashes())
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`Commit::first_parents`].
#[derive(Debug)]
pub struct FirstParents {
    next: Option<Result<Commit>>,
}

impl Iterator for FirstParents {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if let Ok(commit) = &current {
            self.next = commit.base_parent_hash().map(|p| commit.walk_to(p));
        }
        Some(current)
    }
}

/// Read `oid` as a commit, dereferencing annotated tags on the way.
///
/// The returned commit carries its own hash, not the tag's. Trees and
/// blobs are a [`Error::TypeMismatch`]; more than `max_tag_depth` nested
/// tags is a [`Error::TagDepth`].
pub(crate) fn resolve_commit(
    odb: &Arc<ObjectDatabase>,
    oid: &ObjectId,
    max_tag_depth: usize,
) -> Result<Commit> {
    let mut current = *oid;
    for _ in 0..=max_tag_depth {
        let object = odb.read(&current)?;
        match object.kind {
            ObjectType::Commit => {
                let data = git_object::Commit::parse(object.data.as_slice())?;
                return Ok(Commit {
                    hash: current,
                    data: Arc::new(data),
                    odb: Arc::clone(odb),
                    max_tag_depth,
                });
            }
            ObjectType::Tag => {
                let target = Tag::parse_target(&object.data)?;
                trace!(tag = %current, target = %target, "dereferencing tag");
                current = target;
            }
            actual => {
                return Err(Error::TypeMismatch {
                    oid: current,
                    expected: ObjectType::Commit,
                    actual,
                })
            }
        }
    }
    Err(Error::TagDepth {
        oid: *oid,
        max: max_tag_depth,
    })
}
