use std::fmt;
use std::sync::Arc;

use git_hash::ObjectId;
use git_ref::{RefCategory, RefTarget};
use once_cell::sync::OnceCell;

use crate::commit::Commit;
use crate::error::Result;
use crate::objects::Objects;

/// A branch, tag, or remote-tracking branch.
///
/// The commit it names is read on the first call to
/// [`commit`](Self::commit) and kept.
pub struct Ref {
    name: String,
    category: RefCategory,
    target: RefTarget,
    objects: Arc<Objects>,
    commit: OnceCell<Commit>,
}

impl Ref {
    pub(crate) fn new(
        name: String,
        category: RefCategory,
        target: RefTarget,
        objects: Arc<Objects>,
    ) -> Self {
        Self {
            name,
            category,
            target,
            objects,
            commit: OnceCell::new(),
        }
    }

    /// Short name: `master`, `v1.0`, `origin/master`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> RefCategory {
        self.category
    }

    /// `refs/<category>/<name>`.
    pub fn full_name(&self) -> String {
        format!("refs/{}/{}", self.category, self.name)
    }

    /// The id stored in the ref. For an annotated tag this is the tag object.
    pub fn target_hash(&self) -> &ObjectId {
        &self.target.oid
    }

    /// The object an annotated tag finally points at, when the ref source
    /// recorded it.
    pub fn peeled_hash(&self) -> Option<&ObjectId> {
        self.target.peeled.as_ref()
    }

    /// The commit this ref names, tags dereferenced.
    pub fn commit(&self) -> Result<&Commit> {
        self.commit.get_or_try_init(|| {
            let oid = self.target.peeled.unwrap_or(self.target.oid);
            self.objects.commit(&oid)
        })
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
