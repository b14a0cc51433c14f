use std::collections::BTreeMap;
use std::path::Path;

use git_utils::io::StoreIo;
use tracing::debug;

use crate::error::RefError;
use crate::files::info::InfoRefs;
use crate::files::loose;
use crate::files::packed::{PackedRef, PackedRefs};
use crate::{is_remote_head, RefCategory, RefTarget};

/// Every branch, tag, and remote-tracking branch of a git directory.
///
/// Built once from the three ref sources. A name found in a loose file
/// hides the same name in `packed-refs`, which in turn hides `info/refs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefTable {
    heads: BTreeMap<String, RefTarget>,
    tags: BTreeMap<String, RefTarget>,
    remotes: BTreeMap<String, RefTarget>,
}

impl RefTable {
    /// Scan `git_dir` and merge its ref sources.
    pub fn load(io: &dyn StoreIo, git_dir: &Path) -> Result<Self, RefError> {
        let mut table = Self::default();
        for category in RefCategory::ALL {
            *table.category_mut(category) = loose::scan(io, git_dir, category)?;
        }
        let packed = PackedRefs::load(io, git_dir)?;
        table.merge(packed.iter());
        let info = InfoRefs::load(io, git_dir)?;
        table.merge(info.iter());

        debug!(
            git_dir = %git_dir.display(),
            heads = table.heads.len(),
            tags = table.tags.len(),
            remotes = table.remotes.len(),
            packed = packed.len(),
            "ref table built"
        );
        Ok(table)
    }

    /// Add refs whose names are not yet present.
    fn merge<'a>(&mut self, refs: impl Iterator<Item = &'a PackedRef>) {
        for r in refs {
            let Some((category, name)) = RefCategory::split_full_name(&r.name) else {
                continue;
            };
            if category == RefCategory::Remotes && is_remote_head(name) {
                continue;
            }
            self.category_mut(category)
                .entry(name.to_owned())
                .or_insert(RefTarget {
                    oid: r.oid,
                    peeled: r.peeled,
                });
        }
    }

    /// Refs of one category, sorted by name.
    pub fn category(&self, category: RefCategory) -> &BTreeMap<String, RefTarget> {
        match category {
            RefCategory::Heads => &self.heads,
            RefCategory::Tags => &self.tags,
            RefCategory::Remotes => &self.remotes,
        }
    }

    fn category_mut(&mut self, category: RefCategory) -> &mut BTreeMap<String, RefTarget> {
        match category {
            RefCategory::Heads => &mut self.heads,
            RefCategory::Tags => &mut self.tags,
            RefCategory::Remotes => &mut self.remotes,
        }
    }

    pub fn get(&self, category: RefCategory, name: &str) -> Option<&RefTarget> {
        self.category(category).get(name)
    }

    /// Like [`get`](Self::get) but absence is a [`RefError::NotFound`].
    pub fn require(&self, category: RefCategory, name: &str) -> Result<&RefTarget, RefError> {
        self.get(category, name).ok_or_else(|| RefError::NotFound {
            category,
            name: name.to_owned(),
        })
    }

    /// Total number of refs across categories.
    pub fn len(&self) -> usize {
        self.heads.len() + self.tags.len() + self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
