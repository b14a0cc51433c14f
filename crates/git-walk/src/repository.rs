use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use git_hash::ObjectId;
use git_object::RawObject;
use git_pack::PackStoreRegistry;
use git_ref::{read_head, Head, RefCategory, RefTable};
use git_utils::io::{FsIo, StoreIo};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::commit::Commit;
use crate::discover::{find_store_dir, open_layout, Layout};
use crate::error::{Error, Result};
use crate::objects::{Objects, Registry};
use crate::options::RepositoryOptions;
use crate::reference::Ref;

/// What `HEAD` resolves to.
#[derive(Debug, Clone)]
pub enum ResolvedHead {
    /// `HEAD` names a branch.
    Branch(Arc<Ref>),
    /// `HEAD` holds a commit id directly.
    Detached(Commit),
}

impl ResolvedHead {
    /// The branch name, unless `HEAD` is detached.
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Self::Branch(r) => Some(r.name()),
            Self::Detached(_) => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }

    /// The commit `HEAD` points at.
    pub fn commit(&self) -> Result<&Commit> {
        match self {
            Self::Branch(r) => r.commit(),
            Self::Detached(c) => Ok(c),
        }
    }
}

/// Refs of every category, built once per repository handle.
#[derive(Default)]
struct RefSet {
    heads: BTreeMap<String, Arc<Ref>>,
    tags: BTreeMap<String, Arc<Ref>>,
    remotes: BTreeMap<String, Arc<Ref>>,
}

impl RefSet {
    fn build(table: &RefTable, objects: &Arc<Objects>) -> Self {
        let mut set = Self::default();
        for category in RefCategory::ALL {
            let refs = table
                .category(category)
                .iter()
                .map(|(name, target)| {
                    let r = Ref::new(name.clone(), category, *target, Arc::clone(objects));
                    (name.clone(), Arc::new(r))
                })
                .collect();
            match category {
                RefCategory::Heads => set.heads = refs,
                RefCategory::Tags => set.tags = refs,
                RefCategory::Remotes => set.remotes = refs,
            }
        }
        set
    }

    fn category(&self, category: RefCategory) -> &BTreeMap<String, Arc<Ref>> {
        match category {
            RefCategory::Heads => &self.heads,
            RefCategory::Tags => &self.tags,
            RefCategory::Remotes => &self.remotes,
        }
    }
}

struct Inner {
    layout: Layout,
    io: Arc<dyn StoreIo>,
    objects: Arc<Objects>,
    refs: OnceCell<RefSet>,
}

/// A read-only handle on one repository.
///
/// Cloning is cheap and clones share the ref table and object caches.
/// Packs are indexed on the first object read; refs are scanned on the
/// first ref lookup. Both happen at most once per handle even under
/// concurrent first use, and the pack store itself is shared with every
/// other handle on the same store directory through the
/// [`PackStoreRegistry`].
#[derive(Clone)]
pub struct Repository {
    inner: Arc<Inner>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.inner.layout.git_dir)
            .field("work_dir", &self.inner.layout.work_dir)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open the repository at `path`, which is either a git directory or a
    /// directory containing `.git`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, RepositoryOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: RepositoryOptions) -> Result<Self> {
        Self::build(Arc::new(FsIo), path.as_ref(), options, Registry::Global)
    }

    /// Open through a custom I/O provider with a private pack-store registry.
    pub fn open_with(
        io: Arc<dyn StoreIo>,
        path: impl AsRef<Path>,
        options: RepositoryOptions,
        registry: Arc<PackStoreRegistry>,
    ) -> Result<Self> {
        Self::build(io, path.as_ref(), options, Registry::Owned(registry))
    }

    /// Find the repository governing `start` (see
    /// [`find_store_dir`](crate::find_store_dir)) and open it.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref();
        let git_dir =
            find_store_dir(&FsIo, start)?.ok_or_else(|| Error::StoreNotFound(start.to_path_buf()))?;
        Self::open(git_dir)
    }

    fn build(
        io: Arc<dyn StoreIo>,
        path: &Path,
        options: RepositoryOptions,
        registry: Registry,
    ) -> Result<Self> {
        let layout = open_layout(io.as_ref(), path)?;
        debug!(git_dir = %layout.git_dir.display(), "opened repository");
        let objects = Arc::new(Objects::new(
            Arc::clone(&io),
            layout.common_dir.clone(),
            registry,
            options,
        ));
        Ok(Self {
            inner: Arc::new(Inner {
                layout,
                io,
                objects,
                refs: OnceCell::new(),
            }),
        })
    }

    /// The directory holding `HEAD`.
    pub fn git_dir(&self) -> &Path {
        &self.inner.layout.git_dir
    }

    /// The directory holding `objects/` and `refs/`; the git dir itself
    /// except in linked worktrees.
    pub fn common_dir(&self) -> &Path {
        &self.inner.layout.common_dir
    }

    /// The working directory, `None` for a bare repository.
    pub fn work_dir(&self) -> Option<&Path> {
        self.inner.layout.work_dir.as_deref()
    }

    pub fn options(&self) -> &RepositoryOptions {
        self.inner.objects.options()
    }

    /// Where `HEAD` points, without reading any object.
    pub fn head(&self) -> Result<Head> {
        Ok(read_head(self.inner.io.as_ref(), self.git_dir())?)
    }

    /// Resolve `HEAD` to its branch or, when detached, its commit.
    ///
    /// A branch that has no commit yet is `NotFound`.
    pub fn read_head(&self) -> Result<ResolvedHead> {
        match self.head()? {
            Head::Branch(name) => {
                let branch = self.require(RefCategory::Heads, &name)?;
                Ok(ResolvedHead::Branch(branch))
            }
            Head::Detached(oid) => Ok(ResolvedHead::Detached(self.read_commit(&oid)?)),
        }
    }

    /// Refs of the given categories, each category sorted by name.
    pub fn read_branches(&self, categories: &[RefCategory]) -> Result<Vec<Arc<Ref>>> {
        let refs = self.refs()?;
        let mut seen = Vec::with_capacity(categories.len());
        let mut out = Vec::new();
        for &category in categories {
            if seen.contains(&category) {
                continue;
            }
            seen.push(category);
            out.extend(refs.category(category).values().cloned());
        }
        Ok(out)
    }

    pub fn read_tags(&self) -> Result<Vec<Arc<Ref>>> {
        self.read_branches(&[RefCategory::Tags])
    }

    /// A ref by category and short name.
    pub fn find_ref(&self, category: RefCategory, name: &str) -> Result<Option<Arc<Ref>>> {
        Ok(self.refs()?.category(category).get(name).cloned())
    }

    /// The commit of a local branch, or of a remote-tracking branch when no
    /// local branch has that name.
    pub fn read_commit_by_branch(&self, name: &str) -> Result<Commit> {
        let refs = self.refs()?;
        let branch = refs
            .heads
            .get(name)
            .or_else(|| refs.remotes.get(name))
            .ok_or_else(|| Error::NotFound {
                what: format!("branch '{name}'"),
            })?;
        Ok(branch.commit()?.clone())
    }

    pub fn read_commit_by_tag(&self, name: &str) -> Result<Commit> {
        let tag = self.require(RefCategory::Tags, name)?;
        Ok(tag.commit()?.clone())
    }

    /// Read a commit by id, dereferencing annotated tags.
    pub fn read_commit(&self, oid: &ObjectId) -> Result<Commit> {
        self.inner.objects.commit(oid)
    }

    /// Read any object by id.
    pub fn read_object(&self, oid: &ObjectId) -> Result<Arc<RawObject>> {
        Ok(self.inner.objects.odb()?.read(oid)?)
    }

    fn require(&self, category: RefCategory, name: &str) -> Result<Arc<Ref>> {
        self.find_ref(category, name)?.ok_or_else(|| {
            Error::Ref(git_ref::RefError::NotFound {
                category,
                name: name.to_owned(),
            })
        })
    }

    fn refs(&self) -> Result<&RefSet> {
        self.inner.refs.get_or_try_init(|| {
            let table = RefTable::load(self.inner.io.as_ref(), self.common_dir())?;
            Ok(RefSet::build(&table, &self.inner.objects))
        })
    }
}
