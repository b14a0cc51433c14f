//! Non-blocking adapter.
//!
//! Every method runs the blocking implementation on tokio's blocking pool,
//! so both calling conventions share one code path and return identical
//! results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git_hash::ObjectId;
use git_object::RawObject;
use git_ref::{Head, RefCategory};
use git_pack::PackStoreRegistry;
use git_utils::io::{FsIo, StoreIo};

use crate::commit::Commit;
use crate::error::Result;
use crate::options::RepositoryOptions;
use crate::reference::Ref;
use crate::repository::{Repository, ResolvedHead};

async fn unblock<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// [`find_store_dir`](crate::find_store_dir) off the async executor.
pub async fn find_store_dir_async(start: impl Into<PathBuf>) -> Result<Option<PathBuf>> {
    let start = start.into();
    unblock(move || crate::find_store_dir(&FsIo, &start)).await
}

/// A [`Repository`] whose methods are `async`.
///
/// Any blocking handle converts with `From<Repository>` and keeps sharing
/// its caches.
#[derive(Debug, Clone)]
pub struct AsyncRepository {
    repo: Repository,
}

impl From<Repository> for AsyncRepository {
    fn from(repo: Repository) -> Self {
        Self { repo }
    }
}

impl AsyncRepository {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_options(path, RepositoryOptions::default()).await
    }

    pub async fn open_with_options(
        path: impl Into<PathBuf>,
        options: RepositoryOptions,
    ) -> Result<Self> {
        let path = path.into();
        unblock(move || Repository::open_with_options(path, options))
            .await
            .map(Self::from)
    }

    /// [`Repository::open_with`]: custom I/O provider, private pack-store
    /// registry.
    pub async fn open_with(
        io: Arc<dyn StoreIo>,
        path: impl Into<PathBuf>,
        options: RepositoryOptions,
        registry: Arc<PackStoreRegistry>,
    ) -> Result<Self> {
        let path = path.into();
        unblock(move || Repository::open_with(io, path, options, registry))
            .await
            .map(Self::from)
    }

    pub async fn discover(start: impl Into<PathBuf>) -> Result<Self> {
        let start = start.into();
        unblock(move || Repository::discover(start))
            .await
            .map(Self::from)
    }

    /// The blocking handle sharing this one's caches.
    pub fn blocking(&self) -> &Repository {
        &self.repo
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.git_dir()
    }

    pub async fn head(&self) -> Result<Head> {
        let repo = self.repo.clone();
        unblock(move || repo.head()).await
    }

    /// Resolve `HEAD`, reading the commit it names so that
    /// [`ResolvedHead::commit`] does not block afterwards.
    pub async fn read_head(&self) -> Result<ResolvedHead> {
        let repo = self.repo.clone();
        unblock(move || {
            let head = repo.read_head()?;
            head.commit()?;
            Ok(head)
        })
        .await
    }

    pub async fn read_branches(&self, categories: &[RefCategory]) -> Result<Vec<Arc<Ref>>> {
        let repo = self.repo.clone();
        let categories = categories.to_vec();
        unblock(move || repo.read_branches(&categories)).await
    }

    pub async fn read_tags(&self) -> Result<Vec<Arc<Ref>>> {
        let repo = self.repo.clone();
        unblock(move || repo.read_tags()).await
    }

    pub async fn read_commit_by_branch(&self, name: &str) -> Result<Commit> {
        let repo = self.repo.clone();
        let name = name.to_owned();
        unblock(move || repo.read_commit_by_branch(&name)).await
    }

    pub async fn read_commit_by_tag(&self, name: &str) -> Result<Commit> {
        let repo = self.repo.clone();
        let name = name.to_owned();
        unblock(move || repo.read_commit_by_tag(&name)).await
    }

    pub async fn read_commit(&self, oid: ObjectId) -> Result<Commit> {
        let repo = self.repo.clone();
        unblock(move || repo.read_commit(&oid)).await
    }

    pub async fn read_object(&self, oid: ObjectId) -> Result<Arc<RawObject>> {
        let repo = self.repo.clone();
        unblock(move || repo.read_object(&oid)).await
    }
}

impl Commit {
    /// [`walk`](Self::walk) off the async executor.
    pub async fn walk_async(&self) -> Result<Commit> {
        let commit = self.clone();
        unblock(move || commit.walk()).await
    }

    /// [`walk_to`](Self::walk_to) off the async executor.
    pub async fn walk_to_async(&self, hash: ObjectId) -> Result<Commit> {
        let commit = self.clone();
        unblock(move || commit.walk_to(&hash)).await
    }
}

impl Ref {
    /// [`commit`](Self::commit) off the async executor.
    pub async fn commit_async(self: Arc<Self>) -> Result<Commit> {
        unblock(move || self.commit().cloned()).await
    }
}
