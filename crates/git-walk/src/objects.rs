use std::path::PathBuf;
use std::sync::Arc;

use git_hash::ObjectId;
use git_odb::ObjectDatabase;
use git_pack::PackStoreRegistry;
use git_utils::io::StoreIo;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::commit::{resolve_commit, Commit};
use crate::error::Result;
use crate::options::RepositoryOptions;

/// Where a repository takes its pack stores from.
#[derive(Debug, Clone)]
pub(crate) enum Registry {
    Global,
    Owned(Arc<PackStoreRegistry>),
}

impl Registry {
    fn get(&self) -> &PackStoreRegistry {
        match self {
            Self::Global => PackStoreRegistry::global(),
            Self::Owned(registry) => registry,
        }
    }
}

/// Object access shared by a repository and the refs it hands out.
///
/// The object database (and with it the pack store) is opened on first
/// use; concurrent first users wait for one open.
#[derive(Debug)]
pub(crate) struct Objects {
    io: Arc<dyn StoreIo>,
    common_dir: PathBuf,
    registry: Registry,
    options: RepositoryOptions,
    odb: OnceCell<Arc<ObjectDatabase>>,
}

impl Objects {
    pub fn new(
        io: Arc<dyn StoreIo>,
        common_dir: PathBuf,
        registry: Registry,
        options: RepositoryOptions,
    ) -> Self {
        Self {
            io,
            common_dir,
            registry,
            options,
            odb: OnceCell::new(),
        }
    }

    pub fn odb(&self) -> Result<&Arc<ObjectDatabase>> {
        self.odb.get_or_try_init(|| {
            debug!(store = %self.common_dir.display(), "opening object database");
            let odb = ObjectDatabase::open(
                Arc::clone(&self.io),
                &self.common_dir,
                self.registry.get(),
                &self.options.pack_store_options(),
            )?;
            Ok(Arc::new(odb))
        })
    }

    pub fn commit(&self, oid: &ObjectId) -> Result<Commit> {
        resolve_commit(self.odb()?, oid, self.options.max_tag_depth)
    }

    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }
}
