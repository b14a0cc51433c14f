//! Process-wide map from store directory to its [`PackStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use git_utils::io::StoreIo;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::{PackError, PackStore, PackStoreOptions};

static GLOBAL: Lazy<PackStoreRegistry> = Lazy::new(PackStoreRegistry::new);

type Slot = Arc<OnceCell<Arc<PackStore>>>;

/// Builds each store directory's [`PackStore`] at most once.
///
/// Concurrent first requests for the same directory share one
/// initialization; a failed initialization is not remembered and the next
/// request retries it. Stores are never evicted implicitly, so packs added
/// to a directory after its store was built stay invisible until
/// [`evict`](Self::evict) is called.
///
/// The first successful request for a directory fixes the [`StoreIo`] and
/// [`PackStoreOptions`] its store uses.
#[derive(Default)]
pub struct PackStoreRegistry {
    stores: Mutex<HashMap<PathBuf, Slot>>,
}

impl PackStoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every repository handle in the process.
    pub fn global() -> &'static PackStoreRegistry {
        &GLOBAL
    }

    /// Return the store for `store_dir`, building it on first use.
    pub fn get_or_init(
        &self,
        io: &Arc<dyn StoreIo>,
        store_dir: &Path,
        options: &PackStoreOptions,
    ) -> Result<Arc<PackStore>, PackError> {
        let slot = Arc::clone(self.lock().entry(store_dir.to_path_buf()).or_default());
        slot.get_or_try_init(|| {
            debug!(store = %store_dir.display(), "building pack store");
            PackStore::initialize(Arc::clone(io), store_dir, options).map(Arc::new)
        })
        .cloned()
    }

    /// Forget the store for `store_dir`. Handles already holding it keep it.
    pub fn evict(&self, store_dir: &Path) -> bool {
        self.lock().remove(store_dir).is_some()
    }

    /// Number of directories with a built store.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Slot>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PackStoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackStoreRegistry")
            .field("stores", &self.len())
            .finish()
    }
}
