//! Unified object database.
//!
//! Resolves an object id against the packs of a store directory first and
//! the loose object directory second. This is the lookup every higher layer
//! (commits, tags, delta bases) goes through.

mod search;

use std::path::Path;
use std::sync::Arc;

use git_hash::ObjectId;
use git_loose::LooseObjectStore;
use git_object::RawObject;
use git_pack::{PackStore, PackStoreOptions, PackStoreRegistry};
use git_utils::io::StoreIo;

pub use error::OdbError;

mod error {
    use git_hash::ObjectId;
    use git_utils::ErrorKind;

    #[derive(Debug, thiserror::Error)]
    pub enum OdbError {
        #[error("object not found: {0}")]
        NotFound(ObjectId),

        #[error(transparent)]
        Loose(#[from] git_loose::LooseError),

        #[error(transparent)]
        Pack(#[from] git_pack::PackError),
    }

    impl OdbError {
        pub fn kind(&self) -> ErrorKind {
            match self {
                Self::NotFound(_) => ErrorKind::NotFound,
                Self::Loose(e) => e.kind(),
                Self::Pack(e) => e.kind(),
            }
        }
    }
}

/// Object lookup across one store directory's packs and loose objects.
///
/// Cheap to clone through an `Arc`; the pack store is shared with every
/// other handle on the same directory.
#[derive(Debug)]
pub struct ObjectDatabase {
    packs: Arc<PackStore>,
    loose: LooseObjectStore,
}

impl ObjectDatabase {
    /// Open the database of `store_dir` (a `.git` directory), taking its pack
    /// store from `registry`.
    pub fn open(
        io: Arc<dyn StoreIo>,
        store_dir: &Path,
        registry: &PackStoreRegistry,
        options: &PackStoreOptions,
    ) -> Result<Self, OdbError> {
        let packs = registry.get_or_init(&io, store_dir, options)?;
        let loose = LooseObjectStore::open(io, store_dir.join("objects"));
        Ok(Self::from_parts(packs, loose))
    }

    /// Assemble a database from an already built pack store.
    pub fn from_parts(packs: Arc<PackStore>, loose: LooseObjectStore) -> Self {
        Self { packs, loose }
    }

    /// Read an object, failing with [`OdbError::NotFound`] when no store has it.
    pub fn read(&self, oid: &ObjectId) -> Result<Arc<RawObject>, OdbError> {
        self.try_read(oid)?.ok_or(OdbError::NotFound(*oid))
    }

    /// Read an object, mapping absence to `None`.
    ///
    /// Only absence from every pack index sends the lookup to the loose
    /// store; a packed object that fails to decode is an error even if a
    /// loose copy exists.
    pub fn try_read(&self, oid: &ObjectId) -> Result<Option<Arc<RawObject>>, OdbError> {
        search::find_object(self, oid, 0)
    }

    /// Check if an object exists without reading it.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.packs.contains(oid) || self.loose.contains(oid)
    }

    pub fn packs(&self) -> &Arc<PackStore> {
        &self.packs
    }

    pub fn loose(&self) -> &LooseObjectStore {
        &self.loose
    }
}
