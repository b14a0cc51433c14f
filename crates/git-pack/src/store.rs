//! Hash-to-object resolution over every pack of one store directory.

use std::collections::{HashMap, HashSet};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::bufread::ZlibDecoder;
use git_hash::ObjectId;
use git_object::RawObject;
use git_utils::flight::SingleFlight;
use git_utils::io::{FileKind, RandomAccess, ReadAt, StoreIo};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::cache::{CacheKey, ObjectCache};
use crate::delta::apply::apply_delta;
use crate::entry::{parse_entry_header, MAX_HEADER_LEN};
use crate::index::PackIndex;
use crate::{PackEntryType, PackError, MAX_DELTA_CHAIN_DEPTH};

/// Extra bytes read past the declared size when filling the inflate buffer;
/// zlib output is rarely larger than its input by more than this.
const INFLATE_SLACK: usize = 512;
const MAX_READ_WINDOW: usize = 1 << 20;
const MAX_PREALLOC: usize = 16 << 20;

/// Tuning knobs for a [`PackStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackStoreOptions {
    /// Number of resolved objects kept in the LRU cache.
    pub cache_capacity: usize,
    /// Longest delta chain followed before giving up.
    pub max_delta_depth: usize,
}

impl Default for PackStoreOptions {
    fn default() -> Self {
        Self {
            cache_capacity: 2048,
            max_delta_depth: MAX_DELTA_CHAIN_DEPTH,
        }
    }
}

/// Where a packed object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackIndexEntry {
    /// Entry offset inside the packfile.
    pub offset: u64,
    /// Position of the packfile in [`PackStore::pack_paths`].
    pub pack: usize,
}

/// Resolves a REF_DELTA base that is not stored in the same pack.
///
/// Receives the base id and the chain depth reached so far, and must return
/// the fully resolved base. Object databases route this back through their
/// general lookup so bases may live in another pack or as loose objects.
pub type BaseResolver<'a> = dyn Fn(&ObjectId, usize) -> Result<Arc<RawObject>, PackError> + 'a;

/// All packs of one store directory, indexed by object id.
///
/// Built once by [`initialize`](PackStore::initialize) and immutable after
/// that except for its object cache. When an id appears in several packs
/// the pack whose index sorts first by file name wins.
pub struct PackStore {
    store_dir: PathBuf,
    io: Arc<dyn StoreIo>,
    pack_paths: Vec<PathBuf>,
    index: HashMap<ObjectId, PackIndexEntry>,
    cache: ObjectCache,
    flight: SingleFlight<CacheKey, Arc<RawObject>>,
    max_delta_depth: usize,
}

impl PackStore {
    /// Read every `objects/pack/*.idx` under `store_dir` and build the hash map.
    ///
    /// A missing pack directory yields an empty store. Indexes are parsed in
    /// parallel; any malformed or unsupported index fails the whole call.
    pub fn initialize(
        io: Arc<dyn StoreIo>,
        store_dir: impl Into<PathBuf>,
        options: &PackStoreOptions,
    ) -> Result<Self, PackError> {
        let store_dir = store_dir.into();
        let pack_dir = store_dir.join("objects").join("pack");
        let listing = io
            .read_dir_optional(&pack_dir)
            .map_err(|e| PackError::io(&pack_dir, e))?;

        let mut idx_names: Vec<String> = listing
            .into_iter()
            .filter(|e| e.kind == FileKind::File && e.name.ends_with(".idx"))
            .map(|e| e.name)
            .collect();
        idx_names.sort();
        let idx_paths: Vec<PathBuf> = idx_names.iter().map(|n| pack_dir.join(n)).collect();

        let indexes = idx_paths
            .par_iter()
            .map(|path| {
                let data = io.read(path).map_err(|e| PackError::io(path, e))?;
                PackIndex::parse(&data, path)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut index = HashMap::with_capacity(indexes.iter().map(PackIndex::len).sum());
        let mut pack_paths = Vec::with_capacity(idx_paths.len());
        for (pack, (idx_path, idx)) in idx_paths.iter().zip(&indexes).enumerate() {
            pack_paths.push(idx_path.with_extension("pack"));
            for &(oid, offset) in idx.entries() {
                index.entry(oid).or_insert(PackIndexEntry { offset, pack });
            }
        }

        debug!(
            store = %store_dir.display(),
            packs = pack_paths.len(),
            objects = index.len(),
            "pack store initialized"
        );

        Ok(Self {
            store_dir,
            io,
            pack_paths,
            index,
            cache: ObjectCache::new(options.cache_capacity),
            flight: SingleFlight::new(),
            max_delta_depth: options.max_delta_depth,
        })
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// `true` if at least one pack index was found.
    pub fn has_pack_files(&self) -> bool {
        !self.pack_paths.is_empty()
    }

    /// Packfile paths, in index file name order.
    pub fn pack_paths(&self) -> &[PathBuf] {
        &self.pack_paths
    }

    /// Number of distinct packed objects.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.index.contains_key(oid)
    }

    pub fn lookup(&self, oid: &ObjectId) -> Option<PackIndexEntry> {
        self.index.get(oid).copied()
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    /// Resolve `oid` from the packs.
    ///
    /// `Ok(None)` means no index lists the id and the caller should look
    /// elsewhere. Any failure after the id was found (I/O, inflate, delta
    /// errors, an unresolvable base) is returned as an error.
    pub fn resolve(
        &self,
        oid: &ObjectId,
        resolve_base: &BaseResolver<'_>,
    ) -> Result<Option<Arc<RawObject>>, PackError> {
        self.resolve_at_depth(oid, 0, resolve_base)
    }

    /// [`resolve`](Self::resolve) for a lookup nested `depth` levels inside
    /// another delta chain.
    ///
    /// Nested lookups count toward the delta depth limit and skip
    /// single-flight coalescing, so a chain that refers back to a hash
    /// already being resolved on this thread fails instead of waiting on itself.
    pub fn resolve_at_depth(
        &self,
        oid: &ObjectId,
        depth: usize,
        resolve_base: &BaseResolver<'_>,
    ) -> Result<Option<Arc<RawObject>>, PackError> {
        let Some(entry) = self.lookup(oid) else {
            return Ok(None);
        };
        let key = (entry.pack, entry.offset);
        if let Some(hit) = self.cache.get(&key) {
            trace!(%oid, "pack cache hit");
            return Ok(Some(hit));
        }
        let obj = if depth == 0 {
            self.flight.run(&key, || match self.cache.get(&key) {
                Some(hit) => Ok(hit),
                None => self.unpack(entry, depth, resolve_base),
            })?
        } else {
            self.unpack(entry, depth, resolve_base)?
        };
        Ok(Some(obj))
    }

    /// Read, inflate and undeltify the entry, then cache the result.
    fn unpack(
        &self,
        entry: PackIndexEntry,
        depth: usize,
        resolve_base: &BaseResolver<'_>,
    ) -> Result<Arc<RawObject>, PackError> {
        let pack_path = &self.pack_paths[entry.pack];
        let mut file = self
            .io
            .open(pack_path)
            .map_err(|e| PackError::io(pack_path, e))?;

        // (entry offset, delta payload), tip first.
        let mut deltas: Vec<(u64, Vec<u8>)> = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = entry.offset;

        // `disk_base` is the offset of a base read from this pack, which is
        // not cached yet.
        let (kind, data, disk_base) = loop {
            if !visited.insert(offset) {
                return Err(PackError::DeltaCycle { offset });
            }
            if depth + deltas.len() > self.max_delta_depth {
                return Err(PackError::DeltaChainTooDeep {
                    offset: entry.offset,
                    max_depth: self.max_delta_depth,
                });
            }
            if !deltas.is_empty() {
                if let Some(base) = self.cache.get(&(entry.pack, offset)) {
                    break (base.kind, base.data.clone(), None);
                }
            }

            let mut head = [0u8; MAX_HEADER_LEN];
            let n = file
                .read_at(offset, &mut head)
                .map_err(|e| PackError::io(pack_path, e))?;
            let header = parse_entry_header(&head[..n], offset)?;
            let payload = inflate_at(
                file.as_mut(),
                header.data_offset(offset),
                header.declared_size,
                offset,
            )?;

            match header.entry_type {
                PackEntryType::OfsDelta { base_offset } => {
                    deltas.push((offset, payload));
                    offset = base_offset;
                }
                PackEntryType::RefDelta { base_oid } => {
                    deltas.push((offset, payload));
                    match self.lookup(&base_oid) {
                        Some(base) if base.pack == entry.pack => offset = base.offset,
                        _ => {
                            let base = resolve_base(&base_oid, depth + deltas.len())?;
                            break (base.kind, base.data.clone(), None);
                        }
                    }
                }
                other => {
                    let kind = other.to_object_type().ok_or_else(|| PackError::CorruptEntry {
                        offset,
                        reason: "delta entry where a base was expected".into(),
                    })?;
                    break (kind, payload, Some(offset));
                }
            }
        };
        drop(file);

        // Every object rebuilt along the chain is cached under its own
        // offset; the last one inserted is the requested entry.
        let mut obj = Arc::new(RawObject::new(kind, data));
        if let Some(base_offset) = disk_base {
            self.cache.insert((entry.pack, base_offset), Arc::clone(&obj));
        }
        for (hop, delta) in deltas.iter().rev() {
            obj = Arc::new(RawObject::new(kind, apply_delta(&obj.data, delta)?));
            self.cache.insert((entry.pack, *hop), Arc::clone(&obj));
        }

        trace!(
            pack = entry.pack,
            offset = entry.offset,
            chain = deltas.len(),
            "resolved packed object"
        );
        Ok(obj)
    }
}

/// Inflate the zlib stream at `data_offset`, which must produce exactly `size` bytes.
fn inflate_at(
    file: &mut dyn RandomAccess,
    data_offset: u64,
    size: u64,
    entry_offset: u64,
) -> Result<Vec<u8>, PackError> {
    let size = usize::try_from(size).map_err(|_| PackError::CorruptEntry {
        offset: entry_offset,
        reason: format!("declared size {size} does not fit in memory"),
    })?;
    let window = size.saturating_add(INFLATE_SLACK).min(MAX_READ_WINDOW);
    let reader = BufReader::with_capacity(window, ReadAt::new(file, data_offset));
    let mut out = Vec::with_capacity(size.min(MAX_PREALLOC));
    ZlibDecoder::new(reader)
        .take(size as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|source| PackError::Inflate {
            offset: entry_offset,
            source,
        })?;
    if out.len() != size {
        return Err(PackError::CorruptEntry {
            offset: entry_offset,
            reason: format!("inflated {} bytes, header declares {size}", out.len()),
        });
    }
    Ok(out)
}

impl std::fmt::Debug for PackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackStore")
            .field("store_dir", &self.store_dir)
            .field("packs", &self.pack_paths.len())
            .field("objects", &self.index.len())
            .field("cache", &self.cache)
            .finish()
    }
}
