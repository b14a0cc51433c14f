use git_pack::PackStoreOptions;
use serde::Deserialize;

/// Tunables for a [`Repository`](crate::Repository).
///
/// Deserializes from any serde format; missing fields take their defaults:
///
/// ```
/// let opts: git_walk::RepositoryOptions =
///     serde_json::from_str(r#"{ "object_cache_capacity": 64 }"#).unwrap();
/// assert_eq!(opts.object_cache_capacity, 64);
/// assert_eq!(opts.max_tag_depth, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryOptions {
    /// Resolved packed objects kept in the per-store LRU cache.
    pub object_cache_capacity: usize,
    /// Longest delta chain followed before the pack is treated as corrupt.
    pub max_delta_depth: usize,
    /// Longest chain of annotated tags dereferenced when resolving a commit.
    pub max_tag_depth: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        let pack = PackStoreOptions::default();
        Self {
            object_cache_capacity: pack.cache_capacity,
            max_delta_depth: pack.max_delta_depth,
            max_tag_depth: 16,
        }
    }
}

impl RepositoryOptions {
    pub fn pack_store_options(&self) -> PackStoreOptions {
        PackStoreOptions {
            cache_capacity: self.object_cache_capacity,
            max_delta_depth: self.max_delta_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = RepositoryOptions::default();
        assert_eq!(opts.object_cache_capacity, 2048);
        assert_eq!(opts.max_delta_depth, 512);
        assert_eq!(opts.max_tag_depth, 16);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: RepositoryOptions = serde_json::from_str(r#"{"max_tag_depth": 3}"#).unwrap();
        assert_eq!(opts.max_tag_depth, 3);
        assert_eq!(opts.object_cache_capacity, 2048);
        let pack = opts.pack_store_options();
        assert_eq!(pack.max_delta_depth, 512);
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(serde_json::from_str::<RepositoryOptions>(r#"{"cache": 1}"#).is_err());
    }
}
